use cucumber::given;
use merchant_gateway_engine::db_types::NewGateway;

use crate::cucumber::{
    gateway_world::{GatewaySystem, CALLBACK_URL},
    GatewayWorld,
};

#[given("a fresh install")]
async fn fresh_database(world: &mut GatewayWorld) {
    let system = GatewaySystem::new().await;
    world.system = Some(system);
}

async fn add_gateway(world: &mut GatewayWorld, name: &str, secret: Option<&str>, check_signature: bool) {
    let mut gateway = NewGateway::new(name, "xpub6CUGRUonZSQ4TWtTMmzXdrXDtypWKiKrhko4egpiMZbpi", "Order")
        .with_signature_checks(check_signature)
        .with_callback_url(CALLBACK_URL);
    if let Some(secret) = secret {
        gateway = gateway.with_secret(secret);
    }
    world.system().db.create_gateway(gateway).await.expect("Error creating gateway");
}

#[given(expr = "a gateway '{word}' with secret '{word}' that checks signatures")]
async fn signed_gateway(world: &mut GatewayWorld, name: String, secret: String) {
    add_gateway(world, &name, Some(&secret), true).await;
}

#[given(expr = "a gateway '{word}' with secret '{word}' that does not check signatures")]
async fn unsigned_gateway_with_secret(world: &mut GatewayWorld, name: String, secret: String) {
    add_gateway(world, &name, Some(&secret), false).await;
}

#[given(expr = "a gateway '{word}' without a secret")]
async fn gateway_without_secret(world: &mut GatewayWorld, name: String) {
    add_gateway(world, &name, None, false).await;
}
