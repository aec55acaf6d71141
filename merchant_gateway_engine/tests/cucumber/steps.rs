use cucumber::{then, when};
use merchant_gateway_engine::{
    db_types::{CallbackResponse, OrderId, OrderStatus},
    helpers::{callback_signature, sign},
    CallbackOutcome,
    CreateOrderRequest,
    GatewayError,
    KeychainAllocator,
    OrderManagement,
};
use mpg_common::Secret;
use url::Url;

use crate::cucumber::{gateway_world::CALLBACK_URL, GatewayWorld};

async fn create_order(world: &mut GatewayWorld, gateway: &str, request: CreateOrderRequest) {
    let gateway = world.gateway(gateway).await;
    let result = world.api().create_order(gateway.id, request).await;
    world.last_result = Some(result);
}

#[when(expr = "I create an order on '{word}' with id '{word}', amount {int} and a valid signature for secret '{word}'")]
async fn signed_order(world: &mut GatewayWorld, gateway: String, id: String, amount: i64, secret: String) {
    let signature = sign(&id, &Secret::new(secret));
    let request = CreateOrderRequest::new(amount).with_id(id).with_signature(signature);
    create_order(world, &gateway, request).await;
}

#[when(expr = "I create an order on '{word}' with id '{word}', amount {int} and signature '{word}'")]
async fn order_with_signature(world: &mut GatewayWorld, gateway: String, id: String, amount: i64, signature: String) {
    let request = CreateOrderRequest::new(amount).with_id(id).with_signature(signature);
    create_order(world, &gateway, request).await;
}

#[when(expr = "I create an order on '{word}' with an empty id, amount {int} and signature '{word}'")]
async fn order_with_empty_id(world: &mut GatewayWorld, gateway: String, amount: i64, signature: String) {
    let request = CreateOrderRequest::new(amount).with_id("").with_signature(signature);
    create_order(world, &gateway, request).await;
}

#[when(expr = "I create an order on '{word}' without an id for amount {int}")]
async fn order_without_id(world: &mut GatewayWorld, gateway: String, amount: i64) {
    create_order(world, &gateway, CreateOrderRequest::new(amount)).await;
}

#[when(expr = "I create an order on '{word}' with id '{word}', amount {int} and data {string}")]
async fn order_with_data(world: &mut GatewayWorld, gateway: String, id: String, amount: i64, data: String) {
    let request = CreateOrderRequest::new(amount).with_id(id).with_data(data);
    create_order(world, &gateway, request).await;
}

#[when(expr = "the merchant endpoint always responds with {int}")]
async fn endpoint_always(world: &mut GatewayWorld, code: u16) {
    world.script_endpoint(vec![], CallbackResponse::new(code.to_string(), format!("status {code}")));
}

#[when(expr = "the merchant endpoint responds with {int} {int} times and then with {int}")]
async fn endpoint_recovers(world: &mut GatewayWorld, failure: u16, times: usize, success: u16) {
    let failures = (0..times).map(|_| CallbackResponse::new(failure.to_string(), "failed".to_string())).collect();
    world.script_endpoint(failures, CallbackResponse::new(success.to_string(), format!("status {success}")));
}

#[when(expr = "order '{word}' on '{word}' becomes {word} with transaction '{word}'")]
async fn order_status_changes(world: &mut GatewayWorld, order_id: String, gateway: String, status: String, tid: String) {
    let gateway = world.gateway(&gateway).await;
    let status = status.parse::<OrderStatus>().expect("Not a valid order status");
    let order = world
        .api()
        .orders()
        .update_order_status(gateway.id, &OrderId::new(order_id), status, Some(tid))
        .await
        .expect("Error updating order status");
    let outcome = world.dispatcher().dispatch(&gateway, &order).await;
    assert_ne!(outcome, CallbackOutcome::NoCallbackUrl);
}

#[then(expr = "the order is created with keychain id {int}")]
async fn order_created(world: &mut GatewayWorld, keychain_id: i64) {
    assert_eq!(world.last_order().keychain_id, keychain_id);
}

#[then(expr = "the order is created with id '{word}'")]
async fn order_created_with_id(world: &mut GatewayWorld, id: String) {
    assert_eq!(world.last_order().id, OrderId::new(id));
}

#[then(expr = "the order is rejected with {word}")]
async fn order_rejected(world: &mut GatewayWorld, reason: String) {
    match (reason.as_str(), &world.last_result) {
        ("InvalidSignature", Some(Err(GatewayError::InvalidSignature))) => {},
        ("InvalidOrderId", Some(Err(GatewayError::InvalidOrderId))) => {},
        (reason, result) => panic!("Expected {reason}, but got {result:?}"),
    }
}

#[then(expr = "the keychain counter for '{word}' is {int}")]
async fn keychain_counter(world: &mut GatewayWorld, gateway: String, expected: i64) {
    let gateway = world.gateway(&gateway).await;
    assert_eq!(gateway.last_keychain_id, expected);
    assert_eq!(world.system().db.current_id(&gateway).await.unwrap(), expected);
}

#[then(expr = "the merchant endpoint received {int} callback(s)")]
async fn callbacks_received(world: &mut GatewayWorld, count: usize) {
    assert_eq!(world.system().endpoint.requests().len(), count);
}

fn last_callback(world: &GatewayWorld) -> Vec<(String, String)> {
    let requests = world.system().endpoint.requests();
    let last = requests.last().expect("No callbacks were sent");
    assert!(last.starts_with(CALLBACK_URL));
    Url::parse(last).unwrap().query_pairs().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn param(params: &[(String, String)], key: &str) -> Option<String> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

#[then(expr = "the last callback has {word} set to {string}")]
async fn callback_param(world: &mut GatewayWorld, key: String, value: String) {
    let params = last_callback(world);
    assert_eq!(param(&params, &key), Some(value));
}

#[then(expr = "the last callback has no {word} parameter")]
async fn callback_param_absent(world: &mut GatewayWorld, key: String) {
    let params = last_callback(world);
    assert_eq!(param(&params, &key), None);
}

#[then(expr = "the last callback is signed with secret '{word}'")]
async fn callback_signed(world: &mut GatewayWorld, secret: String) {
    let params = last_callback(world);
    let id = param(&params, "id").expect("Callback has no order id");
    let expected = callback_signature(&id, &Secret::new(secret));
    assert_eq!(param(&params, "signature"), Some(expected));
}

#[then(expr = "order '{word}' on '{word}' has the callback response {int}")]
async fn recorded_response(world: &mut GatewayWorld, order_id: String, gateway: String, code: u16) {
    let gateway = world.gateway(&gateway).await;
    let order = world.api().fetch_order(gateway.id, &OrderId::new(order_id)).await.expect("Order does not exist");
    let response = order.callback_response.expect("No callback response was recorded");
    assert_eq!(response.code, code.to_string());
}
