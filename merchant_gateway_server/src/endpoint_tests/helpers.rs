use std::path::Path;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use merchant_gateway_engine::{
    events::EventProducers,
    test_utils::fakes::MemoryOrderStore,
    ConfigGatewayStore,
    FileKeychainAllocator,
    GatewayApi,
};

use crate::routes::{health, CreateOrderRoute, OrderByIdRoute, UpdateOrderStatusRoute};

pub type TestApi = GatewayApi<ConfigGatewayStore, MemoryOrderStore>;

pub const SECRET: &str = "secret";

/// Gateway 1 (`signed`) enforces signatures with [`SECRET`]. Gateway 2 (`open`) accepts anything.
const GATEWAYS: &str = r#"
[[gateways]]
name = "signed"
pubkey = "xpub6CbSigned"
confirmations_required = 1
order_class = "Order"
secret = "secret"
check_signature = true

[[gateways]]
name = "open"
pubkey = "xpub6CbOpen"
confirmations_required = 0
order_class = "Order"
check_signature = false
"#;

pub fn test_api(keychain_dir: &Path) -> TestApi {
    let store = ConfigGatewayStore::from_toml_str(GATEWAYS, FileKeychainAllocator::new(keychain_dir))
        .expect("Invalid test gateways");
    GatewayApi::new(store, MemoryOrderStore::default(), EventProducers::default())
}

pub async fn send_request(api: &TestApi, req: TestRequest) -> (StatusCode, String) {
    let app = App::new()
        .app_data(web::Data::new(api.clone()))
        .service(health)
        .service(CreateOrderRoute::<ConfigGatewayStore, MemoryOrderStore>::new())
        .service(OrderByIdRoute::<ConfigGatewayStore, MemoryOrderStore>::new())
        .service(UpdateOrderStatusRoute::<ConfigGatewayStore, MemoryOrderStore>::new());
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("Response was not JSON")
}
