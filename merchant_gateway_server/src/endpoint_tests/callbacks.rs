use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use merchant_gateway_engine::{
    db_types::{NewGateway, OrderId, OrderStatus},
    test_utils::prepare_env::fresh_database,
    traits::OrderManagement,
    CreateOrderRequest,
    GatewayApi,
};

use crate::{config::ServerConfig, server::start_callback_handlers};

type Received = Arc<Mutex<Vec<String>>>;

/// Starts a stand-in merchant endpoint on a free port, returning its base URL.
fn merchant_endpoint(received: Received) -> String {
    let server = HttpServer::new(move || {
        let received = received.clone();
        App::new().route(
            "/payment_callback",
            web::get().to(move |req: HttpRequest| {
                let received = received.clone();
                async move {
                    received.lock().unwrap().push(req.query_string().to_string());
                    HttpResponse::Ok().body("OK")
                }
            }),
        )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let port = server.addrs()[0].port();
    actix_web::rt::spawn(server.run());
    format!("http://127.0.0.1:{port}/payment_callback")
}

#[actix_web::test]
async fn status_change_is_delivered_to_merchant() {
    let _ = env_logger::try_init().ok();
    let received = Received::default();
    let callback_url = merchant_endpoint(received.clone());

    let db = fresh_database().await;
    let gateway = db
        .create_gateway(
            NewGateway::new("shop", "xpub6CbShop", "Order").with_secret("secret").with_callback_url(&callback_url),
        )
        .await
        .unwrap();
    let config = ServerConfig {
        callback_retry_delay: Duration::from_millis(50),
        callback_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let producers = start_callback_handlers(&config, db.clone()).await.unwrap();
    let api = GatewayApi::new(db.clone(), db.clone(), producers);

    let order = api.create_order(gateway.id, CreateOrderRequest::new(1200).with_id("inv-1")).await.unwrap();
    assert_eq!(order.keychain_id, 0);
    api.update_order_status(gateway.id, &order.id, OrderStatus::Paid, Some("f00d".into())).await.unwrap();

    let mut stored = None;
    for _ in 0..100 {
        let order = db.fetch_order(gateway.id, &OrderId::new("inv-1")).await.unwrap().unwrap();
        if order.callback_response.is_some() {
            stored = Some(order);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let stored = stored.expect("Callback response was never recorded");
    let response = stored.callback_response.unwrap();
    assert_eq!(response.code, "200");
    assert_eq!(response.body, "OK");

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert!(received[0].starts_with("id=inv-1&amount=1200&status=2&"), "{}", received[0]);
    assert!(received[0].contains("tid=f00d"));
    assert!(received[0].contains("&signature="));
}
