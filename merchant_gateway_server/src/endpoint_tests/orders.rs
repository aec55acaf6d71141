use actix_web::{http::StatusCode, test::TestRequest};
use merchant_gateway_engine::{helpers::sign, test_utils::fakes::MemoryOrderStore};
use mpg_common::Secret;
use serde_json::json;

use super::helpers::{json_body, send_request, test_api, TestApi, SECRET};

fn signature_for(id: &str) -> String {
    sign(id, &Secret::from(SECRET))
}

fn orders(api: &TestApi) -> &MemoryOrderStore {
    api.orders()
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let (status, body) = send_request(&api, TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn create_order_on_open_gateway_with_json() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let req = TestRequest::post().uri("/gateways/2/orders").set_json(json!({ "amount": 1500, "data": "cart=5" }));
    let (status, body) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = json_body(&body);
    assert_eq!(order["id"], "2-0");
    assert_eq!(order["gateway_id"], 2);
    assert_eq!(order["amount"], 1500);
    assert_eq!(order["keychain_id"], 0);
    assert_eq!(order["status"], "new");
    assert_eq!(order["data"], "cart=5");

    let req = TestRequest::post().uri("/gateways/2/orders").set_json(json!({ "amount": 10 }));
    let (status, body) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["keychain_id"], 1);
}

#[actix_web::test]
async fn create_signed_order_with_form() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let signature = signature_for("order-1");
    let form = [("amount", "2500"), ("id", "order-1"), ("signature", signature.as_str())];
    let (status, body) = send_request(&api, TestRequest::post().uri("/gateways/1/orders").set_form(form)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = json_body(&body);
    assert_eq!(order["id"], "order-1");
    assert_eq!(order["amount"], 2500);
    assert_eq!(orders(&api).len(), 1);
}

#[actix_web::test]
async fn missing_order_id_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let req = TestRequest::post()
        .uri("/gateways/1/orders")
        .set_json(json!({ "amount": 100, "signature": signature_for("order-1") }));
    let (status, body) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "The order id is missing or empty");
    assert!(orders(&api).factory_calls().is_empty());
}

#[actix_web::test]
async fn bad_signature_is_forbidden_and_allocates_nothing() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let req = TestRequest::post()
        .uri("/gateways/1/orders")
        .set_json(json!({ "amount": 100, "id": "order-1", "signature": "invalid" }));
    let (status, body) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json_body(&body)["error"], "The order signature is invalid");
    assert!(orders(&api).is_empty());

    let req = TestRequest::post()
        .uri("/gateways/1/orders")
        .set_json(json!({ "amount": 100, "id": "order-1", "signature": signature_for("order-1") }));
    let (status, body) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["keychain_id"], 0);
}

#[actix_web::test]
async fn negative_amounts_are_rejected() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let req = TestRequest::post().uri("/gateways/2/orders").set_json(json!({ "amount": -5 }));
    let (status, _) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(orders(&api).is_empty());
}

#[actix_web::test]
async fn unknown_gateway_is_not_found() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let req = TestRequest::post().uri("/gateways/9/orders").set_json(json!({ "amount": 100 }));
    let (status, body) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["error"], "Gateway 9 does not exist");
}

#[actix_web::test]
async fn fetch_order_by_id() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let req = TestRequest::post().uri("/gateways/2/orders").set_json(json!({ "amount": 700, "id": "abc" }));
    let (status, _) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_request(&api, TestRequest::get().uri("/gateways/2/orders/abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["amount"], 700);

    let (status, _) = send_request(&api, TestRequest::get().uri("/gateways/2/orders/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_request(&api, TestRequest::get().uri("/gateways/1/orders/abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn report_status_change() {
    let _ = env_logger::try_init().ok();
    let dir = tempfile::tempdir().unwrap();
    let api = test_api(dir.path());
    let req = TestRequest::post().uri("/gateways/2/orders").set_json(json!({ "amount": 700, "id": "abc" }));
    send_request(&api, req).await;

    let req = TestRequest::post()
        .uri("/gateways/2/orders/abc/status")
        .set_form([("status", "paid"), ("tid", "f00dcafe")]);
    let (status, body) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = json_body(&body);
    assert_eq!(order["status"], "paid");
    assert_eq!(order["tid"], "f00dcafe");

    let req = TestRequest::post().uri("/gateways/2/orders/abc/status").set_json(json!({ "status": "bogus" }));
    let (status, _) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/gateways/2/orders/missing/status").set_json(json!({ "status": "paid" }));
    let (status, _) = send_request(&api, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
