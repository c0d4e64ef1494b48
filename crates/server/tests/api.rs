use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    server::router(engine)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn seed_widget(app: &Router, stock: i64) {
    let (status, _) = send(
        app,
        "POST",
        "/products",
        Some(json!({
            "name": "Widget",
            "product_code": "WID-001",
            "selling_price": 10,
            "initial_stock": stock,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn alice_invoice(quantity: i64, amount: i64) -> Value {
    json!({
        "name": "Alice",
        "email": "alice@example.com",
        "phone": "555-0101",
        "items": [{ "product": "Widget", "quantity": quantity }],
        "amount": amount,
    })
}

#[tokio::test]
async fn health_is_ok() {
    let app = app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_invoice_returns_201_with_totals() {
    let app = app().await;
    seed_widget(&app, 5).await;

    let (status, body) = send(&app, "POST", "/invoices/create", Some(alice_invoice(2, 15))).await;
    assert_eq!(status, StatusCode::CREATED);
    let invoice = &body["invoice"];
    assert_eq!(invoice["number"], "INV-000001");
    assert_eq!(invoice["subtotal"], 20);
    assert_eq!(invoice["balance_due"], 5);
    assert_eq!(invoice["status"], "partially_paid");
    assert_eq!(invoice["customer_email"], "alice@example.com");

    let (status, body) = send(&app, "GET", "/stock/Widget", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 3);

    let (status, body) = send(&app, "GET", "/invoices/number/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice"]["amount_paid"], 15);
}

#[tokio::test]
async fn insufficient_stock_is_a_400_with_message() {
    let app = app().await;
    seed_widget(&app, 1).await;

    let (status, body) = send(&app, "POST", "/invoices/create", Some(alice_invoice(2, 0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient stock for Widget. Available: 1");
}

#[tokio::test]
async fn out_of_range_discount_is_rejected() {
    let app = app().await;
    seed_widget(&app, 5).await;

    let mut body = alice_invoice(1, 0);
    body["discount"] = json!(120);
    let (status, body) = send(&app, "POST", "/invoices/create", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Discount must be between 0 and 100.");
}

#[tokio::test]
async fn unknown_invoice_is_404() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "GET",
        "/invoices/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invoice not found");
}

#[tokio::test]
async fn payment_return_and_statement_flow() {
    let app = app().await;
    seed_widget(&app, 5).await;
    let (_, created) = send(&app, "POST", "/invoices/create", Some(alice_invoice(2, 0))).await;
    let invoice_id = created["invoice"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/pay/add",
        Some(json!({ "name": "Alice", "amount": 5, "invoice_number": 1, "method": "bank_transfer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["payments"][0]["amount"], 5);
    assert_eq!(body["payments"][0]["method"], "bank_transfer");

    let (status, body) = send(
        &app,
        "POST",
        "/return/add",
        Some(json!({
            "invoice_id": invoice_id,
            "product_name": "Widget",
            "name": "Alice",
            "quantity": 1,
            "reason": "broken",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["return"]["refund_amount"], 10);
    let return_id = body["return"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/customers/Alice/statement", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], -5);
    assert_eq!(body["customer"]["outstanding_balance"], 5);

    let (status, body) = send(&app, "POST", &format!("/return/{return_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["return"]["cancelled_at"].is_string());

    let (status, body) = send(&app, "GET", "/customers/Alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer"]["outstanding_balance"], 15);
}

#[tokio::test]
async fn return_needs_exactly_one_invoice_reference() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/return/add",
        Some(json!({ "product_name": "Widget", "name": "Alice", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "either invoice_number or invoice_id is required");
}

#[tokio::test]
async fn update_status_and_delete() {
    let app = app().await;
    seed_widget(&app, 5).await;
    let (_, created) = send(&app, "POST", "/invoices/create", Some(alice_invoice(3, 0))).await;
    let id = created["invoice"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/invoices/{id}/status"),
        Some(json!({ "status": "paid", "payment_amount": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice"]["status"], "paid");
    assert_eq!(body["invoice"]["balance_due"], 0);

    let (status, body) = send(&app, "DELETE", &format!("/invoices/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invoice deleted");

    let (_, body) = send(&app, "GET", "/stock/Widget", None).await;
    assert_eq!(body["quantity"], 5);

    let (status, body) = send(&app, "GET", "/invoices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["invoices"].as_array().unwrap().is_empty());
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn patch_rewrites_the_invoice() {
    let app = app().await;
    seed_widget(&app, 5).await;
    let (_, created) = send(&app, "POST", "/invoices/create", Some(alice_invoice(1, 0))).await;
    let id = created["invoice"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/invoices/{id}"),
        Some(alice_invoice(4, 10)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice"]["subtotal"], 40);
    assert_eq!(body["invoice"]["balance_due"], 30);

    let (_, body) = send(&app, "GET", "/sales", None).await;
    assert_eq!(body["sales"][0]["count"], 4);
    assert_eq!(body["sales"][0]["product_name"], "Widget");
}

#[tokio::test]
async fn malformed_bodies_are_400_with_a_json_message() {
    let app = app().await;
    seed_widget(&app, 5).await;

    let mut fractional = alice_invoice(1, 0);
    fractional["items"][0]["quantity"] = json!(1.5);
    let (status, body) = send(&app, "POST", "/invoices/create", Some(fractional)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Failed to deserialize the JSON body"), "{message}");

    let (status, body) = send(
        &app,
        "POST",
        "/invoices/create",
        Some(json!({ "name": "Alice", "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("items"));

    let (status, body) = send(
        &app,
        "POST",
        "/pay/add",
        Some(json!({ "name": "Alice", "amount": 2.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (_, body) = send(&app, "GET", "/stock/Widget", None).await;
    assert_eq!(body["quantity"], 5);
}

#[tokio::test]
async fn malformed_paths_and_queries_are_400_with_a_json_message() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/invoices/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send(&app, "GET", "/invoices?limit=many", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn client_timestamps_are_ignored() {
    let app = app().await;
    seed_widget(&app, 5).await;

    let mut body = alice_invoice(1, 0);
    body["issued_at"] = json!("2001-01-01T00:00:00Z");
    let (status, body) = send(&app, "POST", "/invoices/create", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invoice"]["status"], "unpaid");
    assert!(!body["invoice"]["issue_date"].as_str().unwrap().starts_with("2001"));
}
