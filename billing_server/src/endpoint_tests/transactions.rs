use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use billing_common::Money;
use billing_engine::{
    db_types::{Invoice, InvoiceStatus, Transaction, TransactionStatus, TransactionView},
    events::EventProducers,
    TransactionApi,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;

use super::{
    helpers::{issue_token, send_request},
    mocks::MockDatabase,
};
use crate::{
    auth::JwtClaims,
    data_objects::{CreateTransactionRequest, UpdateStatusRequest},
    routes::{CreateTransactionRoute, TransactionByIdRoute, TransactionHistoryRoute, UpdateTransactionStatusRoute},
};

fn user_token(user_id: i64) -> String {
    issue_token(JwtClaims { user_id, is_staff: false })
}

fn staff_token() -> String {
    issue_token(JwtClaims { user_id: 99, is_staff: true })
}

fn body_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}

fn invoice(id: i64, user_id: i64, cents: i64) -> Invoice {
    Invoice {
        id,
        user_id,
        total_amount: Money::from_cents(cents),
        status: InvoiceStatus::Pending,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

fn transaction(id: i64, invoice_id: i64, cents: i64, status: TransactionStatus) -> Transaction {
    Transaction {
        id,
        invoice_id,
        amount: Money::from_cents(cents),
        status,
        created_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap(),
    }
}

fn view(id: i64, invoice_id: i64, cents: i64, status: TransactionStatus) -> TransactionView {
    TransactionView::from_parts(&transaction(id, invoice_id, cents, status), &invoice(invoice_id, 1, cents))
}

fn register(cfg: &mut ServiceConfig, db: MockDatabase) {
    let api = TransactionApi::new(db, EventProducers::default());
    cfg.service(CreateTransactionRoute::<MockDatabase>::new())
        .service(TransactionHistoryRoute::<MockDatabase>::new())
        .service(TransactionByIdRoute::<MockDatabase>::new())
        .service(UpdateTransactionStatusRoute::<MockDatabase>::new())
        .app_data(web::Data::new(api));
}

//---------------------------------------  Create  -------------------------------------------------

fn configure_create(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_invoice().returning(|id| Ok(Some(invoice(id, 1, 3000))));
    db.expect_insert_transaction()
        .returning(|invoice_id, amount| Ok(transaction(1, invoice_id, amount.cents(), TransactionStatus::Pending)));
    register(cfg, db);
}

#[actix_web::test]
async fn create_transaction_success() {
    let _ = env_logger::try_init();
    let req = TestRequest::post().uri("/transactions").set_json(CreateTransactionRequest { invoice_id: 10 });
    let (status, body) = send_request(req, &user_token(1), configure_create).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = body_json(&body);
    assert_eq!(body["message"], "Transaction registered successfully.");
    assert_eq!(body["result"]["invoice_id"], 10);
    assert_eq!(body["result"]["invoice_status"], "PENDING");
    assert_eq!(body["result"]["amount"], "30.00");
    assert_eq!(body["result"]["status"], "PENDING");
}

#[actix_web::test]
async fn a_malformed_body_renders_the_envelope() {
    let _ = env_logger::try_init();
    // No invoice_id, so Json extraction fails before the handler runs
    let req = TestRequest::post().uri("/transactions").set_json(serde_json::json!({}));
    let (status, body) = send_request(req, &user_token(1), |cfg| register(cfg, MockDatabase::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body_json(&body);
    assert_eq!(body["message"], "Validation error.");
    let detail = body["result"]["body"][0].as_str().expect("detail should be a string");
    assert!(detail.contains("invoice_id"), "detail should name the missing field: {detail}");
}

#[actix_web::test]
async fn a_non_json_body_renders_the_envelope() {
    let _ = env_logger::try_init();
    let req = TestRequest::post()
        .uri("/transactions")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("not json at all");
    let (status, body) = send_request(req, &user_token(1), |cfg| register(cfg, MockDatabase::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body_json(&body);
    assert_eq!(body["message"], "Validation error.");
}

#[actix_web::test]
async fn create_transaction_requires_a_token() {
    let _ = env_logger::try_init();
    let req = TestRequest::post().uri("/transactions").set_json(CreateTransactionRequest { invoice_id: 10 });
    let (status, body) = send_request(req, "", configure_create).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = body_json(&body);
    assert_eq!(body["message"], "Authentication Error. No authentication token was provided.");
}

#[actix_web::test]
async fn create_transaction_rejects_a_tampered_token() {
    let _ = env_logger::try_init();
    let mut token = user_token(1);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let req = TestRequest::post().uri("/transactions").set_json(CreateTransactionRequest { invoice_id: 10 });
    let (status, _) = send_request(req, &token, configure_create).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_transaction_for_anothers_invoice_is_forbidden() {
    let _ = env_logger::try_init();
    let req = TestRequest::post().uri("/transactions").set_json(CreateTransactionRequest { invoice_id: 10 });
    // The invoice belongs to user 1
    let (status, body) = send_request(req, &user_token(2), configure_create).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body = body_json(&body);
    assert_eq!(body["message"], "You may only create transactions for your own invoices.");
}

#[actix_web::test]
async fn create_transaction_for_a_missing_invoice_is_not_found() {
    let _ = env_logger::try_init();
    let req = TestRequest::post().uri("/transactions").set_json(CreateTransactionRequest { invoice_id: 42 });
    let (status, body) = send_request(req, &user_token(1), |cfg| {
        let mut db = MockDatabase::new();
        db.expect_fetch_invoice().returning(|_| Ok(None));
        register(cfg, db);
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = body_json(&body);
    assert_eq!(body["message"], "Invoice #42 not found.");
}

//---------------------------------------  History  ------------------------------------------------

fn configure_history(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_history_for_user()
        .returning(|_| Ok(vec![view(1, 10, 3000, TransactionStatus::Completed)]));
    db.expect_full_history().returning(|| {
        Ok(vec![
            view(1, 10, 3000, TransactionStatus::Completed),
            view(2, 11, 1500, TransactionStatus::Pending),
        ])
    });
    register(cfg, db);
}

#[actix_web::test]
async fn users_see_only_their_own_history() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/transactions");
    let (status, body) = send_request(req, &user_token(1), configure_history).await;
    assert_eq!(status, StatusCode::OK);
    let body = body_json(&body);
    assert_eq!(body["message"], "Transaction history retrieved successfully.");
    assert_eq!(body["result"].as_array().unwrap().len(), 1);
    assert_eq!(body["result"][0]["amount"], "30.00");
}

#[actix_web::test]
async fn staff_see_the_full_history() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/transactions");
    let (status, body) = send_request(req, &staff_token(), configure_history).await;
    assert_eq!(status, StatusCode::OK);
    let body = body_json(&body);
    assert_eq!(body["result"].as_array().unwrap().len(), 2);
}

//---------------------------------------  Fetch by id  --------------------------------------------

#[actix_web::test]
async fn fetch_a_missing_transaction_is_not_found() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/transactions/7");
    let (status, body) = send_request(req, &user_token(1), |cfg| {
        let mut db = MockDatabase::new();
        db.expect_fetch_transaction().returning(|_| Ok(None));
        register(cfg, db);
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = body_json(&body);
    assert_eq!(body["message"], "Transaction not found.");
}

//---------------------------------------  Status updates  -----------------------------------------

#[actix_web::test]
async fn an_unknown_status_is_a_validation_error() {
    let _ = env_logger::try_init();
    let req = TestRequest::patch()
        .uri("/transactions/1/status")
        .set_json(UpdateStatusRequest { status: "PAID".to_string() });
    let (status, body) = send_request(req, &user_token(1), |cfg| register(cfg, MockDatabase::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body_json(&body);
    assert_eq!(body["message"], "Validation error.");
    assert_eq!(body["result"]["status"][0], "\"PAID\" is not a valid choice.");
}

fn configure_terminal_update(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_transaction()
        .returning(|id| Ok(Some(transaction(id, 10, 1000, TransactionStatus::Completed))));
    db.expect_fetch_invoice().returning(|id| Ok(Some(invoice(id, 1, 1000))));
    db.expect_checked_status_update().returning(|_, _| Ok(None));
    register(cfg, db);
}

#[actix_web::test]
async fn a_terminal_transaction_cannot_change_status() {
    let _ = env_logger::try_init();
    let req = TestRequest::patch()
        .uri("/transactions/1/status")
        .set_json(UpdateStatusRequest { status: "FAILED".to_string() });
    let (status, body) = send_request(req, &user_token(1), configure_terminal_update).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body_json(&body);
    assert_eq!(body["message"], "Validation error.");
    assert_eq!(body["result"]["status"][0], "Status cannot be changed once COMPLETED or FAILED.");
}

fn configure_successful_update(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_transaction()
        .returning(|id| Ok(Some(transaction(id, 10, 1000, TransactionStatus::Pending))));
    db.expect_fetch_invoice().returning(|id| Ok(Some(invoice(id, 1, 1000))));
    db.expect_checked_status_update()
        .returning(|id, new_status| Ok(Some(transaction(id, 10, 1000, new_status))));
    register(cfg, db);
}

#[actix_web::test]
async fn a_pending_transaction_can_be_completed() {
    let _ = env_logger::try_init();
    let req = TestRequest::patch()
        .uri("/transactions/1/status")
        .set_json(UpdateStatusRequest { status: "COMPLETED".to_string() });
    let (status, body) = send_request(req, &user_token(1), configure_successful_update).await;
    assert_eq!(status, StatusCode::OK);
    let body = body_json(&body);
    assert_eq!(body["message"], "Transaction status updated successfully.");
    assert_eq!(body["result"]["status"], "COMPLETED");
}
