//! API integration tests
//!
//! These run against a live server with a fresh database and the default
//! bootstrap account. Repository-level tests connect to the same database
//! through `DATABASE_URL`.

use libris_server::{
    config::{DatabaseConfig, DeletePolicy},
    models::{book::CreateBook, category::normalize_name, reader::CreateReader},
    repository::Repository,
    AppError,
};
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Short unique suffix so tests can rerun against the same database
fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

async fn create_category(client: &Client, token: &str) -> i64 {
    let response = client
        .post(format!("{}/categories", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": format!("shelf {}", unique()) }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No category id")
}

async fn create_book(client: &Client, token: &str, category_id: i64, copies: i32) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": format!("Book {}", unique()),
            "author": "Test Author",
            "ubno": format!("UB-{}", unique()),
            "category_id": category_id,
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book id")
}

/// Ten-digit phone number derived from a fresh UUID
fn unique_phone() -> String {
    let digits: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(8)
        .map(|b| char::from(b'0' + b % 10))
        .collect();
    format!("06{}", digits)
}

/// Returns (library_id, phone)
async fn create_reader(client: &Client, token: &str, membership: &str) -> (String, String) {
    let suffix = unique();
    let phone = unique_phone();
    let response = client
        .post(format!("{}/readers", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "name": format!("Reader {}", suffix),
            "phone": phone,
            "email": format!("reader-{}@example.org", suffix),
            "address": "1 rue des Livres",
            "membership": membership
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    (body["library_id"].as_str().expect("No library id").to_string(), phone)
}

async fn issue(client: &Client, token: &str, reader: &str, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "reader": reader, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn return_loan(client: &Client, token: &str, loan_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_staff_routes_require_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_last_copy_goes_to_one_reader() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 1).await;
    let (first, _) = create_reader(&client, &token, "BASIC").await;
    let (second, _) = create_reader(&client, &token, "BASIC").await;

    let response = issue(&client, &token, &first, book).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available_copies"], 0);
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");

    let response = issue(&client, &token, &second, book).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 5);

    let response = return_loan(&client, &token, loan_id).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available_copies"], 1);

    let response = issue(&client, &token, &second, book).await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_basic_reader_stops_at_three() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let (reader, _) = create_reader(&client, &token, "BASIC").await;

    for _ in 0..3 {
        let book = create_book(&client, &token, category, 2).await;
        let response = issue(&client, &token, &reader, book).await;
        assert_eq!(response.status(), 201);
    }

    let fourth = create_book(&client, &token, category, 2).await;
    let response = issue(&client, &token, &reader, fourth).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 7);

    // Upgrading lifts the limit
    let response = client
        .put(format!("{}/readers/{}/membership", BASE_URL, reader))
        .bearer_auth(&token)
        .json(&json!({ "membership": "PREMIUM" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["issue_limit"], 5);

    let response = issue(&client, &token, &reader, fourth).await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_same_book_twice_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 3).await;
    let (reader, _) = create_reader(&client, &token, "VIP").await;

    assert_eq!(issue(&client, &token, &reader, book).await.status(), 201);

    let response = issue(&client, &token, &reader, book).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 6);
}

#[tokio::test]
#[ignore]
async fn test_return_twice_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 1).await;
    let (reader, _) = create_reader(&client, &token, "BASIC").await;

    let body: Value = issue(&client, &token, &reader, book)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");

    assert_eq!(return_loan(&client, &token, loan_id).await.status(), 200);

    let response = return_loan(&client, &token, loan_id).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 8);

    // Stock did not grow past total
    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["available_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_issued_book_cannot_be_deleted() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 1).await;
    let (reader, _) = create_reader(&client, &token, "BASIC").await;

    let body: Value = issue(&client, &token, &reader, book)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    assert_eq!(return_loan(&client, &token, loan_id).await.status(), 200);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_reader_found_by_phone() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 1).await;
    let (library_id, phone) = create_reader(&client, &token, "BASIC").await;

    let body: Value = client
        .get(format!("{}/readers/{}", BASE_URL, phone))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["library_id"], library_id.as_str());

    // Issue by phone as well
    assert_eq!(issue(&client, &token, &phone, book).await.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_history_newest_first_and_active_readers() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let older = create_book(&client, &token, category, 1).await;
    let newer = create_book(&client, &token, category, 1).await;
    let (reader, _) = create_reader(&client, &token, "BASIC").await;

    let body: Value = issue(&client, &token, &reader, older)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let first_loan = body["loan"]["id"].as_i64().expect("No loan id");
    assert_eq!(return_loan(&client, &token, first_loan).await.status(), 200);
    assert_eq!(issue(&client, &token, &reader, newer).await.status(), 201);

    let body: Value = client
        .get(format!("{}/readers/{}/history", BASE_URL, reader))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let loans = body["loans"].as_array().expect("No loans");
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0]["book"]["id"], newer);
    assert_eq!(loans[1]["is_returned"], true);

    let body: Value = client
        .get(format!("{}/readers/{}/loans", BASE_URL, reader))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["loans"].as_array().map(Vec::len), Some(1));

    let body: Value = client
        .get(format!("{}/readers/active", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let entry = body
        .as_array()
        .expect("Not an array")
        .iter()
        .find(|r| r["library_id"] == reader.as_str())
        .expect("Reader not listed as active");
    assert_eq!(entry["active_loans"], 1);
}

#[tokio::test]
#[ignore]
async fn test_reader_with_loans_cannot_be_deleted() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 1).await;
    let (reader, _) = create_reader(&client, &token, "BASIC").await;

    assert_eq!(issue(&client, &token, &reader, book).await.status(), 201);

    let response = client
        .delete(format!("{}/readers/{}", BASE_URL, reader))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 9);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_issues_share_the_last_copy() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 1).await;
    let (first, _) = create_reader(&client, &token, "BASIC").await;
    let (second, _) = create_reader(&client, &token, "BASIC").await;

    let (a, b) = tokio::join!(
        issue(&client, &token, &first, book),
        issue(&client, &token, &second, book)
    );

    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![201, 409]);

    let refused = if a.status() == 409 { a } else { b };
    let body: Value = refused.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 5);

    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["available_copies"], 0);
}

#[tokio::test]
#[ignore]
async fn test_category_delete_blocked_while_issued_then_cascades() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 1).await;
    let (reader, _) = create_reader(&client, &token, "BASIC").await;

    let body: Value = issue(&client, &token, &reader, book)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");

    let response = client
        .delete(format!("{}/categories/{}", BASE_URL, category))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 9);

    assert_eq!(return_loan(&client, &token, loan_id).await.status(), 200);

    // Default policy cascades to the books and their returned loans
    let response = client
        .delete(format!("{}/categories/{}", BASE_URL, category))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!("{}/loans/{}", BASE_URL, loan_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

/// Repository over the same database the server uses
async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DatabaseConfig::default().url);
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    Repository::new(pool)
}

async fn seed_book(repo: &Repository, copies: i32) -> (i32, i32) {
    let category = repo
        .categories
        .create(&normalize_name(&format!("shelf {}", unique())))
        .await
        .expect("Failed to create category");
    let book = repo
        .books
        .create(&CreateBook {
            title: format!("Book {}", unique()),
            author: "Test Author".into(),
            ubno: format!("UB-{}", unique()),
            category_id: category.id,
            total_copies: copies,
        })
        .await
        .expect("Failed to create book");
    (category.id, book.id)
}

async fn seed_reader(repo: &Repository) -> Uuid {
    let suffix = unique();
    repo.readers
        .create(&CreateReader {
            name: format!("Reader {}", suffix),
            phone: unique_phone(),
            email: format!("reader-{}@example.org", suffix),
            address: "1 rue des Livres".into(),
            membership: None,
        })
        .await
        .expect("Failed to create reader")
        .library_id
}

#[tokio::test]
#[ignore]
async fn test_restrict_policy_keeps_category_with_books() {
    let repo = repository().await;
    let (category, book) = seed_book(&repo, 2).await;

    let result = repo.categories.delete(category, DeletePolicy::Restrict).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(repo.books.get_by_id(book).await.is_ok());

    let removed = repo
        .categories
        .delete(category, DeletePolicy::Cascade)
        .await
        .expect("Cascade delete failed");
    assert_eq!(removed, 1);
    assert!(matches!(repo.books.get_by_id(book).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_restrict_policy_keeps_reader_with_history() {
    let repo = repository().await;
    let (_, book) = seed_book(&repo, 1).await;
    let reader = seed_reader(&repo).await;

    let (loan, _) = repo.loans.issue(reader, book).await.expect("Issue failed");
    repo.loans.return_loan(loan.id).await.expect("Return failed");

    let result = repo.readers.delete(reader, DeletePolicy::Restrict).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let removed = repo
        .readers
        .delete(reader, DeletePolicy::Cascade)
        .await
        .expect("Cascade delete failed");
    assert_eq!(removed, 1);
    assert!(matches!(repo.loans.get_by_id(loan.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_concurrent_repository_issues_leave_one_winner() {
    let repo = repository().await;
    let (_, book) = seed_book(&repo, 1).await;
    let first = seed_reader(&repo).await;
    let second = seed_reader(&repo).await;

    let (a, b) = tokio::join!(repo.loans.issue(first, book), repo.loans.issue(second, book));

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(r, Err(AppError::OutOfStock))));

    let stored = repo.books.get_by_id(book).await.expect("Book missing");
    assert_eq!(stored.available_copies, 0);
}

#[tokio::test]
#[ignore]
async fn test_book_update_recomputes_available_copies() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, 2).await;
    let (reader, _) = create_reader(&client, &token, "BASIC").await;
    assert_eq!(issue(&client, &token, &reader, book).await.status(), 201);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .json(&json!({ "total_copies": 3, "title": "  Renamed  " }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total_copies"], 3);
    assert_eq!(body["available_copies"], 2);
    assert_eq!(body["title"], "Renamed");

    // Fewer copies than are out on loan
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .json(&json!({ "total_copies": 0 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Blank title
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book))
        .bearer_auth(&token)
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}
