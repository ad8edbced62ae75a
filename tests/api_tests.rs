//! API integration tests
//!
//! These run against a live server with a migrated database:
//! cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_email(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@example.com", prefix, nanos)
}

/// Register a fresh member account and return (token, user id, email)
async fn register_and_login(client: &Client, prefix: &str) -> (String, i64, String) {
    let email = unique_email(prefix);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "testpass123"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse register response");
    let user_id = body["id"].as_i64().expect("No user id in response");

    let response = client
        .post(format!("{}/auth/token", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "testpass123"
        }))
        .send()
        .await
        .expect("Failed to send token request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse token response");
    let token = body["token"].as_str().expect("No token in response").to_string();

    (token, user_id, email)
}

/// Get a staff token. Requires a seeded staff account (staff@example.com /
/// staffpass123 with is_staff = TRUE) in the test database.
async fn get_staff_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/token", BASE_URL))
        .json(&json!({
            "email": "staff@example.com",
            "password": "staffpass123"
        }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), 200, "seed the staff account first");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_book(client: &Client, staff_token: &str, inventory: i64) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff_token))
        .json(&json!({
            "title": "Test Book",
            "author": "Test Author",
            "cover": "HARD",
            "inventory": inventory,
            "daily_fee": "10.50"
        }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_i64().expect("No book id")
}

async fn get_inventory(client: &Client, token: &str, book_id: i64) -> i64 {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send get book request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["inventory"].as_i64().expect("No inventory")
}

async fn borrow(client: &Client, token: &str, book_id: i64, days_ahead: i64) -> reqwest::Response {
    let date = date_in_days(days_ahead);
    client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_id": book_id,
            "expected_return_date": date
        }))
        .send()
        .await
        .expect("Failed to send borrow request")
}

/// ISO date `days_ahead` days from today
fn date_in_days(days_ahead: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days_ahead))
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
#[ignore]
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
async fn test_register_never_echoes_password() {
    let client = Client::new();
    let email = unique_email("register");

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "testpass123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], email.as_str());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_short_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": unique_email("shortpass"),
            "password": "1234"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["field"], "password");
}

#[tokio::test]
#[ignore]
async fn test_token_bad_credentials() {
    let client = Client::new();
    let (_token, _id, email) = register_and_login(&client, "badcred").await;

    let response = client
        .post(format!("{}/auth/token", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "wrongpass"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
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
async fn test_member_cannot_create_book() {
    let client = Client::new();
    let (token, _id, _email) = register_and_login(&client, "member").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "New Book",
            "author": "New Author",
            "cover": "SOFT",
            "inventory": 5,
            "daily_fee": "7.00"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_borrow_decreases_inventory_and_sets_borrow_date() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token, user_id, _email) = register_and_login(&client, "borrower").await;
    let book_id = create_book(&client, &staff_token, 2).await;

    let response = borrow(&client, &token, book_id, 3).await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["book_id"].as_i64(), Some(book_id));
    assert_eq!(body["user_id"].as_i64(), Some(user_id));
    assert_eq!(body["borrow_date"].as_str(), Some(date_in_days(0).as_str()));
    assert!(body["actual_return_date"].is_null());

    assert_eq!(get_inventory(&client, &token, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_borrow_expected_return_date_must_be_future() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token, _user_id, _email) = register_and_login(&client, "pastdate").await;
    let book_id = create_book(&client, &staff_token, 2).await;

    let response = borrow(&client, &token, book_id, 0).await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["field"], "expected_return_date");

    // No record created, inventory untouched
    assert_eq!(get_inventory(&client, &token, book_id).await, 2);
}

#[tokio::test]
#[ignore]
async fn test_borrow_out_of_stock() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token, _user_id, _email) = register_and_login(&client, "outofstock").await;
    let book_id = create_book(&client, &staff_token, 0).await;

    let response = borrow(&client, &token, book_id, 2).await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["field"], "book_id");

    assert_eq!(get_inventory(&client, &token, book_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_member_sees_only_own_borrowings() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token1, user1_id, _email1) = register_and_login(&client, "owner1").await;
    let (token2, _user2_id, _email2) = register_and_login(&client, "owner2").await;
    let book_id = create_book(&client, &staff_token, 5).await;

    assert_eq!(borrow(&client, &token1, book_id, 3).await.status(), 201);
    assert_eq!(borrow(&client, &token2, book_id, 3).await.status(), 201);

    let response = client
        .get(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token1))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    let items = body.as_array().expect("Expected array");
    assert!(!items.is_empty());
    for item in items {
        assert_eq!(item["user_id"].as_i64(), Some(user1_id));
    }
}

#[tokio::test]
#[ignore]
async fn test_member_user_id_filter_is_ignored() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token1, user1_id, _email1) = register_and_login(&client, "filter1").await;
    let (token2, user2_id, _email2) = register_and_login(&client, "filter2").await;
    let book_id = create_book(&client, &staff_token, 5).await;

    assert_eq!(borrow(&client, &token1, book_id, 3).await.status(), 201);
    assert_eq!(borrow(&client, &token2, book_id, 3).await.status(), 201);

    // user1 asks for user2's borrowings; still gets only their own
    let response = client
        .get(format!("{}/borrowings?user_id={}", BASE_URL, user2_id))
        .header("Authorization", format!("Bearer {}", token1))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    for item in body.as_array().expect("Expected array") {
        assert_eq!(item["user_id"].as_i64(), Some(user1_id));
    }
}

#[tokio::test]
#[ignore]
async fn test_staff_sees_all_and_can_filter_by_user_id() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token1, user1_id, _email1) = register_and_login(&client, "staffview1").await;
    let (token2, user2_id, _email2) = register_and_login(&client, "staffview2").await;
    let book_id = create_book(&client, &staff_token, 5).await;

    assert_eq!(borrow(&client, &token1, book_id, 3).await.status(), 201);
    assert_eq!(borrow(&client, &token2, book_id, 3).await.status(), 201);

    let response = client
        .get(format!("{}/borrowings?user_id={}", BASE_URL, user1_id))
        .header("Authorization", format!("Bearer {}", staff_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    let items = body.as_array().expect("Expected array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["user_id"].as_i64(), Some(user1_id));

    // Unfiltered list includes both users' borrowings
    let response = client
        .get(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", staff_token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let user_ids: Vec<i64> = body
        .as_array()
        .expect("Expected array")
        .iter()
        .filter_map(|item| item["user_id"].as_i64())
        .collect();
    assert!(user_ids.contains(&user1_id));
    assert!(user_ids.contains(&user2_id));
}

#[tokio::test]
#[ignore]
async fn test_is_active_filter_tri_state() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token, user_id, _email) = register_and_login(&client, "active").await;
    let book_id = create_book(&client, &staff_token, 5).await;

    let response = borrow(&client, &token, book_id, 3).await;
    let active_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = borrow(&client, &token, book_id, 3).await;
    let returned_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/borrowings/{}/return", BASE_URL, returned_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    let list = |filter: &'static str| {
        let client = client.clone();
        let token = token.clone();
        async move {
            let url = if filter.is_empty() {
                format!("{}/borrowings?user_id={}", BASE_URL, user_id)
            } else {
                format!("{}/borrowings?user_id={}&is_active={}", BASE_URL, user_id, filter)
            };
            let body: Value = client
                .get(url)
                .header("Authorization", format!("Bearer {}", token))
                .send()
                .await
                .expect("Failed to send list request")
                .json()
                .await
                .expect("Failed to parse list response");
            body.as_array()
                .expect("Expected array")
                .iter()
                .filter_map(|item| item["id"].as_i64())
                .collect::<Vec<_>>()
        }
    };

    let active_ids = list("true").await;
    assert!(active_ids.contains(&active_id));
    assert!(!active_ids.contains(&returned_id));

    let returned_ids = list("FALSE").await;
    assert!(returned_ids.contains(&returned_id));
    assert!(!returned_ids.contains(&active_id));

    // Garbage token means no filtering
    let all_ids = list("maybe").await;
    assert!(all_ids.contains(&active_id));
    assert!(all_ids.contains(&returned_id));
}

#[tokio::test]
#[ignore]
async fn test_borrowing_detail_embeds_book_and_user() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token, _user_id, email) = register_and_login(&client, "detail").await;
    let book_id = create_book(&client, &staff_token, 5).await;

    let response = borrow(&client, &token, book_id, 3).await;
    let borrowing_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book_title"], "Test Book");
    assert_eq!(body["book_daily_fee"], "10.50");
    assert_eq!(body["user_email"], email.as_str());
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_see_others_borrowing_detail() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token1, _user1_id, _email1) = register_and_login(&client, "hidden1").await;
    let (token2, _user2_id, _email2) = register_and_login(&client, "hidden2").await;
    let book_id = create_book(&client, &staff_token, 5).await;

    let response = borrow(&client, &token1, book_id, 3).await;
    let borrowing_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Indistinguishable from a missing id
    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token2))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_return_restores_inventory_and_is_idempotent_conflict() {
    let client = Client::new();
    let staff_token = get_staff_token(&client).await;
    let (token, _user_id, _email) = register_and_login(&client, "returner").await;
    let book_id = create_book(&client, &staff_token, 1).await;

    let response = borrow(&client, &token, book_id, 3).await;
    let borrowing_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();
    assert_eq!(get_inventory(&client, &token, book_id).await, 0);

    let response = client
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["actual_return_date"].as_str(), Some(date_in_days(0).as_str()));

    assert_eq!(get_inventory(&client, &token, book_id).await, 1);

    // A second return must not increment again
    let response = client
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowing_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 409);

    assert_eq!(get_inventory(&client, &token, book_id).await, 1);
}
