//! Quota tracking integration tests for usage-service.

mod common;

use chrono::Utc;
use common::TestApp;
use reqwest::Client;
use serde_json::json;
use usage_service::services::quota::current_period;
use uuid::Uuid;

async fn check(client: &Client, address: &str, user_id: Uuid, usage_type: &str) -> serde_json::Value {
    let response = client
        .get(&format!("{}/quota/{}/{}", address, user_id, usage_type))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
    response.json().await.expect("Failed to parse JSON")
}

async fn increment(client: &Client, address: &str, user_id: Uuid, usage_type: &str, amount: i32) {
    let response = client
        .post(&format!(
            "{}/quota/{}/{}/increment",
            address, user_id, usage_type
        ))
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unknown_user_defaults_to_free_plan() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let body = check(&client, &app.address, Uuid::new_v4(), "listing").await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["remaining"], 5);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["plan_name"], "Free");

    app.cleanup().await;
}

#[tokio::test]
async fn increments_exhaust_the_allowance() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    increment(&client, &app.address, user_id, "listing", 4).await;
    let body = check(&client, &app.address, user_id, "listing").await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["remaining"], 1);

    increment(&client, &app.address, user_id, "listing", 1).await;
    let body = check(&client, &app.address, user_id, "listing").await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["remaining"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn usage_types_are_counted_independently() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    increment(&client, &app.address, user_id, "listing", 5).await;

    let body = check(&client, &app.address, user_id, "video").await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["remaining"], 2);

    app.cleanup().await;
}

#[tokio::test]
async fn unlimited_plan_is_never_denied() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    let response = client
        .post(&format!("{}/subscriptions/trial", app.address))
        .json(&json!({ "user_id": user_id, "plan_id": "pro" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    increment(&client, &app.address, user_id, "listing", 1000).await;

    let body = check(&client, &app.address, user_id, "listing").await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["remaining"], -1);
    assert_eq!(body["limit"], -1);
    assert_eq!(body["plan_name"], "Pro");

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_increments_are_lossless() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    let futures: Vec<_> = (0..20)
        .map(|_| {
            let client = client.clone();
            let url = format!("{}/quota/{}/listing/increment", app.address, user_id);
            async move {
                client
                    .post(&url)
                    .json(&json!({ "amount": 1 }))
                    .send()
                    .await
                    .expect("Failed to execute request")
                    .status()
            }
        })
        .collect();

    for status in futures::future::join_all(futures).await {
        assert_eq!(status, 200);
    }

    let quota = app
        .db
        .get_quota(user_id, &current_period(Utc::now()))
        .await
        .expect("Failed to read quota")
        .expect("Quota row missing");
    assert_eq!(quota.listings_used, 20);
    assert_eq!(quota.videos_used, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn invalid_usage_type_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/quota/{}/widget", app.address, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn zero_increment_fails_validation() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(&format!(
            "{}/quota/{}/listing/increment",
            app.address,
            Uuid::new_v4()
        ))
        .json(&json!({ "amount": 0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 422);

    app.cleanup().await;
}
