//! Subscription trial integration tests for usage-service.

mod common;

use common::TestApp;
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn starting_a_trial_creates_a_trialing_subscription() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    let response = client
        .post(&format!("{}/subscriptions/trial", app.address))
        .json(&json!({ "user_id": user_id, "plan_id": "starter" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["plan_id"], "starter");
    assert_eq!(body["status"], "trialing");
    assert!(body["trial_end"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn a_second_trial_replaces_the_subscription() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    for plan_id in ["starter", "pro"] {
        let response = client
            .post(&format!("{}/subscriptions/trial", app.address))
            .json(&json!({ "user_id": user_id, "plan_id": plan_id }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 201);
    }

    let subscription = app
        .db
        .get_subscription(user_id)
        .await
        .expect("Failed to read subscription")
        .expect("Subscription row missing");
    assert_eq!(subscription.plan_id, "pro");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_plan_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(&format!("{}/subscriptions/trial", app.address))
        .json(&json!({ "user_id": Uuid::new_v4(), "plan_id": "platinum" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);

    app.cleanup().await;
}
