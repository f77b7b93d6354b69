//! Plan recommendation integration tests for usage-service.

mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use reqwest::Client;
use serde_json::json;
use usage_service::services::quota::current_period;
use uuid::Uuid;

async fn start_trial(client: &Client, address: &str, user_id: Uuid, plan_id: &str) {
    let response = client
        .post(&format!("{}/subscriptions/trial", address))
        .json(&json!({ "user_id": user_id, "plan_id": plan_id }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
}

async fn record_listing(client: &Client, address: &str, user_id: Uuid, hours_ago: i64) {
    let response = client
        .post(&format!("{}/usage", address))
        .json(&json!({
            "service": "text-generation",
            "model": "textgen-standard-v1",
            "operation": "generate_listing",
            "input_units": 1000,
            "output_units": 500,
            "success": true,
            "user_id": user_id,
            "session_id": "rec-test",
            "recorded_at": Utc::now() - Duration::hours(hours_ago)
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn user_without_subscription_gets_unavailable_response() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/recommendations/{}", app.address, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["available"], false);
    assert!(body.get("plan_recommendation").is_none());
    assert!(body.get("usage_projection").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn heavy_usage_near_the_limit_is_high_urgency() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    start_trial(&client, &app.address, user_id, "starter").await;

    // 45 of 50 listings used this period, 14 in the trailing week: the
    // projection (2/day) exceeds 50 whatever the month length, and the
    // remaining 5 last floor(5 / 2) = 2 more days.
    app.db
        .increment_quota(user_id, "starter", &current_period(Utc::now()), 45, 0)
        .await
        .expect("Failed to seed quota");
    for i in 0..14 {
        record_listing(&client, &app.address, user_id, (i % 6) * 24 + 1).await;
    }

    let response = client
        .get(&format!("{}/recommendations/{}", app.address, user_id))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(body["available"], true);
    let projection = &body["usage_projection"];
    assert_eq!(projection["current_usage"]["listings"], 45);
    assert_eq!(projection["will_exceed_limit"], true);
    assert_eq!(projection["days_until_limit"], 2);
    assert_eq!(projection["risk_level"], "high");

    let recommendation = &body["plan_recommendation"];
    assert_eq!(recommendation["urgency"], "high");
    assert_eq!(recommendation["current_plan"]["id"], "starter");
    assert!(recommendation["reason"]
        .as_str()
        .unwrap()
        .contains("within 2 days"));

    app.cleanup().await;
}

#[tokio::test]
async fn nearly_exhausted_quota_is_high_risk_even_when_projection_fits() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    start_trial(&client, &app.address, user_id, "starter").await;

    // 49 of 50 used, only 4 in the trailing week: the extrapolated month
    // stays under the allowance, but the last listing is a day away.
    app.db
        .increment_quota(user_id, "starter", &current_period(Utc::now()), 49, 0)
        .await
        .expect("Failed to seed quota");
    for i in 0..4 {
        record_listing(&client, &app.address, user_id, i * 24 + 1).await;
    }

    let response = client
        .get(&format!("{}/recommendations/{}", app.address, user_id))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    let projection = &body["usage_projection"];
    assert_eq!(projection["will_exceed_limit"], false);
    assert_eq!(projection["days_until_limit"], 1);
    assert_eq!(projection["risk_level"], "high");

    app.cleanup().await;
}

#[tokio::test]
async fn light_usage_on_an_unlimited_plan_is_low_urgency() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    start_trial(&client, &app.address, user_id, "pro").await;
    record_listing(&client, &app.address, user_id, 2).await;

    let response = client
        .get(&format!("{}/recommendations/{}", app.address, user_id))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(body["available"], true);
    assert_eq!(body["usage_projection"]["will_exceed_limit"], false);
    assert_eq!(body["usage_projection"]["risk_level"], "low");

    app.cleanup().await;
}

#[tokio::test]
async fn failed_operations_do_not_inflate_the_projection() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();

    start_trial(&client, &app.address, user_id, "starter").await;

    let response = client
        .post(&format!("{}/usage", app.address))
        .json(&json!({
            "service": "text-generation",
            "model": "textgen-standard-v1",
            "operation": "generate_listing",
            "input_units": 1000,
            "output_units": 0,
            "success": false,
            "error_type": "rate_limited",
            "user_id": user_id,
            "session_id": "rec-test",
            "recorded_at": Utc::now() - Duration::hours(1)
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(&format!("{}/recommendations/{}", app.address, user_id))
        .send()
        .await
        .expect("Failed to execute request");

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["usage_projection"]["projected_monthly_usage"]["listings"], 0);
    assert_eq!(body["usage_projection"]["risk_level"], "low");

    app.cleanup().await;
}
