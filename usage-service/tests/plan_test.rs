//! Plan catalog integration tests for usage-service.

mod common;

use common::TestApp;
use reqwest::Client;

#[tokio::test]
async fn plan_catalog_lists_all_tiers() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/plans", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let plans: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let plans = plans.as_array().expect("expected an array");

    assert_eq!(plans.len(), 4);

    let ids: Vec<&str> = plans.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["free", "starter", "pro", "enterprise"]);

    let free = &plans[0];
    assert_eq!(free["listings_per_month"], 5);
    assert_eq!(free["videos_per_month"], 2);
    assert_eq!(free["model_tier"], "lite");

    let enterprise = &plans[3];
    assert_eq!(enterprise["listings_per_month"], -1);
    assert_eq!(enterprise["api_access"], true);
    assert_eq!(enterprise["model_tier"], "premium");

    app.cleanup().await;
}
