//! Capture → wizard → checkout → success callback, with Stripe mocked.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use httpmock::prelude::*;
use serde_json::json;

use secret_menu_integration_tests::TestApp;

/// Capture an in-area lead and return the app holding its session.
async fn captured(server: &MockServer) -> TestApp {
    let mut app = TestApp::new(&server.base_url());
    let resp = app
        .post(
            "/api/onboarding/capture",
            json!({ "email": " Diner@Example.com ", "zip": "94110" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "onboard");
    assert_eq!(resp.body["redirect"], "/onboarding");
    app
}

/// Walk a captured app to the payment step.
async fn to_payment(app: &mut TestApp) {
    assert_eq!(app.post("/api/onboarding/next", json!({})).await.status, StatusCode::OK);
    let resp = app
        .put(
            "/api/onboarding/delivery",
            json!({
                "full_name": "Ada Lovelace",
                "street_address": "500 Valencia St",
                "phone": "415-555-0100"
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let resp = app.post("/api/onboarding/next", json!({})).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["step"], "payment");
}

// ============================================================================
// Capture
// ============================================================================

#[tokio::test]
async fn test_wizard_without_capture_asks_for_restart() {
    let server = MockServer::start_async().await;
    let mut app = TestApp::new(&server.base_url());

    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["restart"], "/");
}

#[tokio::test]
async fn test_capture_validation() {
    let server = MockServer::start_async().await;
    let mut app = TestApp::new(&server.base_url());

    let resp = app
        .post("/api/onboarding/capture", json!({ "email": "not-an-email", "zip": "94110" }))
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["fields"][0]["field"], "email");

    let resp = app
        .post("/api/onboarding/capture", json!({ "email": "diner@example.com", "zip": "9411" }))
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["fields"][0]["field"], "zip");

    let resp = app
        .post(
            "/api/onboarding/capture",
            json!({ "email": "diner@example.com", "zip": "94110", "referral_code": "no!" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["fields"][0]["field"], "referral_code");
    assert_eq!(app.get("/api/onboarding").await.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_capture_accepts_blank_referral_code() {
    let server = MockServer::start_async().await;
    let mut app = TestApp::new(&server.base_url());

    let resp = app
        .post(
            "/api/onboarding/capture",
            json!({ "email": "diner@example.com", "zip": "94110", "referral_code": "  " }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "onboard");
}

// ============================================================================
// Wizard
// ============================================================================

#[tokio::test]
async fn test_wizard_starts_from_capture() {
    let server = MockServer::start_async().await;
    let mut app = captured(&server).await;

    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["step"], "plan_selection");
    assert_eq!(resp.body["step_number"], 1);
    assert_eq!(resp.body["draft"]["email"], "diner@example.com");
    assert_eq!(resp.body["draft"]["zip"], "94110");
    assert_eq!(resp.body["draft"]["meal_count"], 8);
    assert_eq!(resp.body["draft"]["city"], "San Francisco");
}

#[tokio::test]
async fn test_plan_selection() {
    let server = MockServer::start_async().await;
    let mut app = captured(&server).await;

    let resp = app.post("/api/onboarding/plan", json!({ "meal_count": 16 })).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["draft"]["plan"], "solodev");
    assert_eq!(resp.body["summary"]["meal_count"], 16);
    assert_eq!(resp.body["summary"]["delivery_waived"], true);

    let resp = app.post("/api/onboarding/plan", json!({ "meal_count": 7 })).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["fields"][0]["field"], "meal_count");
}

#[tokio::test]
async fn test_blank_delivery_field_blocks_payment() {
    let server = MockServer::start_async().await;
    let mut app = captured(&server).await;
    app.post("/api/onboarding/next", json!({})).await;

    app.put(
        "/api/onboarding/delivery",
        json!({
            "full_name": "",
            "street_address": "500 Valencia St",
            "apt_suite": "4B",
            "phone": "415-555-0100"
        }),
    )
    .await;

    let resp = app.post("/api/onboarding/next", json!({})).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = resp.body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields.first().unwrap()["field"], "full_name");

    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.body["step"], "delivery_info");
    assert_eq!(resp.body["draft"]["street_address"], "500 Valencia St");
    assert_eq!(resp.body["draft"]["apt_suite"], "4B");
}

#[tokio::test]
async fn test_step_guards() {
    let server = MockServer::start_async().await;
    let mut app = captured(&server).await;

    // Delivery edits only at the delivery step
    let resp = app
        .put("/api/onboarding/delivery", json!({ "full_name": "Ada" }))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    // Back from the first step stays put
    let resp = app.post("/api/onboarding/back", json!({})).await;
    assert_eq!(resp.body["step"], "plan_selection");

    to_payment(&mut app).await;

    let resp = app.post("/api/onboarding/plan", json!({ "meal_count": 10 })).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    let resp = app.post("/api/onboarding/next", json!({})).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    // Preferences are editable anywhere
    let resp = app
        .put(
            "/api/onboarding/preferences",
            json!({ "calorie_preference": "very-high", "diets": ["Vegetarian"], "toggle_allergy": "Peanuts" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["draft"]["calorie_preference"], "very-high");
    assert_eq!(resp.body["draft"]["diets"], json!(["vegetarian"]));
    assert_eq!(resp.body["draft"]["allergies"], json!(["peanuts"]));
}

#[tokio::test]
async fn test_new_capture_restarts_wizard() {
    let server = MockServer::start_async().await;
    let mut app = captured(&server).await;
    app.post("/api/onboarding/plan", json!({ "meal_count": 10 })).await;
    app.post("/api/onboarding/next", json!({})).await;

    app.post(
        "/api/onboarding/capture",
        json!({ "email": "other@example.com", "zip": "94117" }),
    )
    .await;

    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.body["step"], "plan_selection");
    assert_eq!(resp.body["draft"]["email"], "other@example.com");
    assert_eq!(resp.body["draft"]["meal_count"], 8);
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_before_payment_is_rejected() {
    let server = MockServer::start_async().await;
    let mut app = captured(&server).await;

    let resp = app.post("/api/onboarding/checkout", json!({})).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_creates_stripe_session() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/checkout/sessions")
                .x_www_form_urlencoded_tuple("mode", "subscription")
                .x_www_form_urlencoded_tuple("line_items[0][price]", "price_plus")
                .x_www_form_urlencoded_tuple("customer_email", "diner@example.com");
            then.status(200).json_body(json!({
                "id": "cs_test_flow",
                "url": "https://checkout.stripe.com/c/pay/cs_test_flow"
            }));
        })
        .await;

    let mut app = captured(&server).await;
    to_payment(&mut app).await;

    let resp = app.post("/api/onboarding/checkout", json!({})).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["session_id"], "cs_test_flow");
    assert_eq!(resp.body["url"], "https://checkout.stripe.com/c/pay/cs_test_flow");
    create.assert_async().await;
}

#[tokio::test]
async fn test_declined_checkout_keeps_draft_for_retry() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/checkout/sessions");
            then.status(402).json_body(json!({
                "error": { "type": "card_error", "message": "Your card was declined." }
            }));
        })
        .await;

    let mut app = captured(&server).await;
    to_payment(&mut app).await;

    let resp = app.post("/api/onboarding/checkout", json!({})).await;
    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(resp.body["error"], "Your card was declined.");

    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.body["step"], "payment");
    assert_eq!(resp.body["last_error"], "Your card was declined.");
    assert_eq!(resp.body["draft"]["full_name"], "Ada Lovelace");
}

// ============================================================================
// Success callback
// ============================================================================

#[tokio::test]
async fn test_rejected_api_key_is_hidden_from_customer() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/checkout/sessions");
            then.status(401).json_body(json!({
                "error": {
                    "type": "invalid_request_error",
                    "message": "Invalid API Key provided: sk_live_****abcd"
                }
            }));
        })
        .await;

    let mut app = captured(&server).await;
    to_payment(&mut app).await;

    let resp = app.post("/api/onboarding/checkout", json!({})).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["error"], "configuration error");
    assert!(!resp.body.to_string().contains("sk_live"));

    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.body["step"], "payment");
    assert_eq!(resp.body["last_error"], "configuration error");
}

#[tokio::test]
async fn test_success_requires_session_id() {
    let server = MockServer::start_async().await;
    let mut app = TestApp::new(&server.base_url());

    let resp = app.get("/api/subscription/success?plan=plus").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_open_session_is_not_completed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/checkout/sessions/cs_open");
            then.status(200).json_body(json!({
                "id": "cs_open",
                "status": "open",
                "payment_status": "unpaid"
            }));
        })
        .await;

    let mut app = captured(&server).await;
    to_payment(&mut app).await;

    let resp = app
        .get("/api/subscription/success?session_id=cs_open&plan=plus&onboarding=true")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "not_completed");
    assert_eq!(resp.body["status"], "open");

    // Still resumable
    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.body["step"], "payment");
}

#[tokio::test]
async fn test_unverifiable_session_is_assumed_successful() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/checkout/sessions/cs_flaky");
            then.status(500);
        })
        .await;

    let mut app = captured(&server).await;
    to_payment(&mut app).await;

    let resp = app
        .get("/api/subscription/success?session_id=cs_flaky&plan=plus&onboarding=true")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "assumed_success");
    assert_eq!(resp.body["plan"], "plus");
    assert_eq!(resp.body["from_onboarding"], true);

    // Draft discarded; the wizard starts over from the capture
    let resp = app.get("/api/onboarding").await;
    assert_eq!(resp.body["step"], "plan_selection");
}

#[tokio::test]
async fn test_confirmed_session_without_database_still_succeeds() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/checkout/sessions/cs_done");
            then.status(200).json_body(json!({
                "id": "cs_done",
                "status": "complete",
                "payment_status": "paid",
                "customer_details": { "email": "diner@example.com" }
            }));
        })
        .await;

    let mut app = captured(&server).await;

    let resp = app
        .get("/api/subscription/success?session_id=cs_done&plan=plus")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "confirmed");
    assert_eq!(resp.body["email"], "diner@example.com");
    assert_eq!(resp.body["from_onboarding"], false);
    assert!(resp.body["member"].is_null());
}
