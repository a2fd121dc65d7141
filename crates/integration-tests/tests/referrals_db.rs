//! Referral program and waitlist against `PostgreSQL`.
//!
//! These tests require a database:
//!
//! ```bash
//! STOREFRONT_DATABASE_URL=postgres://... cargo test -p secret-menu-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use httpmock::prelude::*;
use serde_json::json;
use uuid::Uuid;

use secret_menu_core::Email;
use secret_menu_core::capture::capture;
use secret_menu_storefront::db::{ProfileRepository, WaitlistRepository};
use secret_menu_storefront::services::referrals;

use secret_menu_integration_tests::{TestApp, TestResponse, migrated_pool};

fn unique_email(prefix: &str) -> String {
    format!("{prefix}+{}@example.com", Uuid::new_v4().simple())
}

/// Mock a completed Stripe session paid by `email` and return its id.
async fn mock_confirmed(server: &MockServer, email: &str) -> String {
    let session_id = format!("cs_{}", Uuid::new_v4().simple());
    let path = format!("/v1/checkout/sessions/{session_id}");
    server
        .mock_async(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(200).json_body(json!({
                "id": session_id,
                "status": "complete",
                "payment_status": "paid",
                "customer_details": { "email": email }
            }));
        })
        .await;
    session_id
}

/// Capture an in-area lead, optionally arriving through an invite link.
async fn capture_lead(app: &mut TestApp, email: &str, referral_code: Option<&str>) {
    let resp = app
        .post(
            "/api/onboarding/capture",
            json!({ "email": email, "zip": "94110", "referral_code": referral_code }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "onboard");
}

/// Return from Stripe with `session_id`.
async fn return_from_checkout(app: &mut TestApp, session_id: &str) -> TestResponse {
    let resp = app
        .get(&format!("/api/subscription/success?session_id={session_id}&plan=plus"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "confirmed");
    resp
}

/// Capture `email`, complete one checkout and check the member is signed in.
async fn sign_in(app: &mut TestApp, server: &MockServer, email: &str) {
    capture_lead(app, email, None).await;
    let session_id = mock_confirmed(server, email).await;
    let resp = return_from_checkout(app, &session_id).await;
    assert_eq!(resp.body["member"]["email"], email);
}

// ============================================================================
// Members
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_confirmed_checkout_creates_member() {
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(migrated_pool().await, &server.base_url());
    let email = unique_email("member");

    sign_in(&mut app, &server, &email).await;

    let resp = app.get("/api/referrals").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["invites_remaining"], 10);
    assert_eq!(resp.body["invites_used"], 0);
    assert_eq!(resp.body["total_referrals"], 0);
    assert_eq!(resp.body["can_invite"], true);
    let code = resp.body["referral_code"].as_str().unwrap().to_owned();
    assert!(resp.body["referral_link"].as_str().unwrap().ends_with(&format!("?ref={code}")));

    let share = app.get("/api/referrals/share").await;
    assert_eq!(share.status, StatusCode::OK);
    assert!(share.body["whatsapp"].as_str().unwrap().starts_with("https://wa.me/"));

    let check = app.get(&format!("/api/referrals/validate/{}", code.to_lowercase())).await;
    assert_eq!(check.body["valid"], true);
    assert_eq!(check.body["invites_available"], true);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_upsert_keeps_referral_code() {
    let pool = migrated_pool().await;
    let repo = ProfileRepository::new(&pool);
    let email = Email::parse(&unique_email("upsert")).unwrap();

    let first = repo.upsert_by_email(&email, None).await.unwrap();
    let second = repo.upsert_by_email(&email, Some("Grace")).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.referral_code, second.referral_code);
    assert_eq!(second.name.as_deref(), Some("Grace"));
}

// ============================================================================
// Referral lifecycle
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_invite_link_completes_on_first_checkout() {
    let pool = migrated_pool().await;
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(pool.clone(), &server.base_url());

    let referrer = ProfileRepository::new(&pool)
        .upsert_by_email(&Email::parse(&unique_email("referrer")).unwrap(), Some("Ada"))
        .await
        .unwrap();

    let friend = unique_email("friend");
    let code = referrer.referral_code.as_str().to_lowercase();
    capture_lead(&mut app, &friend, Some(&code)).await;

    let session_id = mock_confirmed(&server, &friend).await;
    let resp = return_from_checkout(&mut app, &session_id).await;
    assert_eq!(resp.body["member"]["email"], friend);

    let stats = referrals::stats(&pool, referrer.id).await.unwrap();
    assert_eq!(stats.total_referrals, 1);
    assert_eq!(stats.pending_referrals, 0);
    assert_eq!(stats.completed_referrals, 1);
    assert_eq!(stats.free_meals_earned, 1);
    assert_eq!(stats.invites_remaining, 9);
    assert_eq!(stats.invites_used, 1);
    let row = stats.friends.first().unwrap();
    assert!(row.reward_earned);
    assert!(row.masked_email.as_deref().unwrap().contains("***@example.com"));

    // The code was used up by the checkout
    let again = app.post("/api/referrals/claim", json!({ "code": code })).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_member_claim_is_pending_until_next_order() {
    let pool = migrated_pool().await;
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(pool.clone(), &server.base_url());

    let referrer = ProfileRepository::new(&pool)
        .upsert_by_email(&Email::parse(&unique_email("referrer")).unwrap(), Some("Ada"))
        .await
        .unwrap();

    sign_in(&mut app, &server, &unique_email("member")).await;

    let resp = app
        .post("/api/referrals/claim", json!({ "code": referrer.referral_code.as_str() }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["claimed"], true);
    assert_eq!(resp.body["code"], referrer.referral_code.as_str());

    let stats = referrals::stats(&pool, referrer.id).await.unwrap();
    assert_eq!(stats.pending_referrals, 1);
    assert_eq!(stats.completed_referrals, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_replayed_session_id_does_not_sign_in() {
    let pool = migrated_pool().await;
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(pool, &server.base_url());
    let email = unique_email("owner");

    capture_lead(&mut app, &email, None).await;
    let session_id = mock_confirmed(&server, &email).await;
    let resp = return_from_checkout(&mut app, &session_id).await;
    assert_eq!(resp.body["member"]["email"], email);

    // A fresh browser holding only the redirect URL
    app.clear_cookies();
    let resp = return_from_checkout(&mut app, &session_id).await;
    assert!(resp.body["member"].is_null());
    assert_eq!(app.get("/api/referrals").await.status, StatusCode::UNAUTHORIZED);

    // Typing the customer's email first does not help either
    capture_lead(&mut app, &email, None).await;
    let resp = return_from_checkout(&mut app, &session_id).await;
    assert!(resp.body["member"].is_null());
    assert_eq!(app.get("/api/referrals").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_checkout_for_another_email_does_not_sign_in() {
    let pool = migrated_pool().await;
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(pool, &server.base_url());

    capture_lead(&mut app, &unique_email("visitor"), None).await;
    let session_id = mock_confirmed(&server, &unique_email("customer")).await;

    let resp = return_from_checkout(&mut app, &session_id).await;
    assert!(resp.body["member"].is_null());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_self_referral_rejected() {
    let pool = migrated_pool().await;
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(pool, &server.base_url());

    sign_in(&mut app, &server, &unique_email("self")).await;
    let own = app.get("/api/referrals").await.body["referral_code"].clone();

    let resp = app.post("/api/referrals/claim", json!({ "code": own })).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["fields"][0]["field"], "code");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_unknown_code_rejected() {
    let pool = migrated_pool().await;
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(pool, &server.base_url());

    sign_in(&mut app, &server, &unique_email("unknown")).await;

    let resp = app.post("/api/referrals/claim", json!({ "code": "ZZZZ9999" })).await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

    let check = app.get("/api/referrals/validate/ZZZZ9999").await;
    assert_eq!(check.body["valid"], false);
}

// ============================================================================
// Waitlist
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (STOREFRONT_DATABASE_URL)"]
async fn test_out_of_area_capture_joins_waitlist_once() {
    let pool = migrated_pool().await;
    let server = MockServer::start_async().await;
    let mut app = TestApp::with_pool(pool.clone(), &server.base_url());
    let email = unique_email("waitlist");

    let resp = app
        .post("/api/onboarding/capture", json!({ "email": email, "zip": "10001" }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["outcome"], "waitlist");
    assert_eq!(resp.body["redirect"], "/waitlist");

    // No wizard for waitlisted leads
    assert_eq!(app.get("/api/onboarding").await.status, StatusCode::CONFLICT);

    let lead = capture(&email, "10001").unwrap().lead().clone();
    assert!(!WaitlistRepository::new(&pool).add(&lead).await.unwrap());
}
