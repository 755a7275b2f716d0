mod common;

use chrono::Duration;
use chrono::Utc;
use common::TestApp;
use common::FAILURE_REDIRECT;
use common::STUB_STATE;
use common::SUCCESS_REDIRECT;
use identity_service::account::models::AccountId;
use identity_service::account::models::EmailAddress;
use identity_service::account::models::ProviderIdentity;
use identity_service::account::ports::AccountRepository;
use reqwest::StatusCode;
use serde_json::json;

fn register_body(email: &str) -> serde_json::Value {
    json!({
        "name": "Ada Lovelace",
        "email": email,
        "password": "pass_word!",
        "phoneNumber": "+15550100"
    })
}

/// Register and return the verification code captured by the test mailer.
async fn register_account(app: &TestApp, email: &str) -> String {
    let response = app
        .post("/register")
        .json(&register_body(email))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CREATED);

    app.mailer.latest_code().expect("No verification email sent")
}

async fn verify_account(app: &TestApp, email: &str, code: &str) -> reqwest::Response {
    app.post("/verify-email")
        .json(&json!({ "email": email, "otp": code }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/register")
        .json(&register_body("ada@example.com"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["message"].is_string());

    // The verification code travels only by email.
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");
    assert!(app.mailer.latest_code().is_some());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    register_account(&app, "ada@example.com").await;

    let response = app
        .post("/register")
        .json(&register_body("Ada@Example.COM"))
        .send()
        .await
        .expect("Failed to execute request");

    // Case-insensitive duplicate; surfaced as a 400 with a stable reason.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["reason"], "conflict");
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let app = TestApp::spawn().await;

    for body in [
        json!({ "name": "", "email": "ada@example.com", "password": "pass_word!" }),
        json!({ "name": "Ada", "email": "not-an-email", "password": "pass_word!" }),
        json!({ "name": "Ada", "email": "ada@example.com", "password": "short" }),
    ] {
        let response = app
            .post("/register")
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["reason"], "validation");
    }

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_concurrent_duplicate_registration() {
    let app = TestApp::spawn().await;

    let first = app.post("/register").json(&register_body("race@example.com"));
    let second = app.post("/register").json(&register_body("race@example.com"));

    let (first, second) = tokio::join!(first.send(), second.send());
    let statuses = [
        first.expect("Failed to execute request").status(),
        second.expect("Failed to execute request").status(),
    ];

    // Exactly one registration wins; the loser gets the duplicate response.
    assert!(statuses.contains(&StatusCode::CREATED));
    assert!(statuses.contains(&StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_register_mail_relay_failure_keeps_account() {
    let app = TestApp::spawn().await;
    app.mailer.fail_next();

    let response = app
        .post("/register")
        .json(&register_body("ada@example.com"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["reason"], "upstream_failure");

    // The account was committed before the dispatch attempt.
    let stored = app
        .repository
        .find_by_email(&EmailAddress::new("ada@example.com").unwrap())
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_verify_email_establishes_session() {
    let app = TestApp::spawn().await;
    let code = register_account(&app, "ada@example.com").await;

    let response = verify_account(&app, "ada@example.com", &code).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get_all("set-cookie")
        .iter()
        .any(|v| v.to_str().unwrap().starts_with("session_token=")));

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["name"], "Ada Lovelace");

    // The cookie from verification authenticates the next request directly.
    let profile = app
        .get("/profile")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(profile.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verify_email_wrong_code() {
    let app = TestApp::spawn().await;
    let code = register_account(&app, "ada@example.com").await;

    let wrong = if code == "000000" { "000001" } else { "000000" };
    let response = verify_account(&app, "ada@example.com", wrong).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["reason"], "invalid_or_expired_code");
}

#[tokio::test]
async fn test_verify_email_expired_code() {
    let app = TestApp::spawn().await;
    let code = register_account(&app, "ada@example.com").await;

    let account = app
        .repository
        .find_by_email(&EmailAddress::new("ada@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();

    // Age the pending code past its window.
    app.repository
        .mutate(&account.id, |account| {
            if let Some(verification) = account.verification.as_mut() {
                verification.expires_at = Utc::now() - Duration::seconds(1);
            }
        })
        .unwrap();

    let response = verify_account(&app, "ada@example.com", &code).await;

    // Indistinguishable from a wrong code.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["reason"], "invalid_or_expired_code");
}

#[tokio::test]
async fn test_verify_email_unknown_account_is_uniform() {
    let app = TestApp::spawn().await;

    let response = verify_account(&app, "ghost@example.com", "123456").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["reason"], "invalid_or_expired_code");
}

#[tokio::test]
async fn test_resend_invalidates_previous_code() {
    let app = TestApp::spawn().await;
    let old_code = register_account(&app, "ada@example.com").await;

    let response = app
        .post("/resend-verification")
        .json(&json!({ "email": "ada@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let new_code = app.mailer.latest_code().expect("No resend email sent");

    if old_code != new_code {
        let response = verify_account(&app, "ada@example.com", &old_code).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = verify_account(&app, "ada@example.com", &new_code).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resend_is_uniform_for_unknown_and_verified() {
    let app = TestApp::spawn().await;
    let code = register_account(&app, "ada@example.com").await;
    verify_account(&app, "ada@example.com", &code).await;

    for email in ["ada@example.com", "ghost@example.com"] {
        let response = app
            .post("/resend-verification")
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("Failed to execute request");

        // Verified and nonexistent accounts are indistinguishable.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["reason"], "not_found");
    }
}

#[tokio::test]
async fn test_login_before_verification() {
    let app = TestApp::spawn().await;
    register_account(&app, "ada@example.com").await;

    let response = app
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "pass_word!" }))
        .send()
        .await
        .expect("Failed to execute request");

    // The password was right, so disclosure is safe and actionable.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["reason"], "email_not_verified");
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let app = TestApp::spawn().await;
    let code = register_account(&app, "ada@example.com").await;
    verify_account(&app, "ada@example.com", &code).await;

    for (email, password) in [
        ("ada@example.com", "wrong-password"),
        ("ghost@example.com", "pass_word!"),
        ("not-an-email", "pass_word!"),
    ] {
        let response = app
            .post("/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["reason"], "invalid_credentials");
    }
}

#[tokio::test]
async fn test_login_success_sets_session_cookie() {
    let app = TestApp::spawn().await;
    let code = register_account(&app, "ada@example.com").await;
    verify_account(&app, "ada@example.com", &code).await;

    let response = app
        .post("/login")
        .json(&json!({ "email": "Ada@Example.COM", "password": "pass_word!" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .find(|v| v.to_str().unwrap().starts_with("session_token="))
        .expect("No session cookie set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_profile_requires_valid_session() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/profile")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .get("/profile")
        .header("Cookie", "session_token=garbage")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_missing_account_is_rejected() {
    let app = TestApp::spawn().await;

    // Validly signed, but the subject never resolves to a stored account,
    // as after a deletion between issuance and use.
    let token = app
        .token_issuer
        .issue(&AccountId::new().to_string())
        .expect("Failed to issue token");

    let response = app
        .get("/profile")
        .header("Cookie", format!("session_token={}", token))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["reason"], "unauthenticated");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::spawn().await;
    let code = register_account(&app, "ada@example.com").await;
    verify_account(&app, "ada@example.com", &code).await;

    let response = app
        .post("/logout")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    // The cookie store has dropped the expired cookie.
    let response = app
        .get("/profile")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_google_redirect_pins_state_cookie() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/google")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()["location"],
        "https://provider.test/authorize?client_id=stub"
    );

    let state_cookie = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .find(|v| v.to_str().unwrap().starts_with("oauth_state="))
        .expect("No state cookie set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(state_cookie.contains(STUB_STATE));
    assert!(state_cookie.contains("SameSite=Lax"));
    assert!(state_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_google_callback_creates_federated_account() {
    let app = TestApp::spawn().await;
    app.provider.register_identity(
        "auth-code-1",
        ProviderIdentity {
            provider_id: "google-subject-1".to_string(),
            email: EmailAddress::new("fed@example.com").unwrap(),
            name: "Fed Account".to_string(),
            photo_url: Some("https://photos.example.com/1.jpg".to_string()),
        },
    );

    app.get("/google").send().await.expect("Failed to execute request");

    let response = app
        .get(&format!(
            "/google/callback?code=auth-code-1&state={}",
            STUB_STATE
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], SUCCESS_REDIRECT);
    assert!(response
        .headers()
        .get_all("set-cookie")
        .iter()
        .any(|v| v.to_str().unwrap().starts_with("session_token=")));

    let profile = app
        .get("/profile")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(profile.status(), StatusCode::OK);
    let body: serde_json::Value = profile.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["email"], "fed@example.com");
    assert_eq!(body["data"]["photoURL"], "https://photos.example.com/1.jpg");
}

#[tokio::test]
async fn test_google_callback_links_existing_local_account() {
    let app = TestApp::spawn().await;
    register_account(&app, "ada@example.com").await;

    app.provider.register_identity(
        "auth-code-1",
        ProviderIdentity {
            provider_id: "google-subject-1".to_string(),
            email: EmailAddress::new("ada@example.com").unwrap(),
            name: "Ada Lovelace".to_string(),
            photo_url: None,
        },
    );

    app.get("/google").send().await.expect("Failed to execute request");
    let response = app
        .get(&format!(
            "/google/callback?code=auth-code-1&state={}",
            STUB_STATE
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.headers()["location"], SUCCESS_REDIRECT);

    // Linked onto the existing account: verified, provider id attached, the
    // local password untouched.
    let account = app
        .repository
        .find_by_email(&EmailAddress::new("ada@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(account.is_email_verified);
    assert_eq!(account.provider_id.as_deref(), Some("google-subject-1"));
    assert!(account.password_hash.is_some());

    let login = app
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "pass_word!" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_google_callback_rejects_state_mismatch() {
    let app = TestApp::spawn().await;
    app.provider.register_identity(
        "auth-code-1",
        ProviderIdentity {
            provider_id: "google-subject-1".to_string(),
            email: EmailAddress::new("fed@example.com").unwrap(),
            name: "Fed Account".to_string(),
            photo_url: None,
        },
    );

    app.get("/google").send().await.expect("Failed to execute request");

    let response = app
        .get("/google/callback?code=auth-code-1&state=forged-state")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], FAILURE_REDIRECT);
    assert!(!response
        .headers()
        .get_all("set-cookie")
        .iter()
        .any(|v| v.to_str().unwrap().starts_with("session_token=")));
}

#[tokio::test]
async fn test_google_callback_without_state_cookie_fails() {
    let app = TestApp::spawn().await;

    let response = app
        .get(&format!(
            "/google/callback?code=auth-code-1&state={}",
            STUB_STATE
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], FAILURE_REDIRECT);
}

#[tokio::test]
async fn test_google_callback_provider_error_redirects_to_failure() {
    let app = TestApp::spawn().await;

    app.get("/google").send().await.expect("Failed to execute request");

    let response = app
        .get("/google/callback?error=access_denied")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], FAILURE_REDIRECT);
}
