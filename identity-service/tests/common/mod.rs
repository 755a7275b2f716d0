use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::TokenIssuer;
use identity_service::account::errors::IdentityProviderError;
use identity_service::account::errors::MailerError;
use identity_service::account::models::EmailAddress;
use identity_service::account::models::ProviderIdentity;
use identity_service::account::ports::IdentityProvider;
use identity_service::account::ports::Mailer;
use identity_service::domain::account::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::SessionSettings;
use identity_service::outbound::repositories::InMemoryAccountRepository;

pub const TEST_JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const SUCCESS_REDIRECT: &str = "http://client.test/dashboard";
pub const FAILURE_REDIRECT: &str = "http://client.test/login";
pub const STUB_STATE: &str = "stub-csrf-state";

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that records every message instead of sending it. `fail_next`
/// makes exactly one subsequent send fail, to exercise the dispatch-failure
/// path.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail_next: AtomicBool,
}

impl CapturingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Pull the six-digit code out of the most recent message body.
    pub fn latest_code(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let body = &sent.last()?.body;

        let digits: Vec<char> = body.chars().collect();
        digits
            .windows(6)
            .find(|w| w.iter().all(|c| c.is_ascii_digit()))
            .map(|w| w.iter().collect())
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), MailerError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(MailerError::DispatchFailed("relay unavailable".to_string()));
        }

        self.sent.lock().unwrap().push(SentMail {
            to: to.as_str().to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Identity provider stub: a fixed authorize URL and state, plus a
/// code-to-identity table seeded by each test.
#[derive(Default)]
pub struct StubIdentityProvider {
    identities: Mutex<HashMap<String, ProviderIdentity>>,
}

impl StubIdentityProvider {
    pub fn register_identity(&self, code: &str, identity: ProviderIdentity) {
        self.identities
            .lock()
            .unwrap()
            .insert(code.to_string(), identity);
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn authorize_url(&self) -> (String, String) {
        (
            "https://provider.test/authorize?client_id=stub".to_string(),
            STUB_STATE.to_string(),
        )
    }

    async fn resolve(&self, code: &str) -> Result<ProviderIdentity, IdentityProviderError> {
        self.identities
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| {
                IdentityProviderError::ExchangeFailed("unknown authorization code".to_string())
            })
    }
}

/// Test application that spawns a real server over in-memory collaborators.
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub repository: Arc<InMemoryAccountRepository>,
    pub mailer: Arc<CapturingMailer>,
    pub provider: Arc<StubIdentityProvider>,
    pub token_issuer: Arc<TokenIssuer>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryAccountRepository::new());
        let mailer = Arc::new(CapturingMailer::default());
        let provider = Arc::new(StubIdentityProvider::default());
        let token_issuer = Arc::new(TokenIssuer::new(TEST_JWT_SECRET));

        let identity_service = Arc::new(IdentityService::new(
            Arc::clone(&repository),
            Arc::clone(&mailer),
        ));

        let session = SessionSettings {
            cookie_secure: false,
            success_redirect: SUCCESS_REDIRECT.to_string(),
            failure_redirect: FAILURE_REDIRECT.to_string(),
        };

        let router = create_router(
            identity_service,
            Arc::clone(&token_issuer),
            provider.clone() as Arc<dyn IdentityProvider>,
            session,
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            // Redirects stay visible to assertions; cookies persist across
            // requests like a browser session.
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to create reqwest client"),
            repository,
            mailer,
            provider,
            token_issuer,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }
}
