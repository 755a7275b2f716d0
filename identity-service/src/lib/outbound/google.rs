use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::AuthUrl;
use oauth2::AuthorizationCode;
use oauth2::ClientId;
use oauth2::ClientSecret;
use oauth2::CsrfToken;
use oauth2::RedirectUrl;
use oauth2::Scope;
use oauth2::TokenResponse;
use oauth2::TokenUrl;
use serde::Deserialize;

use crate::account::errors::IdentityProviderError;
use crate::account::models::EmailAddress;
use crate::account::models::ProviderIdentity;
use crate::account::ports::IdentityProvider;
use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Subset of the OpenID Connect userinfo response this service relies on.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

/// Google OAuth2 authorization-code flow gateway.
pub struct GoogleIdentityProvider {
    oauth_client: BasicClient,
    http_client: reqwest::Client,
}

impl GoogleIdentityProvider {
    /// # Errors
    /// * `Configuration` - A configured URL is malformed
    pub fn new(config: &GoogleConfig) -> Result<Self, IdentityProviderError> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| IdentityProviderError::Configuration(e.to_string()))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| IdentityProviderError::Configuration(e.to_string()))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| IdentityProviderError::Configuration(e.to_string()))?;

        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            oauth_client,
            http_client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorize_url(&self) -> (String, String) {
        let (url, csrf_token) = self
            .oauth_client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();

        (url.to_string(), csrf_token.secret().clone())
    }

    async fn resolve(&self, code: &str) -> Result<ProviderIdentity, IdentityProviderError> {
        let token = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| IdentityProviderError::ExchangeFailed(e.to_string()))?;

        let user_info: GoogleUserInfo = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .map_err(|e| IdentityProviderError::UserInfoFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| IdentityProviderError::UserInfoFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| IdentityProviderError::UserInfoFailed(e.to_string()))?;

        // Only an email Google itself has verified may link or create an
        // account here.
        if !user_info.email_verified {
            return Err(IdentityProviderError::UnverifiedEmail);
        }

        let email = EmailAddress::new(&user_info.email)
            .map_err(|e| IdentityProviderError::InvalidIdentity(e.to_string()))?;

        let name = user_info
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.as_str().to_string());

        Ok(ProviderIdentity {
            provider_id: user_info.sub,
            email,
            name,
            photo_url: user_info.picture,
        })
    }
}
