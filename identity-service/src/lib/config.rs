use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use thiserror::Error;

/// Minimum acceptable JWT secret length for HS256, in bytes.
const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub google: GoogleConfig,
    pub client: ClientConfig,
    pub mail: MailConfig,
    pub cookie: CookieConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// Google OAuth2 application credentials and the registered callback URL.
#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Client-side routes the federated flow redirects to once it completes.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub success_redirect: String,
    pub failure_redirect: String,
}

/// HTTP mail relay the service hands outbound email to.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub endpoint: String,
    pub sender: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieConfig {
    /// Mark session cookies `Secure`. Off only for local development.
    pub secure: bool,
}

/// Configuration rejected by [`Config::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("JWT secret must be at least {MIN_JWT_SECRET_BYTES} bytes")]
    JwtSecretTooShort,

    #[error("Missing Google OAuth setting: {0}")]
    MissingGoogleSetting(&'static str),

    #[error("Missing client redirect setting: {0}")]
    MissingClientRedirect(&'static str),

    #[error("Missing mail relay endpoint")]
    MissingMailEndpoint,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }

    /// Check the loaded configuration for values that would only fail at
    /// request time. Called once at startup, before anything is wired up.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }
        if self.google.client_id.is_empty() {
            return Err(ConfigValidationError::MissingGoogleSetting("client_id"));
        }
        if self.google.client_secret.is_empty() {
            return Err(ConfigValidationError::MissingGoogleSetting("client_secret"));
        }
        if self.google.redirect_url.is_empty() {
            return Err(ConfigValidationError::MissingGoogleSetting("redirect_url"));
        }
        if self.client.success_redirect.is_empty() {
            return Err(ConfigValidationError::MissingClientRedirect("success_redirect"));
        }
        if self.client.failure_redirect.is_empty() {
            return Err(ConfigValidationError::MissingClientRedirect("failure_redirect"));
        }
        if self.mail.endpoint.is_empty() {
            return Err(ConfigValidationError::MissingMailEndpoint);
        }
        Ok(())
    }
}
