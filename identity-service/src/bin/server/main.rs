use std::sync::Arc;

use auth::TokenIssuer;
use identity_service::config::Config;
use identity_service::domain::account::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::SessionSettings;
use identity_service::outbound::google::GoogleIdentityProvider;
use identity_service::outbound::mailer::HttpMailer;
use identity_service::outbound::repositories::PostgresAccountRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    config.validate()?;

    // Secrets and the database URL stay out of the logs.
    tracing::info!(
        http_port = config.server.http_port,
        cookie_secure = config.cookie.secure,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let token_issuer = Arc::new(TokenIssuer::new(config.jwt.secret.as_bytes()));
    let account_repository = Arc::new(PostgresAccountRepository::new(pg_pool));
    let mailer = Arc::new(HttpMailer::new(
        config.mail.endpoint.clone(),
        config.mail.sender.clone(),
    ));
    let identity_provider = Arc::new(GoogleIdentityProvider::new(&config.google)?);

    let identity_service = Arc::new(IdentityService::new(account_repository, mailer));

    let session = SessionSettings {
        cookie_secure: config.cookie.secure,
        success_redirect: config.client.success_redirect.clone(),
        failure_redirect: config.client.failure_redirect.clone(),
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        identity_service,
        token_issuer,
        identity_provider,
        session,
    );

    axum::serve(http_listener, http_application).await?;

    Ok(())
}
