use std::sync::Arc;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::config::Environment;
use identity_service::domain::identity::ports::IdentityServicePort;
use identity_service::domain::identity::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryIdentityRepository;
use identity_service::outbound::repositories::PostgresIdentityRepository;
use tokio::signal;
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

    tracing::info!(
        environment = %config.environment,
        host = %config.server.host,
        http_port = config.server.http_port,
        persistent_store = config.database.url().is_some(),
        token_ttl_minutes = config.jwt.expiration_minutes,
        "Configuration loaded"
    );

    for warning in config.warnings() {
        tracing::warn!(warning = ?warning, "ConfigurationWarning: {}", warning);
    }

    let authenticator = Arc::new(Authenticator::with_cost(
        config.signing_secret()?,
        config.password,
    )?);

    let identity_service: Arc<dyn IdentityServicePort> = match config.database.url() {
        Some(url) => {
            let repository =
                PostgresIdentityRepository::connect(url, config.database.max_connections).await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created and migrations applied"
            );
            Arc::new(IdentityService::new(
                Arc::new(repository),
                authenticator,
                config.token_ttl(),
            ))
        }
        None if config.environment == Environment::Production => {
            anyhow::bail!("database.url must be set in production");
        }
        None => Arc::new(IdentityService::new(
            Arc::new(InMemoryIdentityRepository::new()),
            authenticator,
            config.token_ttl(),
        )),
    };

    let http_address = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(identity_service, config.environment);

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
