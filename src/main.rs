// Contract Desk - HTTP server

use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use tokio::signal;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use contract_desk::adapters::http::{sms_router, SmsAppState, WebhookVerification};
use contract_desk::adapters::{
    DocumentReportGenerator, LocalArtifactStorage, LoggingTransport, PostgresContractRepository,
    QueuedChannelSender, QueuedChannelSenderConfig, TwilioConfig, TwilioSignatureVerifier,
    TwilioTransport,
};
use contract_desk::application::{
    ConversationRegistry, HandleInboundMessageHandler, RegistrySweeper, RegistrySweeperConfig,
};
use contract_desk::config::{AppConfig, MessagingConfig, MessagingProvider};
use contract_desk::domain::conversation::TurnServices;
use contract_desk::ports::{ArtifactStorage, MessageTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config);

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!(
        environment = ?config.server.environment,
        provider = ?config.messaging.provider,
        "Starting Contract Desk"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            anyhow::anyhow!("Database connection failed: {}", e)
        })?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations applied");
    }

    tokio::fs::create_dir_all(&config.reports.output_dir)
        .await
        .with_context(|| {
            format!(
                "cannot create report directory {}",
                config.reports.output_dir.display()
            )
        })?;

    let contracts = Arc::new(PostgresContractRepository::new(pool));
    let artifacts: Arc<dyn ArtifactStorage> =
        Arc::new(LocalArtifactStorage::new(config.reports.output_dir.clone()));

    let mut reports = DocumentReportGenerator::new(
        Arc::clone(&artifacts),
        config.reports.public_base_url.clone(),
    )
    .with_format(config.reports.format)
    .with_pdf_timeout(config.reports.pdf_timeout_secs);
    if let Some(pandoc) = &config.reports.pandoc_path {
        reports = reports.with_pandoc_path(pandoc.clone());
    }

    let transport = build_transport(&config.messaging)?;
    let sender = Arc::new(QueuedChannelSender::new(
        transport,
        QueuedChannelSenderConfig {
            pacing: config.messaging.send_delay(),
            max_concurrent_sends: config.messaging.max_concurrent_sends,
            queue_idle_timeout: config.messaging.queue_idle_timeout(),
        },
    ));

    let registry = Arc::new(ConversationRegistry::new(
        config.conversation.continuation_mode,
    ));
    let handler = Arc::new(HandleInboundMessageHandler::new(
        Arc::clone(&registry),
        TurnServices::new(contracts, Arc::new(reports)),
        sender,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = RegistrySweeper::new(
        registry,
        RegistrySweeperConfig {
            sweep_interval: config.conversation.sweep_interval(),
            idle_timeout: config.conversation.idle_timeout(),
        },
    )
    .with_artifact_retention(Arc::clone(&artifacts), config.reports.retention());
    let sweeper_task = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    let verification = webhook_verification(&config)?;
    let state = SmsAppState {
        inbound_handler: handler,
        artifacts,
        verification,
    };

    let app = sms_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.server.request_timeout()))
            .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
            .into_inner(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_task.await {
        error!("Registry sweeper ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }
}

fn build_transport(config: &MessagingConfig) -> anyhow::Result<Arc<dyn MessageTransport>> {
    match config.provider {
        MessagingProvider::Log => Ok(Arc::new(LoggingTransport::new())),
        MessagingProvider::Twilio => {
            let sid = config
                .account_sid
                .clone()
                .context("messaging.account_sid is required for twilio")?;
            let token = config
                .auth_token
                .clone()
                .context("messaging.auth_token is required for twilio")?;
            let twilio = TwilioConfig::new(sid, token)
                .with_base_url(config.api_base_url.clone())
                .with_send_media(config.send_media);
            Ok(Arc::new(TwilioTransport::new(twilio)?))
        }
    }
}

fn webhook_verification(config: &AppConfig) -> anyhow::Result<Option<WebhookVerification>> {
    if !config.messaging.validate_signatures {
        return Ok(None);
    }
    let token = config
        .messaging
        .auth_token
        .clone()
        .context("messaging.auth_token is required to validate signatures")?;
    Ok(Some(WebhookVerification {
        verifier: TwilioSignatureVerifier::new(token),
        webhook_url: config.reports.webhook_url(),
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
