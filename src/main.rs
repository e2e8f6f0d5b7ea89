// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alt3r::config::Config;
use alt3r::handlers;
use alt3r::payments::ton::{self, ToncenterGateway};
use alt3r::probe_router;
use alt3r::session::Sessions;
use alt3r::state::AppState;
use alt3r::store::PgProfileStore;
use alt3r::telegram::TelegramApi;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Seconds between TON chain verification passes.
const TON_SWEEP_SECS: u64 = 60;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    let api = Arc::new(TelegramApi::new(&config.telegram_bot_token));
    let state = AppState {
        store: Arc::new(PgProfileStore::new(pool)),
        transport: api.clone(),
        sessions: Sessions::new(),
        config: config.clone(),
    };

    // Liveness probe for the hosting platform.
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Probe listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind probe listener");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, probe_router()).await {
            tracing::error!("Probe server stopped: {}", e);
        }
    });

    if !config.ton_wallet.is_empty() {
        tokio::spawn(ton_sweep_loop(state.clone()));
    } else {
        tracing::info!("TON_WALLET not set, chain verification disabled");
    }

    tracing::info!("Polling for updates...");
    let mut offset = 0i64;
    loop {
        match api.poll_updates(&mut offset).await {
            Ok(events) => {
                for event in events {
                    handlers::handle_event_with_retry(&state, event).await;
                }
            }
            Err(e) => {
                tracing::warn!("Update poll failed, backing off: {}", e);
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
    }
}

/// Periodically settles pending TON donations against the wallet's
/// recent transactions and thanks confirmed donors.
async fn ton_sweep_loop(state: AppState) {
    let gateway = ToncenterGateway::new(
        state.config.ton_wallet.clone(),
        state.config.ton_api_key.clone(),
        state.config.ton_testnet,
    );
    let mut interval = tokio::time::interval(Duration::from_secs(TON_SWEEP_SECS));
    loop {
        interval.tick().await;
        match ton::verify_pending(state.store.as_ref(), &gateway).await {
            Ok(completed) => {
                for user_id in completed {
                    if let Ok(Some(user)) = state.store.get(user_id).await {
                        let _ = state
                            .transport
                            .send_message(
                                user.user_id,
                                alt3r::i18n::tr(user.language, "payment_thanks"),
                                None,
                            )
                            .await;
                    }
                }
            }
            Err(e) => tracing::warn!("TON verification pass failed: {}", e),
        }
    }
}
