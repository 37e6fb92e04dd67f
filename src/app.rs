/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool / migrations / AuthService) → Router 組み立て
 * - Middleware の適用 (認可ゲートは api::routes、CORS/HTTP はここ)
 * - axum::serve() で起動
 */
use std::{panic, process, time::Duration};

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error;
use crate::services::auth::build_auth_service;
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,casting_agency=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    info!(
        "starting API in {:?} mode on {}",
        config.app_env, config.addr
    );

    let state = build_state(&config).await?;

    let app = build_router(state);
    let app = middleware::cors::apply(app, &config);
    let app = middleware::http::apply(app, Duration::from_secs(config.request_timeout_seconds));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&db).await?;

    // Signing keys are fetched lazily on the first request that needs them.
    let auth = build_auth_service(config)?;
    info!(
        issuer = %auth.policy().issuer,
        audience = %auth.policy().audience,
        "authorization configured"
    );

    Ok(AppState::new(db, auth))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::routes(&state))
        .fallback(error::not_found)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received Ctrl+C, shutting down"),
        _ = terminate => warn!("received terminate signal, shutting down"),
    }
}
