//! draftauth server binary.
//!
//! Main application entry point that configures the OAuth draft authorization server
//! with the in-memory backend and starts the HTTP server with graceful shutdown.

use anyhow::Result;
use draftauth::{
    config::Config,
    errors::ConfigError,
    http::{AppEngine, AppState, build_router},
    storage::{
        MemoryGrantVerifier, SeedData, StorageBackend, create_storage_backend,
        traits::{AccessTokenStore, AuthorizationCodeStore, OAuthStorage, RefreshTokenStore},
    },
    templates::build_env,
};
use std::{env, sync::Arc};

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "draftauth=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = draftauth::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting draftauth");

    let config = Config::new()?;
    let settings = config.oauth_settings();

    let template_env = AppEngine::from(build_env(settings.realm.clone())?);

    let storage = create_storage_backend(StorageBackend::Memory);

    // Seed clients and grant verifier data
    let seed = match config.seed_file {
        Some(ref seed_file) => {
            let contents = tokio::fs::read_to_string(seed_file)
                .await
                .map_err(|e| ConfigError::SeedLoadFailed(seed_file.clone(), e.to_string()))?;
            let seed = SeedData::from_json(&contents)
                .map_err(|e| ConfigError::SeedLoadFailed(seed_file.clone(), e.to_string()))?;
            let clients = storage.seed(&seed).await?;
            tracing::info!(?seed_file, clients, "Loaded seed data");
            seed
        }
        None => {
            tracing::warn!("SEED_FILE not set, starting without registered clients");
            SeedData::default()
        }
    };
    let verifier = Arc::new(MemoryGrantVerifier::from_seed(&seed));

    tracing::info!(
        grant_types = ?settings.supported_grant_types,
        realm = %settings.realm,
        "OAuth settings"
    );

    let oauth_storage: Arc<dyn OAuthStorage> = storage.clone();
    let app_context = AppState::new(oauth_storage, verifier, settings, template_env);

    // Build the router
    let app = build_router(app_context);

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut terminate) => {
                    terminate.recv().await;
                }
                Err(err) => {
                    tracing::error!("failed to install signal handler: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    // Periodically drop expired codes and tokens
    {
        let inner_token = token.clone();
        let cleanup_storage = storage.clone();
        tracker.spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                tokio::select! {
                    () = inner_token.cancelled() => break,
                    _ = interval.tick() => {
                        let codes = cleanup_storage.cleanup_expired_codes().await;
                        let tokens = cleanup_storage.cleanup_expired_tokens().await;
                        let refresh_tokens = cleanup_storage.cleanup_expired_refresh_tokens().await;
                        match (codes, tokens, refresh_tokens) {
                            (Ok(codes), Ok(tokens), Ok(refresh_tokens)) => {
                                tracing::debug!(codes, tokens, refresh_tokens, "expired entries removed");
                            }
                            (codes, tokens, refresh_tokens) => {
                                tracing::error!(?codes, ?tokens, ?refresh_tokens, "cleanup failed");
                            }
                        }
                    }
                }
            }
        });
    }

    // Start HTTP server
    {
        let http_port = *config.http_port.as_ref();
        let inner_token = token.clone();
        let bind_address = format!("0.0.0.0:{http_port}");
        tracing::info!("Starting server on {bind_address}");
        let listener = TcpListener::bind(&bind_address).await?;

        tracker.spawn(async move {
            let shutdown_token = inner_token.clone();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    tokio::select! {
                        () = shutdown_token.cancelled() => { }
                    }
                    tracing::info!("axum graceful shutdown complete");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("axum task failed: {}", err);
            }

            inner_token.cancel();
        });
    }

    tracker.wait().await;

    Ok(())
}
