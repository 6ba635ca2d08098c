//! Ward REST API server binary.
//!
//! ## Purpose
//! Serves the patient record API over HTTP with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! Records persist to the in-process [`MemoryStore`]; deployments pointing at
//! a hosted relational service swap in their own
//! [`QueryClient`](ward_core::store::QueryClient) when building the context.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use ward_core::attachments::{AttachmentStore, DirAttachmentStore};
use ward_core::numbers::DailySequenceSource;
use ward_core::store::MemoryStore;
use ward_core::{CoreContext, RetryPolicy};

/// Main entry point for the Ward REST API server
///
/// Starts the REST API server on the configured address (default:
/// 0.0.0.0:3000) and serves until interrupted.
///
/// # Environment Variables
/// - `WARD_HTTP_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `WARD_ATTACHMENT_DIR`: Directory attachment files are written under
///   (default: "ward-attachments")
/// - `RUST_LOG`: Tracing filter directives
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("ward_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("WARD_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let attachment_dir =
        std::env::var("WARD_ATTACHMENT_DIR").unwrap_or_else(|_| "ward-attachments".into());

    tracing::info!("-- Starting Ward REST API on {}", addr);
    tracing::info!("-- Attachments stored under {}", attachment_dir);

    let ctx = Arc::new(CoreContext::new(
        Arc::new(MemoryStore::new()),
        Arc::new(DailySequenceSource::new()),
        RetryPolicy::default(),
    ));
    let attachments: Arc<dyn AttachmentStore> = Arc::new(DirAttachmentStore::new(&attachment_dir));
    let state = AppState::new(ctx, attachments);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for the shutdown signal: {err}");
        return;
    }
    tracing::info!("-- Shutting down");
}
