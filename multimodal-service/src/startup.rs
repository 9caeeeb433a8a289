//! Application startup and lifecycle management.

use crate::config::MultimodalConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::{GenerationProvider, Uploads};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa_swagger_ui::{Config as SwaggerConfig, SwaggerUi};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MultimodalConfig>,
    pub provider: Arc<dyn GenerationProvider>,
    pub uploads: Uploads,
}

/// Build the HTTP router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::index))
        .route("/spec", get(handlers::spec))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/text", post(handlers::generate_text))
        .route("/image", post(handlers::generate_from_image))
        .route("/audio", post(handlers::generate_from_audio))
        .route("/multimodal", post(handlers::generate_from_multimodal));

    if state.config.swagger.enabled {
        app = app.merge(SwaggerUi::new("/api/docs").config(SwaggerConfig::from("/spec")));
    }

    app.layer(DefaultBodyLimit::max(state.config.uploads.max_upload_bytes))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with a Gemini provider from the given configuration.
    pub async fn build(config: MultimodalConfig) -> Result<Self, AppError> {
        let provider = GeminiProvider::new(GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            model: config.gemini.model.clone(),
            api_base: config.gemini.api_base.clone(),
            timeout: Duration::from_secs(config.gemini.timeout_secs),
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(
            model = %provider.model(),
            api_base = %config.gemini.api_base,
            "Initialized Gemini provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_provider(
        config: MultimodalConfig,
        provider: Arc<dyn GenerationProvider>,
    ) -> Result<Self, AppError> {
        let uploads = Uploads::new(config.upload_dir()).await.map_err(|e| {
            tracing::error!(
                "Failed to prepare upload directory {}: {}",
                config.upload_dir().display(),
                e
            );
            AppError::InternalError(anyhow::anyhow!(e))
        })?;

        // Port 0 binds a random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            upload_dir = %uploads.dir().display(),
            swagger = config.swagger.enabled,
            "Multimodal service listening on port {}",
            port
        );

        let state = AppState {
            config: Arc::new(config),
            provider,
            uploads,
        };

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
