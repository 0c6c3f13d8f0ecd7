use crate::{
    config::Config, inference_service::InferenceService, model_service::ModelService,
    ort_service::OrtModelService, routes::api_routes,
};
use axum::{extract::DefaultBodyLimit, Router};
use tokio::{net::TcpListener, signal};

pub struct SharedState<M: ModelService> {
    pub inference_service: InferenceService<M>,
}

impl<M: ModelService> Clone for SharedState<M> {
    fn clone(&self) -> Self {
        Self {
            inference_service: self.inference_service.clone(),
        }
    }
}

pub fn build_router<M: ModelService>(
    inference_service: InferenceService<M>,
    max_upload_bytes: usize,
) -> Router {
    let app_state = SharedState { inference_service };

    Router::new()
        .merge(api_routes())
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<M: ModelService>(
        inference_service: InferenceService<M>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let addr = config.server.get_address();
        let router = build_router(inference_service, config.server.max_upload_bytes);
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            "Prediction service listening on {}",
            self.listener.local_addr()?
        );

        let shutdown = async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown")
        };

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let ort_model_service = OrtModelService::new(&config.model).map_err(|e| {
        tracing::error!("Failed to load model: {}", e);
        e
    })?;
    let inference_service = InferenceService::new(ort_model_service, config.model.threshold);

    let server = HttpServer::new(inference_service, &config).await?;
    server.run().await?;

    tracing::info!("Prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
