use crate::{
    catalog::ModelCatalog, config::Config, model_service::ModelService,
    ort_loader::OrtModelService, server::HttpServer,
};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let catalog: Arc<ModelCatalog> = match ModelCatalog::from_file(&config.catalog.path) {
        Ok(catalog) => {
            tracing::info!("Loaded catalog with {} plants", catalog.len());
            Arc::new(catalog)
        }
        Err(e) => {
            tracing::error!("Failed to load model catalog: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let model_service: Arc<dyn ModelService> = match OrtModelService::from_config(&config.model) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to initialize model service: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let server = HttpServer::new(catalog, model_service, &config.server).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
