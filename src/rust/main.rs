use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;
use wastesort::server::{self, AppState};
use wastesort::{
    BuiltinModel, ClassificationService, ClipClassifier, ContainerLocator, LabelCatalog,
    ModelManager, ServerConfig,
};

async fn ensure_model_downloaded(manager: &ModelManager, model: BuiltinModel, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }
    manager
        .ensure_model_downloaded(model)
        .await
        .with_context(|| format!("failed to download {:?}", model))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wastesort::init_logger();
    let config = ServerConfig::parse();
    let model = BuiltinModel::ClipVitBasePatch32;

    info!("=== Starting wastesort ===");
    let manager = config.model_manager().context("failed to create model cache directory")?;
    ensure_model_downloaded(&manager, model, config.fresh).await?;

    let start_time = Instant::now();
    let catalog = Arc::new(LabelCatalog::builtin());
    info!("Loading CLIP model and embedding {} catalog phrases...", catalog.len());

    let runtime_config = config.runtime_config();
    let phrases: Vec<String> = catalog.phrases().into_iter().map(String::from).collect();
    let classifier = tokio::task::spawn_blocking(move || {
        ClipClassifier::builder()
            .with_runtime_config(runtime_config)
            .with_model_manager(manager)
            .with_model(model)?
            .with_phrases(phrases)
            .build()
    })
    .await??;
    info!("Model loaded (took {:.2?})", start_time.elapsed());

    let state = AppState {
        classifier: ClassificationService::new(Arc::new(classifier), catalog),
        locator: ContainerLocator::default(),
        static_dir: config.static_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
    };

    server::serve(&config, state).await?;
    Ok(())
}
