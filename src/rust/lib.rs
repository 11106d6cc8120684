//! Zero-shot waste sorting: classify a photo of an object into the disposal
//! container it belongs in, using CLIP image/text similarity over a fixed
//! catalog of household items.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use wastesort::{BuiltinModel, ClassificationService, ClipClassifier, LabelCatalog};
//!
//! let catalog = Arc::new(LabelCatalog::builtin());
//! let classifier = ClipClassifier::builder()
//!     .with_model(BuiltinModel::ClipVitBasePatch32)?
//!     .with_phrases(catalog.phrases())
//!     .build()?;
//!
//! let service = ClassificationService::new(Arc::new(classifier), catalog);
//! let result = service.classify(&std::fs::read("bottle.jpg")?)?;
//! println!("{}", result.message);
//! # Ok(())
//! # }
//! ```
//!
//! The classifier only needs to implement [`ImageTextScorer`], so the model
//! backend can be replaced without touching the service or the HTTP layer.

pub mod catalog;
pub mod classifier;
pub mod config;
mod runtime;
pub mod model_manager;
pub mod models;
pub mod server;
pub mod service;

pub use catalog::{CatalogEntry, ContainerColor, LabelCatalog};
pub use classifier::{ClassifierError, ClassifierInfo, ClipClassifier, ClipClassifierBuilder, ImageTextScorer};
pub use config::ServerConfig;
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use service::{ClassificationResult, ClassificationService, ContainerLocator, GeoPoint, MockContainer, ServiceError};

/// Default log filter; keeps ONNX Runtime and tokenizer chatter down.
pub const DEFAULT_LOG_FILTER: &str = "info,ort=warn,tokenizers=warn";

/// Installs env_logger, honoring `RUST_LOG` when set.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();
}
