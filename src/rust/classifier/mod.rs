use image::DynamicImage;

mod error;
mod embedding;
mod classifier;
pub mod builder;
pub mod preprocess;
pub mod utils;

pub use error::ClassifierError;
pub use classifier::ClipClassifier;
pub use builder::ClipClassifierBuilder;
pub use preprocess::ImagePreprocessor;

/// Scores one image against a list of candidate phrases.
///
/// Implementations return one probability per phrase, in the order given,
/// summing to 1. This is the only capability the classification service
/// needs from a model backend.
pub trait ImageTextScorer: Send + Sync {
    fn score(&self, image: &DynamicImage, phrases: &[&str]) -> Result<Vec<f32>, ClassifierError>;
}

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the vision tower ONNX file
    pub vision_model_path: String,
    /// Path to the text tower ONNX file
    pub text_model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Number of phrases with precomputed embeddings
    pub cached_phrases: usize,
    /// Size of the embedding vectors
    pub embedding_size: usize,
}
