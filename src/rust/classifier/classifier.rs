use std::sync::Arc;
use std::collections::HashMap;
use ort::session::Session;
use tokenizers::Tokenizer;
use ndarray::Array1;
use image::DynamicImage;

use super::error::ClassifierError;
use super::embedding::ClipEmbedding;
use super::preprocess::ImagePreprocessor;
use super::utils::softmax;
use super::ImageTextScorer;
use crate::ModelCharacteristics;

/// A thread-safe zero-shot image classifier backed by CLIP ONNX models.
///
/// Phrase embeddings passed to the builder are computed once and cached;
/// scoring an image against cached phrases costs a single vision-tower run.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use wastesort::{BuiltinModel, ClipClassifier, ImageTextScorer};
///
/// let classifier = ClipClassifier::builder()
///     .with_model(BuiltinModel::ClipVitBasePatch32)?
///     .with_phrases(["a cat", "a dog"])
///     .build()?;
///
/// let image = image::open("cat.jpg")?;
/// let probs = classifier.score(&image, &["a cat", "a dog"])?;
/// println!("cat: {:.2}", probs[0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ClipClassifier {
    pub vision_model_path: String,
    pub text_model_path: String,
    pub tokenizer_path: String,
    pub tokenizer: Arc<Tokenizer>,
    pub vision_session: Arc<Session>,
    pub text_session: Arc<Session>,
    pub preprocessor: ImagePreprocessor,
    pub embedded_phrases: Arc<HashMap<String, Array1<f32>>>,
    pub model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClipClassifier>();
    }
};

impl ClipEmbedding for ClipClassifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn text_session(&self) -> Option<&Session> {
        Some(&self.text_session)
    }

    fn vision_session(&self) -> Option<&Session> {
        Some(&self.vision_session)
    }

    fn preprocessor(&self) -> Option<&ImagePreprocessor> {
        Some(&self.preprocessor)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.model_characteristics.max_sequence_length)
    }
}

impl ClipClassifier {
    /// Creates a new ClipClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClipClassifierBuilder {
        super::builder::ClipClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            vision_model_path: self.vision_model_path.clone(),
            text_model_path: self.text_model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            cached_phrases: self.embedded_phrases.len(),
            embedding_size: self.model_characteristics.embedding_size,
        }
    }

    /// Embedding for a phrase, from the cache when available
    fn phrase_embedding(&self, phrase: &str) -> Result<Array1<f32>, ClassifierError> {
        match self.embedded_phrases.get(phrase) {
            Some(embedding) => Ok(embedding.clone()),
            None => {
                log::debug!("Phrase '{}' not cached, embedding on demand", phrase);
                self.embed_text(phrase)
            }
        }
    }
}

impl ImageTextScorer for ClipClassifier {
    fn score(&self, image: &DynamicImage, phrases: &[&str]) -> Result<Vec<f32>, ClassifierError> {
        if phrases.is_empty() {
            return Err(ClassifierError::ValidationError("Phrase list cannot be empty".into()));
        }

        let image_vector = self.embed_image(image)?;
        let scale = self.model_characteristics.logit_scale;

        let logits = phrases
            .iter()
            .map(|phrase| {
                let text_vector = self.phrase_embedding(phrase)?;
                Ok(scale * image_vector.dot(&text_vector))
            })
            .collect::<Result<Vec<f32>, ClassifierError>>()?;

        Ok(softmax(&logits))
    }
}
