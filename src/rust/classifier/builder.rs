use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use ort::session::Session;
use log::{info, warn, error};

use super::error::ClassifierError;
use super::embedding::ClipEmbedding;
use super::classifier::ClipClassifier;
use super::preprocess::ImagePreprocessor;
use crate::{BuiltinModel, ModelCharacteristics, ModelManager, runtime::{RuntimeConfig, create_session_builder}};

/// A builder for constructing a ClipClassifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClipClassifierBuilder {
    vision_model_path: Option<String>,
    text_model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    vision_session: Option<Session>,
    text_session: Option<Session>,
    preprocessor: Option<ImagePreprocessor>,
    phrases: Vec<String>,
    model_characteristics: Option<ModelCharacteristics>,
    model_manager: Option<ModelManager>,
    runtime_config: RuntimeConfig,
}

impl ClipEmbedding for ClipClassifierBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn text_session(&self) -> Option<&Session> {
        self.text_session.as_ref()
    }

    fn vision_session(&self) -> Option<&Session> {
        self.vision_session.as_ref()
    }

    fn preprocessor(&self) -> Option<&ImagePreprocessor> {
        self.preprocessor.as_ref()
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.model_characteristics.as_ref().map(|c| c.max_sequence_length)
    }
}

impl ClipClassifierBuilder {
    /// Creates a new empty builder with the default runtime configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Uses the given model manager to locate built-in model files instead of
    /// the default cache directory
    pub fn with_model_manager(mut self, manager: ModelManager) -> Self {
        self.model_manager = Some(manager);
        self
    }

    /// Phrases whose embeddings are computed at build time
    pub fn with_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phrases.extend(phrases.into_iter().map(Into::into));
        self
    }

    /// Loads a built-in model from the model cache.
    ///
    /// # Errors
    /// - `BuildError` if a model is already set or the model isn't downloaded
    /// - `BuildError` / `ModelError` if loading or validating the sessions fails
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.vision_model_path.is_some() {
            return Err(ClassifierError::BuildError("Model paths already set".to_string()));
        }

        let manager = match self.model_manager.clone() {
            Some(manager) => manager,
            None => ModelManager::new_default()
                .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?,
        };

        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let vision_path = manager.get_vision_model_path(model);
        let text_path = manager.get_text_model_path(model);
        let tokenizer_path = manager.get_tokenizer_path(model);

        self.load(&vision_path, &text_path, &tokenizer_path)?;
        self.model_characteristics = Some(model.characteristics());
        self.preprocessor = Some(ImagePreprocessor::clip(model.characteristics().image_size)?);
        Ok(self)
    }

    /// Loads CLIP towers and tokenizer from custom paths.
    ///
    /// The embedding size is inferred by running a probe phrase through the
    /// text tower; the other characteristics default to CLIP ViT-B/32 values.
    pub fn with_custom_model(
        mut self,
        vision_model_path: &str,
        text_model_path: &str,
        tokenizer_path: &str,
    ) -> Result<Self, ClassifierError> {
        if vision_model_path.is_empty() || text_model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths cannot be empty".to_string()));
        }
        if self.vision_model_path.is_some() {
            return Err(ClassifierError::BuildError("Model paths already set".to_string()));
        }
        for path in [vision_model_path, text_model_path, tokenizer_path] {
            if !Path::new(path).exists() {
                return Err(ClassifierError::BuildError(format!("File not found: {}", path)));
            }
        }

        self.load(Path::new(vision_model_path), Path::new(text_model_path), Path::new(tokenizer_path))?;

        let defaults = BuiltinModel::ClipVitBasePatch32.characteristics();
        self.model_characteristics = Some(defaults.clone());
        self.preprocessor = Some(ImagePreprocessor::clip(defaults.image_size)?);

        let embedding_size = self.embed_text("a photo")?.len();
        info!("Inferred embedding size from model: {}", embedding_size);
        self.model_characteristics = Some(ModelCharacteristics {
            embedding_size,
            model_size_mb: 0,
            ..defaults
        });
        Ok(self)
    }

    fn load(&mut self, vision_path: &Path, text_path: &Path, tokenizer_path: &Path) -> Result<(), ClassifierError> {
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
            })?;
        info!("Tokenizer loaded from {:?}", tokenizer_path);

        let vision_session = create_session_builder(&self.runtime_config)?
            .commit_from_file(vision_path)?;
        Self::validate_vision_model(&vision_session)?;
        info!("Vision model loaded from {:?}", vision_path);

        let text_session = create_session_builder(&self.runtime_config)?
            .commit_from_file(text_path)?;
        Self::validate_text_model(&text_session)?;
        info!("Text model loaded from {:?}", text_path);

        self.vision_model_path = Some(vision_path.to_string_lossy().to_string());
        self.text_model_path = Some(text_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.vision_session = Some(vision_session);
        self.text_session = Some(text_session);
        Ok(())
    }

    /// Builds the classifier, embedding every registered phrase.
    ///
    /// # Errors
    /// - `BuildError` if no model has been loaded
    /// - `ValidationError` if a phrase is empty or too long
    /// - any error raised while embedding a phrase
    pub fn build(mut self) -> Result<ClipClassifier, ClassifierError> {
        let model_characteristics = self.model_characteristics
            .clone()
            .ok_or_else(|| ClassifierError::BuildError("Model must be set before building".to_string()))?;

        let mut embedded_phrases = HashMap::with_capacity(self.phrases.len());
        for phrase in &self.phrases {
            if embedded_phrases.contains_key(phrase) {
                warn!("Phrase '{}' registered more than once", phrase);
                continue;
            }
            let embedding = self.embed_text(phrase).map_err(|e| {
                error!("Failed to embed phrase '{}': {}", phrase, e);
                e
            })?;
            embedded_phrases.insert(phrase.clone(), embedding);
        }
        info!("Cached embeddings for {} phrases", embedded_phrases.len());

        let missing = |what: &str| ClassifierError::BuildError(format!("No {} loaded", what));
        Ok(ClipClassifier {
            vision_model_path: self.vision_model_path.take().ok_or_else(|| missing("vision model path"))?,
            text_model_path: self.text_model_path.take().ok_or_else(|| missing("text model path"))?,
            tokenizer_path: self.tokenizer_path.take().ok_or_else(|| missing("tokenizer path"))?,
            tokenizer: Arc::new(self.tokenizer.take().ok_or_else(|| missing("tokenizer"))?),
            vision_session: Arc::new(self.vision_session.take().ok_or_else(|| missing("vision model"))?),
            text_session: Arc::new(self.text_session.take().ok_or_else(|| missing("text model"))?),
            preprocessor: self.preprocessor.take().ok_or_else(|| missing("image preprocessor"))?,
            embedded_phrases: Arc::new(embedded_phrases),
            model_characteristics,
        })
    }

    fn validate_vision_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Vision model must have a pixel_values input".to_string()
            ));
        }
        Self::validate_outputs(session, "image_embeds")
    }

    fn validate_text_model(session: &Session) -> Result<(), ClassifierError> {
        if !session.inputs.iter().any(|input| input.name == "input_ids") {
            return Err(ClassifierError::ModelError(
                "Text model must have an input_ids input".to_string()
            ));
        }
        Self::validate_outputs(session, "text_embeds")
    }

    fn validate_outputs(session: &Session, expected: &str) -> Result<(), ClassifierError> {
        let first = session.outputs.first().ok_or_else(|| {
            ClassifierError::ModelError("Model must have at least 1 output for embeddings".to_string())
        })?;
        if first.name != expected {
            warn!("First model output is '{}', expected '{}'", first.name, expected);
        }
        Ok(())
    }
}
