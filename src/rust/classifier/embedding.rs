use tokenizers::Tokenizer;
use ort::session::Session;
use ndarray::{Array1, Array2, ArrayViewD, Axis};
use ort::value::Tensor;
use image::DynamicImage;
use std::collections::HashMap;

use super::error::ClassifierError;
use super::preprocess::ImagePreprocessor;
use super::utils::normalize_vector;

/// Provides joint image/text embedding using the two CLIP towers.
///
/// The ONNX models are expected to:
/// - text tower: accept `input_ids` (and optionally `attention_mask`), both
///   `[batch_size, sequence_length]`, and output `text_embeds` `[batch_size, embedding_size]`
/// - vision tower: accept `pixel_values` `[batch_size, 3, H, W]` and output
///   `image_embeds` `[batch_size, embedding_size]`
///
/// Both embeddings are L2-normalized so their dot product is the cosine similarity.
pub(crate) trait ClipEmbedding {
    fn tokenizer(&self) -> Option<&Tokenizer>;

    fn text_session(&self) -> Option<&Session>;

    fn vision_session(&self) -> Option<&Session>;

    fn preprocessor(&self) -> Option<&ImagePreprocessor>;

    /// Returns the maximum sequence length the text tower can handle
    fn max_sequence_length(&self) -> Option<usize>;

    /// Converts text into token IDs suitable for the text tower.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized or cannot encode the text
    /// - `ValidationError` if the text is empty or exceeds max_sequence_length
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;
        let max_length = self.max_sequence_length()
            .ok_or_else(|| ClassifierError::TokenizerError("Max sequence length not set".into()))?;

        let encoding = tokenizer.encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        let token_ids = encoding.get_ids();

        if token_ids.len() > max_length {
            return Err(ClassifierError::ValidationError(format!(
                "Phrase too long: {} tokens (max: {})",
                token_ids.len(), max_length
            )));
        }

        Ok(token_ids.to_vec())
    }

    /// Converts a phrase into a normalized embedding vector.
    fn embed_text(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let tokens = self.tokenize(text)?;
        self.get_text_embedding(&tokens)
    }

    /// Runs the text tower on one token sequence.
    ///
    /// # Model Input Format
    /// - input_ids: Token IDs [batch_size=1, sequence_length]
    /// - attention_mask (if the model declares it): all ones, same shape
    fn get_text_embedding(&self, tokens: &[u32]) -> Result<Array1<f32>, ClassifierError> {
        let session = self.text_session()
            .ok_or_else(|| ClassifierError::ModelError("Text session not initialized".into()))?;

        let input_ids = Array2::from_shape_vec((1, tokens.len()),
            tokens.iter().map(|&x| x as i64).collect())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", Tensor::from_array(input_ids)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);

        if session.inputs.iter().any(|input| input.name == "attention_mask") {
            let mask = Array2::<i64>::ones((1, tokens.len()));
            input_tensors.insert("attention_mask", Tensor::from_array(mask)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e)))?);
        }

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run text model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract text output: {}", e)))?;

        first_row(output_tensor)
    }

    /// Runs the vision tower on a decoded image.
    fn embed_image(&self, image: &DynamicImage) -> Result<Array1<f32>, ClassifierError> {
        let session = self.vision_session()
            .ok_or_else(|| ClassifierError::ModelError("Vision session not initialized".into()))?;
        let preprocessor = self.preprocessor()
            .ok_or_else(|| ClassifierError::ModelError("Image preprocessor not initialized".into()))?;

        let pixel_values = preprocessor.preprocess(image)?;
        let input_name = session.inputs.first()
            .map(|input| input.name.as_str())
            .ok_or_else(|| ClassifierError::ModelError("Vision model has no inputs".into()))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(input_name, Tensor::from_array(pixel_values)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create pixel tensor: {}", e)))?);

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run vision model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract vision output: {}", e)))?;

        first_row(output_tensor)
    }
}

/// Takes the batch-0 row of a `[batch, embedding_size]` output and normalizes it.
fn first_row(output: ArrayViewD<'_, f32>) -> Result<Array1<f32>, ClassifierError> {
    if output.ndim() != 2 || output.shape()[0] == 0 {
        return Err(ClassifierError::ModelError(format!(
            "Expected projected embeddings of shape [batch, dim], got {:?}",
            output.shape()
        )));
    }
    let row = output.index_axis(Axis(0), 0);
    let embedding = Array1::from_iter(row.iter().cloned());
    Ok(normalize_vector(&embedding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    #[test]
    fn test_first_row_normalizes() {
        let data = ArrayD::from_shape_vec(vec![1, 2], vec![3.0f32, 4.0]).unwrap();
        let row = first_row(data.view()).unwrap();
        assert!((row[0] - 0.6).abs() < 1e-6);
        assert!((row[1] - 0.8).abs() < 1e-6);
    }

    struct Unloaded;

    impl ClipEmbedding for Unloaded {
        fn tokenizer(&self) -> Option<&Tokenizer> { None }
        fn text_session(&self) -> Option<&Session> { None }
        fn vision_session(&self) -> Option<&Session> { None }
        fn preprocessor(&self) -> Option<&ImagePreprocessor> { None }
        fn max_sequence_length(&self) -> Option<usize> { Some(77) }
    }

    #[test]
    fn test_tokenize_requires_text_and_tokenizer() {
        assert!(matches!(Unloaded.tokenize("   "), Err(ClassifierError::ValidationError(_))));
        assert!(matches!(Unloaded.tokenize("a glass bottle"), Err(ClassifierError::TokenizerError(_))));
        assert!(matches!(Unloaded.embed_text("a glass bottle"), Err(ClassifierError::TokenizerError(_))));
    }

    #[test]
    fn test_first_row_rejects_hidden_states() {
        let data = ArrayD::<f32>::zeros(vec![1, 7, 512]);
        assert!(matches!(first_row(data.view()), Err(ClassifierError::ModelError(_))));
    }
}
