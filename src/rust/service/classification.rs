use std::sync::Arc;
use serde::Serialize;

use crate::catalog::{CatalogEntry, ContainerColor, LabelCatalog};
use crate::classifier::utils::argmax;
use crate::classifier::ImageTextScorer;
use super::error::ServiceError;

/// Outcome of classifying one uploaded photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub object_detected: String,
    pub confidence: f32,
    pub waste_type: String,
    pub container_color: ContainerColor,
    pub message: String,
}

/// Decodes an upload, scores it against every catalog phrase and turns the
/// best match into a disposal instruction.
#[derive(Clone)]
pub struct ClassificationService {
    scorer: Arc<dyn ImageTextScorer>,
    catalog: Arc<LabelCatalog>,
}

impl ClassificationService {
    pub fn new(scorer: Arc<dyn ImageTextScorer>, catalog: Arc<LabelCatalog>) -> Self {
        Self { scorer, catalog }
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn classify(&self, bytes: &[u8]) -> Result<ClassificationResult, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::Decode("uploaded file is empty".into()));
        }
        let image = image::load_from_memory(bytes)?;
        log::debug!("Decoded {}x{} image", image.width(), image.height());

        let phrases = self.catalog.phrases();
        let probs = self.scorer.score(&image, &phrases)?;
        if probs.len() != phrases.len() {
            return Err(ServiceError::Internal(format!(
                "scorer returned {} scores for {} phrases",
                probs.len(),
                phrases.len()
            )));
        }

        let best = argmax(&probs)
            .ok_or_else(|| ServiceError::Internal("no valid scores returned".into()))?;
        let entry = self
            .catalog
            .entry(best)
            .ok_or_else(|| ServiceError::Internal(format!("no catalog entry at index {}", best)))?;
        let confidence = probs[best].clamp(0.0, 1.0);

        log::info!(
            "Classified image as '{}' ({}) with confidence {:.3}",
            entry.phrase, entry.color, confidence
        );

        Ok(ClassificationResult {
            object_detected: entry.display_name.clone(),
            confidence,
            waste_type: entry.category.clone(),
            container_color: entry.color,
            message: disposal_message(entry),
        })
    }
}

/// User-facing instruction for a detected object
pub fn disposal_message(entry: &CatalogEntry) -> String {
    if entry.color.is_disposable() {
        format!(
            "He detectado: {}. Va en el contenedor {} ({}).",
            entry.display_name,
            entry.color.spanish_name(),
            entry.category
        )
    } else {
        format!("He detectado: {}. ⚠️ {}", entry.display_name, entry.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierError;
    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
    use std::io::Cursor;

    /// Puts all probability mass on one phrase.
    struct PickPhrase(&'static str);

    impl ImageTextScorer for PickPhrase {
        fn score(&self, _image: &DynamicImage, phrases: &[&str]) -> Result<Vec<f32>, ClassifierError> {
            Ok(phrases.iter().map(|p| if *p == self.0 { 0.9 } else { 0.1 / (phrases.len() - 1) as f32 }).collect())
        }
    }

    struct WrongLength;

    impl ImageTextScorer for WrongLength {
        fn score(&self, _image: &DynamicImage, _phrases: &[&str]) -> Result<Vec<f32>, ClassifierError> {
            Ok(vec![1.0])
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 4, Rgb([200, 10, 10])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png).unwrap();
        bytes
    }

    fn service(scorer: impl ImageTextScorer + 'static) -> ClassificationService {
        ClassificationService::new(Arc::new(scorer), Arc::new(LabelCatalog::builtin()))
    }

    #[test]
    fn test_recyclable_message() {
        let result = service(PickPhrase("plastic bottle")).classify(&png_bytes()).unwrap();
        assert_eq!(result.object_detected, "Botella de plástico");
        assert_eq!(result.container_color, ContainerColor::White);
        assert_eq!(result.waste_type, "Material reciclable");
        assert_eq!(
            result.message,
            "He detectado: Botella de plástico. Va en el contenedor Blanco (Material reciclable)."
        );
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_warning_message() {
        let result = service(PickPhrase("cat")).classify(&png_bytes()).unwrap();
        assert_eq!(result.container_color, ContainerColor::None);
        assert_eq!(result.message, "He detectado: Gato. ⚠️ ¡Es un gato! No lo tires a la basura.");
    }

    #[test]
    fn test_non_image_is_decode_error() {
        let err = service(PickPhrase("cat")).classify(b"definitely not a png").unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
        let err = service(PickPhrase("cat")).classify(&[]).unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }

    #[test]
    fn test_score_length_mismatch_is_internal() {
        let err = service(WrongLength).classify(&png_bytes()).unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
