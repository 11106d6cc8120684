#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
use wastesort::server::AppState;
use wastesort::{
    ClassificationService, ClassifierError, ContainerLocator, ImageTextScorer, LabelCatalog,
};

/// Deterministic scorer that favors one phrase.
pub struct FavorPhrase(pub &'static str);

impl ImageTextScorer for FavorPhrase {
    fn score(&self, _image: &DynamicImage, phrases: &[&str]) -> Result<Vec<f32>, ClassifierError> {
        if phrases.is_empty() {
            return Err(ClassifierError::ValidationError("Phrase list cannot be empty".into()));
        }
        let rest = if phrases.len() > 1 { 0.25 / (phrases.len() - 1) as f32 } else { 0.0 };
        Ok(phrases
            .iter()
            .map(|p| if *p == self.0 { 0.75 } else { rest })
            .collect())
    }
}

/// Scorer whose backend always fails.
pub struct BrokenModel;

impl ImageTextScorer for BrokenModel {
    fn score(&self, _image: &DynamicImage, _phrases: &[&str]) -> Result<Vec<f32>, ClassifierError> {
        Err(ClassifierError::ModelError("session crashed".into()))
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(16, 12, Rgb([90, 140, 200])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("encode png");
    bytes
}

pub fn service(scorer: impl ImageTextScorer + 'static) -> ClassificationService {
    ClassificationService::new(Arc::new(scorer), Arc::new(LabelCatalog::builtin()))
}

pub fn app_state(scorer: impl ImageTextScorer + 'static, static_dir: &Path) -> AppState {
    AppState {
        classifier: service(scorer),
        locator: ContainerLocator::default(),
        static_dir: static_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
    }
}
