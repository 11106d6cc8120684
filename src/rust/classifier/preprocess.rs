//! Image preprocessing for the CLIP vision tower.
//!
//! Matches the reference CLIP pipeline: shortest side resized to the model
//! resolution with bicubic filtering, a centered square crop, and per-channel
//! normalization into a `[1, 3, H, W]` tensor.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;

use super::error::ClassifierError;

pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    size: u32,
    /// Per-channel multiplier (scale / std)
    alpha: [f32; 3],
    /// Per-channel offset (-mean / std)
    beta: [f32; 3],
}

impl ImagePreprocessor {
    pub fn new(size: u32, mean: [f32; 3], std: [f32; 3]) -> Result<Self, ClassifierError> {
        if size == 0 {
            return Err(ClassifierError::ValidationError("Image size must be greater than 0".into()));
        }
        if let Some(i) = std.iter().position(|&s| s <= 0.0 || !s.is_finite()) {
            return Err(ClassifierError::ValidationError(format!(
                "Standard deviation at index {} must be a positive number, got {}",
                i, std[i]
            )));
        }
        let scale = 1.0 / 255.0;
        let alpha = [scale / std[0], scale / std[1], scale / std[2]];
        let beta = [-mean[0] / std[0], -mean[1] / std[1], -mean[2] / std[2]];
        Ok(Self { size, alpha, beta })
    }

    pub fn clip(size: u32) -> Result<Self, ClassifierError> {
        Self::new(size, CLIP_MEAN, CLIP_STD)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Resizes the shortest side to `size` and takes the centered square.
    pub fn resize_and_crop(&self, image: &DynamicImage) -> Result<RgbImage, ClassifierError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ClassifierError::ValidationError("Image has zero width or height".into()));
        }

        let short = width.min(height) as f64;
        let ratio = self.size as f64 / short;
        let new_w = ((width as f64 * ratio).round() as u32).max(self.size);
        let new_h = ((height as f64 * ratio).round() as u32).max(self.size);

        let resized = image.to_rgb8();
        let resized = imageops::resize(&resized, new_w, new_h, FilterType::CatmullRom);

        let x = (new_w - self.size) / 2;
        let y = (new_h - self.size) / 2;
        Ok(imageops::crop_imm(&resized, x, y, self.size, self.size).to_image())
    }

    /// Produces the normalized `[1, 3, size, size]` pixel tensor.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>, ClassifierError> {
        let cropped = self.resize_and_crop(image)?;
        let side = self.size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));

        for (x, y, pixel) in cropped.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] =
                    pixel[c] as f32 * self.alpha[c] + self.beta[c];
            }
        }

        Ok(tensor)
    }
}
