/// Represents the available built-in models in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// OpenAI CLIP ViT-B/32, exported to ONNX as separate vision and text towers
    ///
    /// Characteristics:
    /// - Embedding size: 512
    /// - Image size: 224x224
    /// - Max sequence length: 77
    /// - Size: ~600MB (both towers)
    ClipVitBasePatch32,
}

/// Characteristics of a model including its capabilities and requirements
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCharacteristics {
    /// Size of the joint image/text embedding space
    pub embedding_size: usize,
    /// Side length of the square image the vision tower expects
    pub image_size: u32,
    /// Maximum token sequence length the text tower can handle
    pub max_sequence_length: usize,
    /// Multiplier applied to cosine similarities before softmax
    pub logit_scale: f32,
    /// Approximate size of the model in memory
    pub model_size_mb: usize,
}

/// Where to fetch a model's files from and how to verify them.
///
/// Hashes are optional: a `None` hash means the file is accepted as
/// downloaded, and the model manager logs that it could not be verified.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub vision_url: String,
    pub vision_hash: Option<String>,
    pub text_url: String,
    pub text_hash: Option<String>,
    pub tokenizer_url: String,
    pub tokenizer_hash: Option<String>,
}

const CLIP_B32_REPO: &str = "https://huggingface.co/Xenova/clip-vit-base-patch32/resolve/main";

impl BuiltinModel {
    /// Get the characteristics of the model
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::ClipVitBasePatch32 => ModelCharacteristics {
                embedding_size: 512,
                image_size: 224,
                max_sequence_length: 77,
                logit_scale: 100.0,
                model_size_mb: 600,
            },
        }
    }

    /// Get download locations for the model's files
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::ClipVitBasePatch32 => ModelInfo {
                name: "clip-vit-base-patch32".to_string(),
                vision_url: format!("{}/onnx/vision_model.onnx", CLIP_B32_REPO),
                vision_hash: None,
                text_url: format!("{}/onnx/text_model.onnx", CLIP_B32_REPO),
                text_hash: None,
                tokenizer_url: format!("{}/tokenizer.json", CLIP_B32_REPO),
                tokenizer_hash: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_characteristics() {
        let c = BuiltinModel::ClipVitBasePatch32.characteristics();
        assert_eq!(c.embedding_size, 512);
        assert_eq!(c.image_size, 224);
        assert_eq!(c.max_sequence_length, 77);
    }

    #[test]
    fn test_model_info_urls() {
        let info = BuiltinModel::ClipVitBasePatch32.get_model_info();
        assert!(info.vision_url.ends_with("vision_model.onnx"));
        assert!(info.text_url.ends_with("text_model.onnx"));
        assert!(info.tokenizer_url.ends_with("tokenizer.json"));
    }
}
