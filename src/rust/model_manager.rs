use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use std::ffi::OsString;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::{BuiltinModel, ModelInfo};

/// Environment variable overriding the model cache location.
pub const CACHE_ENV_VAR: &str = "WASTESORT_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {file_type} file failed with HTTP status {status}")]
    HttpStatus {
        file_type: String,
        status: u16,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// One of the files that make up a CLIP model on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFile {
    Vision,
    Text,
    Tokenizer,
}

impl ModelFile {
    pub const ALL: [ModelFile; 3] = [ModelFile::Vision, ModelFile::Text, ModelFile::Tokenizer];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Vision => "vision_model.onnx",
            Self::Text => "text_model.onnx",
            Self::Tokenizer => "tokenizer.json",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Vision => "vision model",
            Self::Text => "text model",
            Self::Tokenizer => "tokenizer",
        }
    }

    fn url<'a>(&self, info: &'a ModelInfo) -> &'a str {
        match self {
            Self::Vision => &info.vision_url,
            Self::Text => &info.text_url,
            Self::Tokenizer => &info.tokenizer_url,
        }
    }

    fn hash<'a>(&self, info: &'a ModelInfo) -> Option<&'a str> {
        match self {
            Self::Vision => info.vision_hash.as_deref(),
            Self::Text => info.text_hash.as_deref(),
            Self::Tokenizer => info.tokenizer_hash.as_deref(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        Self::models_dir_for(env::var_os(CACHE_ENV_VAR))
    }

    /// Resolves the models directory given the value of `WASTESORT_CACHE`.
    fn models_dir_for(cache_override: Option<OsString>) -> PathBuf {
        if let Some(path) = cache_override.filter(|p| !p.is_empty()) {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("wastesort").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("wastesort").join("models");
        }

        env::temp_dir().join("wastesort").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_file_path(&self, model: BuiltinModel, file: ModelFile) -> PathBuf {
        let info = model.get_model_info();
        self.models_dir.join(info.name).join(file.file_name())
    }

    pub fn get_vision_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.get_file_path(model, ModelFile::Vision)
    }

    pub fn get_text_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.get_file_path(model, ModelFile::Text)
    }

    pub fn get_tokenizer_path(&self, model: BuiltinModel) -> PathBuf {
        self.get_file_path(model, ModelFile::Tokenizer)
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        ModelFile::ALL.iter().all(|file| {
            let path = self.get_file_path(model, *file);
            log::debug!("  {} path: {:?} (exists: {})", file.label(), path, path.exists());
            path.exists()
        })
    }

    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for file in ModelFile::ALL {
            let path = self.get_file_path(model, file);
            let result = match (path.exists(), file.hash(&info)) {
                (true, Some(expected)) => {
                    if self.verify_file(&path, expected)? {
                        log::info!("Existing {} file verified successfully", file.label());
                        Ok(())
                    } else {
                        log::warn!("{} file verification failed, redownloading", file.label());
                        self.download_and_verify_file(file.url(&info), &path, Some(expected), file.label()).await
                    }
                }
                (true, None) => {
                    log::info!("{} file exists at {:?}", file.label(), path);
                    Ok(())
                }
                (false, hash) => {
                    log::info!("{} file does not exist, downloading...", file.label());
                    self.download_and_verify_file(file.url(&info), &path, hash, file.label()).await
                }
            };

            if let Err(e) = result {
                log::error!("Failed to set up {} file: {}", file.label(), e);
                let _ = self.remove_download(model);
                return Err(e);
            }
        }

        log::info!("Model {} ready to use", info.name);
        Ok(())
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: calculated {}, expected {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    /// Checks every file of the model against its pinned hash.
    /// Files without a pinned hash only need to exist.
    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let info = model.get_model_info();

        for file in ModelFile::ALL {
            let path = self.get_file_path(model, file);
            if !path.exists() {
                log::info!("{} file missing at {:?}", file.label(), path);
                return Ok(false);
            }
            match file.hash(&info) {
                Some(expected) => {
                    if !self.verify_file(&path, expected)? {
                        log::warn!("{} hash verification failed", file.label());
                        return Ok(false);
                    }
                }
                None => log::warn!("No pinned hash for {} file, skipping verification", file.label()),
            }
        }

        Ok(true)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::HttpStatus {
                file_type: file_type.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let hash = sha256_hex(&bytes);
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if let Some(expected) = expected_hash {
            if !self.verify_file(path, expected)? {
                return Err(ModelError::VerificationFailed);
            }
        }

        log::info!("{} file downloaded successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        for file in ModelFile::ALL {
            let path = self.get_file_path(model, file);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        log::info!("Checking if model {:?} is downloaded...", model);
        if !self.is_model_downloaded(model) {
            log::info!("Model not found, downloading...");
            self.download_model(model).await?;
        } else if !self.verify_model(model)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(model)?;
            self.download_model(model).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
