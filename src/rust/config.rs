use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use clap::Parser;

use crate::model_manager::ModelManager;
use crate::runtime::RuntimeConfig;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Command-line and environment configuration for the HTTP server
#[derive(Parser, Debug, Clone)]
#[command(name = "wastesort", author, version, about = "Waste sorting assistant backed by CLIP", long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "WASTESORT_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "WASTESORT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding index.html and the frontend assets
    #[arg(long, env = "WASTESORT_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Root of the model cache (models are stored under `<dir>/models`)
    #[arg(long, env = "WASTESORT_CACHE")]
    pub cache_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads (0 = runtime default)
    #[arg(long, default_value_t = 0)]
    pub intra_threads: usize,

    /// ONNX Runtime inter-op threads (0 = runtime default)
    #[arg(long, default_value_t = 0)]
    pub inter_threads: usize,

    /// Maximum accepted request body size for uploads
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    pub fresh: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default().with_threads(self.inter_threads, self.intra_threads)
    }

    pub fn model_manager(&self) -> std::io::Result<ModelManager> {
        match &self.cache_dir {
            Some(dir) => ModelManager::new(dir.join("models")),
            None => ModelManager::new_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["wastesort"]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(!config.fresh);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "wastesort", "--host", "127.0.0.1", "-p", "9090", "--intra-threads", "4", "--fresh",
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.runtime_config().intra_threads, 4);
        assert!(config.fresh);
    }

    #[test]
    fn test_cache_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::try_parse_from([
            "wastesort", "--cache-dir", dir.path().to_str().unwrap(),
        ])
        .unwrap();
        let manager = config.model_manager().unwrap();
        assert_eq!(manager.models_dir(), dir.path().join("models"));
    }
}
