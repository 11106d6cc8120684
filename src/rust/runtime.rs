use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::sync::OnceLock;

use crate::classifier::ClassifierError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Threading and graph optimization settings shared by the vision and text sessions.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl RuntimeConfig {
    pub fn with_threads(mut self, inter_threads: usize, intra_threads: usize) -> Self {
        self.inter_threads = inter_threads;
        self.intra_threads = intra_threads;
        self
    }
}

// GraphOptimizationLevel is not Clone in ort 2.0.0-rc.9
fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

/// Initializes the process-wide ONNX Runtime environment once.
/// Later calls return the outcome of the first one.
pub fn ensure_initialized() -> Result<(), ClassifierError> {
    let outcome = INIT.get_or_init(|| {
        ort::init()
            .with_name("wastesort")
            .commit()
            .map(|_| ())
            .map_err(|e| e.to_string())
    });
    init_outcome(outcome)
}

fn init_outcome(outcome: &Result<(), String>) -> Result<(), ClassifierError> {
    outcome.clone().map_err(|e| {
        log::error!("ONNX Runtime environment init failed: {}", e);
        ClassifierError::BuildError(format!("ONNX Runtime init failed: {}", e))
    })
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ClassifierError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_threads() {
        let config = RuntimeConfig::default().with_threads(1, 4);
        assert_eq!(config.inter_threads, 1);
        assert_eq!(config.intra_threads, 4);
        let cloned = config.clone();
        assert_eq!(cloned.intra_threads, 4);
        assert!(matches!(cloned.optimization_level, GraphOptimizationLevel::Level3));
    }

    #[test]
    fn test_failed_init_is_a_build_error() {
        let failed = Err("libonnxruntime.so not found".to_string());
        match init_outcome(&failed) {
            Err(ClassifierError::BuildError(msg)) => assert!(msg.contains("libonnxruntime.so")),
            other => panic!("expected BuildError, got {:?}", other),
        }
        assert!(init_outcome(&Ok(())).is_ok());
    }

    #[test]
    #[ignore = "requires the ONNX Runtime shared library"]
    fn test_session_builder_config() {
        let config = RuntimeConfig {
            inter_threads: 2,
            intra_threads: 2,
            optimization_level: GraphOptimizationLevel::Level1,
        };
        assert!(ensure_initialized().is_ok());
        assert!(create_session_builder(&config).is_ok());
    }
}
