//! Image pipeline configuration.

use std::time::Duration;

use civic_core::defaults;
use tracing::debug;

/// Tunables for the image ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longest side after the resizing canvas strategy.
    pub max_dimension: u32,
    /// JPEG quality (1-100) for canvas re-encodes.
    pub jpeg_quality: u8,
    /// Upload ceiling in bytes.
    pub max_file_size: usize,
    /// Bound on validating one strategy's output.
    pub validation_timeout: Duration,
    /// Bound on a single canvas draw + encode.
    pub canvas_timeout: Duration,
    /// Bound on any one strategy producing its candidate.
    pub strategy_timeout: Duration,
    /// Canvas output shorter than this is rejected.
    pub min_canvas_output_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dimension: defaults::IMAGE_MAX_DIMENSION,
            jpeg_quality: defaults::JPEG_QUALITY,
            max_file_size: defaults::MAX_IMAGE_FILE_SIZE,
            validation_timeout: Duration::from_millis(defaults::IMAGE_VALIDATION_TIMEOUT_MS),
            canvas_timeout: Duration::from_secs(10),
            strategy_timeout: Duration::from_millis(defaults::IMAGE_STRATEGY_TIMEOUT_MS),
            min_canvas_output_len: defaults::MIN_CANVAS_OUTPUT_LEN,
        }
    }
}

impl PipelineConfig {
    /// Create from environment variables, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let base = Self::default();
        let config = Self {
            max_dimension: env_parse(defaults::ENV_IMAGE_MAX_DIMENSION)
                .filter(|d| *d > 0)
                .unwrap_or(base.max_dimension),
            jpeg_quality: env_parse::<u8>(defaults::ENV_IMAGE_JPEG_QUALITY)
                .map(|q| q.clamp(1, 100))
                .unwrap_or(base.jpeg_quality),
            max_file_size: env_parse(defaults::ENV_IMAGE_MAX_FILE_SIZE)
                .unwrap_or(base.max_file_size),
            validation_timeout: env_parse(defaults::ENV_IMAGE_VALIDATION_TIMEOUT_MS)
                .map(Duration::from_millis)
                .unwrap_or(base.validation_timeout),
            ..base
        };
        debug!(
            subsystem = "media",
            component = "pipeline",
            max_dimension = config.max_dimension,
            jpeg_quality = config.jpeg_quality,
            max_file_size = config.max_file_size,
            validation_timeout_ms = config.validation_timeout.as_millis() as u64,
            "Loaded image pipeline config"
        );
        config
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    pub fn with_canvas_timeout(mut self, timeout: Duration) -> Self {
        self.canvas_timeout = timeout;
        self
    }

    pub fn with_strategy_timeout(mut self, timeout: Duration) -> Self {
        self.strategy_timeout = timeout;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_dimension, 1200);
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.validation_timeout, Duration::from_secs(3));
        assert_eq!(config.min_canvas_output_len, 1000);
        assert_eq!(config.strategy_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::default()
            .with_max_dimension(800)
            .with_validation_timeout(Duration::from_secs(30));
        assert_eq!(config.max_dimension, 800);
        assert_eq!(config.validation_timeout, Duration::from_secs(30));
    }
}
