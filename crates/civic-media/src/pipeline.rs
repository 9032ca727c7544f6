//! The image ingestion pipeline.
//!
//! Tries each strategy in order and returns the first output that validates.
//! Any strategy error, validation failure or timeout moves on to the next
//! strategy; only exhausting the chain is an error.

use std::sync::Arc;
use std::time::Instant;

use civic_core::{validate_image_upload, Error, Result};
use tracing::{debug, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::MediaError;
use crate::object_url::ObjectUrlRegistry;
use crate::strategy::{default_strategies, ImageStrategy, StrategyContext, StrategyOutput};
use crate::types::{ImageFile, ProcessedImage, StrategyFailure};
use crate::validate::ImageValidator;

/// Turns picked files into displayable, validated images.
pub struct ImagePipeline {
    ctx: StrategyContext,
    validator: ImageValidator,
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl ImagePipeline {
    /// Pipeline with the default strategy chain.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_strategies(config, default_strategies())
    }

    /// Pipeline with the default chain and config read from the environment.
    pub fn from_env() -> Self {
        Self::new(PipelineConfig::from_env())
    }

    /// Pipeline with a custom strategy chain, tried in the given order.
    pub fn with_strategies(config: PipelineConfig, strategies: Vec<Box<dyn ImageStrategy>>) -> Self {
        let registry = ObjectUrlRegistry::new();
        Self {
            validator: ImageValidator::new(Arc::clone(&registry)),
            ctx: StrategyContext { config, registry },
            strategies,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.ctx.config
    }

    /// Session registry backing any object urls this pipeline hands out.
    pub fn registry(&self) -> &Arc<ObjectUrlRegistry> {
        &self.ctx.registry
    }

    /// Produce a validated image for `file`.
    ///
    /// Type and size are checked before any strategy runs. On success every
    /// object url created by rejected attempts has been revoked; an accepted
    /// object url stays live for the session.
    #[instrument(
        skip(self, file),
        fields(subsystem = "media", component = "pipeline", op = "process_image", filename = %file.name, file_size = file.size())
    )]
    pub async fn process_image(&self, file: &ImageFile) -> Result<ProcessedImage> {
        let start = Instant::now();
        validate_image_upload(
            &file.name,
            &file.mime_type,
            file.size(),
            self.ctx.config.max_file_size,
        )?;

        let mut failures = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let method = strategy.method();
            debug!(strategy = %method, "Trying strategy");

            let limit = self.ctx.config.strategy_timeout;
            let outcome = match tokio::time::timeout(limit, strategy.produce(file, &self.ctx)).await {
                Ok(Ok(output)) => self.accept(output).await,
                Ok(Err(e)) => Err(e),
                Err(_) => Err(MediaError::Timeout(limit.as_millis() as u64)),
            };

            match outcome {
                Ok(image) => {
                    info!(
                        strategy = %method,
                        width = image.width,
                        height = image.height,
                        url_len = image.url.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Image processed"
                    );
                    return Ok(image);
                }
                Err(e) => {
                    warn!(strategy = %method, error = %e, "Strategy failed, falling back");
                    failures.push(StrategyFailure {
                        method,
                        reason: e.to_string(),
                    });
                }
            }
        }

        warn!(
            attempts = failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "All image strategies failed"
        );
        Err(Error::ProcessingFailed {
            filename: file.name.clone(),
            reasons: failures.iter().map(ToString::to_string).collect(),
        })
    }

    /// Validate a candidate. The reference, if any, is kept only on success.
    async fn accept(
        &self,
        output: StrategyOutput,
    ) -> std::result::Result<ProcessedImage, MediaError> {
        let StrategyOutput {
            mut image,
            reference,
        } = output;
        let (width, height) = self
            .validator
            .validate(&image.url, self.ctx.config.validation_timeout)
            .await?;
        image.width = width;
        image.height = height;
        if let Some(guard) = reference {
            image.url = guard.keep();
        }
        Ok(image)
    }
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("config", &self.ctx.config)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.method()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
