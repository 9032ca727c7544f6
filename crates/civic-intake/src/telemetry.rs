//! Tracing subscriber setup for hosts embedding the intake core.
//!
//! Environment variables:
//!   LOG_FORMAT  - "json" or "text" (default: "text")
//!   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
//!   RUST_LOG    - standard env filter (default: [`DEFAULT_FILTER`])

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str =
    "civic_intake=info,civic_media=info,civic_store=info,civic_inference=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Anything other than "json" (case-insensitive) is text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|v| Self::parse(&v))
            .unwrap_or(Self::Text)
    }
}

fn ansi_override() -> Option<bool> {
    std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1")
}

/// Install the global subscriber.
///
/// Returns false when a subscriber was already installed (for example by the
/// host application or an earlier test), in which case nothing changes.
pub fn init_tracing() -> bool {
    let format = LogFormat::from_env();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok(),
        LogFormat::Text => {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = ansi_override() {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).try_init().is_ok()
        }
    };

    if installed {
        info!(log_format = ?format, "Logging initialized");
    }
    installed
}
