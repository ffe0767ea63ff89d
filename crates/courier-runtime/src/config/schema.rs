//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;

use courier_core::{MediatorBuilder, PipelineOptions, PublishStrategyKind};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Mediator behaviour.
    #[serde(default)]
    pub mediator: MediatorConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CourierConfig {
    /// Returns a [`MediatorBuilder`] preconfigured from the `mediator` section.
    ///
    /// The caller still supplies the registry.
    pub fn mediator_builder(&self) -> MediatorBuilder {
        self.mediator.builder()
    }
}

// =============================================================================
// Mediator
// =============================================================================

/// Mediator settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediatorConfig {
    /// Strategy used by `publish` when none is given explicitly.
    #[serde(default)]
    pub publish_strategy: PublishStrategyKind,

    /// Which built-in pipeline stages are composed.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl MediatorConfig {
    /// Creates a builder carrying these settings.
    pub fn builder(&self) -> MediatorBuilder {
        MediatorBuilder::default()
            .pipeline(self.pipeline.into())
            .publish_strategy_kind(self.publish_strategy)
    }
}

/// Built-in pipeline stage switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_enabled")]
    pub exception_handling: bool,

    #[serde(default = "default_enabled")]
    pub pre_processing: bool,

    #[serde(default = "default_enabled")]
    pub post_processing: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            exception_handling: true,
            pre_processing: true,
            post_processing: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

impl From<PipelineConfig> for PipelineOptions {
    fn from(config: PipelineConfig) -> Self {
        PipelineOptions {
            exception_handling: config.exception_handling,
            pre_processing: config.pre_processing,
            post_processing: config.post_processing,
        }
    }
}

impl From<PipelineOptions> for PipelineConfig {
    fn from(options: PipelineOptions) -> Self {
        PipelineConfig {
            exception_handling: options.exception_handling,
            pre_processing: options.pre_processing,
            post_processing: options.post_processing,
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings consumed by [`crate::logging::init_from_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global level, overridden by `RUST_LOG` when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Include thread ids in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number in each line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-target levels, e.g. `courier_core = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
            span_events: SpanEventConfig::default(),
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the matching `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON. Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
