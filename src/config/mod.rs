//! Environment-backed configuration.
//!
//! Every setting has a default except the query. Override with `RESEMBLE_*`
//! environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::classifier::DecisionRule;
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_DISTANCE_HIGH, DEFAULT_DISTANCE_LOW, DEFAULT_EMBEDDING_URL,
    DEFAULT_GENERATIVE_URL, DEFAULT_RELATED_URL, DEFAULT_TOP_K, DEFAULT_UNIT_CONCURRENCY,
    DEFAULT_YES_THRESHOLD,
};
use crate::gateway::{GatewayConfig, ModelKind, RelatednessThresholds};
use crate::pipeline::PipelineSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which embedding-tier decision rule to use.
pub enum DecisionRuleKind {
    Ternary,
    Distance,
}

impl FromStr for DecisionRuleKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ternary" => Ok(DecisionRuleKind::Ternary),
            "distance" => Ok(DecisionRuleKind::Distance),
            _ => Err(ConfigError::InvalidDecisionRule {
                value: value.to_string(),
            }),
        }
    }
}

/// Search configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RESEMBLE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Natural-language or code query. Required by the binary.
    pub query: Option<String>,

    /// Candidates kept after the scan pass. Default: `1000`.
    pub top_k: usize,

    /// Capacity of each per-run cache. Default: `1000`.
    pub cache_capacity: usize,

    /// Units classified concurrently. Default: `4`.
    pub unit_concurrency: usize,

    /// Default: [`DecisionRuleKind::Ternary`].
    pub decision_rule: DecisionRuleKind,

    /// Distance rule bounds. Default: `0.2` / `0.8`.
    pub distance_low: f64,
    pub distance_high: f64,

    /// Generative-tier Yes-probability threshold. Default: `0.5932`.
    pub yes_threshold: f64,

    pub embedding_url: String,
    pub related_url: String,
    pub generative_url: String,

    /// Shell commands that start each model service when it is not live.
    pub embedding_launch_cmd: Option<String>,
    pub related_launch_cmd: Option<String>,
    pub generative_launch_cmd: Option<String>,

    /// JSON corpus file read by the binary.
    pub corpus_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query: None,
            top_k: DEFAULT_TOP_K,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            unit_concurrency: DEFAULT_UNIT_CONCURRENCY,
            decision_rule: DecisionRuleKind::Ternary,
            distance_low: DEFAULT_DISTANCE_LOW,
            distance_high: DEFAULT_DISTANCE_HIGH,
            yes_threshold: DEFAULT_YES_THRESHOLD,
            embedding_url: DEFAULT_EMBEDDING_URL.to_string(),
            related_url: DEFAULT_RELATED_URL.to_string(),
            generative_url: DEFAULT_GENERATIVE_URL.to_string(),
            embedding_launch_cmd: None,
            related_launch_cmd: None,
            generative_launch_cmd: None,
            corpus_path: None,
        }
    }
}

impl Config {
    const ENV_QUERY: &'static str = "RESEMBLE_QUERY";
    const ENV_TOP_K: &'static str = "RESEMBLE_TOP_K";
    const ENV_CACHE_CAPACITY: &'static str = "RESEMBLE_CACHE_CAPACITY";
    const ENV_UNIT_CONCURRENCY: &'static str = "RESEMBLE_UNIT_CONCURRENCY";
    const ENV_DECISION_RULE: &'static str = "RESEMBLE_DECISION_RULE";
    const ENV_DISTANCE_LOW: &'static str = "RESEMBLE_DISTANCE_LOW";
    const ENV_DISTANCE_HIGH: &'static str = "RESEMBLE_DISTANCE_HIGH";
    const ENV_YES_THRESHOLD: &'static str = "RESEMBLE_YES_THRESHOLD";
    const ENV_EMBEDDING_URL: &'static str = "RESEMBLE_EMBEDDING_URL";
    const ENV_RELATED_URL: &'static str = "RESEMBLE_RELATED_URL";
    const ENV_GENERATIVE_URL: &'static str = "RESEMBLE_GENERATIVE_URL";
    const ENV_EMBEDDING_LAUNCH_CMD: &'static str = "RESEMBLE_EMBEDDING_LAUNCH_CMD";
    const ENV_RELATED_LAUNCH_CMD: &'static str = "RESEMBLE_RELATED_LAUNCH_CMD";
    const ENV_GENERATIVE_LAUNCH_CMD: &'static str = "RESEMBLE_GENERATIVE_LAUNCH_CMD";
    const ENV_CORPUS_PATH: &'static str = "RESEMBLE_CORPUS_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let decision_rule = match Self::parse_optional_string_from_env(Self::ENV_DECISION_RULE) {
            Some(value) => value.parse()?,
            None => defaults.decision_rule,
        };

        Ok(Self {
            query: Self::parse_optional_string_from_env(Self::ENV_QUERY),
            top_k: Self::parse_number_from_env(Self::ENV_TOP_K, defaults.top_k)?,
            cache_capacity: Self::parse_number_from_env(
                Self::ENV_CACHE_CAPACITY,
                defaults.cache_capacity,
            )?,
            unit_concurrency: Self::parse_number_from_env(
                Self::ENV_UNIT_CONCURRENCY,
                defaults.unit_concurrency,
            )?,
            decision_rule,
            distance_low: Self::parse_number_from_env(Self::ENV_DISTANCE_LOW, defaults.distance_low)?,
            distance_high: Self::parse_number_from_env(
                Self::ENV_DISTANCE_HIGH,
                defaults.distance_high,
            )?,
            yes_threshold: Self::parse_number_from_env(
                Self::ENV_YES_THRESHOLD,
                defaults.yes_threshold,
            )?,
            embedding_url: Self::parse_string_from_env(Self::ENV_EMBEDDING_URL, defaults.embedding_url),
            related_url: Self::parse_string_from_env(Self::ENV_RELATED_URL, defaults.related_url),
            generative_url: Self::parse_string_from_env(
                Self::ENV_GENERATIVE_URL,
                defaults.generative_url,
            ),
            embedding_launch_cmd: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_LAUNCH_CMD),
            related_launch_cmd: Self::parse_optional_string_from_env(Self::ENV_RELATED_LAUNCH_CMD),
            generative_launch_cmd: Self::parse_optional_string_from_env(
                Self::ENV_GENERATIVE_LAUNCH_CMD,
            ),
            corpus_path: Self::parse_optional_string_from_env(Self::ENV_CORPUS_PATH)
                .map(PathBuf::from),
        })
    }

    /// Checks ranges and the corpus path (does not read the corpus).
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_positive("top_k", self.top_k)?;
        Self::require_positive("cache_capacity", self.cache_capacity)?;
        Self::require_positive("unit_concurrency", self.unit_concurrency)?;

        if !(self.distance_low >= 0.0 && self.distance_low <= self.distance_high) {
            return Err(ConfigError::OutOfRange {
                name: "distance thresholds",
                reason: format!(
                    "expected 0 <= low <= high, got low={} high={}",
                    self.distance_low, self.distance_high
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.yes_threshold) {
            return Err(ConfigError::OutOfRange {
                name: "yes_threshold",
                reason: format!("expected a probability, got {}", self.yes_threshold),
            });
        }

        if let Some(ref path) = self.corpus_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// The query, or [`ConfigError::MissingEnvVar`].
    pub fn require_query(&self) -> Result<&str, ConfigError> {
        self.query.as_deref().ok_or(ConfigError::MissingEnvVar {
            name: Self::ENV_QUERY,
        })
    }

    pub fn decision_rule(&self) -> DecisionRule {
        match self.decision_rule {
            DecisionRuleKind::Ternary => DecisionRule::Ternary {
                thresholds: RelatednessThresholds::default(),
            },
            DecisionRuleKind::Distance => DecisionRule::DistanceThreshold {
                low: self.distance_low,
                high: self.distance_high,
            },
        }
    }

    pub fn pipeline_settings(&self, query: &str) -> PipelineSettings {
        PipelineSettings::new(query)
            .with_top_k(self.top_k)
            .with_cache_capacity(self.cache_capacity)
            .with_unit_concurrency(self.unit_concurrency)
            .with_rule(self.decision_rule())
            .with_yes_threshold(self.yes_threshold)
    }

    pub fn gateway_config(&self, kind: ModelKind) -> GatewayConfig {
        let url = match kind {
            ModelKind::Embedding => &self.embedding_url,
            ModelKind::Relatedness => &self.related_url,
            ModelKind::Generative => &self.generative_url,
        };
        GatewayConfig::for_kind(kind).with_base_url(url.as_str())
    }

    pub fn launch_command(&self, kind: ModelKind) -> Option<&str> {
        match kind {
            ModelKind::Embedding => self.embedding_launch_cmd.as_deref(),
            ModelKind::Relatedness => self.related_launch_cmd.as_deref(),
            ModelKind::Generative => self.generative_launch_cmd.as_deref(),
        }
    }

    fn require_positive(name: &'static str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::OutOfRange {
                name,
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidNumber {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
