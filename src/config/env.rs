//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use crate::report::ReportFormat;

/// Environment variable prefix
const ENV_PREFIX: &str = "HWTEST";

/// Overrides read from `HWTEST_*` variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// HWTEST_PARALLEL
    pub parallel: Option<bool>,
    /// HWTEST_MAX_PARALLELISM
    pub max_parallelism: Option<usize>,
    /// HWTEST_STOP_ON_FAILURE
    pub stop_on_failure: Option<bool>,
    /// HWTEST_RETRY_DELAY_MS
    pub retry_delay_ms: Option<u64>,
    /// HWTEST_FORMAT
    pub format: Option<ReportFormat>,
    /// HWTEST_LOG
    pub log_level: Option<String>,
    /// HWTEST_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            parallel: get_env_bool("PARALLEL"),
            max_parallelism: get_env_parse("MAX_PARALLELISM"),
            stop_on_failure: get_env_bool("STOP_ON_FAILURE"),
            retry_delay_ms: get_env_parse("RETRY_DELAY_MS"),
            format: get_env_parse("FORMAT"),
            log_level: get_env("LOG"),
            config_file: config_override(),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.parallel.is_some()
            || self.max_parallelism.is_some()
            || self.stop_on_failure.is_some()
            || self.retry_delay_ms.is_some()
            || self.format.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
    }
}

/// Config file path from HWTEST_CONFIG
pub(super) fn config_override() -> Option<String> {
    get_env("CONFIG")
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}
