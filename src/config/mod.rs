//! Configuration module
//!
//! Engine settings loaded from a JSON or YAML file, overridden by
//! `HWTEST_*` environment variables and finally by CLI flags.

mod env;
mod file;

pub use env::EnvConfig;
pub use file::{find_config, is_yaml_file};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decorators::RetryPolicy;
use crate::executor::ExecutionMode;
use crate::report::ReportFormat;

/// Engine configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Run units in bounded-parallel groups
    pub parallel: bool,

    /// Group size in parallel mode
    pub max_parallelism: usize,

    /// Stop dispatching after the first non-passing result
    pub stop_on_failure: bool,

    pub retry: RetrySettings,

    pub report: ReportSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_parallelism: 4,
            stop_on_failure: false,
            retry: RetrySettings::default(),
            report: ReportSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, a discovered file, or fall back to defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match find_config() {
                Some(path) => Self::load(path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.parallel && self.max_parallelism == 0 {
            anyhow::bail!("maxParallelism must be at least 1 when parallel execution is enabled");
        }
        Ok(())
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(parallel) = env.parallel {
            self.parallel = parallel;
        }
        if let Some(max) = env.max_parallelism {
            self.max_parallelism = max;
        }
        if let Some(stop) = env.stop_on_failure {
            self.stop_on_failure = stop;
        }
        if let Some(delay) = env.retry_delay_ms {
            self.retry.delay_ms = delay;
        }
        if let Some(format) = env.format {
            self.report.format = format;
        }
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::Parallel {
                max_parallelism: self.max_parallelism,
            }
        } else {
            ExecutionMode::Sequential
        }
    }

    /// Example configuration written by `hwtest config init`
    pub fn example() -> Self {
        Self {
            parallel: true,
            max_parallelism: 2,
            stop_on_failure: false,
            retry: RetrySettings {
                default_max_retries: 3,
                delay_ms: 500,
                policy: RetryPolicy::AnyFailure,
            },
            report: ReportSettings::default(),
        }
    }
}

/// Retry decorator defaults
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrySettings {
    /// Used when a definition enables retry without `maxRetries`
    pub default_max_retries: u32,

    /// Pause between failed attempts; `retryDelayMs` parameter overrides it
    pub delay_ms: u64,

    pub policy: RetryPolicy,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            default_max_retries: 3,
            delay_ms: 1000,
            policy: RetryPolicy::AnyFailure,
        }
    }
}

/// Report output settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportSettings {
    /// Console rendering
    pub format: ReportFormat,

    /// ANSI colors in table output
    pub colorize: bool,

    /// Write the structured artifact after each run
    pub write: bool,

    /// Artifact path; defaults to `<definitions>.report.json`
    pub output_path: Option<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            format: ReportFormat::Table,
            colorize: true,
            write: true,
            output_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(!config.parallel);
        assert_eq!(config.max_parallelism, 4);
        assert_eq!(config.retry.default_max_retries, 3);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.execution_mode(), ExecutionMode::Sequential);
    }

    #[test]
    fn test_save_load_yaml_and_json() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::example();

        for name in ["hwtest.yaml", "hwtest.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            let loaded = EngineConfig::load(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hwtest.yaml");
        std::fs::write(&path, "parallel: true\nretry:\n  delayMs: 10\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(config.parallel);
        assert_eq!(config.max_parallelism, 4);
        assert_eq!(config.retry.delay_ms, 10);
        assert_eq!(config.retry.default_max_retries, 3);
        assert_eq!(
            config.execution_mode(),
            ExecutionMode::Parallel { max_parallelism: 4 }
        );
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let config = EngineConfig {
            parallel: true,
            max_parallelism: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        let env = EnvConfig {
            parallel: Some(true),
            max_parallelism: Some(8),
            retry_delay_ms: Some(5),
            format: Some(ReportFormat::Json),
            ..Default::default()
        };
        config.apply_env(&env);

        assert!(config.parallel);
        assert_eq!(config.max_parallelism, 8);
        assert_eq!(config.retry.delay_ms, 5);
        assert_eq!(config.report.format, ReportFormat::Json);
        assert!(!config.stop_on_failure);
    }
}
