//! Report generation
//!
//! A [`SuiteReport`] is computed once from the finished result set and then
//! rendered for the console or written as a structured artifact.

mod generator;

pub use generator::ReportGenerator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::is_yaml_file;
use crate::models::{TestResult, TestStatus};

/// Report errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize report as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to format report")]
    Format(#[from] fmt::Error),
}

/// Console rendering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Table,
    Summary,
    Json,
    JsonPretty,
    Csv,
}

impl ReportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ReportFormat::Table => "table",
            ReportFormat::Summary => "summary",
            ReportFormat::Json => "json",
            ReportFormat::JsonPretty => "json-pretty",
            ReportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(ReportFormat::Table),
            "summary" => Ok(ReportFormat::Summary),
            "json" => Ok(ReportFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(ReportFormat::JsonPretty),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!(
                "unknown report format '{other}' (expected table, summary, json, json-pretty or csv)"
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Structured report over a finished result set
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub total_tests: usize,
    pub pass_count: usize,
    /// Every non-passing result, errors included
    pub fail_count: usize,
    pub error_count: usize,
    /// Percentage of `total_tests` that passed
    pub pass_rate: f64,
    /// Sum of individual durations, not the wall-clock time of the run
    pub total_duration_seconds: f64,
    pub test_results: Vec<TestResult>,
}

impl SuiteReport {
    pub fn from_results(results: &[TestResult]) -> Self {
        let total_tests = results.len();
        let pass_count = results.iter().filter(|r| r.success).count();
        let error_count = results
            .iter()
            .filter(|r| r.status == TestStatus::Error)
            .count();
        let total_ms: u64 = results.iter().map(|r| r.duration_ms).sum();

        let pass_rate = if total_tests == 0 {
            0.0
        } else {
            pass_count as f64 / total_tests as f64 * 100.0
        };

        Self {
            total_tests,
            pass_count,
            fail_count: total_tests - pass_count,
            error_count,
            pass_rate,
            total_duration_seconds: total_ms as f64 / 1000.0,
            test_results: results.to_vec(),
        }
    }

    pub fn fail_rate(&self) -> f64 {
        if self.total_tests == 0 {
            0.0
        } else {
            100.0 - self.pass_rate
        }
    }

    /// Serialize as indented JSON, or YAML for `.yaml`/`.yml` paths
    pub fn to_artifact(&self, path: &Path) -> Result<String, ReportError> {
        if is_yaml_file(path) {
            Ok(serde_yaml::to_string(self)?)
        } else {
            Ok(serde_json::to_string_pretty(self)?)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Step;

    pub(crate) fn sample_results() -> Vec<TestResult> {
        let mut pass = TestResult::begin("V001", "Nominal voltage output");
        pass.push_step(Step::new("initialize", true, "ok"));
        pass.push_step(Step::new("execute", true, "ok"));
        pass.push_step(Step::new("verify", true, "measured 12.050V"));
        pass.push_step(Step::new("cleanup", true, "ok"));
        pass.set_status(TestStatus::Pass);
        let mut pass = pass.finish();
        pass.duration_ms = 1200;

        let mut fail = TestResult::begin("C001", "Load current");
        fail.push_step(Step::new("initialize", true, "ok"));
        fail.push_step(Step::new("verify", false, "current out of range"));
        fail.push_step(Step::new("cleanup", true, "ok"));
        fail.error_message = Some("current out of range".to_string());
        fail.set_status(TestStatus::Fail);
        let mut fail = fail.finish();
        fail.duration_ms = 300;

        let mut error = TestResult::error("CAN001", "BMS status", "bus offline");
        error.duration_ms = 500;
        error.attempts = 3;

        vec![pass, fail, error]
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON-PRETTY".parse::<ReportFormat>(), Ok(ReportFormat::JsonPretty));
        assert_eq!("csv".parse::<ReportFormat>(), Ok(ReportFormat::Csv));
        assert!("html".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::default(), ReportFormat::Table);
    }

    #[test]
    fn test_counts_and_duration_sum() {
        let report = SuiteReport::from_results(&sample_results());
        assert_eq!(report.total_tests, 3);
        assert_eq!(report.pass_count, 1);
        assert_eq!(report.fail_count, 2);
        assert_eq!(report.error_count, 1);
        assert!((report.total_duration_seconds - 2.0).abs() < 1e-9);
        assert!((report.pass_rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_report() {
        let report = SuiteReport::from_results(&[]);
        assert_eq!(report.total_tests, 0);
        assert_eq!(report.pass_rate, 0.0);
        assert_eq!(report.fail_rate(), 0.0);
    }

    #[test]
    fn test_artifact_uses_camel_case_keys() {
        let report = SuiteReport::from_results(&sample_results());
        let json = report.to_artifact(Path::new("out.report.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["totalTests"], 3);
        assert_eq!(value["passCount"], 1);
        assert_eq!(value["failCount"], 2);
        assert_eq!(value["testResults"][2]["testId"], "CAN001");
        assert_eq!(value["testResults"][2]["status"], "error");
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_yaml_artifact() {
        let report = SuiteReport::from_results(&sample_results());
        let yaml = report.to_artifact(Path::new("run.yml")).unwrap();
        assert!(yaml.contains("totalTests: 3"));

        let loaded: SuiteReport = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(loaded.test_results.len(), 3);
        assert_eq!(loaded.error_count, 1);
    }
}
