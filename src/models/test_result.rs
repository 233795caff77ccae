//! Test result models
//!
//! Defines lifecycle steps, per-unit results, outcome status and the
//! suite-level summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single test unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Verification succeeded
    Pass,
    /// Verification returned false
    Fail,
    /// Setup or execution failed before verification
    Error,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Record of one lifecycle phase
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub success: bool,
    pub message: String,
}

impl Step {
    pub fn new(name: impl Into<String>, success: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success,
            message: message.into(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.success { "ok" } else { "failed" };
        write!(f, "{}: {} - {}", self.name, outcome, self.message)
    }
}

/// Result of a single test execution
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_id: String,
    pub test_name: String,
    pub status: TestStatus,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    /// Lifecycle executions behind this result
    pub attempts: u32,
    pub steps: Vec<Step>,
}

impl TestResult {
    /// Open a result; the clock starts now
    pub fn begin(test_id: impl Into<String>, test_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            test_id: test_id.into(),
            test_name: test_name.into(),
            status: TestStatus::Error,
            success: false,
            error_message: None,
            start_time: now,
            end_time: now,
            duration_ms: 0,
            attempts: 1,
            steps: Vec::new(),
        }
    }

    /// Result for a unit whose worker never produced one; its cleanup is
    /// recorded as not run
    pub fn error(
        test_id: impl Into<String>,
        test_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        let mut result = Self::begin(test_id, test_name);
        result.push_step(Step::new("error", false, error.clone()));
        result.push_step(Step::new("cleanup", false, "not run"));
        result.error_message = Some(error);
        result.finish()
    }

    pub fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn set_status(&mut self, status: TestStatus) {
        self.status = status;
        self.success = status.is_success();
    }

    /// Stop the clock; `duration_ms` always equals `end_time - start_time`
    pub fn finish(mut self) -> Self {
        self.end_time = Utc::now();
        self.duration_ms = (self.end_time - self.start_time)
            .num_milliseconds()
            .max(0) as u64;
        self
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) [{}ms]",
            self.status.symbol(),
            self.test_name,
            self.test_id,
            self.duration_ms
        )?;
        if let Some(msg) = &self.error_message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one suite run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub not_run: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
}

impl SuiteResult {
    pub fn new(
        total_tests: usize,
        results: &[TestResult],
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        let passed = count(TestStatus::Pass);
        let failed = count(TestStatus::Fail);
        let errored = count(TestStatus::Error);
        let total_tests = total_tests.max(passed + failed + errored);

        Self {
            total_tests,
            passed,
            failed,
            errored,
            not_run: total_tests - (passed + failed + errored),
            start_time,
            end_time,
            duration_ms: (end_time - start_time).num_milliseconds().max(0) as u64,
        }
    }

    /// Account for definitions that never became runnable units
    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.total_tests += rejected;
        self.not_run += rejected;
        self
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total_tests == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total_tests as f64) * 100.0
        }
    }
}

impl fmt::Display for SuiteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {} | Not run: {} ({:.2}s)",
            self.total_tests,
            self.passed,
            self.failed,
            self.errored,
            self.not_run,
            self.duration_ms as f64 / 1000.0
        )
    }
}
