//! Four-phase lifecycle runner
//!
//! A [`TestCase`] drives a [`Fixture`] and a [`Strategy`] through
//! initialize, execute, verify and cleanup, turning every failure into
//! data on the returned [`TestResult`].

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{PhaseError, TestUnit};
use crate::models::{Parameters, Step, TestResult, TestStatus};

/// Outcome of the verify phase
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    pub passed: bool,
    pub detail: String,
}

impl Verification {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Domain hooks around a measurement
#[async_trait]
pub trait Fixture: Send + Sync {
    /// Arm the bench; an error here is a setup failure
    async fn initialize(&self, params: &Parameters) -> anyhow::Result<()>;

    /// Compare expected against observed values. Mismatches are `passed: false`.
    fn verify(&self, params: &Parameters) -> Verification;

    /// Release the bench; runs on every exit path
    async fn cleanup(&self, params: &Parameters) -> anyhow::Result<()>;
}

/// Measurement or action for one test type
///
/// Observed values are written back into `params`.
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn run_test(&self, params: &mut Parameters) -> anyhow::Result<()>;
}

/// Executable unit with the fixed initialize → execute → verify → cleanup flow
pub struct TestCase {
    id: String,
    name: String,
    parameters: Parameters,
    fixture: Box<dyn Fixture>,
    strategy: Arc<dyn Strategy>,
}

impl TestCase {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parameters: Parameters,
        fixture: Box<dyn Fixture>,
        strategy: Arc<dyn Strategy>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parameters,
            fixture,
            strategy,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    async fn run_phases(&mut self, result: &mut TestResult) -> Result<Verification, PhaseError> {
        if let Err(msg) = guarded(self.fixture.initialize(&self.parameters)).await {
            return Err(record_failure(result, PhaseError::Setup(msg)));
        }
        result.push_step(Step::new("initialize", true, "initialization complete"));

        if let Err(msg) = guarded(self.strategy.run_test(&mut self.parameters)).await {
            return Err(record_failure(result, PhaseError::Execution(msg)));
        }
        result.push_step(Step::new("execute", true, "execution complete"));

        let fixture = &self.fixture;
        let parameters = &self.parameters;
        let verification =
            std::panic::catch_unwind(AssertUnwindSafe(|| fixture.verify(parameters))).map_err(
                |panic| {
                    PhaseError::Execution(format!(
                        "verification panicked: {}",
                        panic_message(panic.as_ref())
                    ))
                },
            )?;
        result.push_step(Step::new(
            "verify",
            verification.passed,
            verification.detail.clone(),
        ));

        Ok(verification)
    }

    async fn cleanup(&self, result: &mut TestResult) {
        match guarded(self.fixture.cleanup(&self.parameters)).await {
            Ok(()) => result.push_step(Step::new("cleanup", true, "cleanup complete")),
            Err(msg) => {
                let err = record_failure(result, PhaseError::Cleanup(msg));
                warn!("{} ({}): {}", self.name, self.id, err);
            }
        }
    }
}

/// Record the failed step under the phase that raised it
fn record_failure(result: &mut TestResult, err: PhaseError) -> PhaseError {
    result.push_step(Step::new(err.phase(), false, err.message()));
    err
}

#[async_trait]
impl TestUnit for TestCase {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) -> TestResult {
        let mut result = TestResult::begin(&self.id, &self.name);
        info!("Starting {} ({})", self.name, self.id);

        match self.run_phases(&mut result).await {
            Ok(verification) if verification.passed => {
                result.set_status(TestStatus::Pass);
            }
            Ok(verification) => {
                result.set_status(TestStatus::Fail);
                result.error_message = Some(verification.detail);
            }
            Err(err) => {
                warn!("{} ({}): {}", self.name, self.id, err);
                result.push_step(Step::new("error", false, err.to_string()));
                result.error_message = Some(err.to_string());
                result.set_status(TestStatus::Error);
            }
        }

        self.cleanup(&mut result).await;

        let result = result.finish();
        debug!(
            "Finished {} ({}) - {} in {}ms",
            self.name, self.id, result.status, result.duration_ms
        );
        result
    }
}

/// Await a hook, turning both errors and panics into a message
async fn guarded<F>(hook: F) -> Result<(), String>
where
    F: Future<Output = anyhow::Result<()>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(panic) => Err(format!("panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
