//! Test unit contract and lifecycle template
//!
//! Every runnable thing in the engine is a [`TestUnit`]: the four-phase
//! [`TestCase`] as well as the decorators wrapping it.

mod case;

pub use case::{Fixture, Strategy, TestCase, Verification};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::TestResult;

/// Failures raised by lifecycle phases
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Cleanup failed: {0}")]
    Cleanup(String),
}

impl PhaseError {
    /// Step name of the phase that raised the error
    pub fn phase(&self) -> &'static str {
        match self {
            PhaseError::Setup(_) => "initialize",
            PhaseError::Execution(_) => "execute",
            PhaseError::Cleanup(_) => "cleanup",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PhaseError::Setup(msg) | PhaseError::Execution(msg) | PhaseError::Cleanup(msg) => msg,
        }
    }
}

/// An executable test
///
/// `run` always yields a result; failures of the test itself are data.
#[async_trait]
pub trait TestUnit: Send {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn identify(&self) -> (String, String) {
        (self.id().to_string(), self.name().to_string())
    }

    async fn run(&mut self) -> TestResult;
}
