//! Timing capture decorator

use async_trait::async_trait;
use tracing::info;

use crate::lifecycle::TestUnit;
use crate::models::TestResult;
use crate::utils::{format_duration, Timer};

/// Logs wall-clock time around the inner unit, retries included
pub struct TimingDecorator {
    inner: Box<dyn TestUnit>,
}

impl TimingDecorator {
    pub fn new(inner: Box<dyn TestUnit>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TestUnit for TimingDecorator {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&mut self) -> TestResult {
        info!("[timing] {} started", self.inner.name());
        let timer = Timer::start(format!("[timing] {}", self.inner.id()));

        let result = self.inner.run().await;

        let elapsed = timer.stop();
        info!(
            test_id = %result.test_id,
            elapsed_ms = elapsed.as_millis() as u64,
            attempts = result.attempts,
            "[timing] {} finished in {}",
            self.inner.name(),
            format_duration(elapsed)
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorators::RetryDecorator;
    use crate::models::TestStatus;
    use crate::testing::FlakyUnit;

    #[tokio::test]
    async fn test_timing_is_observational() {
        let mut unit = TimingDecorator::new(Box::new(FlakyUnit::always_failing("V002")));
        let result = unit.run().await;

        assert_eq!(result.status, TestStatus::Fail);
        assert_eq!(result.test_id, "V002");
        assert_eq!(result.attempts, 1);
        assert_eq!(unit.id(), "V002");
    }

    #[tokio::test]
    async fn test_timing_wraps_retries() {
        let retry = RetryDecorator::new(Box::new(FlakyUnit::new("V001", 2)), 2, 0);
        let result = TimingDecorator::new(Box::new(retry)).run().await;

        assert!(result.success);
        assert_eq!(result.attempts, 3);
    }
}
