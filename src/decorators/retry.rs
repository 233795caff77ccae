//! Automatic retry decorator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::lifecycle::TestUnit;
use crate::models::{TestResult, TestStatus};

/// Which non-success results are worth another attempt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryPolicy {
    /// Retry both verification failures and setup/execution errors
    #[default]
    AnyFailure,
    /// Retry verification failures only; errors are returned immediately
    FailuresOnly,
}

impl RetryPolicy {
    pub fn should_retry(&self, status: TestStatus) -> bool {
        match self {
            RetryPolicy::AnyFailure => !status.is_success(),
            RetryPolicy::FailuresOnly => status == TestStatus::Fail,
        }
    }
}

/// Re-runs the inner unit until it passes or `max_retries + 1` attempts are used
pub struct RetryDecorator {
    inner: Box<dyn TestUnit>,
    max_retries: u32,
    delay: Duration,
    policy: RetryPolicy,
}

impl RetryDecorator {
    pub fn new(inner: Box<dyn TestUnit>, max_retries: u32, delay_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            delay: Duration::from_millis(delay_ms),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl TestUnit for RetryDecorator {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&mut self) -> TestResult {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;
        let mut total_attempts = 0;

        loop {
            attempt += 1;
            info!(
                "[retry] {} attempt {}/{}",
                self.inner.name(),
                attempt,
                max_attempts
            );

            let mut result = self.inner.run().await;
            total_attempts = result.attempts.saturating_add(total_attempts);

            let retry = attempt < max_attempts && self.policy.should_retry(result.status);
            if !retry {
                if !result.success {
                    warn!(
                        "[retry] {} failed after {} attempt(s)",
                        self.inner.name(),
                        attempt
                    );
                } else if attempt > 1 {
                    info!(
                        "[retry] {} passed on attempt {}",
                        self.inner.name(),
                        attempt
                    );
                }
                result.attempts = total_attempts;
                return result;
            }

            warn!(
                "[retry] {} {}, retrying in {}ms",
                self.inner.name(),
                result.status,
                self.delay.as_millis()
            );
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}
