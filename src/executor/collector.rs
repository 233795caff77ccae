//! Concurrency-safe result sink

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{SuiteResult, TestResult};

/// Accumulates results from any number of workers
///
/// Every mutation is a serialized critical section. Share it through an
/// `Arc` and call [`get_all`](Self::get_all) once the workers have joined.
#[derive(Debug, Default)]
pub struct ResultCollector {
    results: Mutex<Vec<TestResult>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, result: TestResult) {
        let mut results = self.results.lock().await;
        debug!(
            "Recorded {} ({}) - {}",
            result.test_name, result.test_id, result.status
        );
        results.push(result);
    }

    /// Snapshot of every recorded result, in recording order
    pub async fn get_all(&self) -> Vec<TestResult> {
        self.results.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.results.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.results.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.lock().await.is_empty()
    }

    /// Counts by outcome over `total` scheduled units
    pub async fn summarize(
        &self,
        total: usize,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> SuiteResult {
        let results = self.results.lock().await;
        SuiteResult::new(total, &results, start_time, end_time)
    }
}
