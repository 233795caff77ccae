//! Sequential and bounded-parallel scheduling

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::collector::ResultCollector;
use crate::lifecycle::TestUnit;
use crate::models::{SuiteResult, TestResult, TestStatus};

/// How units are dispatched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum ExecutionMode {
    /// One unit at a time, in input order
    Sequential,
    /// Groups of at most `max_parallelism` units, joined before the next group
    Parallel { max_parallelism: usize },
}

impl ExecutionMode {
    pub fn group_size(&self) -> usize {
        match self {
            ExecutionMode::Sequential => 1,
            ExecutionMode::Parallel { max_parallelism } => (*max_parallelism).max(1),
        }
    }
}

/// Cooperative cancellation flag, checked between dispatches
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Progress notifications published during a run
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum ProgressEvent {
    SuiteStarted {
        total: usize,
        mode: ExecutionMode,
    },
    TestStarted {
        id: String,
        name: String,
    },
    TestCompleted {
        id: String,
        name: String,
        status: TestStatus,
        duration_ms: u64,
        attempts: u32,
    },
    Cancelled {
        remaining: usize,
    },
    SuiteCompleted(SuiteResult),
}

#[derive(Clone, Default)]
struct Progress(Option<UnboundedSender<ProgressEvent>>);

impl Progress {
    fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.0 {
            // A dropped subscriber must not affect the run
            let _ = tx.send(event);
        }
    }
}

/// State every worker needs
#[derive(Clone)]
struct Worker {
    collector: Arc<ResultCollector>,
    cancel: CancelHandle,
    stop_on_failure: bool,
    progress: Progress,
}

impl Worker {
    async fn execute(self, mut unit: Box<dyn TestUnit>) {
        let (id, name) = unit.identify();
        self.progress.emit(ProgressEvent::TestStarted {
            id: id.clone(),
            name: name.clone(),
        });

        let result = unit.run().await;
        self.record(result).await;
    }

    async fn record(&self, result: TestResult) {
        if !result.success && self.stop_on_failure {
            warn!(
                "{} ({}) did not pass, stopping after in-flight tests",
                result.test_name, result.test_id
            );
            self.cancel.cancel();
        }

        self.progress.emit(ProgressEvent::TestCompleted {
            id: result.test_id.clone(),
            name: result.test_name.clone(),
            status: result.status,
            duration_ms: result.duration_ms,
            attempts: result.attempts,
        });
        info!("  {}", result);
        self.collector.add(result).await;
    }

    fn spawn(&self, unit: Box<dyn TestUnit>) -> (String, String, JoinHandle<()>) {
        let (id, name) = unit.identify();
        let span = info_span!("test", id = %id);
        let handle = tokio::spawn(self.clone().execute(unit).instrument(span));
        (id, name, handle)
    }

    /// Await a spawned unit; a worker that died still yields a result
    async fn join(&self, id: String, name: String, handle: JoinHandle<()>) {
        if let Err(e) = handle.await {
            error!("Worker for {} ({}) died: {}", name, id, e);
            self.record(TestResult::error(id, name, format!("worker failed: {e}")))
                .await;
        }
    }
}

/// Dispatches units and owns the stop-on-failure policy
pub struct Scheduler {
    mode: ExecutionMode,
    stop_on_failure: bool,
    cancel: CancelHandle,
    progress: Progress,
}

impl Scheduler {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            stop_on_failure: false,
            cancel: CancelHandle::new(),
            progress: Progress::default(),
        }
    }

    pub fn sequential() -> Self {
        Self::new(ExecutionMode::Sequential)
    }

    pub fn parallel(max_parallelism: usize) -> Self {
        Self::new(ExecutionMode::Parallel { max_parallelism })
    }

    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    pub fn with_events(mut self, tx: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Progress(Some(tx));
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run every unit, recording results into `collector`
    ///
    /// The collector should be empty; the returned summary counts all of it.
    pub async fn run(
        &self,
        units: Vec<Box<dyn TestUnit>>,
        collector: &Arc<ResultCollector>,
    ) -> SuiteResult {
        let total = units.len();
        let start_time = Utc::now();
        let worker = Worker {
            collector: collector.clone(),
            cancel: self.cancel.clone(),
            stop_on_failure: self.stop_on_failure,
            progress: self.progress.clone(),
        };

        self.progress.emit(ProgressEvent::SuiteStarted {
            total,
            mode: self.mode,
        });

        match self.mode {
            ExecutionMode::Sequential => {
                info!("Running {} tests sequentially", total);
                self.run_sequential(units, &worker).await
            }
            ExecutionMode::Parallel { .. } => {
                info!(
                    "Running {} tests in parallel (max {} concurrent)",
                    total,
                    self.mode.group_size()
                );
                self.run_groups(units, &worker).await
            }
        }

        let summary = collector.summarize(total, start_time, Utc::now()).await;
        info!("Run complete - {}", summary);
        self.progress
            .emit(ProgressEvent::SuiteCompleted(summary.clone()));
        summary
    }

    async fn run_sequential(&self, units: Vec<Box<dyn TestUnit>>, worker: &Worker) {
        let total = units.len();
        for (index, unit) in units.into_iter().enumerate() {
            if self.check_cancelled(total - index) {
                break;
            }
            let (id, name, handle) = worker.spawn(unit);
            worker.join(id, name, handle).await;
        }
    }

    async fn run_groups(&self, units: Vec<Box<dyn TestUnit>>, worker: &Worker) {
        let total = units.len();
        let size = self.mode.group_size();
        let mut dispatched = 0;
        let mut pending = units.into_iter();

        loop {
            let group: Vec<_> = pending.by_ref().take(size).collect();
            if group.is_empty() {
                break;
            }
            if self.check_cancelled(total - dispatched) {
                break;
            }

            debug!(
                "Dispatching group of {} ({}/{} dispatched)",
                group.len(),
                dispatched,
                total
            );
            dispatched += group.len();

            let spawned: Vec<_> = group.into_iter().map(|unit| worker.spawn(unit)).collect();
            join_all(
                spawned
                    .into_iter()
                    .map(|(id, name, handle)| worker.join(id, name, handle)),
            )
            .await;
        }
    }

    fn check_cancelled(&self, remaining: usize) -> bool {
        if self.cancel.is_cancelled() {
            warn!("Run cancelled, {} test(s) not run", remaining);
            self.progress.emit(ProgressEvent::Cancelled { remaining });
            true
        } else {
            false
        }
    }
}
