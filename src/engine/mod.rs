//! Suite orchestration
//!
//! One run: load definitions, interpret each into a unit, schedule the units,
//! then build the report from the collected results.

use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::executor::{CancelHandle, ProgressEvent, ResultCollector, Scheduler};
use crate::interpreter::{InterpretError, Interpreter};
use crate::lifecycle::TestUnit;
use crate::loader::{DefinitionSource, FileLoader, LoadError};
use crate::models::{SuiteResult, TestSuite};
use crate::report::{ReportError, SuiteReport};
use crate::utils::{format_duration, Timer};

/// Errors that abort a run or its reporting
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A definition the interpreter refused
#[derive(Clone, Debug)]
pub struct Rejection {
    pub id: String,
    pub name: String,
    pub error: InterpretError,
}

/// Everything one run produced
#[derive(Clone, Debug)]
pub struct SuiteRun {
    pub run_id: String,
    pub suite_name: Option<String>,
    pub summary: SuiteResult,
    pub report: SuiteReport,
    pub rejections: Vec<Rejection>,
}

/// Loader -> Interpreter -> Scheduler -> Collector -> Report
///
/// Runs on one engine must not overlap; the collector is cleared at the
/// start of each run.
pub struct ExecutionEngine {
    config: EngineConfig,
    interpreter: Interpreter,
    collector: Arc<ResultCollector>,
    cancel: CancelHandle,
    events: Option<UnboundedSender<ProgressEvent>>,
}

impl ExecutionEngine {
    pub fn new(config: EngineConfig, interpreter: Interpreter) -> Self {
        Self {
            config,
            interpreter,
            collector: Arc::new(ResultCollector::new()),
            cancel: CancelHandle::new(),
            events: None,
        }
    }

    /// Engine backed by the simulated bench
    pub fn simulated(config: EngineConfig) -> Self {
        let interpreter = Interpreter::simulated(config.retry);
        Self::new(config, interpreter)
    }

    pub fn with_events(mut self, tx: UnboundedSender<ProgressEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Stops dispatch of the current run; in-flight tests finish
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub async fn run(&self, source: &dyn DefinitionSource) -> Result<SuiteRun, EngineError> {
        let run_id = generate_run_id();
        let span = info_span!("suite", run_id = %run_id);
        self.execute(run_id, source).instrument(span).await
    }

    pub async fn run_file(&self, path: impl AsRef<Path>) -> Result<SuiteRun, EngineError> {
        self.run(&FileLoader::new(path.as_ref())).await
    }

    async fn execute(
        &self,
        run_id: String,
        source: &dyn DefinitionSource,
    ) -> Result<SuiteRun, EngineError> {
        let timer = Timer::start("suite run");
        info!("Loading definitions from {}", source.describe());
        let suite = source.load()?;

        self.collector.clear().await;
        self.cancel.reset();

        let (units, rejections) = self.interpret(&suite);
        let scheduler = self.scheduler();
        let summary = scheduler
            .run(units, &self.collector)
            .await
            .with_rejected(rejections.len());

        let results = self.collector.get_all().await;
        let report = SuiteReport::from_results(&results);

        info!(
            "{} finished in {}: {}",
            suite.name.as_deref().unwrap_or("Suite"),
            format_duration(timer.elapsed()),
            summary
        );

        Ok(SuiteRun {
            run_id,
            suite_name: suite.name,
            summary,
            report,
            rejections,
        })
    }

    fn interpret(&self, suite: &TestSuite) -> (Vec<Box<dyn TestUnit>>, Vec<Rejection>) {
        let mut units = Vec::with_capacity(suite.tests.len());
        let mut rejections = Vec::new();

        for def in &suite.tests {
            match self.interpreter.interpret(def) {
                Ok(unit) => units.push(unit),
                Err(error) => {
                    warn!("Skipping {}: {}", def.id, error);
                    rejections.push(Rejection {
                        id: def.id.clone(),
                        name: def.name.clone(),
                        error,
                    });
                }
            }
        }

        (units, rejections)
    }

    fn scheduler(&self) -> Scheduler {
        let scheduler = Scheduler::new(self.config.execution_mode())
            .stop_on_failure(self.config.stop_on_failure)
            .with_cancel_handle(self.cancel.clone());

        match &self.events {
            Some(tx) => scheduler.with_events(tx.clone()),
            None => scheduler,
        }
    }

    /// Write the structured artifact for a finished run
    pub fn write_report(run: &SuiteRun, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        let content = run.report.to_artifact(path)?;
        let io_err = |source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, content).map_err(io_err)?;

        info!("Report written to {}", path.display());
        Ok(())
    }
}

/// `suite.json` -> `suite.report.json`
pub fn default_report_path(definitions: &Path) -> PathBuf {
    definitions.with_extension("report.json")
}

fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::rng().random_range(0..10000);
    format!("{timestamp}_{random:04}")
}
