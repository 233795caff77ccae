//! hwtest - pluggable test execution engine for hardware validation
//!
//! Declarative test definitions are interpreted into units with a fixed
//! lifecycle (initialize, execute, verify, cleanup), optionally wrapped with
//! retry and timing, and scheduled sequentially or in bounded-parallel groups.
//!
//! ```no_run
//! use hwtest::{EngineConfig, ExecutionEngine};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let engine = ExecutionEngine::simulated(EngineConfig::default());
//! let run = engine.run_file("suite.json").await?;
//! println!("{}", run.summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decorators;
pub mod engine;
pub mod executor;
pub mod interpreter;
pub mod lifecycle;
pub mod loader;
pub mod models;
pub mod report;
pub mod strategies;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine::{default_report_path, EngineError, ExecutionEngine, Rejection, SuiteRun};
pub use executor::{CancelHandle, ExecutionMode, ProgressEvent, ResultCollector, Scheduler};
pub use interpreter::{InterpretError, Interpreter, TestKind};
pub use lifecycle::{Fixture, Strategy, TestCase, TestUnit, Verification};
pub use loader::{DefinitionSource, FileLoader, InMemory, LoadError};
pub use models::{Parameters, SuiteResult, TestDefinition, TestResult, TestStatus, TestSuite};
pub use report::{ReportFormat, ReportGenerator, SuiteReport};
