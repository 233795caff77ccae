//! Data models for hardware validation runs
//!
//! Definitions, typed parameters, step traces and results.

mod definition;
mod params;
mod test_result;

pub use definition::{SuiteFile, TestDefinition, TestSuite};
pub use params::{ParamError, ParamValue, Parameters};
pub use test_result::{Step, SuiteResult, TestResult, TestStatus};
