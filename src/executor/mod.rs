//! Test execution
//!
//! The [`Scheduler`] dispatches units sequentially or in bounded parallel
//! groups and feeds every result into a shared [`ResultCollector`].

mod collector;
mod scheduler;

pub use collector::ResultCollector;
pub use scheduler::{CancelHandle, ExecutionMode, ProgressEvent, Scheduler};
