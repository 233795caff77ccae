//! Elapsed-time measurement
//!
//! Durations come from the monotonic clock; the wall-clock start stamp is
//! kept alongside for logs.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::debug;

/// Labelled stopwatch
#[derive(Debug)]
pub struct Timer {
    label: String,
    started_at: DateTime<Utc>,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Consume the timer, logging the elapsed time at debug level
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        debug!(
            timer = %self.label,
            started_at = %self.started_at.format("%H:%M:%S%.3f"),
            "stopped after {}",
            format_duration(elapsed)
        );
        elapsed
    }
}

/// `850ms`, `12.40s`, `3m 05s`
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
