//! Console renderings of a [`SuiteReport`]

use serde::Serialize;
use std::fmt::Write;

use super::{ReportError, ReportFormat, SuiteReport};
use crate::models::{TestResult, TestStatus};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Renders reports in one [`ReportFormat`]
#[derive(Clone, Debug)]
pub struct ReportGenerator {
    format: ReportFormat,
    colorize: bool,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    test_id: &'a str,
    test_name: &'a str,
    status: TestStatus,
    attempts: u32,
    duration_ms: u64,
    start_time: String,
    error_message: &'a str,
}

impl ReportGenerator {
    pub fn new(format: ReportFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn render(&self, report: &SuiteReport) -> Result<String, ReportError> {
        match self.format {
            ReportFormat::Table => self.render_table(report),
            ReportFormat::Summary => Ok(self.summary_line(report)),
            ReportFormat::Json => Ok(serde_json::to_string(report)?),
            ReportFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
            ReportFormat::Csv => self.render_csv(&report.test_results),
        }
    }

    /// Counts, percentages and total duration on one line
    pub fn summary_line(&self, report: &SuiteReport) -> String {
        let pass = format!("{} ({:.1}%)", report.pass_count, report.pass_rate);
        let fail = format!("{} ({:.1}%)", report.fail_count, report.fail_rate());
        format!(
            "Total: {} | Pass: {} | Fail: {} | Error: {} | Duration: {:.2}s",
            report.total_tests,
            self.paint(&pass, GREEN, report.pass_count > 0),
            self.paint(&fail, RED, report.fail_count > 0),
            report.error_count,
            report.total_duration_seconds
        )
    }

    fn render_table(&self, report: &SuiteReport) -> Result<String, ReportError> {
        let mut output = String::new();

        writeln!(output, "\n{:=^70}", " Test Report ")?;
        writeln!(output, "{}", self.summary_line(report))?;
        writeln!(output, "{:-<70}", "")?;

        for result in &report.test_results {
            self.write_result(&mut output, result)?;
        }

        writeln!(output, "{:=<70}", "")?;
        Ok(output)
    }

    fn write_result(&self, output: &mut String, result: &TestResult) -> std::fmt::Result {
        let tag = format!("{} {:<5}", result.status.symbol(), result.status.to_string());
        let attempts = match result.attempts {
            1 => "1 attempt".to_string(),
            n => format!("{n} attempts"),
        };

        writeln!(
            output,
            "{} {} - {} [{}ms, {}]",
            self.status_tag(&tag, result.status),
            result.test_id,
            result.test_name,
            result.duration_ms,
            attempts
        )?;

        for step in &result.steps {
            let mark = if step.success { "✓" } else { "✗" };
            writeln!(output, "    {} {}: {}", mark, step.name, step.message)?;
        }

        if let Some(msg) = &result.error_message {
            writeln!(output, "    error: {}", self.paint(msg, RED, true))?;
        }
        Ok(())
    }

    fn render_csv(&self, results: &[TestResult]) -> Result<String, ReportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for result in results {
            writer.serialize(CsvRow {
                test_id: &result.test_id,
                test_name: &result.test_name,
                status: result.status,
                attempts: result.attempts,
                duration_ms: result.duration_ms,
                start_time: result.start_time.to_rfc3339(),
                error_message: result.error_message.as_deref().unwrap_or(""),
            })?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ReportError::Csv(e.into_error().into()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn status_tag(&self, tag: &str, status: TestStatus) -> String {
        let color = match status {
            TestStatus::Pass => GREEN,
            TestStatus::Fail => RED,
            TestStatus::Error => YELLOW,
        };
        self.paint(tag, color, true)
    }

    fn paint(&self, text: &str, color: &str, when: bool) -> String {
        if self.colorize && when {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(ReportFormat::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_results;

    fn report() -> SuiteReport {
        SuiteReport::from_results(&sample_results())
    }

    #[test]
    fn test_summary_line() {
        let line = ReportGenerator::new(ReportFormat::Summary)
            .no_color()
            .render(&report())
            .unwrap();
        assert_eq!(
            line,
            "Total: 3 | Pass: 1 (33.3%) | Fail: 2 (66.7%) | Error: 1 | Duration: 2.00s"
        );
    }

    #[test]
    fn test_table_lists_steps_and_errors() {
        let table = ReportGenerator::default().no_color().render(&report()).unwrap();

        assert!(table.contains("Test Report"));
        assert!(table.contains("✓ PASS  V001 - Nominal voltage output [1200ms, 1 attempt]"));
        assert!(table.contains("    ✓ verify: measured 12.050V"));
        assert!(table.contains("    ✗ verify: current out of range"));
        assert!(table.contains("CAN001 - BMS status [500ms, 3 attempts]"));
        assert!(table.contains("    error: bus offline"));
        assert!(!table.contains("\x1b["));
    }

    #[test]
    fn test_colorized_table() {
        let table = ReportGenerator::default().render(&report()).unwrap();
        assert!(table.contains(GREEN));
        assert!(table.contains(RED));
    }

    #[test]
    fn test_csv_rows() {
        let csv = ReportGenerator::new(ReportFormat::Csv)
            .render(&report())
            .unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("test_id,test_name,status,attempts,duration_ms"));
        assert!(lines[1].starts_with("V001,Nominal voltage output,pass,1,1200,"));
        assert!(lines[3].starts_with("CAN001,BMS status,error,3,500,"));
        assert!(lines[3].ends_with("bus offline"));
    }

    #[test]
    fn test_json_is_deterministic() {
        let generator = ReportGenerator::new(ReportFormat::Json);
        let report = report();
        let first = generator.render(&report).unwrap();
        assert_eq!(first, generator.render(&report).unwrap());
        assert!(!first.contains('\n'));

        let pretty = ReportGenerator::new(ReportFormat::JsonPretty)
            .render(&report)
            .unwrap();
        assert!(pretty.contains("\n  \"totalTests\": 3"));
    }
}
