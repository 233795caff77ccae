//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hwtest::ReportFormat;

/// Hardware validation test runner
#[derive(Parser, Debug)]
#[command(name = "hwtest")]
#[command(version)]
#[command(about = "Run declarative hardware validation suites")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a definition file
    Run(RunArgs),

    /// List definitions and whether their type is supported
    List(ListArgs),

    /// Write the sample BMS suite
    Sample {
        /// Output path (.json, .yaml or .yml)
        #[arg(default_value = "bms_suite.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the JSON Schema of definition files
    Schema,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Definition file (JSON or YAML)
    pub definitions: PathBuf,

    /// Run tests in parallel groups
    #[arg(short, long)]
    pub parallel: bool,

    /// Group size when parallel
    #[arg(short = 'j', long)]
    pub max_parallelism: Option<usize>,

    /// Stop dispatching after the first test that does not pass
    #[arg(short, long)]
    pub stop_on_failure: bool,

    /// Console format (table, summary, json, json-pretty, csv)
    #[arg(short, long)]
    pub format: Option<ReportFormat>,

    /// Report artifact path (defaults to <definitions>.report.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip writing the report artifact
    #[arg(long)]
    pub no_report: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Definition file (JSON or YAML)
    pub definitions: PathBuf,

    /// Show parameters of each definition
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show environment overrides only
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(default_value = "hwtest.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
