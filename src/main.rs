//! hwtest - hardware validation test runner
//!
//! Runs declarative test suites against the simulated bench and reports the
//! results on the console and as a JSON or YAML artifact.
//!
//! ## Usage
//!
//! ```bash
//! # Write the sample suite and run it
//! hwtest sample bms_suite.json
//! hwtest run bms_suite.json
//!
//! # Parallel groups of 3, stop at the first failure
//! hwtest run bms_suite.json --parallel -j 3 --stop-on-failure
//!
//! # Check which definitions are runnable
//! hwtest list bms_suite.json --detailed
//! ```
//!
//! Test failures are data: the exit code is non-zero only when loading or
//! orchestration fails.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{info, warn};

use hwtest::config::{is_yaml_file, EnvConfig};
use hwtest::loader::{self, DefinitionSource};
use hwtest::utils::{init_logger, LogLevel};
use hwtest::{
    default_report_path, EngineConfig, ExecutionEngine, FileLoader, Interpreter, ProgressEvent,
    ReportFormat, ReportGenerator, TestSuite,
};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(log_level(&args, &env)?);

    match args.command {
        cli::Command::Run(run_args) => run_suite(run_args, &env).await?,
        cli::Command::List(list_args) => list_definitions(list_args)?,
        cli::Command::Sample { path, force } => write_sample(&path, force)?,
        cli::Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&loader::schema())?);
        }
        cli::Command::Config(config_args) => manage_config(config_args, &env)?,
    }

    Ok(())
}

/// `--verbose` beats `--log-level`, which beats `HWTEST_LOG`
fn log_level(args: &Args, env: &EnvConfig) -> Result<LogLevel> {
    if args.verbose {
        return Ok(LogLevel::Debug);
    }
    match args.log_level.as_deref().or(env.log_level.as_deref()) {
        Some(level) => level.parse().map_err(anyhow::Error::msg),
        None => Ok(LogLevel::Info),
    }
}

fn effective_config(explicit: Option<&Path>, env: &EnvConfig) -> Result<EngineConfig> {
    let mut config = EngineConfig::resolve(explicit)?;
    config.apply_env(env);
    Ok(config)
}

async fn run_suite(args: cli::RunArgs, env: &EnvConfig) -> Result<()> {
    let mut config = effective_config(args.config.as_deref(), env)?;

    if args.parallel {
        config.parallel = true;
    }
    if let Some(max) = args.max_parallelism {
        config.max_parallelism = max;
    }
    if args.stop_on_failure {
        config.stop_on_failure = true;
    }
    if let Some(format) = args.format {
        config.report.format = format;
    }
    if args.no_color {
        config.report.colorize = false;
    }
    config.validate()?;

    info!(
        "Running {} ({:?}, stop on failure: {})",
        args.definitions.display(),
        config.execution_mode(),
        config.stop_on_failure
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let interpreter = Interpreter::simulated(config.retry);
    let engine = ExecutionEngine::new(config.clone(), interpreter).with_events(tx);

    // Machine-readable formats own stdout
    let live = matches!(config.report.format, ReportFormat::Table | ReportFormat::Summary);
    let printer = tokio::spawn(print_progress(rx, live));

    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight tests");
            cancel.cancel();
        }
    });

    let run = engine.run_file(&args.definitions).await;
    drop(engine);
    if let Err(e) = printer.await {
        warn!("Progress printer stopped: {}", e);
    }
    let run = run?;

    for rejection in &run.rejections {
        warn!("Not run: {} ({}): {}", rejection.name, rejection.id, rejection.error);
    }

    let generator =
        ReportGenerator::new(config.report.format).colorize(config.report.colorize);
    println!("{}", generator.render(&run.report)?);
    if live {
        println!("Suite: {}", run.summary);
    }

    if config.report.write && !args.no_report {
        let path = args
            .output
            .or_else(|| config.report.output_path.as_ref().map(Into::into))
            .unwrap_or_else(|| default_report_path(&args.definitions));
        ExecutionEngine::write_report(&run, &path)?;
        if live {
            println!("Report written to {}", path.display());
        }
    }

    Ok(())
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<ProgressEvent>, live: bool) {
    while let Some(event) = rx.recv().await {
        if !live {
            continue;
        }
        match event {
            ProgressEvent::SuiteStarted { total, mode } => {
                println!("Starting {total} tests ({mode:?})");
            }
            ProgressEvent::TestStarted { id, name } => {
                println!("  → {name} ({id})");
            }
            ProgressEvent::TestCompleted {
                id,
                status,
                duration_ms,
                attempts,
                ..
            } => {
                let retries = if attempts > 1 {
                    format!(", {attempts} attempts")
                } else {
                    String::new()
                };
                println!("  {} {status} {id} [{duration_ms}ms{retries}]", status.symbol());
            }
            ProgressEvent::Cancelled { remaining } => {
                println!("  Stopped: {remaining} test(s) not run");
            }
            ProgressEvent::SuiteCompleted(_) => {}
        }
    }
}

fn list_definitions(args: cli::ListArgs) -> Result<()> {
    let source = FileLoader::new(&args.definitions);
    let suite = source
        .load()
        .with_context(|| format!("Failed to load {}", source.describe()))?;
    let interpreter = Interpreter::default();

    println!(
        "\n{} ({} definitions)\n",
        suite.name.as_deref().unwrap_or("Test suite"),
        suite.tests.len()
    );
    if let Some(description) = &suite.description {
        println!("{description}\n");
    }
    println!("{:-<70}", "");

    for def in &suite.tests {
        let support = match interpreter.resolve(&def.kind) {
            Some(kind) => format!("✓ {kind}"),
            None => "✗ unsupported".to_string(),
        };
        let retry = if def.enable_retry { " [retry]" } else { "" };
        println!("  {:8} {:32} {:16}{}", def.id, def.name, support, retry);

        if args.detailed {
            for (key, value) in def.parameters.iter() {
                println!("      {key} = {value}");
            }
            if let Some(expected) = &def.expected_results {
                for (key, value) in expected.iter() {
                    println!("      expect {key} = {value}");
                }
            }
        }
    }

    println!("{:-<70}\n", "");
    Ok(())
}

fn write_sample(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "File already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let suite = TestSuite::sample();
    let content = if is_yaml_file(path) {
        serde_yaml::to_string(&suite).context("Failed to serialize sample suite")?
    } else {
        serde_json::to_string_pretty(&suite).context("Failed to serialize sample suite")?
    };
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✓ Sample suite written: {}", path.display());
    println!("\nRun it with: hwtest run {}", path.display());
    Ok(())
}

fn manage_config(args: cli::ConfigArgs, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            EngineConfig::example().save(&output)?;
            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show {
            config,
            env: env_only,
            format,
        } => {
            if env_only {
                if env.has_any() {
                    println!("{env:#?}");
                } else {
                    println!("No HWTEST_* overrides set");
                }
                return Ok(());
            }

            let config = effective_config(config.as_deref(), env)?;
            let output = if format == "json" {
                serde_json::to_string_pretty(&config)?
            } else {
                serde_yaml::to_string(&config)?
            };
            println!("{output}");
        }
    }

    Ok(())
}
