//! Definition loading
//!
//! Definition files are JSON or YAML (chosen by extension) holding either a
//! suite object or a bare list of definitions.

use schemars::schema::RootSchema;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::is_yaml_file;
use crate::models::{SuiteFile, TestDefinition, TestSuite};

/// Errors that abort a run before anything executes
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Duplicate test id '{0}'")]
    DuplicateId(String),

    #[error("Test definition #{index} has an empty id")]
    EmptyId { index: usize },
}

/// Anything that can produce a suite of definitions
pub trait DefinitionSource: Send + Sync {
    fn load(&self) -> Result<TestSuite, LoadError>;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// JSON or YAML definition file
#[derive(Clone, Debug)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<SuiteFile, LoadError> {
        let parse_err = |reason: String| LoadError::Parse {
            path: self.path.clone(),
            reason,
        };

        if is_yaml_file(&self.path) {
            serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))
        } else {
            serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))
        }
    }
}

impl DefinitionSource for FileLoader {
    fn load(&self) -> Result<TestSuite, LoadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        let suite = self.parse(&content)?.into_suite();
        validate(&suite.tests)?;

        info!(
            "Loaded {} definitions from {}",
            suite.tests.len(),
            self.path.display()
        );
        Ok(suite)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Definitions already in memory
#[derive(Clone, Debug, Default)]
pub struct InMemory {
    suite: TestSuite,
}

impl InMemory {
    pub fn new(tests: Vec<TestDefinition>) -> Self {
        Self {
            suite: TestSuite {
                tests,
                ..Default::default()
            },
        }
    }
}

impl DefinitionSource for InMemory {
    fn load(&self) -> Result<TestSuite, LoadError> {
        validate(&self.suite.tests)?;
        Ok(self.suite.clone())
    }

    fn describe(&self) -> String {
        match &self.suite.name {
            Some(name) => format!("in-memory suite '{name}'"),
            None => "in-memory suite".to_string(),
        }
    }
}

/// Ids must be non-empty and unique
pub fn validate(tests: &[TestDefinition]) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for (index, def) in tests.iter().enumerate() {
        if def.id.trim().is_empty() {
            return Err(LoadError::EmptyId { index });
        }
        if !seen.insert(def.id.as_str()) {
            return Err(LoadError::DuplicateId(def.id.clone()));
        }
    }
    debug!("Validated {} definitions", tests.len());
    Ok(())
}

/// JSON Schema of the definition file
pub fn schema() -> RootSchema {
    schemars::schema_for!(SuiteFile)
}
