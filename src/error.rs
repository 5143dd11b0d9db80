//! Error handling for flowgraph-rs
//!
//! This module defines the crate-level error type and a Result alias. The
//! engine's own error enums live in `flowchart::error`; they convert into
//! `FlowError` with `?`.

use crate::flowchart::error::{GraphError, LoadError, ParameterError, ProcessingError};
use crate::plugins::PluginError;
use thiserror::Error;

/// Main error type for flowgraph-rs operations
#[derive(Error, Debug)]
pub enum FlowError {
    /// Graph mutation or lookup failures
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Parameter values that could not be parsed or validated
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// A node's process step failed
    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// Flowchart files that could not be loaded
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Plugin libraries that could not be loaded
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// Errors related to configuration loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for flowgraph-rs operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<FlowError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
