//! Configuration module for flowgraph-rs
//!
//! This module handles:
//! - Locating the plugin folder (CLI flag, environment, platform default)
//! - Reading globals config files used to override flowchart parameters
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.flowgraph.flowgraph-rs/`
//! - **macOS**: `~/Library/Application Support/dev.flowgraph.flowgraph-rs/`
//! - **Windows**: `%APPDATA%\dev.flowgraph.flowgraph-rs\`
//!
//! # Globals file
//!
//! ```toml
//! factor = 0.5
//! bounds = [0.0, 10.0]
//! input = "data/points.csv"
//! clamp = true
//! ```

use crate::error::{FlowError, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.flowgraph.flowgraph-rs";

/// Environment variable naming the plugin folder
pub const PLUGIN_FOLDER_ENV: &str = "FLOWGRAPH_PLUGIN_FOLDER";

/// Plugin folder name, both under the data dir and as the local fallback
pub const PLUGIN_FOLDER_NAME: &str = "plugins";

/// Global overrides: external name to raw value tokens
pub type GlobalOverrides = IndexMap<String, Vec<String>>;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Default plugin folder: `<data dir>/<APP_ID>/plugins`, or `./plugins`
/// when the platform has no data directory.
pub fn default_plugin_folder() -> PathBuf {
    app_data_dir()
        .map(|dir| dir.join(PLUGIN_FOLDER_NAME))
        .unwrap_or_else(|| PathBuf::from(PLUGIN_FOLDER_NAME))
}

/// Resolve the plugin folder: CLI flag, then environment, then default.
pub fn resolve_plugin_folder(cli: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli {
        return path;
    }
    match std::env::var_os(PLUGIN_FOLDER_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => default_plugin_folder(),
    }
}

// ==================== Globals Config ====================

/// Globals read from a TOML config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalsConfig {
    pub values: GlobalOverrides,
}

impl GlobalsConfig {
    /// Load a globals file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlowError::Config(format!(
                "Failed to read globals file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            e.with_context(format!("Globals file {}", path.display()))
        })?;
        tracing::debug!(
            "Loaded {} globals from {}",
            config.values.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse a globals table from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| FlowError::Config(e.to_string()))?;

        let mut values = GlobalOverrides::new();
        for (name, value) in table {
            let tokens = value_tokens(&name, &value)?;
            values.insert(name, tokens);
        }
        Ok(Self { values })
    }

    /// Merge with CLI overrides; CLI values win for the same name.
    pub fn merged_with(mut self, cli: GlobalOverrides) -> GlobalOverrides {
        for (name, tokens) in cli {
            self.values.insert(name, tokens);
        }
        self.values
    }
}

fn value_tokens(name: &str, value: &toml::Value) -> Result<Vec<String>> {
    match value {
        toml::Value::Array(items) => items
            .iter()
            .map(|item| scalar_token(name, item))
            .collect(),
        other => Ok(vec![scalar_token(name, other)?]),
    }
}

fn scalar_token(name: &str, value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(FlowError::Config(format!(
            "Global '{}' has unsupported {} value",
            name,
            other.type_str()
        ))),
    }
}

/// Parse `--name v1 v2 --other v3` into global overrides.
///
/// Values may start with a single `-` (negative numbers). A name given
/// twice keeps its last values.
pub fn parse_global_args<S: AsRef<str>>(args: &[S]) -> Result<GlobalOverrides> {
    let mut values = GlobalOverrides::new();
    let mut current: Option<String> = None;

    for arg in args {
        let arg = arg.as_ref();
        if let Some(name) = arg.strip_prefix("--") {
            if name.is_empty() {
                return Err(FlowError::Config("Empty global name '--'".to_string()));
            }
            finish_global(&values, current.take())?;
            values.insert(name.to_string(), Vec::new());
            current = Some(name.to_string());
        } else {
            let name = current.as_ref().ok_or_else(|| {
                FlowError::Config(format!("Value '{}' given before any --<global> name", arg))
            })?;
            if let Some(tokens) = values.get_mut(name) {
                tokens.push(arg.to_string());
            }
        }
    }
    finish_global(&values, current)?;
    Ok(values)
}

fn finish_global(values: &GlobalOverrides, name: Option<String>) -> Result<()> {
    match name {
        Some(name) if values.get(&name).map_or(true, Vec::is_empty) => Err(FlowError::Config(
            format!("Global '--{}' is missing a value", name),
        )),
        _ => Ok(()),
    }
}
