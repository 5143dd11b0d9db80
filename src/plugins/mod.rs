//! Dynamic plugin loading.
//!
//! A plugin is a `cdylib` built against this crate that exports two
//! symbols, normally generated by [`declare_plugin!`](crate::declare_plugin):
//!
//! - `flowgraph_plugin_api_version() -> u32`, which must equal
//!   [`PLUGIN_API_VERSION`];
//! - `flowgraph_plugin_registers() -> Vec<NodeRegister>`, the registers the
//!   plugin contributes.
//!
//! The registers cross the boundary as Rust values, so a plugin must be
//! built with the same compiler and crate version as the host.
//!
//! Each register keeps an `Arc` of its library and every node keeps an
//! `Arc` of its register: a library is only unmapped after the last node,
//! manager and register built from it are gone.

use crate::flowchart::register::{NodeRegister, NodeRegisterMap};
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// ABI version of the plugin entry points.
pub const PLUGIN_API_VERSION: u32 = 1;

pub const API_VERSION_SYMBOL: &[u8] = b"flowgraph_plugin_api_version";
pub const REGISTERS_SYMBOL: &[u8] = b"flowgraph_plugin_registers";

type ApiVersionFn = unsafe extern "C" fn() -> u32;
type RegistersFn = unsafe fn() -> Vec<NodeRegister>;

/// Export the plugin entry points from a `cdylib`.
///
/// ```ignore
/// fn registers() -> Vec<NodeRegister> {
///     let mut r = NodeRegister::create("Extra");
///     r.register_node::<MyNode>("MyNode").ok();
///     vec![r]
/// }
/// flowgraph_rs::declare_plugin!(registers);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($build:path) => {
        #[no_mangle]
        pub extern "C" fn flowgraph_plugin_api_version() -> u32 {
            $crate::plugins::PLUGIN_API_VERSION
        }

        #[no_mangle]
        pub fn flowgraph_plugin_registers() -> ::std::vec::Vec<$crate::flowchart::NodeRegister> {
            $build()
        }
    };
}

/// Errors from loading a single plugin. Never fatal for the host.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("{path} does not export '{symbol}'")]
    MissingEntryPoint { path: PathBuf, symbol: String },

    #[error("{path} targets plugin API {found}, host provides {expected}")]
    Incompatible {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("{path} provides register '{name}', which is already loaded")]
    DuplicateRegister { path: PathBuf, name: String },
}

/// A loaded plugin library and the registers it contributed.
#[derive(Debug)]
pub struct LoadedPlugin {
    pub path: PathBuf,
    pub registers: Vec<String>,
    library: Arc<Library>,
}

impl LoadedPlugin {
    /// Handles on the library held outside this record: one per live
    /// register plus one per opaque value produced by the plugin's nodes.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.library) - 1
    }
}

/// Result of scanning a plugin folder.
#[derive(Debug, Default)]
pub struct PluginReport {
    pub loaded: Vec<PathBuf>,
    pub failures: Vec<PluginError>,
}

impl PluginReport {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.failures.is_empty()
    }
}

/// Owns plugin libraries and the merged register namespace.
///
/// Must outlive every `NodeManager` created from [`registers`](Self::registers);
/// `unload` reports libraries that are still referenced.
#[derive(Debug)]
pub struct PluginManager {
    registers: NodeRegisterMap,
    plugins: Vec<LoadedPlugin>,
}

impl PluginManager {
    /// Manager holding only the built-in `Core` register.
    pub fn new() -> Self {
        Self {
            registers: NodeRegisterMap::with_core(),
            plugins: Vec::new(),
        }
    }

    pub fn registers(&self) -> &NodeRegisterMap {
        &self.registers
    }

    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    /// Load every plugin library found directly in `dir`.
    ///
    /// Failures are logged and collected; a missing folder yields an empty report.
    pub fn load_dir(&mut self, dir: &Path, verbose: bool) -> PluginReport {
        let mut report = PluginReport::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "No plugins loaded, cannot read folder {}: {}",
                    dir.display(),
                    e
                );
                return report;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| is_plugin_file(path))
            .collect();
        paths.sort();

        if verbose {
            tracing::info!("Found {} plugin file(s) in {}", paths.len(), dir.display());
        }

        for path in paths {
            match self.load_plugin(&path) {
                Ok(names) => {
                    if verbose {
                        tracing::info!("Loaded plugin {} [{}]", path.display(), names.join(", "));
                    } else {
                        tracing::debug!("Loaded plugin {}", path.display());
                    }
                    report.loaded.push(path);
                }
                Err(e) => {
                    tracing::warn!("Skipping plugin: {}", e);
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// Load one plugin library. Returns the names of the registers it added.
    pub fn load_plugin(&mut self, path: &Path) -> Result<Vec<String>, PluginError> {
        // SAFETY: loading a library runs its initializers; plugins are trusted code.
        let library = unsafe { Library::new(path) }.map_err(|e| PluginError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let registers = {
            let version: Symbol<ApiVersionFn> =
                unsafe { library.get(API_VERSION_SYMBOL) }.map_err(|_| {
                    PluginError::MissingEntryPoint {
                        path: path.to_path_buf(),
                        symbol: String::from_utf8_lossy(API_VERSION_SYMBOL).into_owned(),
                    }
                })?;
            let found = unsafe { version() };
            if found != PLUGIN_API_VERSION {
                return Err(PluginError::Incompatible {
                    path: path.to_path_buf(),
                    found,
                    expected: PLUGIN_API_VERSION,
                });
            }

            let build: Symbol<RegistersFn> =
                unsafe { library.get(REGISTERS_SYMBOL) }.map_err(|_| {
                    PluginError::MissingEntryPoint {
                        path: path.to_path_buf(),
                        symbol: String::from_utf8_lossy(REGISTERS_SYMBOL).into_owned(),
                    }
                })?;
            unsafe { build() }
        };

        if let Some(dup) = registers
            .iter()
            .find(|r| self.registers.get(r.name()).is_some())
        {
            return Err(PluginError::DuplicateRegister {
                path: path.to_path_buf(),
                name: dup.name().to_string(),
            });
        }

        let library = Arc::new(library);
        let mut names = Vec::with_capacity(registers.len());
        for mut register in registers {
            register.attach_library(library.clone());
            let name = register.name().to_string();
            if self.registers.insert(Arc::new(register)) {
                names.push(name);
            } else {
                tracing::warn!("Register {} listed twice by {}", name, path.display());
            }
        }

        self.plugins.push(LoadedPlugin {
            path: path.to_path_buf(),
            registers: names.clone(),
            library,
        });
        Ok(names)
    }

    /// Remove all plugin registers and release the libraries.
    ///
    /// A library stays mapped while nodes or managers built from it are
    /// alive; this is logged so teardown order problems are visible.
    pub fn unload(&mut self) {
        for plugin in self.plugins.drain(..) {
            for name in &plugin.registers {
                self.registers.remove(name);
            }
            let refs = plugin.handle_count();
            if refs > 0 {
                tracing::warn!(
                    "Plugin {} still referenced by {} handle(s); library stays loaded",
                    plugin.path.display(),
                    refs
                );
            } else {
                tracing::debug!("Unloaded plugin {}", plugin.path.display());
            }
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Whether `path` has a shared-library extension.
pub fn is_plugin_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("so") | Some("dylib") | Some("dll")
    )
}
