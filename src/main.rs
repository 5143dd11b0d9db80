//! flowgraph-rs - Main Entry Point
//!
//! Loads node plugins, loads a flowchart, applies global overrides and runs
//! it once in batch mode.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use flowgraph_rs::{
    config::{self, GlobalOverrides, GlobalsConfig},
    NodeManager, PluginManager, TerminalType,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "flowgraph-rs",
    about = "Run flow-based programs built from typed nodes",
    version
)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(short, long, value_name = "FILE", value_parser = parse_log_file)]
    log: Option<PathBuf>,

    /// Folder to load node plugins from
    #[arg(short, long, value_name = "DIR")]
    plugin_folder: Option<PathBuf>,

    /// Trace-level logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a flowchart once
    Run {
        /// Flowchart JSON file
        flowchart: PathBuf,

        /// TOML file with global values
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Global overrides after `--`: --<name> <value>...
        #[arg(last = true, value_name = "GLOBALS")]
        globals: Vec<String>,
    },

    /// List loaded registers and their node types
    Info,

    /// List a flowchart's globals and their current values
    Globals {
        /// Flowchart JSON file
        flowchart: PathBuf,
    },
}

fn parse_log_file(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(format!(
            "log directory {} does not exist",
            parent.display()
        )),
        _ => Ok(path),
    }
}

fn init_logging(log: Option<&Path>, verbose: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let default_filter = if verbose {
        "info,flowgraph_rs=trace"
    } else {
        "info,flowgraph_rs=debug"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = match log {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(guard)
}

fn load_plugins(folder: Option<PathBuf>, verbose: bool) -> PluginManager {
    let folder = config::resolve_plugin_folder(folder);
    let mut plugins = PluginManager::new();
    let report = plugins.load_dir(&folder, verbose);
    if !report.failures.is_empty() {
        tracing::warn!(
            "{} plugin(s) failed to load from {}",
            report.failures.len(),
            folder.display()
        );
    }
    plugins
}

/// Load a flowchart with the working directory set to its folder, so
/// relative paths inside it resolve against the file.
fn load_flowchart(path: &Path, plugins: &PluginManager) -> anyhow::Result<NodeManager> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Flowchart {} not found", path.display()))?;
    if let Some(dir) = path.parent() {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Cannot enter folder {}", dir.display()))?;
    }
    NodeManager::load_json(&path, plugins.registers())
        .with_context(|| format!("Failed to load flowchart {}", path.display()))
}

fn run(
    flowchart: &Path,
    config_file: Option<&Path>,
    globals: &[String],
    plugins: &PluginManager,
) -> anyhow::Result<ExitCode> {
    let cli_globals = config::parse_global_args(globals)?;
    let file_globals = match config_file {
        Some(path) => GlobalsConfig::load(path)?,
        None => GlobalsConfig::default(),
    };
    let overrides: GlobalOverrides = file_globals.merged_with(cli_globals);

    let mut manager = load_flowchart(flowchart, plugins)?;
    manager
        .apply_overrides(&overrides)
        .context("Failed to apply globals")?;

    let report = manager.run_all()?;
    println!("{}", report);
    for failure in &report.failures {
        println!("  {}", failure);
    }
    for id in &report.unresolved {
        println!("  node {} unresolved", id);
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn info(plugins: &PluginManager) {
    let types: Vec<&str> = TerminalType::builtin().iter().map(|ty| ty.name()).collect();
    println!("Terminal types: {} (plugins may add opaque types)", types.join(", "));
    for register in plugins.registers().iter() {
        let origin = if register.is_plugin() { "plugin" } else { "built-in" };
        println!("{} ({}, {} types)", register.name(), origin, register.len());
        for type_name in register.type_names() {
            println!("  {}", register.qualify(type_name));
        }
    }
}

fn list_globals(flowchart: &Path, plugins: &PluginManager) -> anyhow::Result<()> {
    let manager = load_flowchart(flowchart, plugins)?;
    if manager.globals().is_empty() {
        println!("No globals declared");
        return Ok(());
    }
    for binding in manager.globals().iter() {
        let params = manager.parameters(&binding.node_id)?;
        let Some(param) = params.get(&binding.parameter_name) else {
            bail!(
                "Global {} points at missing parameter {}.{}",
                binding.external_name,
                binding.node_id,
                binding.parameter_name
            );
        };
        println!(
            "--{} = {}  ({}.{}, {})",
            binding.external_name,
            param.value(),
            binding.node_id,
            binding.parameter_name,
            param.kind_name()
        );
    }
    Ok(())
}

fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Run {
            flowchart,
            config,
            globals,
        } => {
            // Resolve before load_flowchart changes the working directory.
            let config = config
                .map(|p| {
                    p.canonicalize()
                        .with_context(|| format!("Globals file {} not found", p.display()))
                })
                .transpose()?;
            let plugins = load_plugins(cli.plugin_folder, cli.verbose);
            let code = run(&flowchart, config.as_deref(), &globals, &plugins)?;
            drop(plugins);
            Ok(code)
        }
        Commands::Info => {
            let plugins = load_plugins(cli.plugin_folder, true);
            info(&plugins);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Globals { flowchart } => {
            let plugins = load_plugins(cli.plugin_folder, cli.verbose);
            list_globals(&flowchart, &plugins)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = match init_logging(cli.log.as_deref(), cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!("Starting flowgraph-rs");

    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
