//! Command-line interface for shadecache.
//!
//! Subcommands build shaders through the same cache the library exposes,
//! using the naga backend so no GPU is required.

use crate::debug;
use crate::shader_watcher::ShaderWatcher;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use parking_lot::Mutex;
use shadecache_config::{Config, LogLevel};
use shadecache_render::{
    NagaBackend, Preprocessor, ShaderError, ShaderKey, ShaderManager, ShaderStage, share,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// shadecache - compile, cache and hot reload GLSL shader programs
#[derive(Parser, Debug)]
#[command(name = "shadecache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Shader root directory (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub shaders_dir: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, global = true, value_name = "LEVEL", value_parser = parse_log_level)]
    pub log_level: Option<LevelFilter>,

    /// Config file to use instead of ~/.config/shadecache/config.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build each shader key and report the result
    Check {
        /// Shader keys, e.g. `basic:` or `water:USE_FOAM`
        #[arg(required = true, value_name = "KEY")]
        keys: Vec<String>,
    },

    /// Print the preprocessed source of a single stage file
    Preprocess {
        /// Stage file (.vert, .frag, .geom or an include)
        file: PathBuf,

        /// Define to inject after `#version` (repeatable)
        #[arg(short = 'D', long = "define", value_name = "DEFINE")]
        defines: Vec<String>,
    },

    /// Print the WGSL translation of a linked program
    Wgsl {
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Build shader keys, then rebuild them whenever their sources change
    Watch {
        #[arg(required = true, value_name = "KEY")]
        keys: Vec<String>,
    },
}

fn parse_log_level(value: &str) -> std::result::Result<LevelFilter, String> {
    LogLevel::from_name(value)
        .map(LogLevel::to_level_filter)
        .ok_or_else(|| {
            let names: Vec<String> = LogLevel::all()
                .iter()
                .map(|l| format!("{l:?}").to_lowercase())
                .collect();
            format!("unknown log level '{value}', expected one of: {}", names.join(", "))
        })
}

impl Cli {
    /// Load the config file named by `--config`, or the default one, and
    /// apply the `--shaders-dir` override.
    pub fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load().context("Failed to load config")?,
        };
        Ok(match &self.shaders_dir {
            Some(dir) => config.with_shaders_dir(dir.to_string_lossy()),
            None => config,
        })
    }
}

/// Parse arguments, set up logging and run the subcommand. Returns the
/// process exit code.
pub fn process_cli() -> Result<i32> {
    let cli = Cli::parse();
    debug::init_log_bridge(cli.log_level);

    let config = cli.load_config()?;
    debug::apply_config_log_level(config.log_level.to_level_filter());
    log::info!("shadecache {} starting", env!("CARGO_PKG_VERSION"));

    run(cli.command, &config)
}

/// Run one subcommand against `config`.
pub fn run(command: Commands, config: &Config) -> Result<i32> {
    match command {
        Commands::Check { keys } => Ok(check(&keys, config)),
        Commands::Preprocess { file, defines } => {
            let preprocessor = Preprocessor::new(config.shaders_dir());
            let source = preprocessor.preprocess(&file, &defines)?;
            println!("{}", source.text);
            Ok(0)
        }
        Commands::Wgsl { key } => wgsl(&key, config),
        Commands::Watch { keys } => watch(&keys, config),
    }
}

fn naga_manager(config: &Config) -> (Arc<Mutex<NagaBackend>>, ShaderManager) {
    let backend = share(NagaBackend::new());
    let manager = ShaderManager::new(backend.clone(), config);
    (backend, manager)
}

fn report_failure(key: &str, error: &ShaderError) {
    println!("FAILED {key}: {error}");
    if let Some(log) = error.diagnostic_log() {
        for line in log.lines() {
            println!("    {line}");
        }
    }
}

/// Build every key; exit code 1 if any failed.
fn check(keys: &[String], config: &Config) -> i32 {
    let (_backend, mut manager) = naga_manager(config);
    let mut failed = 0;
    for key in keys {
        match manager.get_smart_shader(key) {
            Ok(program) => println!("OK     {key} ({} stages)", program.stages().len()),
            Err(e) => {
                failed += 1;
                report_failure(key, &e);
            }
        }
    }
    if failed > 0 {
        println!("{failed} of {} shader(s) failed", keys.len());
        1
    } else {
        0
    }
}

fn wgsl(key: &str, config: &Config) -> Result<i32> {
    let (backend, mut manager) = naga_manager(config);
    let program = match manager.get_smart_shader(key) {
        Ok(program) => program,
        Err(e) => {
            report_failure(key, &e);
            return Ok(1);
        }
    };
    let handle = program
        .handle()
        .with_context(|| format!("Shader {key} has no program handle"))?;

    for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
        let wgsl = backend
            .lock()
            .program_wgsl(handle, stage)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to emit WGSL for {stage} stage of {key}"))?;
        println!("// {stage} stage of {key}\n{wgsl}");
    }
    Ok(0)
}

fn watch(keys: &[String], config: &Config) -> Result<i32> {
    let (_backend, mut manager) = naga_manager(config);
    // The watcher drives reloads; mtime polling would only duplicate them.
    manager.set_auto_reload(false);

    let keys: Vec<ShaderKey> = keys.iter().map(|k| ShaderKey::parse(k)).collect();
    rebuild_missing(&mut manager, &keys);

    let watcher = ShaderWatcher::new(manager.root(), config.hot_reload_delay_ms)?;
    println!("Watching {} (Ctrl+C to stop)", watcher.root().display());

    loop {
        let Some(event) = watcher.recv_timeout(Duration::from_millis(500)) else {
            continue;
        };
        let evicted = manager.invalidate_file(&event.path);
        // Drain the rest of a burst before rebuilding.
        let more = watcher.apply_pending(&mut manager);
        let all_ready = keys.iter().all(|k| manager.has_resource(k));
        if evicted == 0 && more.is_empty() && all_ready {
            continue;
        }
        println!("Changed: {}", event.path.display());
        rebuild_missing(&mut manager, &keys);
    }
}

fn rebuild_missing(manager: &mut ShaderManager, keys: &[ShaderKey]) {
    for key in keys {
        if manager.has_resource(key) {
            continue;
        }
        match manager.get_shader(key) {
            Ok(_) => println!("OK     {key}"),
            Err(e) => report_failure(&key.to_string(), &e),
        }
    }
}
