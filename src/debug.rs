//! Debug logging for shadecache.
//!
//! Every `log::*!` call in the workspace is routed to a debug log file in the
//! system temp directory (`shadecache_debug.log`). When `RUST_LOG` is set the
//! same lines are mirrored to stderr so output stays readable when running
//! the CLI in a terminal.
//!
//! Level precedence: `--log-level` flag, then `RUST_LOG`, then the config
//! file's `log_level` (applied after the config is loaded).

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const LOG_FILE_NAME: &str = "shadecache_debug.log";

struct DebugLogger {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
    /// Set when the level came from the CLI flag or `RUST_LOG`.
    level_pinned: AtomicBool,
}

impl DebugLogger {
    fn new(mirror_stderr: bool) -> Self {
        let file = match OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_file_path())
        {
            Ok(mut f) => {
                let _ = writeln!(
                    f,
                    "{}\nshadecache debug session started at {}\n{}",
                    "=".repeat(80),
                    get_timestamp(),
                    "=".repeat(80)
                );
                Some(f)
            }
            // Logging must never stop the program.
            Err(_) => None,
        };

        Self {
            file: Mutex::new(file),
            mirror_stderr,
            level_pinned: AtomicBool::new(false),
        }
    }
}

impl Log for DebugLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

static LOGGER: OnceLock<DebugLogger> = OnceLock::new();

/// Path of the debug log file.
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Level requested through `RUST_LOG`.
///
/// Accepts a bare level (`debug`) or `target=level` directives, in which case
/// the most verbose level mentioned wins. Unparseable values enable `Info`.
pub fn parse_rust_log(value: &str) -> Option<LevelFilter> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let level = value
        .split(',')
        .filter_map(|directive| {
            let level = directive.rsplit('=').next().unwrap_or(directive);
            level.trim().parse::<LevelFilter>().ok()
        })
        .max()
        .unwrap_or(LevelFilter::Info);
    Some(level)
}

/// Install the logger. Safe to call more than once; later calls only adjust
/// the level if a flag level is given.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let env_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| parse_rust_log(&v));

    let logger = LOGGER.get_or_init(|| DebugLogger::new(env_level.is_some()));
    if log::set_logger(logger).is_err() {
        // Someone else (a test harness) owns the global logger.
        if cli_level.is_none() {
            return;
        }
    }

    match cli_level.or(env_level) {
        Some(level) => {
            logger.level_pinned.store(true, Ordering::Relaxed);
            log::set_max_level(level);
        }
        None => log::set_max_level(LevelFilter::Off),
    }
}

/// Apply the config file's level unless the flag or `RUST_LOG` already chose
/// one. Returns whether the level was applied.
pub fn apply_config_log_level(level: LevelFilter) -> bool {
    let pinned = LOGGER
        .get()
        .is_some_and(|l| l.level_pinned.load(Ordering::Relaxed));
    if pinned {
        return false;
    }
    log::set_max_level(level);
    true
}
