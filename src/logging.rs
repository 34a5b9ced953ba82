//! CreamDeck Logging System
//!
//! Console logging mirrored to a per-run log file, with a short run header

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

static LOGGER: OnceLock<Mutex<CreamLogger>> = OnceLock::new();

// ============================================================================
// Run Header
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunInfo {
    pub app_version: String,
    pub os: String,
    pub arch: String,
    pub working_dir: String,
}

impl RunInfo {
    pub fn detect() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            working_dir: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "Unknown".to_string()),
        }
    }

    pub fn to_log_header(&self) -> String {
        format!(
r#"================================================================================
CreamDeck Log - {}
================================================================================
Application:   CreamDeck v{}
Platform:      {} ({})
Working Dir:   {}
================================================================================"#,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.app_version,
            self.os,
            self.arch,
            self.working_dir
        )
    }
}

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Action, // Decisions taken on the user's behalf
    Download,
    Install,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Action => "[ACTION]",
            LogLevel::Download => "[DOWNLOAD]",
            LogLevel::Install => "[INSTALL]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

// ============================================================================
// CreamDeck Logger
// ============================================================================

pub struct CreamLogger {
    log_file: Option<File>,
}

impl CreamLogger {
    /// Console-only logger
    pub fn console() -> Self {
        Self { log_file: None }
    }

    /// Logger that also appends to `creamdeck_<timestamp>.log` inside `log_dir`
    pub fn with_log_dir(log_dir: &Path) -> Self {
        let _ = fs::create_dir_all(log_dir);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("creamdeck_{}.log", timestamp));

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok();

        let mut logger = Self { log_file };
        let header = RunInfo::detect().to_log_header();
        logger.write_file(&header);
        logger
    }

    fn write_file(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }
    }

    fn write_raw(&mut self, level: LogLevel, msg: &str) {
        self.write_file(msg);

        match level {
            LogLevel::Warning | LogLevel::Error => eprintln!("{}", msg),
            _ => println!("{}", msg),
        }
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        let formatted = format!("[{}] {} {}", timestamp, level.prefix(), message);
        self.write_raw(level, &formatted);
    }
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Initialize the global logger (call once at startup).
///
/// With `log_dir` set, every line is mirrored to a timestamped file in that
/// directory. Returns `false` if a logger was already installed.
pub fn init_logger(log_dir: Option<&Path>) -> bool {
    let logger = match log_dir {
        Some(dir) => CreamLogger::with_log_dir(dir),
        None => CreamLogger::console(),
    };
    LOGGER.set(Mutex::new(logger)).is_ok()
}

/// Get the global logger instance, falling back to console-only
fn logger() -> &'static Mutex<CreamLogger> {
    LOGGER.get_or_init(|| Mutex::new(CreamLogger::console()))
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    logger().lock().log(LogLevel::Info, message);
}

pub fn log_action(message: &str) {
    logger().lock().log(LogLevel::Action, message);
}

pub fn log_download(message: &str) {
    logger().lock().log(LogLevel::Download, message);
}

pub fn log_install(message: &str) {
    logger().lock().log(LogLevel::Install, message);
}

pub fn log_warning(message: &str) {
    logger().lock().log(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    logger().lock().log(LogLevel::Error, message);
}
