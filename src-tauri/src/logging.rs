//! Logging for WebTray.
//!
//! Every `log` record goes to the console through `env_logger` (filtered by
//! `RUST_LOG`, default `info`) and to a daily file in the app log directory,
//! rotated by size. Frontend logs arrive through the `write_log` command.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tauri::{command, AppHandle, Manager};

use crate::error::{WebTrayError, WebTrayResult};

/// Maximum log file size before rotation (5MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of log files to keep
const MAX_LOG_FILES: usize = 5;

const LOG_PREFIX: &str = "webtray";

lazy_static::lazy_static! {
    /// Global log file handle
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
    /// Log directory path
    static ref LOG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Console logger plus the log file.
struct TeeLogger {
    console: env_logger::Logger,
}

impl log::Log for TeeLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.console.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.console.matches(record) {
            return;
        }
        self.console.log(record);
        write_line(record.level(), record.target(), &record.args().to_string());
    }

    fn flush(&self) {
        self.console.flush();
        if let Ok(mut file) = LOG_FILE.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the logger. Safe to call once; later calls are ignored.
pub fn init_console() {
    let console = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let max_level = console.filter();
    if log::set_boxed_logger(Box::new(TeeLogger { console })).is_ok() {
        log::set_max_level(max_level);
    }
}

/// Start writing to the app log directory.
pub fn init_file(app: &AppHandle) -> WebTrayResult<()> {
    let log_dir = app
        .path()
        .app_log_dir()
        .map_err(|e| WebTrayError::Other(format!("Failed to get log directory: {}", e)))?;
    fs::create_dir_all(&log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(current_log_path(&log_dir))?;

    if let Ok(mut dir) = LOG_DIR.lock() {
        *dir = Some(log_dir.clone());
    }
    if let Ok(mut log_file) = LOG_FILE.lock() {
        *log_file = Some(file);
    }

    log::info!("[LOG] Log directory: {:?}", log_dir);
    cleanup_old_logs(&log_dir);
    Ok(())
}

/// One file per day.
fn current_log_path(log_dir: &Path) -> PathBuf {
    let date = Local::now().format("%Y-%m-%d");
    log_dir.join(format!("{}_{}.log", LOG_PREFIX, date))
}

/// Keep only the most recent MAX_LOG_FILES
fn cleanup_old_logs(log_dir: &Path) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "log"))
        .collect();

    // Newest first
    log_files.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time)
    });

    for file in log_files.into_iter().skip(MAX_LOG_FILES) {
        let _ = fs::remove_file(file.path());
    }
}

fn check_rotation() {
    let log_dir = match LOG_DIR.lock() {
        Ok(dir) => match dir.as_ref() {
            Some(dir) => dir.clone(),
            None => return,
        },
        Err(_) => return,
    };

    let current_path = current_log_path(&log_dir);
    let Ok(metadata) = fs::metadata(&current_path) else {
        return;
    };
    if metadata.len() <= MAX_LOG_SIZE {
        return;
    }

    let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
    let rotated_path = log_dir.join(format!("{}_{}.log", LOG_PREFIX, timestamp));
    let _ = fs::rename(&current_path, &rotated_path);

    if let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&current_path)
    {
        if let Ok(mut log_file) = LOG_FILE.lock() {
            *log_file = Some(file);
        }
    }
    cleanup_old_logs(&log_dir);
}

fn format_line(level: log::Level, source: &str, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    format!("[{}] [{}] [{}] {}\n", timestamp, level, source, message)
}

fn write_line(level: log::Level, source: &str, message: &str) {
    let line = format_line(level, source, message);
    let written = match LOG_FILE.lock() {
        Ok(mut log_file) => match log_file.as_mut() {
            Some(file) => file.write_all(line.as_bytes()).is_ok(),
            None => false,
        },
        Err(_) => false,
    };
    if written {
        check_rotation();
    }
}

fn parse_level(level: &str) -> log::Level {
    match level.to_lowercase().as_str() {
        "trace" => log::Level::Trace,
        "debug" => log::Level::Debug,
        "warn" | "warning" => log::Level::Warn,
        "error" => log::Level::Error,
        _ => log::Level::Info,
    }
}

// ============================================================================
// Tauri Commands
// ============================================================================

/// Write a log message from the frontend
#[command]
pub fn write_log(level: String, source: String, message: String) {
    log::log!(target: "frontend", parse_level(&level), "[{}] {}", source, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("WARNING"), log::Level::Warn);
        assert_eq!(parse_level("error"), log::Level::Error);
        assert_eq!(parse_level("whatever"), log::Level::Info);
    }

    #[test]
    fn test_line_format() {
        let line = format_line(log::Level::Warn, "page", "hello");
        assert!(line.ends_with("[WARN] [page] hello\n"));
        assert!(line.starts_with('['));
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = std::env::temp_dir().join(format!("webtray-logs-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for i in 0..(MAX_LOG_FILES + 3) {
            fs::write(dir.join(format!("{}_{}.log", LOG_PREFIX, i)), b"x").unwrap();
        }
        fs::write(dir.join("notes.txt"), b"keep").unwrap();

        cleanup_old_logs(&dir);

        let logs = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "log"))
            .count();
        assert_eq!(logs, MAX_LOG_FILES);
        assert!(dir.join("notes.txt").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
