//! Logger module
//!
//! Provides logging utilities for the static server including:
//! - Listening and shutdown messages
//! - Access logging with preset and custom formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::LoggingSettings;
use std::net::SocketAddr;

/// Initialize the logger with settings
///
/// Should be called once at application startup. Without it, output goes to
/// stdout/stderr.
pub fn init(settings: &LoggingSettings) -> std::io::Result<()> {
    writer::init(
        settings.access_log_file.as_deref(),
        settings.error_log_file.as_deref(),
    )
}

/// Write to info log
fn write_info(message: &str) {
    match writer::get() {
        Some(writer) => writer.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(writer) => writer.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(writer) => writer.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_listening(message: &str) {
    write_info(message);
}

pub fn log_worker_threads(workers: usize) {
    write_info(&format!("Worker threads: {workers}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_connection_limit(peer_addr: &SocketAddr, limit: usize) {
    write_error(&format!(
        "[WARN] Connection limit ({limit}) reached, refusing {peer_addr}"
    ));
}

pub fn log_accept_error(err: &std::io::Error) {
    write_error(&format!("[ERROR] Failed to accept connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log a formatted access line
pub fn log_access_line(line: &str) {
    write_access(line);
}

pub fn log_signal(name: &str) {
    write_info(&format!("\n[SIGNAL] {name} received, shutting down"));
}

pub fn log_shutdown(open_connections: usize) {
    write_info(&format!(
        "[Shutdown] Stopped accepting, waiting for {open_connections} connection(s)"
    ));
}
