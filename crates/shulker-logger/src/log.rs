use crate::severity::LogSeverity;
use crate::time::now;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable holding the minimum severity that gets printed.
pub const LOG_ENV: &str = "SHULKER_LOG";

static THRESHOLD: Lazy<AtomicU8> = Lazy::new(|| {
    let initial = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| v.parse::<LogSeverity>().ok())
        .unwrap_or(LogSeverity::Info);
    AtomicU8::new(initial as u8)
});

pub fn threshold() -> LogSeverity {
    LogSeverity::from_u8(THRESHOLD.load(Ordering::Relaxed))
}

pub fn set_threshold(severity: LogSeverity) {
    THRESHOLD.store(severity as u8, Ordering::Relaxed);
}

pub fn enabled(severity: LogSeverity) -> bool {
    severity >= threshold()
}

pub(crate) fn format_line(msg: &str, severity: LogSeverity, time: &str) -> String {
    format!("[{}] {} {}", severity, time, msg)
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if !enabled(log_severity) {
        return;
    }
    let line = format_line(&msg, log_severity, &now());
    if log_severity >= LogSeverity::Error {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}
