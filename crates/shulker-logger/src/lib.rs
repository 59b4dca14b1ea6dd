pub mod log;
pub mod severity;
pub mod time;

pub use log::{enabled, log, set_threshold, threshold};
pub use severity::LogSeverity;
