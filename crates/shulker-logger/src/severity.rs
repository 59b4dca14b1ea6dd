use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogSeverity {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Fatal = 4,
}

impl LogSeverity {
    pub(crate) fn from_u8(value: u8) -> LogSeverity {
        match value {
            0 => LogSeverity::Debug,
            1 => LogSeverity::Info,
            2 => LogSeverity::Warning,
            3 => LogSeverity::Error,
            _ => LogSeverity::Fatal,
        }
    }
}

/// Display impl for LogSeverity
impl Display for LogSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogSeverity::Debug => write!(f, "DEBUG"),
            LogSeverity::Info => write!(f, "INFO"),
            LogSeverity::Warning => write!(f, "WARNING"),
            LogSeverity::Error => write!(f, "ERROR"),
            LogSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}

impl FromStr for LogSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogSeverity::Debug),
            "INFO" => Ok(LogSeverity::Info),
            "WARN" | "WARNING" => Ok(LogSeverity::Warning),
            "ERROR" => Ok(LogSeverity::Error),
            "FATAL" => Ok(LogSeverity::Fatal),
            other => Err(format!("unknown log severity {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_log_severity_display() {
        assert_eq!(format!("{}", LogSeverity::Debug), "DEBUG");
        assert_eq!(format!("{}", LogSeverity::Info), "INFO");
        assert_eq!(format!("{}", LogSeverity::Warning), "WARNING");
        assert_eq!(format!("{}", LogSeverity::Error), "ERROR");
        assert_eq!(format!("{}", LogSeverity::Fatal), "FATAL");
    }

    #[test]
    fn test_log_severity_parse() {
        assert_matches!("debug".parse::<LogSeverity>(), Ok(LogSeverity::Debug));
        assert_matches!(" Warn ".parse::<LogSeverity>(), Ok(LogSeverity::Warning));
        assert_matches!("FATAL".parse::<LogSeverity>(), Ok(LogSeverity::Fatal));
        assert!("verbose".parse::<LogSeverity>().is_err());
    }

    #[test]
    fn test_log_severity_order() {
        assert!(LogSeverity::Debug < LogSeverity::Info);
        assert!(LogSeverity::Warning < LogSeverity::Error);
        for s in [LogSeverity::Debug, LogSeverity::Info, LogSeverity::Fatal] {
            assert_eq!(LogSeverity::from_u8(s as u8), s);
        }
    }
}
