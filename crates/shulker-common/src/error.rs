use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ShulkerError {
    IoError(std::io::Error),
    NbtError(String),
    ConfigError(String),
    InvalidVersion(String),
    /// A section codec failure surfaced through a chunk-level operation.
    SectionError(Box<dyn Error + Send + Sync + 'static>),
}

impl fmt::Display for ShulkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShulkerError::IoError(err) => write!(f, "IO error: {}", err),
            ShulkerError::NbtError(msg) => write!(f, "NBT error: {}", msg),
            ShulkerError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            ShulkerError::InvalidVersion(name) => write!(f, "Invalid version: {:?}", name),
            ShulkerError::SectionError(err) => write!(f, "Section error: {}", err),
        }
    }
}

impl Error for ShulkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ShulkerError::IoError(err) => Some(err),
            ShulkerError::SectionError(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShulkerError {
    fn from(err: std::io::Error) -> Self {
        ShulkerError::IoError(err)
    }
}

impl From<serde_json::Error> for ShulkerError {
    fn from(err: serde_json::Error) -> Self {
        ShulkerError::ConfigError(err.to_string())
    }
}
