use shulker_common::{ShulkerError, Version};
use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, SectionError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    IndexOutOfRange { index: usize, length: usize },
    CoordinateOutOfRange { x: usize, y: usize, z: usize },
    /// A value wider than the field it is stored in.
    ValueOutOfRange { value: u32, max: u32 },
    InvalidLayer { layer: usize, layers: usize },
    BufferTooSmall { required: usize, available: usize },
    DimensionMismatch { expected: usize, actual: usize },
    MissingField(&'static str),
    MalformedTag(String),
    NoCodecForVersion(Version),
    UnknownBlock(String),
    Registry(String),
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionError::IndexOutOfRange { index, length } => {
                write!(f, "index {} out of range for length {}", index, length)
            }
            SectionError::CoordinateOutOfRange { x, y, z } => {
                write!(f, "coordinates ({}, {}, {}) out of range 0-15", x, y, z)
            }
            SectionError::ValueOutOfRange { value, max } => {
                write!(f, "value {} out of range 0-{}", value, max)
            }
            SectionError::InvalidLayer { layer, layers } => {
                write!(f, "layer {} invalid, storage has {} layer(s)", layer, layers)
            }
            SectionError::BufferTooSmall {
                required,
                available,
            } => write!(
                f,
                "buffer too small: need {} bytes, have {}",
                required, available
            ),
            SectionError::DimensionMismatch { expected, actual } => {
                write!(f, "expected {} entries, got {}", expected, actual)
            }
            SectionError::MissingField(name) => write!(f, "missing tag {:?}", name),
            SectionError::MalformedTag(msg) => write!(f, "malformed tag: {}", msg),
            SectionError::NoCodecForVersion(version) => {
                write!(f, "no section codec for version {}", version)
            }
            SectionError::UnknownBlock(block) => write!(f, "unknown block {}", block),
            SectionError::Registry(msg) => write!(f, "block registry: {}", msg),
        }
    }
}

impl Error for SectionError {}

impl From<SectionError> for ShulkerError {
    fn from(err: SectionError) -> Self {
        ShulkerError::SectionError(Box::new(err))
    }
}
