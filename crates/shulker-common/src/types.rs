use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ShulkerError;

pub type Result<T> = std::result::Result<T, ShulkerError>;

/// Data version of snapshot 15w32a, the first to stamp `DataVersion` into chunks.
pub const DATA_15W32A: i32 = 100;

/// Data version of snapshot 17w47a. Chunks from here on store palettes.
pub const DATA_FLATTENING: i32 = 1451;

/// A Java Edition release, ordered by release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

// (data version, release) for every release that carries one
const DATA_VERSIONS: &[(i32, Version)] = &[
    (169, Version::new(1, 9, 0)),
    (175, Version::new(1, 9, 1)),
    (176, Version::new(1, 9, 2)),
    (183, Version::new(1, 9, 3)),
    (184, Version::new(1, 9, 4)),
    (510, Version::new(1, 10, 0)),
    (511, Version::new(1, 10, 1)),
    (512, Version::new(1, 10, 2)),
    (819, Version::new(1, 11, 0)),
    (921, Version::new(1, 11, 1)),
    (922, Version::new(1, 11, 2)),
    (1139, Version::new(1, 12, 0)),
    (1241, Version::new(1, 12, 1)),
    (1343, Version::new(1, 12, 2)),
    // 17w47a, the snapshot that flattened block ids into palettes
    (DATA_FLATTENING, Version::new(1, 13, 0)),
    (1519, Version::new(1, 13, 0)),
    (1628, Version::new(1, 13, 1)),
    (1631, Version::new(1, 13, 2)),
    (1952, Version::new(1, 14, 0)),
    (1957, Version::new(1, 14, 1)),
    (1963, Version::new(1, 14, 2)),
    (1968, Version::new(1, 14, 3)),
    (1976, Version::new(1, 14, 4)),
    (2225, Version::new(1, 15, 0)),
    (2227, Version::new(1, 15, 1)),
    (2230, Version::new(1, 15, 2)),
];

impl Version {
    /// Every chunk written before data versions existed.
    pub const PRE_15W32A: Version = Version::new(1, 8, 9);
    pub const LATEST: Version = Version::new(1, 15, 2);

    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Resolves a chunk's `DataVersion` to the newest release not after it.
    /// Snapshots map to the release preceding them, except 1.13 snapshots
    /// from 17w47a on, which already use the 1.13 layout.
    pub fn from_data_version(data: i32) -> Version {
        if data < DATA_15W32A {
            return Version::PRE_15W32A;
        }
        DATA_VERSIONS
            .iter()
            .take_while(|(d, _)| *d <= data)
            .last()
            .map(|(_, v)| *v)
            .unwrap_or(Version::PRE_15W32A)
    }

    /// The data version of this exact release, if it has one.
    pub fn data_version(&self) -> Option<i32> {
        DATA_VERSIONS
            .iter()
            .rev()
            .find(|(_, v)| v == self)
            .map(|(d, _)| *d)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

impl FromStr for Version {
    type Err = ShulkerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ShulkerError::InvalidVersion(s.to_owned());

        let mut parts = s.trim().split('.');
        let mut next = |required: bool| -> Result<u16> {
            match parts.next() {
                Some(p) => p.parse::<u16>().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };
        let version = Version::new(next(true)?, next(true)?, next(false)?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl TryFrom<String> for Version {
    type Error = ShulkerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}
