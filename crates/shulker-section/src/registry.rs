use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SectionError};

include!(concat!(env!("OUT_DIR"), "/legacy_blocks.rs"));

const NAMESPACE: &str = "minecraft:";
const MAX_LEGACY_ID: u32 = 0xFFF;

static JAVA_1_12_2: Lazy<BlockRegistry> = Lazy::new(|| BlockRegistry {
    by_id: LEGACY_BLOCKS
        .iter()
        .map(|&(id, name)| (id, name.to_string()))
        .collect(),
    by_name: LEGACY_BLOCKS
        .iter()
        .map(|&(id, name)| (name.to_string(), id))
        .collect(),
});

#[derive(Deserialize, Debug)]
struct RegistryEntry {
    id: u32,
    name: String,
}

/// Two-way mapping between legacy block ids and namespaced block names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRegistry {
    by_id: BTreeMap<u32, String>,
    by_name: HashMap<String, u32>,
}

impl BlockRegistry {
    /// Block table of Java Edition 1.12.2, the last release with numeric ids.
    pub fn java_1_12_2() -> &'static BlockRegistry {
        &JAVA_1_12_2
    }

    /// Builds a registry from `(id, name)` pairs. Ids and names must be
    /// unique and ids must fit in 12 bits.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let mut registry = BlockRegistry::default();
        for (id, name) in entries {
            let name = name.into();
            if id > MAX_LEGACY_ID {
                return Err(SectionError::Registry(format!(
                    "id {} for {} exceeds {}",
                    id, name, MAX_LEGACY_ID
                )));
            }
            if registry.by_name.contains_key(&name) {
                return Err(SectionError::Registry(format!("duplicate name {}", name)));
            }
            if registry.by_id.insert(id, name.clone()).is_some() {
                return Err(SectionError::Registry(format!("duplicate id {}", id)));
            }
            registry.by_name.insert(name, id);
        }
        Ok(registry)
    }

    /// Parses a JSON array of `{"id": <u32>, "name": <string>}` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<RegistryEntry> =
            serde_json::from_str(json).map_err(|e| SectionError::Registry(e.to_string()))?;
        Self::from_entries(entries.into_iter().map(|e| (e.id, e.name)))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains_legacy_id(&self, legacy_id: u32) -> bool {
        self.by_id.contains_key(&legacy_id)
    }

    pub fn block_name(&self, legacy_id: u32) -> Option<&str> {
        self.by_id.get(&legacy_id).map(String::as_str)
    }

    /// Legacy id for a block name. A name without a namespace is looked up
    /// under `minecraft:`.
    pub fn legacy_id(&self, name: &str) -> Option<u32> {
        if let Some(&id) = self.by_name.get(name) {
            return Some(id);
        }
        if name.contains(':') {
            return None;
        }
        self.by_name.get(&format!("{}{}", NAMESPACE, name)).copied()
    }

    /// `(legacy_id << 4) | meta` for a named block.
    pub fn runtime_id(&self, name: &str, meta: u8) -> Result<u32> {
        if meta > 15 {
            return Err(SectionError::ValueOutOfRange {
                value: meta as u32,
                max: 15,
            });
        }
        let id = self
            .legacy_id(name)
            .ok_or_else(|| SectionError::UnknownBlock(name.to_string()))?;
        Ok((id << 4) | meta as u32)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.by_id.iter().map(|(&id, name)| (id, name.as_str()))
    }
}
