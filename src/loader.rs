use shulker_common::{Result, ShulkerError, Version};
use shulker_logger::{log, LogSeverity};
use shulker_nbt::Tag;
use shulker_section::{
    BlockRegistry, CodecContext, CodecRegistry, Section, SectionCodec, SectionError,
};
use std::collections::{BTreeMap, HashMap};

use crate::config::LoaderConfig;

/// One chunk column with its decoded sections keyed by vertical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub x: i32,
    pub z: i32,
    pub version: Version,
    pub sections: BTreeMap<i32, Section>,
}

/// A section that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFailure {
    /// Position in the chunk's `Sections` list.
    pub position: usize,
    /// The `Y` byte as stored, when there was one.
    pub y: Option<i8>,
    pub error: SectionError,
}

#[derive(Debug)]
pub struct LoadedChunk {
    pub chunk: Chunk,
    pub failures: Vec<SectionFailure>,
}

impl LoadedChunk {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turns chunk compounds into [`Chunk`]s and back.
pub struct ChunkLoader {
    config: LoaderConfig,
    codecs: CodecRegistry,
    registry: BlockRegistry,
}

fn take_level(root: &mut Tag) -> Result<Tag> {
    let level = root
        .as_compound_mut()
        .and_then(|map| map.remove("Level"))
        .ok_or_else(|| ShulkerError::NbtError("chunk has no Level compound".to_string()))?;
    if level.as_compound().is_none() {
        return Err(ShulkerError::NbtError("Level is not a compound".to_string()));
    }
    Ok(level)
}

fn require_int(tag: &Tag, key: &str) -> Result<i32> {
    tag.get_int(key)
        .ok_or_else(|| ShulkerError::NbtError(format!("chunk has no int {}", key)))
}

fn take_sections(level: &mut Tag) -> Result<Vec<Tag>> {
    match level.as_compound_mut().and_then(|map| map.remove("Sections")) {
        None => Ok(Vec::new()),
        Some(Tag::List(sections)) => Ok(sections),
        Some(_) => Err(ShulkerError::NbtError("Sections is not a list".to_string())),
    }
}

impl ChunkLoader {
    pub fn new(config: LoaderConfig, codecs: CodecRegistry, registry: BlockRegistry) -> Self {
        ChunkLoader {
            config,
            codecs,
            registry,
        }
    }

    /// Default codecs and the built-in block table.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self::new(
            config,
            CodecRegistry::default(),
            BlockRegistry::java_1_12_2().clone(),
        )
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Decodes a chunk root compound. Sections that fail to decode are
    /// reported in [`LoadedChunk::failures`] and do not stop the others.
    pub fn load(&self, mut root: Tag) -> Result<LoadedChunk> {
        let version = self.config.resolve_version(root.get_int("DataVersion"));
        let mut level = take_level(&mut root)?;
        let x = require_int(&level, "xPos")?;
        let z = require_int(&level, "zPos")?;
        let section_tags = take_sections(&mut level)?;

        let codec = self.codecs.select(version)?;
        let ctx = CodecContext::new(&self.registry, version);

        let mut sections = BTreeMap::new();
        let mut failures = Vec::new();
        for (position, tag) in section_tags.into_iter().enumerate() {
            let y = tag.get_byte("Y");
            let error = match codec.decode(tag, &ctx) {
                Ok(section) if sections.contains_key(&section.y()) => {
                    SectionError::MalformedTag(format!("duplicate section y {}", section.y()))
                }
                Ok(section) => {
                    sections.insert(section.y(), section);
                    continue;
                }
                Err(err) => err,
            };
            log(
                format!(
                    "Skipping section {} of chunk ({}, {}): {}",
                    position, x, z, error
                ),
                LogSeverity::Warning,
            );
            failures.push(SectionFailure { position, y, error });
        }

        log(
            format!(
                "Decoded chunk ({}, {}) as {} with {} section(s), {} failed",
                x,
                z,
                version,
                sections.len(),
                failures.len()
            ),
            LogSeverity::Debug,
        );
        Ok(LoadedChunk {
            chunk: Chunk {
                x,
                z,
                version,
                sections,
            },
            failures,
        })
    }

    /// Rebuilds the root compound of a chunk with the codec for its version.
    pub fn encode(&self, chunk: &Chunk) -> Result<Tag> {
        let codec = self.codecs.select(chunk.version)?;
        let ctx = CodecContext::new(&self.registry, chunk.version);
        let sections = chunk
            .sections
            .values()
            .map(|section| codec.encode(section, &ctx))
            .collect::<std::result::Result<Vec<Tag>, SectionError>>()?;

        let mut level = Tag::Compound(HashMap::new());
        level.insert("xPos", Tag::Int(chunk.x));
        level.insert("zPos", Tag::Int(chunk.z));
        level.insert("Sections", Tag::List(sections));

        let mut root = Tag::Compound(HashMap::new());
        if let Some(data_version) = chunk.version.data_version() {
            root.insert("DataVersion", Tag::Int(data_version));
        }
        root.insert("Level", level);
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use bytes::BytesMut;
    use shulker_section::BlockLayer;

    fn legacy_section(y: i8) -> Tag {
        let mut tag = Tag::Compound(HashMap::new());
        tag.insert("Y", Tag::Byte(y));
        tag.insert("Blocks", Tag::ByteArray(BytesMut::zeroed(4096)));
        tag.insert("Data", Tag::ByteArray(BytesMut::zeroed(2048)));
        tag
    }

    fn chunk_root(data_version: Option<i32>, sections: Vec<Tag>) -> Tag {
        let mut level = Tag::Compound(HashMap::new());
        level.insert("xPos", Tag::Int(-3));
        level.insert("zPos", Tag::Int(12));
        level.insert("Sections", Tag::List(sections));
        let mut root = Tag::Compound(HashMap::new());
        if let Some(v) = data_version {
            root.insert("DataVersion", Tag::Int(v));
        }
        root.insert("Level", level);
        root
    }

    #[test]
    fn test_load_legacy_chunk() {
        let loader = ChunkLoader::with_config(LoaderConfig::default());
        let loaded = loader
            .load(chunk_root(Some(1343), vec![legacy_section(0), legacy_section(3)]))
            .unwrap();
        assert!(loaded.is_complete());
        assert_eq!((loaded.chunk.x, loaded.chunk.z), (-3, 12));
        assert_eq!(loaded.chunk.version, Version::new(1, 12, 2));
        assert_eq!(loaded.chunk.sections.keys().copied().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_load_flattening_snapshot_chunk() {
        let mut section = Tag::Compound(HashMap::new());
        section.insert("Y", Tag::Byte(0));
        section.insert(
            "Palette",
            Tag::List(vec![
                Tag::Compound(HashMap::from([(
                    "Name".to_string(),
                    Tag::String("minecraft:air".to_string()),
                )])),
                Tag::Compound(HashMap::from([(
                    "Name".to_string(),
                    Tag::String("minecraft:stone".to_string()),
                )])),
            ]),
        );
        let mut states = vec![0i64; 256];
        states[0] = 0x1;
        section.insert("BlockStates", Tag::LongArray(states));

        let loader = ChunkLoader::with_config(LoaderConfig::default());
        let loaded = loader.load(chunk_root(Some(1451), vec![section])).unwrap();
        assert!(loaded.is_complete());
        assert_eq!(loaded.chunk.version, Version::new(1, 13, 0));
        assert_eq!(loaded.chunk.sections[&0].storage().legacy_id(0, 0, 0).unwrap(), 1);
    }

    #[test]
    fn test_fallback_version_without_data_version() {
        let loader = ChunkLoader::with_config(LoaderConfig::default());
        let loaded = loader.load(chunk_root(None, vec![legacy_section(1)])).unwrap();
        assert_eq!(loaded.chunk.version, Version::PRE_15W32A);
        assert_eq!(loaded.chunk.sections[&1].version(), Version::PRE_15W32A);
    }

    #[test]
    fn test_duplicate_y_is_a_failure() {
        let loader = ChunkLoader::with_config(LoaderConfig::default());
        let loaded = loader
            .load(chunk_root(Some(1343), vec![legacy_section(2), legacy_section(2)]))
            .unwrap();
        assert_eq!(loaded.chunk.sections.len(), 1);
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].position, 1);
        assert_eq!(loaded.failures[0].y, Some(2));
        assert_matches!(loaded.failures[0].error, SectionError::MalformedTag(_));
    }

    #[test]
    fn test_rejects_broken_chunk() {
        let loader = ChunkLoader::with_config(LoaderConfig::default());
        assert_matches!(loader.load(Tag::Int(1)), Err(ShulkerError::NbtError(_)));

        let mut root = chunk_root(Some(1343), vec![]);
        if let Some(level) = root.as_compound_mut().and_then(|m| m.get_mut("Level")) {
            level.as_compound_mut().unwrap().remove("xPos");
        }
        assert_matches!(loader.load(root), Err(ShulkerError::NbtError(_)));

        let empty = ChunkLoader::new(
            LoaderConfig::default(),
            CodecRegistry::new(),
            BlockRegistry::default(),
        );
        assert_matches!(
            empty.load(chunk_root(Some(1343), vec![])),
            Err(ShulkerError::SectionError(_))
        );
    }

    #[test]
    fn test_encode_round_trip() {
        let loader = ChunkLoader::with_config(LoaderConfig::default());
        let root = chunk_root(Some(1343), vec![legacy_section(0), legacy_section(5)]);
        let loaded = loader.load(root).unwrap();

        let encoded = loader.encode(&loaded.chunk).unwrap();
        assert_eq!(encoded.get_int("DataVersion"), Some(1343));
        let reloaded = loader.load(encoded).unwrap();
        assert_eq!(reloaded.chunk, loaded.chunk);
    }
}
