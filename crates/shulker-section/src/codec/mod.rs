//! Conversion between persisted section compounds and [`Section`] values,
//! one codec per on-disk epoch.

mod flattened;
mod legacy;

pub use flattened::FlattenedCodec;
pub use legacy::LegacyCodec;

use bytes::BytesMut;
use shulker_common::Version;
use shulker_logger::{log, LogSeverity};
use shulker_nbt::Tag;
use std::collections::HashMap;

use crate::error::{Result, SectionError};
use crate::nibble::{PackedNibbleArray, PACKED_SIZE};
use crate::registry::BlockRegistry;
use crate::section::Section;
use crate::layer::NUM_BLOCKS;

pub(crate) const KEY_Y: &str = "Y";
pub(crate) const KEY_BLOCK_LIGHT: &str = "BlockLight";
pub(crate) const KEY_SKY_LIGHT: &str = "SkyLight";

/// What a codec needs besides the tag itself.
#[derive(Debug, Clone, Copy)]
pub struct CodecContext<'a> {
    pub registry: &'a BlockRegistry,
    pub version: Version,
}

impl<'a> CodecContext<'a> {
    pub fn new(registry: &'a BlockRegistry, version: Version) -> Self {
        CodecContext { registry, version }
    }
}

pub trait SectionCodec: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Oldest format version this codec reads and writes.
    fn min_version(&self) -> Version;

    /// Decodes an owned section compound. Byte arrays move out of the tag
    /// into the section without copying.
    fn decode(&self, tag: Tag, ctx: &CodecContext<'_>) -> Result<Section>;

    /// Decodes a section compound the caller keeps; byte arrays are copied.
    fn decode_borrowed(&self, tag: &Tag, ctx: &CodecContext<'_>) -> Result<Section> {
        self.decode(tag.clone(), ctx)
    }

    fn encode(&self, section: &Section, ctx: &CodecContext<'_>) -> Result<Tag>;
}

/// Codecs ordered by minimum version.
pub struct CodecRegistry {
    codecs: Vec<Box<dyn SectionCodec>>,
}

impl Default for CodecRegistry {
    /// The Anvil legacy codec and the flattened palette codec.
    fn default() -> Self {
        let mut registry = CodecRegistry::new();
        registry.register(Box::new(LegacyCodec::default()));
        registry.register(Box::new(FlattenedCodec::default()));
        registry
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        CodecRegistry { codecs: Vec::new() }
    }

    /// Adds a codec. A codec with the same minimum version is replaced.
    pub fn register(&mut self, codec: Box<dyn SectionCodec>) {
        let min_version = codec.min_version();
        match self
            .codecs
            .binary_search_by(|c| c.min_version().cmp(&min_version))
        {
            Ok(pos) => self.codecs[pos] = codec,
            Err(pos) => self.codecs.insert(pos, codec),
        }
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// The codec with the greatest minimum version not above `version`.
    pub fn select(&self, version: Version) -> Result<&dyn SectionCodec> {
        let codec = self
            .codecs
            .iter()
            .rev()
            .find(|c| c.min_version() <= version)
            .ok_or(SectionError::NoCodecForVersion(version))?;
        log(
            format!(
                "Selected {} codec (min {}) for version {}",
                codec.name(),
                codec.min_version(),
                version
            ),
            LogSeverity::Debug,
        );
        Ok(codec.as_ref())
    }
}

pub(crate) fn new_compound() -> Tag {
    Tag::Compound(HashMap::new())
}

pub(crate) fn require_compound(tag: &Tag) -> Result<()> {
    if tag.as_compound().is_none() {
        return Err(SectionError::MalformedTag(
            "section is not a compound".to_string(),
        ));
    }
    Ok(())
}

/// A mandatory byte; absent and mistyped are reported apart.
pub(crate) fn require_byte(tag: &Tag, key: &'static str) -> Result<i8> {
    match tag.get(key) {
        None => Err(SectionError::MissingField(key)),
        Some(value) => value
            .as_i8()
            .ok_or_else(|| SectionError::MalformedTag(format!("{} is not a byte", key))),
    }
}

/// Moves a byte array of exactly `len` bytes out of the compound.
pub(crate) fn take_exact(tag: &mut Tag, key: &'static str, len: usize) -> Result<Option<BytesMut>> {
    match tag.get(key) {
        None => return Ok(None),
        Some(Tag::ByteArray(bytes)) if bytes.len() != len => {
            return Err(SectionError::DimensionMismatch {
                expected: len,
                actual: bytes.len(),
            })
        }
        Some(Tag::ByteArray(_)) => {}
        Some(_) => {
            return Err(SectionError::MalformedTag(format!(
                "{} is not a byte array",
                key
            )))
        }
    }
    Ok(tag.take_byte_array(key))
}

pub(crate) fn require_exact(tag: &mut Tag, key: &'static str, len: usize) -> Result<BytesMut> {
    take_exact(tag, key, len)?.ok_or(SectionError::MissingField(key))
}

/// An optional full-section nibble array, wrapped in place.
pub(crate) fn take_nibbles(tag: &mut Tag, key: &'static str) -> Result<Option<PackedNibbleArray>> {
    take_exact(tag, key, PACKED_SIZE)?
        .map(|bytes| PackedNibbleArray::wrap(bytes, 0, NUM_BLOCKS))
        .transpose()
}

pub(crate) fn require_nibbles(tag: &mut Tag, key: &'static str) -> Result<PackedNibbleArray> {
    take_nibbles(tag, key)?.ok_or(SectionError::MissingField(key))
}

pub(crate) fn nibbles_tag(array: &PackedNibbleArray) -> Tag {
    Tag::ByteArray(BytesMut::from(array.as_bytes()))
}

/// Decodes the light arrays common to every epoch.
pub(crate) fn decode_light(tag: &mut Tag, section: Section) -> Result<Section> {
    let block_light = take_nibbles(tag, KEY_BLOCK_LIGHT)?;
    let sky_light = take_nibbles(tag, KEY_SKY_LIGHT)?;
    section.with_light(block_light, sky_light)
}

pub(crate) fn encode_light(section: &Section, tag: &mut Tag) {
    if let Some(light) = section.block_light() {
        tag.insert(KEY_BLOCK_LIGHT, nibbles_tag(light));
    }
    if let Some(light) = section.sky_light() {
        tag.insert(KEY_SKY_LIGHT, nibbles_tag(light));
    }
}
