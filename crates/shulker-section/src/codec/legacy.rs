use bytes::BytesMut;
use shulker_common::Version;
use shulker_nbt::Tag;

use super::{
    decode_light, encode_light, new_compound, nibbles_tag, require_byte, require_compound,
    require_exact, require_nibbles, take_nibbles, CodecContext, SectionCodec, KEY_Y,
};
use crate::error::{Result, SectionError};
use crate::layer::NUM_BLOCKS;
use crate::legacy::LegacyBlockStorage;
use crate::section::Section;

const KEY_BLOCKS: &str = "Blocks";
const KEY_DATA: &str = "Data";
const KEY_ADD: &str = "Add";

/// Anvil sections before the flattening: `Blocks`, `Data` and an optional
/// `Add` array holding id bits 8-11.
pub struct LegacyCodec {
    min_version: Version,
}

impl LegacyCodec {
    pub fn new(min_version: Version) -> Self {
        LegacyCodec { min_version }
    }
}

impl Default for LegacyCodec {
    /// Anvil was introduced in 1.2.1.
    fn default() -> Self {
        Self::new(Version::new(1, 2, 1))
    }
}

impl SectionCodec for LegacyCodec {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn min_version(&self) -> Version {
        self.min_version
    }

    fn decode(&self, mut tag: Tag, ctx: &CodecContext<'_>) -> Result<Section> {
        require_compound(&tag)?;
        let y = require_byte(&tag, KEY_Y)? as u8 as i32;
        let blocks = require_exact(&mut tag, KEY_BLOCKS, NUM_BLOCKS)?;
        let meta = require_nibbles(&mut tag, KEY_DATA)?;
        let add = take_nibbles(&mut tag, KEY_ADD)?;

        let storage = LegacyBlockStorage::wrap(blocks, meta, add)?;
        decode_light(&mut tag, Section::new(y, storage, ctx.version))
    }

    fn encode(&self, section: &Section, _ctx: &CodecContext<'_>) -> Result<Tag> {
        let y = u8::try_from(section.y()).map_err(|_| {
            SectionError::MalformedTag(format!(
                "section y {} does not fit an unsigned byte",
                section.y()
            ))
        })?;
        let storage = section.storage().to_legacy()?;

        let mut tag = new_compound();
        tag.insert(KEY_Y, Tag::Byte(y as i8));
        tag.insert(KEY_BLOCKS, Tag::ByteArray(BytesMut::from(storage.blocks())));
        tag.insert(KEY_DATA, nibbles_tag(storage.meta_array()));
        if let Some(add) = storage.add_array() {
            tag.insert(KEY_ADD, nibbles_tag(add));
        }
        encode_light(section, &mut tag);
        Ok(tag)
    }
}
