use shulker_common::Version;
use shulker_nbt::Tag;

use super::{
    decode_light, encode_light, new_compound, require_byte, require_compound, CodecContext,
    SectionCodec, KEY_Y,
};
use crate::error::{Result, SectionError};
use crate::palette::PaletteBlockStorage;
use crate::section::Section;

const KEY_PALETTE: &str = "Palette";
const KEY_BLOCK_STATES: &str = "BlockStates";
const KEY_NAME: &str = "Name";
const KEY_PROPERTIES: &str = "Properties";
const KEY_DATA: &str = "data";

/// Palette sections from the flattening (1.13) on. Block states are packed
/// LSB-first and may straddle two longs.
///
/// Palette entries resolve their `Name` through the context's
/// [`BlockRegistry`](crate::BlockRegistry). Block metadata travels as a
/// string `data` entry in `Properties` and is written only when non-zero;
/// other properties are ignored.
///
/// The built-in 1.12.2 table knows only pre-flattening names, so sections
/// written by vanilla 1.13+ (`minecraft:grass_block` and the like) need a
/// registry that lists the flattened names.
pub struct FlattenedCodec {
    min_version: Version,
}

impl FlattenedCodec {
    pub fn new(min_version: Version) -> Self {
        FlattenedCodec { min_version }
    }
}

impl Default for FlattenedCodec {
    fn default() -> Self {
        Self::new(Version::new(1, 13, 0))
    }
}

fn decode_palette(entries: &[Tag], ctx: &CodecContext<'_>) -> Result<Vec<u32>> {
    entries
        .iter()
        .map(|entry| {
            let name = entry.get_string(KEY_NAME).ok_or_else(|| {
                SectionError::MalformedTag("palette entry without a Name".to_string())
            })?;
            ctx.registry.runtime_id(name, decode_meta(entry)?)
        })
        .collect()
}

fn decode_meta(entry: &Tag) -> Result<u8> {
    let data = match entry.get(KEY_PROPERTIES) {
        None => return Ok(0),
        Some(Tag::Compound(properties)) => match properties.get(KEY_DATA) {
            None => return Ok(0),
            Some(data) => data,
        },
        Some(_) => {
            return Err(SectionError::MalformedTag(
                "Properties is not a compound".to_string(),
            ))
        }
    };
    data.as_string()
        .and_then(|value| value.parse::<u8>().ok())
        .ok_or_else(|| SectionError::MalformedTag(format!("bad block data {:?}", data)))
}

impl SectionCodec for FlattenedCodec {
    fn name(&self) -> &'static str {
        "flattened"
    }

    fn min_version(&self) -> Version {
        self.min_version
    }

    fn decode(&self, mut tag: Tag, ctx: &CodecContext<'_>) -> Result<Section> {
        require_compound(&tag)?;
        let y = require_byte(&tag, KEY_Y)? as i32;

        let storage = match tag.get(KEY_PALETTE) {
            None => PaletteBlockStorage::new(),
            Some(Tag::List(entries)) => {
                let palette = decode_palette(entries, ctx)?;
                let states = match tag.get(KEY_BLOCK_STATES) {
                    None => return Err(SectionError::MissingField(KEY_BLOCK_STATES)),
                    Some(states) => states.as_long_array().ok_or_else(|| {
                        SectionError::MalformedTag("BlockStates is not a long array".to_string())
                    })?,
                };
                let data = states.iter().map(|&word| word as u64).collect();
                PaletteBlockStorage::from_parts(palette, data)?
            }
            Some(_) => {
                return Err(SectionError::MalformedTag(
                    "Palette is not a list".to_string(),
                ))
            }
        };

        decode_light(&mut tag, Section::new(y, storage, ctx.version))
    }

    fn encode(&self, section: &Section, ctx: &CodecContext<'_>) -> Result<Tag> {
        let y = i8::try_from(section.y()).map_err(|_| {
            SectionError::MalformedTag(format!("section y {} does not fit a byte", section.y()))
        })?;
        let storage = section.storage().to_palette()?;

        let palette = storage
            .palette()
            .iter()
            .map(|&runtime_id| {
                let legacy_id = runtime_id >> 4;
                let name = ctx
                    .registry
                    .block_name(legacy_id)
                    .ok_or_else(|| SectionError::UnknownBlock(format!("legacy id {}", legacy_id)))?;
                let mut entry = new_compound();
                entry.insert(KEY_NAME, Tag::String(name.to_string()));
                let meta = runtime_id & 0xF;
                if meta != 0 {
                    let mut properties = new_compound();
                    properties.insert(KEY_DATA, Tag::String(meta.to_string()));
                    entry.insert(KEY_PROPERTIES, properties);
                }
                Ok(entry)
            })
            .collect::<Result<Vec<Tag>>>()?;

        let mut tag = new_compound();
        tag.insert(KEY_Y, Tag::Byte(y));
        tag.insert(KEY_PALETTE, Tag::List(palette));
        tag.insert(
            KEY_BLOCK_STATES,
            Tag::LongArray(storage.data().iter().map(|&word| word as i64).collect()),
        );
        encode_light(section, &mut tag);
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::BlockLayer;
    use crate::legacy::LegacyBlockStorage;
    use crate::nibble::PackedNibbleArray;
    use crate::palette::data_len;
    use crate::registry::BlockRegistry;
    use crate::storage::BlockStorage;
    use assert_matches::assert_matches;

    fn ctx() -> CodecContext<'static> {
        CodecContext::new(BlockRegistry::java_1_12_2(), Version::new(1, 15, 2))
    }

    fn palette_entry(name: &str) -> Tag {
        let mut entry = new_compound();
        entry.insert(KEY_NAME, Tag::String(name.to_string()));
        entry
    }

    fn section_tag(y: i8, names: &[&str], states: Vec<i64>) -> Tag {
        let mut tag = new_compound();
        tag.insert(KEY_Y, Tag::Byte(y));
        tag.insert(
            KEY_PALETTE,
            Tag::List(names.iter().map(|n| palette_entry(n)).collect()),
        );
        tag.insert(KEY_BLOCK_STATES, Tag::LongArray(states));
        tag
    }

    #[test]
    fn test_decode_palette() {
        let mut states = vec![0i64; data_len(4)];
        // voxel 0 -> entry 1, voxel 1 -> entry 2
        states[0] = 0x21;
        let tag = section_tag(-2, &["minecraft:air", "minecraft:stone", "minecraft:dirt"], states);

        let section = FlattenedCodec::default().decode(tag, &ctx()).unwrap();
        assert_eq!(section.y(), -2);
        assert_eq!(section.storage().legacy_id(0, 0, 0).unwrap(), 1);
        assert_eq!(section.storage().legacy_id(1, 0, 0).unwrap(), 3);
        assert_eq!(section.storage().meta(1, 0, 0).unwrap(), 0);
        assert_eq!(section.non_air_count().unwrap(), 2);
        assert_matches!(section.storage(), BlockStorage::Palette(p) if p.bits_per_block() == 4);
    }

    #[test]
    fn test_decode_without_palette_is_air() {
        let mut tag = new_compound();
        tag.insert(KEY_Y, Tag::Byte(0));
        let section = FlattenedCodec::default().decode(tag, &ctx()).unwrap();
        assert!(section.is_empty().unwrap());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let codec = FlattenedCodec::default();

        let tag = section_tag(0, &["minecraft:air"], vec![0; 10]);
        assert_matches!(
            codec.decode(tag, &ctx()),
            Err(SectionError::DimensionMismatch { expected: 256, actual: 10 })
        );

        let mut states = vec![0i64; data_len(4)];
        states[3] = 0x7 << 60;
        let tag = section_tag(0, &["minecraft:air", "minecraft:stone"], states);
        assert_matches!(codec.decode(tag, &ctx()), Err(SectionError::MalformedTag(_)));

        let tag = section_tag(0, &["minecraft:kelp"], vec![0; data_len(4)]);
        assert_matches!(
            codec.decode(tag, &ctx()),
            Err(SectionError::UnknownBlock(name)) if name == "minecraft:kelp"
        );

        let mut tag = section_tag(0, &["minecraft:air"], vec![]);
        tag.as_compound_mut().unwrap().remove(KEY_BLOCK_STATES);
        assert_matches!(
            codec.decode(tag, &ctx()),
            Err(SectionError::MissingField("BlockStates"))
        );

        let mut tag = section_tag(0, &[], vec![]);
        tag.insert(KEY_PALETTE, Tag::List(vec![Tag::Int(1)]));
        assert_matches!(codec.decode(tag, &ctx()), Err(SectionError::MalformedTag(_)));
    }

    #[test]
    fn test_encode_decode() {
        let mut storage = LegacyBlockStorage::plain();
        for x in 0..16 {
            storage.set_legacy_id(x, 7, 7, x as u32 + 1).unwrap();
        }
        storage.set_legacy_id(0, 0, 0, 20).unwrap();
        let mut sky = PackedNibbleArray::section();
        sky.set_at(0, 15, 0, 15).unwrap();
        let section = Section::new(5, storage, Version::new(1, 15, 2))
            .with_light(None, Some(sky))
            .unwrap();

        let codec = FlattenedCodec::default();
        let tag = codec.encode(&section, &ctx()).unwrap();
        assert_eq!(tag.get_byte(KEY_Y), Some(5));
        assert_eq!(tag.get_list(KEY_PALETTE).unwrap().len(), 18);
        assert_eq!(tag.get_long_array(KEY_BLOCK_STATES).unwrap().len(), data_len(5));

        let decoded = codec.decode(tag, &ctx()).unwrap();
        assert_eq!(
            decoded.storage().runtime_ids().unwrap(),
            section.storage().runtime_ids().unwrap()
        );
        assert_eq!(decoded.sky_light(), section.sky_light());
        assert!(decoded.block_light().is_none());
    }

    #[test]
    fn test_meta_survives_round_trip() {
        let mut storage = LegacyBlockStorage::plain();
        storage.set_runtime_id(0, 0, 0, (35 << 4) | 14).unwrap();
        storage.set_runtime_id(1, 0, 0, 35 << 4).unwrap();
        let section = Section::new(0, storage, Version::LATEST);

        let codec = FlattenedCodec::default();
        let tag = codec.encode(&section, &ctx()).unwrap();
        let palette = tag.get_list(KEY_PALETTE).unwrap();
        let red = palette
            .iter()
            .find(|entry| entry.get(KEY_PROPERTIES).is_some())
            .unwrap();
        assert_eq!(red.get_string(KEY_NAME).unwrap(), "minecraft:wool");
        assert_eq!(
            red.get(KEY_PROPERTIES).unwrap().get_string(KEY_DATA).unwrap(),
            "14"
        );
        assert_eq!(
            palette
                .iter()
                .filter(|entry| entry.get(KEY_PROPERTIES).is_none())
                .count(),
            2
        );

        let decoded = codec.decode(tag, &ctx()).unwrap();
        assert_eq!(decoded.storage().legacy_id(0, 0, 0).unwrap(), 35);
        assert_eq!(decoded.storage().meta(0, 0, 0).unwrap(), 14);
        assert_eq!(decoded.storage().legacy_id(1, 0, 0).unwrap(), 35);
        assert_eq!(decoded.storage().meta(1, 0, 0).unwrap(), 0);
        assert_eq!(
            decoded.storage().runtime_ids().unwrap(),
            section.storage().runtime_ids().unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_bad_block_data() {
        let codec = FlattenedCodec::default();
        let with_properties = |properties: Tag| {
            let mut tag = section_tag(0, &["minecraft:wool"], vec![0; data_len(4)]);
            let mut entry = palette_entry("minecraft:wool");
            entry.insert(KEY_PROPERTIES, properties);
            tag.insert(KEY_PALETTE, Tag::List(vec![entry]));
            tag
        };

        let mut properties = new_compound();
        properties.insert(KEY_DATA, Tag::String("red".to_string()));
        assert_matches!(
            codec.decode(with_properties(properties), &ctx()),
            Err(SectionError::MalformedTag(_))
        );

        let mut properties = new_compound();
        properties.insert(KEY_DATA, Tag::String("16".to_string()));
        assert_matches!(
            codec.decode(with_properties(properties), &ctx()),
            Err(SectionError::ValueOutOfRange { value: 16, max: 15 })
        );

        assert_matches!(
            codec.decode(with_properties(Tag::Int(3)), &ctx()),
            Err(SectionError::MalformedTag(_))
        );

        let mut properties = new_compound();
        properties.insert("snowy", Tag::String("false".to_string()));
        let section = codec.decode(with_properties(properties), &ctx()).unwrap();
        assert_eq!(section.storage().runtime_id(0, 0, 0).unwrap(), 35 << 4);
    }

    #[test]
    fn test_decode_with_flattened_names() {
        let registry = BlockRegistry::from_json(
            r#"[{"id": 0, "name": "minecraft:air"}, {"id": 2, "name": "minecraft:grass_block"}]"#,
        )
        .unwrap();
        let flat_ctx = CodecContext::new(&registry, Version::new(1, 13, 0));
        let mut states = vec![0i64; data_len(4)];
        states[0] = 0x1;
        let tag = section_tag(0, &["minecraft:air", "minecraft:grass_block"], states);

        let section = FlattenedCodec::default().decode(tag.clone(), &flat_ctx).unwrap();
        assert_eq!(
            section.block_name(0, 0, 0, &registry).unwrap(),
            Some("minecraft:grass_block")
        );
        assert_matches!(
            FlattenedCodec::default().decode(tag, &ctx()),
            Err(SectionError::UnknownBlock(name)) if name == "minecraft:grass_block"
        );
    }

    #[test]
    fn test_encode_unknown_id() {
        let mut section = Section::new(0, LegacyBlockStorage::plain(), Version::LATEST);
        section.storage_mut().set_legacy_id(0, 0, 0, 253).unwrap();
        assert_matches!(
            FlattenedCodec::default().encode(&section, &ctx()),
            Err(SectionError::UnknownBlock(_))
        );

        let section = Section::new(200, LegacyBlockStorage::plain(), Version::LATEST);
        assert_matches!(
            FlattenedCodec::default().encode(&section, &ctx()),
            Err(SectionError::MalformedTag(_))
        );
    }
}
