use bytes::BytesMut;

use crate::error::{Result, SectionError};
use crate::layer::{check_nibble, checked_index, BlockLayer, NUM_BLOCKS};
use crate::nibble::PackedNibbleArray;

/// Pre-flattening block storage: one byte of block id per voxel, a nibble
/// of metadata per voxel, and optionally the "Add" nibble array carrying id
/// bits 8-11.
///
/// Without the Add array ids are limited to `0..=255`; with it, to
/// `0..=4095`. Both forms share every other behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyBlockStorage {
    blocks: BytesMut,
    meta: PackedNibbleArray,
    add: Option<PackedNibbleArray>,
}

fn check_full(array: &PackedNibbleArray) -> Result<()> {
    if array.len() != NUM_BLOCKS {
        return Err(SectionError::DimensionMismatch {
            expected: NUM_BLOCKS,
            actual: array.len(),
        });
    }
    Ok(())
}

impl LegacyBlockStorage {
    /// Empty (all air) storage with 8-bit ids.
    pub fn plain() -> Self {
        LegacyBlockStorage {
            blocks: BytesMut::zeroed(NUM_BLOCKS),
            meta: PackedNibbleArray::section(),
            add: None,
        }
    }

    /// Empty (all air) storage with 12-bit ids.
    pub fn with_add() -> Self {
        LegacyBlockStorage {
            add: Some(PackedNibbleArray::section()),
            ..Self::plain()
        }
    }

    /// Builds a storage over existing buffers without copying them.
    pub fn wrap(
        mut blocks: BytesMut,
        meta: PackedNibbleArray,
        add: Option<PackedNibbleArray>,
    ) -> Result<Self> {
        if blocks.len() < NUM_BLOCKS {
            return Err(SectionError::BufferTooSmall {
                required: NUM_BLOCKS,
                available: blocks.len(),
            });
        }
        blocks.truncate(NUM_BLOCKS);
        check_full(&meta)?;
        if let Some(add) = &add {
            check_full(add)?;
        }
        Ok(LegacyBlockStorage { blocks, meta, add })
    }

    pub fn is_extended(&self) -> bool {
        self.add.is_some()
    }

    /// Largest legacy id this storage can hold.
    pub fn max_legacy_id(&self) -> u32 {
        if self.is_extended() {
            0xFFF
        } else {
            0xFF
        }
    }

    fn max_runtime_id(&self) -> u32 {
        ((self.max_legacy_id() + 1) << 4) - 1
    }

    /// Adds a zeroed Add array so ids above 255 can be stored.
    pub fn upgrade_to_add(&mut self) {
        if self.add.is_none() {
            self.add = Some(PackedNibbleArray::section());
        }
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    pub fn meta_array(&self) -> &PackedNibbleArray {
        &self.meta
    }

    pub fn add_array(&self) -> Option<&PackedNibbleArray> {
        self.add.as_ref()
    }

    pub fn into_parts(self) -> (BytesMut, PackedNibbleArray, Option<PackedNibbleArray>) {
        (self.blocks, self.meta, self.add)
    }

    #[inline]
    fn legacy_id_at(&self, index: usize) -> u32 {
        let low = self.blocks[index] as u32;
        match &self.add {
            Some(add) => low | ((add.get_unchecked(index) as u32) << 8),
            None => low,
        }
    }
}

impl BlockLayer for LegacyBlockStorage {
    fn layers(&self) -> usize {
        1
    }

    fn legacy_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32> {
        self.check_layer(layer)?;
        let index = checked_index(x, y, z)?;
        Ok(self.legacy_id_at(index))
    }

    fn meta_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u8> {
        self.check_layer(layer)?;
        let index = checked_index(x, y, z)?;
        Ok(self.meta.get_unchecked(index))
    }

    fn runtime_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32> {
        self.check_layer(layer)?;
        let index = checked_index(x, y, z)?;
        Ok((self.legacy_id_at(index) << 4) | self.meta.get_unchecked(index) as u32)
    }

    fn set_legacy_id_in(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        legacy_id: u32,
    ) -> Result<()> {
        let max = self.max_legacy_id();
        if legacy_id > max {
            return Err(SectionError::ValueOutOfRange {
                value: legacy_id,
                max,
            });
        }
        self.set_runtime_id_in(x, y, z, layer, legacy_id << 4)
    }

    fn set_meta_in(&mut self, x: usize, y: usize, z: usize, layer: usize, meta: u8) -> Result<()> {
        self.check_layer(layer)?;
        let index = checked_index(x, y, z)?;
        check_nibble(meta)?;
        self.meta.set_unchecked(index, meta);
        Ok(())
    }

    fn set_runtime_id_in(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        runtime_id: u32,
    ) -> Result<()> {
        self.check_layer(layer)?;
        let index = checked_index(x, y, z)?;
        let max = self.max_runtime_id();
        if runtime_id > max {
            return Err(SectionError::ValueOutOfRange {
                value: runtime_id,
                max,
            });
        }

        self.blocks[index] = (runtime_id >> 4) as u8;
        self.meta.set_unchecked(index, (runtime_id & 0xF) as u8);
        if let Some(add) = &mut self.add {
            add.set_unchecked(index, ((runtime_id >> 12) & 0xF) as u8);
        }
        Ok(())
    }
}
