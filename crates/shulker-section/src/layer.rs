//! Section-local addressing and the block accessor capability shared by
//! every storage format.

use crate::error::{Result, SectionError};

/// Edge length of a section.
pub const SECTION_SIZE: usize = 16;
/// Voxels in a section.
pub const NUM_BLOCKS: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// Flat YZX index: X varies fastest, then Z, then Y.
/// Callers guarantee `x`, `y`, `z` are below 16.
#[inline]
pub fn index(x: usize, y: usize, z: usize) -> usize {
    (y << 8) | (z << 4) | x
}

/// Inverse of [`index`], returned as `(x, y, z)`.
#[inline]
pub fn coords(index: usize) -> (usize, usize, usize) {
    (index & 0xF, index >> 8, (index >> 4) & 0xF)
}

pub fn check_coords(x: usize, y: usize, z: usize) -> Result<()> {
    if x >= SECTION_SIZE || y >= SECTION_SIZE || z >= SECTION_SIZE {
        return Err(SectionError::CoordinateOutOfRange { x, y, z });
    }
    Ok(())
}

pub fn checked_index(x: usize, y: usize, z: usize) -> Result<usize> {
    check_coords(x, y, z)?;
    Ok(index(x, y, z))
}

pub(crate) fn check_nibble(value: u8) -> Result<()> {
    if value > 15 {
        return Err(SectionError::ValueOutOfRange {
            value: value as u32,
            max: 15,
        });
    }
    Ok(())
}

/// Per-voxel access to block identity.
///
/// A storage may keep several parallel layers at one coordinate (a liquid
/// and a solid, say). The `*_in` methods address a layer explicitly; the
/// plain forms address layer 0. Every method fails with
/// [`SectionError::CoordinateOutOfRange`] for coordinates outside `0..16`
/// and with [`SectionError::InvalidLayer`] for `layer >= layers()`.
///
/// The runtime id is `(legacy_id << 4) | meta`.
pub trait BlockLayer {
    fn layers(&self) -> usize;

    fn legacy_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32>;
    fn meta_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u8>;
    fn runtime_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32>;

    /// Sets the legacy id and resets metadata to 0.
    fn set_legacy_id_in(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        legacy_id: u32,
    ) -> Result<()>;
    fn set_meta_in(&mut self, x: usize, y: usize, z: usize, layer: usize, meta: u8)
        -> Result<()>;
    fn set_runtime_id_in(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        runtime_id: u32,
    ) -> Result<()>;

    fn check_layer(&self, layer: usize) -> Result<()> {
        let layers = self.layers();
        if layer >= layers {
            return Err(SectionError::InvalidLayer { layer, layers });
        }
        Ok(())
    }

    fn legacy_id(&self, x: usize, y: usize, z: usize) -> Result<u32> {
        self.legacy_id_in(x, y, z, 0)
    }

    fn meta(&self, x: usize, y: usize, z: usize) -> Result<u8> {
        self.meta_in(x, y, z, 0)
    }

    fn runtime_id(&self, x: usize, y: usize, z: usize) -> Result<u32> {
        self.runtime_id_in(x, y, z, 0)
    }

    fn set_legacy_id(&mut self, x: usize, y: usize, z: usize, legacy_id: u32) -> Result<()> {
        self.set_legacy_id_in(x, y, z, 0, legacy_id)
    }

    fn set_meta(&mut self, x: usize, y: usize, z: usize, meta: u8) -> Result<()> {
        self.set_meta_in(x, y, z, 0, meta)
    }

    fn set_runtime_id(&mut self, x: usize, y: usize, z: usize, runtime_id: u32) -> Result<()> {
        self.set_runtime_id_in(x, y, z, 0, runtime_id)
    }
}
