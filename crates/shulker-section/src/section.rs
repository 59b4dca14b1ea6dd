use shulker_common::Version;

use crate::error::{Result, SectionError};
use crate::layer::{check_coords, coords, BlockLayer, NUM_BLOCKS};
use crate::nibble::PackedNibbleArray;
use crate::registry::BlockRegistry;
use crate::storage::BlockStorage;

/// One 16x16x16 slice of a chunk column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    y: i32,
    storage: BlockStorage,
    block_light: Option<PackedNibbleArray>,
    sky_light: Option<PackedNibbleArray>,
    version: Version,
}

fn check_light(light: &Option<PackedNibbleArray>) -> Result<()> {
    match light {
        Some(array) if array.len() != NUM_BLOCKS => Err(SectionError::DimensionMismatch {
            expected: NUM_BLOCKS,
            actual: array.len(),
        }),
        _ => Ok(()),
    }
}

impl Section {
    /// A section without light data.
    pub fn new(y: i32, storage: impl Into<BlockStorage>, version: Version) -> Self {
        Section {
            y,
            storage: storage.into(),
            block_light: None,
            sky_light: None,
            version,
        }
    }

    /// Replaces both light tables. Each one given must cover the full section.
    pub fn set_light(
        &mut self,
        block_light: Option<PackedNibbleArray>,
        sky_light: Option<PackedNibbleArray>,
    ) -> Result<()> {
        check_light(&block_light)?;
        check_light(&sky_light)?;
        self.block_light = block_light;
        self.sky_light = sky_light;
        Ok(())
    }

    pub fn with_light(
        mut self,
        block_light: Option<PackedNibbleArray>,
        sky_light: Option<PackedNibbleArray>,
    ) -> Result<Self> {
        self.set_light(block_light, sky_light)?;
        Ok(self)
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn storage(&self) -> &BlockStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut BlockStorage {
        &mut self.storage
    }

    pub fn block_light(&self) -> Option<&PackedNibbleArray> {
        self.block_light.as_ref()
    }

    pub fn sky_light(&self) -> Option<&PackedNibbleArray> {
        self.sky_light.as_ref()
    }

    /// Block light level, 0 when the section carries none.
    pub fn block_light_at(&self, x: usize, y: usize, z: usize) -> Result<u8> {
        check_coords(x, y, z)?;
        match &self.block_light {
            Some(light) => light.get_at(x, y, z),
            None => Ok(0),
        }
    }

    /// Sky light level, 0 when the section carries none.
    pub fn sky_light_at(&self, x: usize, y: usize, z: usize) -> Result<u8> {
        check_coords(x, y, z)?;
        match &self.sky_light {
            Some(light) => light.get_at(x, y, z),
            None => Ok(0),
        }
    }

    /// Voxels whose legacy id is not air.
    pub fn non_air_count(&self) -> Result<usize> {
        let mut count = 0;
        for i in 0..NUM_BLOCKS {
            let (x, y, z) = coords(i);
            if self.storage.legacy_id(x, y, z)? != 0 {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.non_air_count()? == 0)
    }

    /// Name of the block at a coordinate, `None` if the registry lacks its id.
    pub fn block_name<'r>(
        &self,
        x: usize,
        y: usize,
        z: usize,
        registry: &'r BlockRegistry,
    ) -> Result<Option<&'r str>> {
        let id = self.storage.legacy_id(x, y, z)?;
        Ok(registry.block_name(id))
    }
}
