use crate::error::Result;
use crate::layer::{coords, BlockLayer, NUM_BLOCKS};
use crate::legacy::LegacyBlockStorage;
use crate::palette::PaletteBlockStorage;

/// The block storage a section owns, one variant per on-disk epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStorage {
    Legacy(LegacyBlockStorage),
    Palette(PaletteBlockStorage),
}

impl BlockStorage {
    /// Runtime id of every voxel in YZX order, layer 0.
    pub fn runtime_ids(&self) -> Result<Vec<u32>> {
        (0..NUM_BLOCKS)
            .map(|i| {
                let (x, y, z) = coords(i);
                self.runtime_id(x, y, z)
            })
            .collect()
    }

    /// Copies every voxel into legacy storage, with the Add array only when
    /// some id needs it.
    pub fn to_legacy(&self) -> Result<LegacyBlockStorage> {
        if let BlockStorage::Legacy(storage) = self {
            return Ok(storage.clone());
        }
        let ids = self.runtime_ids()?;
        let mut storage = if ids.iter().any(|&id| id >> 4 > 0xFF) {
            LegacyBlockStorage::with_add()
        } else {
            LegacyBlockStorage::plain()
        };
        for (i, id) in ids.into_iter().enumerate() {
            let (x, y, z) = coords(i);
            storage.set_runtime_id(x, y, z, id)?;
        }
        Ok(storage)
    }

    /// Copies every voxel into a palette storage with a minimal palette.
    pub fn to_palette(&self) -> Result<PaletteBlockStorage> {
        if let BlockStorage::Palette(storage) = self {
            let mut storage = storage.clone();
            storage.optimize();
            return Ok(storage);
        }
        let mut storage = PaletteBlockStorage::new();
        for (i, id) in self.runtime_ids()?.into_iter().enumerate() {
            let (x, y, z) = coords(i);
            storage.set_runtime_id(x, y, z, id)?;
        }
        storage.optimize();
        Ok(storage)
    }
}

impl From<LegacyBlockStorage> for BlockStorage {
    fn from(storage: LegacyBlockStorage) -> Self {
        BlockStorage::Legacy(storage)
    }
}

impl From<PaletteBlockStorage> for BlockStorage {
    fn from(storage: PaletteBlockStorage) -> Self {
        BlockStorage::Palette(storage)
    }
}

macro_rules! delegate {
    ($self:ident, $s:ident => $body:expr) => {
        match $self {
            BlockStorage::Legacy($s) => $body,
            BlockStorage::Palette($s) => $body,
        }
    };
}

impl BlockLayer for BlockStorage {
    fn layers(&self) -> usize {
        delegate!(self, s => s.layers())
    }

    fn legacy_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32> {
        delegate!(self, s => s.legacy_id_in(x, y, z, layer))
    }

    fn meta_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u8> {
        delegate!(self, s => s.meta_in(x, y, z, layer))
    }

    fn runtime_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32> {
        delegate!(self, s => s.runtime_id_in(x, y, z, layer))
    }

    fn set_legacy_id_in(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        legacy_id: u32,
    ) -> Result<()> {
        delegate!(self, s => s.set_legacy_id_in(x, y, z, layer, legacy_id))
    }

    fn set_meta_in(&mut self, x: usize, y: usize, z: usize, layer: usize, meta: u8) -> Result<()> {
        delegate!(self, s => s.set_meta_in(x, y, z, layer, meta))
    }

    fn set_runtime_id_in(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        runtime_id: u32,
    ) -> Result<()> {
        delegate!(self, s => s.set_runtime_id_in(x, y, z, layer, runtime_id))
    }
}
