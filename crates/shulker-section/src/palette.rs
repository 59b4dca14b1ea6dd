use crate::error::{Result, SectionError};
use crate::layer::{check_nibble, checked_index, BlockLayer, NUM_BLOCKS};

pub const MIN_BITS: u8 = 4;
pub const MAX_BITS: u8 = 16;

/// Largest runtime id a palette entry can carry.
pub const MAX_RUNTIME_ID: u32 = 0xFFFF;

/// Bits per packed entry for a palette of `len` entries.
pub fn bits_for(len: usize) -> u8 {
    let mut bits = MIN_BITS;
    while (1usize << bits) < len {
        bits += 1;
    }
    bits
}

/// 64-bit words needed to pack a full section at `bits` per entry.
pub fn data_len(bits: u8) -> usize {
    NUM_BLOCKS * bits as usize / 64
}

// Entries are packed LSB-first and may straddle two words.
fn read_packed(data: &[u64], bits: u8, index: usize) -> u32 {
    let bits = bits as usize;
    let bit = index * bits;
    let start_long = bit / 64;
    let offset = bit % 64;
    let mask = (1u64 << bits) - 1;

    let mut value = data[start_long] >> offset;
    if offset + bits > 64 {
        value |= data[start_long + 1] << (64 - offset);
    }
    (value & mask) as u32
}

fn write_packed(data: &mut [u64], bits: u8, index: usize, value: u32) {
    let bits = bits as usize;
    let bit = index * bits;
    let start_long = bit / 64;
    let offset = bit % 64;
    let mask = (1u64 << bits) - 1;
    let value = value as u64 & mask;

    data[start_long] = (data[start_long] & !(mask << offset)) | (value << offset);
    if offset + bits > 64 {
        let written = 64 - offset;
        data[start_long + 1] = (data[start_long + 1] & !(mask >> written)) | (value >> written);
    }
}

/// Flattened-format block storage: a palette of runtime ids and one packed
/// palette index per voxel, YZX ordered.
///
/// Writing an id that is not yet in the palette appends it. When the
/// palette outgrows the current entry width every entry is repacked one
/// bit wider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteBlockStorage {
    palette: Vec<u32>,
    bits: u8,
    data: Vec<u64>,
}

impl Default for PaletteBlockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteBlockStorage {
    /// All-air storage.
    pub fn new() -> Self {
        PaletteBlockStorage {
            palette: vec![0],
            bits: MIN_BITS,
            data: vec![0; data_len(MIN_BITS)],
        }
    }

    /// Builds a storage from a decoded palette and packed data, rejecting
    /// any packed index that falls outside the palette.
    pub fn from_parts(palette: Vec<u32>, data: Vec<u64>) -> Result<Self> {
        if palette.is_empty() {
            return Err(SectionError::MalformedTag("empty palette".to_string()));
        }
        if palette.len() > 1 << MAX_BITS {
            return Err(SectionError::MalformedTag(format!(
                "palette of {} entries exceeds {}",
                palette.len(),
                1 << MAX_BITS
            )));
        }
        if let Some(&id) = palette.iter().find(|&&id| id > MAX_RUNTIME_ID) {
            return Err(SectionError::ValueOutOfRange {
                value: id,
                max: MAX_RUNTIME_ID,
            });
        }

        let bits = bits_for(palette.len());
        let expected = data_len(bits);
        if data.len() != expected {
            return Err(SectionError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }

        let storage = PaletteBlockStorage {
            palette,
            bits,
            data,
        };
        for index in 0..NUM_BLOCKS {
            let entry = storage.entry(index) as usize;
            if entry >= storage.palette.len() {
                return Err(SectionError::MalformedTag(format!(
                    "palette index {} at {} exceeds palette of {}",
                    entry,
                    index,
                    storage.palette.len()
                )));
            }
        }
        Ok(storage)
    }

    pub fn palette(&self) -> &[u32] {
        &self.palette
    }

    pub fn bits_per_block(&self) -> u8 {
        self.bits
    }

    pub fn data(&self) -> &[u64] {
        &self.data
    }

    #[inline]
    fn entry(&self, index: usize) -> u32 {
        read_packed(&self.data, self.bits, index)
    }

    #[inline]
    fn runtime_at(&self, index: usize) -> u32 {
        self.palette[self.entry(index) as usize]
    }

    fn palette_index_for(&mut self, runtime_id: u32) -> u32 {
        if let Some(pos) = self.palette.iter().position(|&id| id == runtime_id) {
            return pos as u32;
        }
        if self.palette.len() >= 1 << self.bits {
            self.repack(self.bits + 1);
        }
        self.palette.push(runtime_id);
        (self.palette.len() - 1) as u32
    }

    fn repack(&mut self, bits: u8) {
        let mut data = vec![0u64; data_len(bits)];
        for index in 0..NUM_BLOCKS {
            write_packed(&mut data, bits, index, self.entry(index));
        }
        self.bits = bits;
        self.data = data;
    }

    fn write_runtime(&mut self, index: usize, runtime_id: u32) {
        let entry = self.palette_index_for(runtime_id);
        write_packed(&mut self.data, self.bits, index, entry);
    }

    /// Drops palette entries no voxel uses and packs at the narrowest width.
    /// Returns whether anything changed.
    pub fn optimize(&mut self) -> bool {
        let mut remap = vec![u32::MAX; self.palette.len()];
        let mut palette = Vec::new();
        for index in 0..NUM_BLOCKS {
            let entry = self.entry(index) as usize;
            if remap[entry] == u32::MAX {
                remap[entry] = palette.len() as u32;
                palette.push(self.palette[entry]);
            }
        }
        if palette == self.palette {
            return false;
        }

        let bits = bits_for(palette.len());
        let mut data = vec![0u64; data_len(bits)];
        for index in 0..NUM_BLOCKS {
            write_packed(&mut data, bits, index, remap[self.entry(index) as usize]);
        }
        self.palette = palette;
        self.bits = bits;
        self.data = data;
        true
    }
}

impl BlockLayer for PaletteBlockStorage {
    fn layers(&self) -> usize {
        1
    }

    fn legacy_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32> {
        Ok(self.runtime_id_in(x, y, z, layer)? >> 4)
    }

    fn meta_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u8> {
        Ok((self.runtime_id_in(x, y, z, layer)? & 0xF) as u8)
    }

    fn runtime_id_in(&self, x: usize, y: usize, z: usize, layer: usize) -> Result<u32> {
        self.check_layer(layer)?;
        let index = checked_index(x, y, z)?;
        Ok(self.runtime_at(index))
    }

    fn set_legacy_id_in(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        layer: usize,
        legacy_id: u32,
    ) -> Result<()> {
        let max = MAX_RUNTIME_ID >> 4;
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
        let runtime_id = (self.runtime_at(index) & !0xF) | meta as u32;
        self.write_runtime(index, runtime_id);
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
        if runtime_id > MAX_RUNTIME_ID {
            return Err(SectionError::ValueOutOfRange {
                value: runtime_id,
                max: MAX_RUNTIME_ID,
            });
        }
        self.write_runtime(index, runtime_id);
        Ok(())
    }
}
