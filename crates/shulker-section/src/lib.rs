pub mod codec;
pub mod error;
pub mod layer;
pub mod legacy;
pub mod nibble;
pub mod palette;
pub mod registry;
pub mod section;
pub mod storage;

pub use codec::{CodecContext, CodecRegistry, FlattenedCodec, LegacyCodec, SectionCodec};
pub use error::{Result, SectionError};
pub use layer::{index, BlockLayer, NUM_BLOCKS, SECTION_SIZE};
pub use legacy::LegacyBlockStorage;
pub use nibble::PackedNibbleArray;
pub use palette::PaletteBlockStorage;
pub use registry::BlockRegistry;
pub use section::Section;
pub use storage::BlockStorage;
