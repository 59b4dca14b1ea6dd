pub mod cli;
pub mod config;
pub mod loader;

pub use config::LoaderConfig;
pub use loader::{Chunk, ChunkLoader, LoadedChunk, SectionFailure};
