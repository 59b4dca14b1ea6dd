use futures::future::join_all;
use shulker_common::{Result, ShulkerError};
use shulker_logger::{log, set_threshold, LogSeverity::*};
use shulker_nbt::NBTFile;
use shulker_section::{BlockRegistry, CodecRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::LoaderConfig;
use crate::loader::{ChunkLoader, LoadedChunk};

pub const USAGE: &str = "usage: shulker [--config <file>] <chunk.nbt>...";

/// Command line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
        let mut config = None;
        let mut files = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => match args.next() {
                    Some(path) => config = Some(PathBuf::from(path)),
                    None => return Err(ShulkerError::ConfigError(USAGE.to_string())),
                },
                flag if flag.starts_with('-') => {
                    return Err(ShulkerError::ConfigError(format!(
                        "unknown option {}\n{}",
                        flag, USAGE
                    )))
                }
                _ => files.push(PathBuf::from(&arg)),
            }
        }
        if files.is_empty() {
            return Err(ShulkerError::ConfigError(USAGE.to_string()));
        }
        Ok(Args { config, files })
    }
}

/// Totals over one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: usize,
    pub sections: usize,
    pub failed_sections: usize,
    pub failed_files: usize,
}

pub async fn load_config(path: Option<&Path>) -> Result<LoaderConfig> {
    match path {
        Some(path) => LoaderConfig::from_json_str(&tokio::fs::read_to_string(path).await?),
        None => Ok(LoaderConfig::default()),
    }
}

/// Applies the config's log level and loads its block table.
pub async fn build_loader(config: LoaderConfig) -> Result<ChunkLoader> {
    if let Some(severity) = config.log_severity()? {
        set_threshold(severity);
    }
    let registry = match &config.registry {
        Some(path) => {
            let registry = BlockRegistry::from_json(&tokio::fs::read_to_string(path).await?)?;
            log(
                format!("Loaded {} block(s) from {}", registry.len(), path.display()),
                Info,
            );
            registry
        }
        None => BlockRegistry::java_1_12_2().clone(),
    };
    Ok(ChunkLoader::new(config, CodecRegistry::default(), registry))
}

/// Reads a gzip-compressed chunk file and decodes it on the blocking pool.
pub async fn load_chunk_file(loader: Arc<ChunkLoader>, path: PathBuf) -> Result<LoadedChunk> {
    let data = tokio::fs::read(&path).await?;
    tokio::task::spawn_blocking(move || {
        let file = NBTFile::from_gzip_bytes(&data)
            .map_err(|e| ShulkerError::NbtError(format!("{}: {}", path.display(), e)))?;
        loader.load(file.root)
    })
    .await
    .map_err(|e| ShulkerError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

pub async fn run(args: Args) -> Result<RunSummary> {
    let config = load_config(args.config.as_deref()).await?;
    let loader = Arc::new(build_loader(config).await?);

    let tasks = args
        .files
        .iter()
        .map(|path| load_chunk_file(Arc::clone(&loader), path.clone()));
    let results = join_all(tasks).await;

    let mut summary = RunSummary::default();
    for (path, result) in args.files.iter().zip(results) {
        match result {
            Ok(loaded) => {
                summary.chunks += 1;
                summary.sections += loaded.chunk.sections.len();
                summary.failed_sections += loaded.failures.len();
                log(
                    format!(
                        "{}: chunk ({}, {}) version {}, {} section(s), {} non-air block(s), {} failed",
                        path.display(),
                        loaded.chunk.x,
                        loaded.chunk.z,
                        loaded.chunk.version,
                        loaded.chunk.sections.len(),
                        loaded
                            .chunk
                            .sections
                            .values()
                            .map(|s| s.non_air_count().unwrap_or(0))
                            .sum::<usize>(),
                        loaded.failures.len()
                    ),
                    Info,
                );
            }
            Err(err) => {
                summary.failed_files += 1;
                log(format!("{}: {}", path.display(), err), Error);
            }
        }
    }
    Ok(summary)
}
