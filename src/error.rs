use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure of the local files the game keeps between runs.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} does not hold a score: {contents:?}", .path.display())]
    Corrupt { path: PathBuf, contents: String },
    #[error("{} lists no fruit names", .path.display())]
    EmptyCatalog { path: PathBuf },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io { path: path.into(), source }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be positive")]
    NotPositive { name: &'static str },
    #[error("{name} ({value}) is not a multiple of the cell size ({cell_size})")]
    NotAligned { name: &'static str, value: u32, cell_size: u32 },
    #[error("grid of {width}x{height} cells is too small, need at least {min}x{min}")]
    GridTooSmall { width: i32, height: i32, min: i32 },
    #[error("tick rate {0} is outside 1..=120")]
    TickRate(u32),
}
