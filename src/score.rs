use std::{fs, io::ErrorKind, path::{Path, PathBuf}};

use tracing::{debug, info};

use crate::error::StorageError;

/// Durable home of the high score.
pub trait ScoreStore {
    /// Returns the stored high score, creating a zero record when none exists.
    fn load(&mut self) -> Result<u32, StorageError>;

    /// Overwrites the stored value.
    fn save(&mut self, score: u32) -> Result<(), StorageError>;
}

/// Keeps the high score as decimal text in a single file.
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileScoreStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&mut self) -> Result<u32, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no high score yet, starting from 0");
                self.save(0)?;
                return Ok(0);
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let score = text.trim().parse().map_err(|_| StorageError::Corrupt {
            path: self.path.clone(),
            contents: text.clone(),
        })?;
        debug!(score, "loaded high score");
        Ok(score)
    }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        fs::write(&self.path, score.to_string()).map_err(|e| StorageError::io(&self.path, e))
    }
}

/// Store that lives only as long as the process.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryScoreStore {
    value: Option<u32>,
}

#[cfg(test)]
impl MemoryScoreStore {
    pub fn with_score(score: u32) -> Self {
        MemoryScoreStore { value: Some(score) }
    }
}

#[cfg(test)]
impl ScoreStore for MemoryScoreStore {
    fn load(&mut self) -> Result<u32, StorageError> {
        Ok(*self.value.get_or_insert(0))
    }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        self.value = Some(score);
        Ok(())
    }
}
