use crate::error::RankingError;
use crate::services::ranked_index::RankedIndex;
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A ranking persisted as a single JSON file.
pub struct RankingStore {
    path: PathBuf,
}

impl RankingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RankingStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored ranking. A file that does not exist yet is an empty
    /// ranking; unreadable or corrupt files are errors.
    pub fn open(&self) -> Result<RankedIndex, RankingError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no ranking at {}, starting empty", self.path.display());
                return Ok(RankedIndex::new());
            }
            Err(e) => return Err(e.into()),
        };
        let index = RankedIndex::from_json(&text)?;
        info!(
            "loaded {} players from {}",
            index.count(),
            self.path.display()
        );
        Ok(index)
    }

    /// Like [`RankingStore::open`], but falls back to an empty ranking on any
    /// failure. The broken file is left untouched.
    pub fn open_or_empty(&self) -> RankedIndex {
        self.open().unwrap_or_else(|e| {
            warn!(
                "could not load ranking from {}: {}; starting empty",
                self.path.display(),
                e
            );
            RankedIndex::new()
        })
    }

    /// Writes the ranking next to the destination and renames it into place.
    pub fn save(&self, index: &RankedIndex) -> Result<(), RankingError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let text = index.to_json()?;
        let written = fs::write(&tmp, text).and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!("saved {} players to {}", index.count(), self.path.display());
        Ok(())
    }
}
