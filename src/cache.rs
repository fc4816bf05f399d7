use crate::config::project_dirs;
use crate::error::CacheError;
use crate::model::Candidate;
use crate::sources::desktop::{SearchPath, desktop_walker, is_desktop_file};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Resolver settings that shape the stored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub skip_hidden: bool,
    pub sort_entries: bool,
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    search_path: Vec<PathBuf>,
    #[serde(default)]
    settings: Option<ScanSettings>,
    candidates: Vec<Candidate>,
}

/// On-disk copy of the last resolved candidate list.
pub struct Cache {
    path: PathBuf,
}

impl Cache {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `candidates.json` in the user cache dir, which is created if absent.
    pub fn open_default() -> Result<Self, CacheError> {
        let dirs = project_dirs().ok_or(CacheError::NoLocation)?;
        let cache_dir = dirs.cache_dir();
        fs::create_dir_all(cache_dir)?;
        Ok(Self::at(cache_dir.join("candidates.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the cache file is at least as new as every existing search
    /// directory and every `.desktop` file directly inside one.
    pub fn is_fresh(&self, search_path: &SearchPath) -> bool {
        let Some(written) = modified(&self.path) else {
            return false;
        };
        search_path.dirs().iter().all(|dir| {
            let dir_ok = modified(dir).is_none_or(|changed| changed <= written);
            dir_ok
                && desktop_walker(dir, false)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(is_desktop_file)
                    .filter_map(|entry| entry.metadata().ok()?.modified().ok())
                    .all(|changed| changed <= written)
        })
    }

    /// Stored candidates; empty when the cache was built for another search
    /// path or with other scan settings.
    pub fn read(&self, search_path: &SearchPath, settings: ScanSettings) -> Result<Vec<Candidate>, CacheError> {
        let content = fs::read_to_string(&self.path)?;
        let file: CacheFile = serde_json::from_str(&content)?;
        if file.search_path != search_path.dirs() {
            debug!("Cache was built for a different search path");
            return Ok(Vec::new());
        }
        if file.settings != Some(settings) {
            debug!("Cache was built with different scan settings");
            return Ok(Vec::new());
        }
        Ok(file.candidates)
    }

    pub fn write(
        &self,
        search_path: &SearchPath,
        settings: ScanSettings,
        candidates: &[Candidate],
    ) -> Result<(), CacheError> {
        let file = CacheFile {
            search_path: search_path.dirs().to_vec(),
            settings: Some(settings),
            candidates: candidates.to_vec(),
        };
        let content = serde_json::to_string(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Candidates from a fresh, non-empty cache; None means the caller must rescan.
    pub fn load_fresh(&self, search_path: &SearchPath, settings: ScanSettings) -> Option<Vec<Candidate>> {
        if !self.is_fresh(search_path) {
            debug!("Cache {:?} is missing or stale", self.path);
            return None;
        }
        match self.read(search_path, settings) {
            Ok(candidates) if !candidates.is_empty() => Some(candidates),
            Ok(_) => {
                debug!("Cache {:?} holds no candidates", self.path);
                None
            }
            Err(err) => {
                warn!("Ignoring cache {:?}: {}", self.path, err);
                None
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
