//! Flat YAML experience file, merged in place by summary key

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

use super::ExperienceSummary;

/// `experience.yaml`: a map from summary key to summary
pub struct ExperienceFile {
    path: PathBuf,
    entries: BTreeMap<String, ExperienceSummary>,
}

impl ExperienceFile {
    /// Load the file, or start empty when it does not exist yet
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yml::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Merge summaries into the file at `path`, replacing entries with the same key
    pub fn create_or_update(summaries: &[ExperienceSummary], path: &Path) -> Result<Self> {
        let mut file = Self::load(path)?;
        for summary in summaries {
            file.entries.insert(summary.key.clone(), summary.clone());
        }
        file.save()?;
        debug!("Saved {} experience entries to {}", file.entries.len(), path.display());
        Ok(file)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yml::to_string(&self.entries)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ExperienceSummary> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summaries(&self) -> impl Iterator<Item = &ExperienceSummary> {
        self.entries.values()
    }
}
