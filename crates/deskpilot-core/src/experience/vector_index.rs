//! Searchable experience index
//!
//! Each summary is stored with a term-frequency vector of its document text.
//! Search ranks entries by cosine similarity against the query vector. The
//! index lives in `<experience_dir>/experience_db/index.json` and is merged
//! by summary key on update.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::error::Result;

use super::ExperienceSummary;

const INDEX_FILE: &str = "index.json";

static TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}_]+").expect("valid term regex"));

fn term_vector(text: &str) -> HashMap<String, f32> {
    let mut terms = HashMap::new();
    for m in TERM_RE.find_iter(text) {
        let term = m.as_str().to_lowercase();
        if term.chars().count() > 1 {
            *terms.entry(term).or_insert(0.0) += 1.0;
        }
    }
    terms
}

fn cosine(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
    let dot: f32 = a
        .iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f32>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    summary: ExperienceSummary,
    terms: HashMap<String, f32>,
}

/// A scored search hit
#[derive(Debug, Clone)]
pub struct ExperienceHit {
    pub score: f32,
    pub summary: ExperienceSummary,
}

/// Term-vector index over experience summaries
pub struct ExperienceIndex {
    dir: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
}

impl ExperienceIndex {
    /// Load the index in `dir`, or start empty
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let path = dir.join(INDEX_FILE);
        let entries = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { dir, entries })
    }

    /// Whether an index has been written in `dir`
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).exists()
    }

    /// Merge summaries into the index in `dir`
    pub fn create_or_update(summaries: &[ExperienceSummary], dir: &Path) -> Result<Self> {
        let mut index = Self::load(dir)?;
        for summary in summaries {
            index.insert(summary.clone());
        }
        index.save()?;
        debug!("Indexed {} experiences in {}", index.len(), dir.display());
        Ok(index)
    }

    pub fn insert(&mut self, summary: ExperienceSummary) {
        let terms = term_vector(&summary.document());
        self.entries
            .insert(summary.key.clone(), IndexEntry { summary, terms });
    }

    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(
            self.dir.join(INDEX_FILE),
            serde_json::to_string_pretty(&self.entries)?,
        )?;
        Ok(())
    }

    /// The `k` most similar entries with a non-zero score, best first
    pub fn search(&self, query: &str, k: usize) -> Vec<ExperienceHit> {
        let query_terms = term_vector(query);
        let mut hits: Vec<ExperienceHit> = self
            .entries
            .values()
            .map(|entry| ExperienceHit {
                score: cosine(&query_terms, &entry.terms),
                summary: entry.summary.clone(),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        hits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn summary(key: &str, request: &str, app: &str) -> ExperienceSummary {
        ExperienceSummary {
            key: key.into(),
            task: "t".into(),
            request: request.into(),
            application: app.into(),
            steps: vec!["type_keys on 'Edit'".into()],
            outcome: "done".into(),
        }
    }

    #[test]
    fn test_search_ranks_similar_first() {
        let mut index = ExperienceIndex::load(TempDir::new().unwrap().path()).unwrap();
        index.insert(summary("a", "Open Notepad and type hello", "notepad"));
        index.insert(summary("b", "Send an email to Bob", "outlook"));

        let hits = index.search("type hello in notepad", 5);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].summary.key, "a");

        assert!(index.search("zzz qqq", 5).is_empty());
        assert_eq!(index.search("notepad outlook email hello", 1).len(), 1);
    }

    #[test]
    fn test_create_or_update_merges() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("experience_db");

        ExperienceIndex::create_or_update(&[summary("a", "Open Notepad", "notepad")], &db).unwrap();
        let index = ExperienceIndex::create_or_update(
            &[summary("a", "Open Notepad again", "notepad"), summary("b", "Email", "outlook")],
            &db,
        )
        .unwrap();
        assert_eq!(index.len(), 2);

        let reloaded = ExperienceIndex::load(&db).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(ExperienceIndex::exists(&db));
        assert_eq!(reloaded.search("again", 1)[0].summary.request, "Open Notepad again");
    }
}
