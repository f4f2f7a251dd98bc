//! Per-stage content snapshots
//!
//! Captured after each stage when `captureSnapshots` is set, so callers can
//! check what a later stage started from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub fn compute_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub hash: String,
    pub content: String,
}

impl SnapshotEntry {
    pub fn new(content: String) -> Self {
        SnapshotEntry {
            hash: compute_hash(&content),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSnapshot {
    pub stage: String,
    pub files: BTreeMap<PathBuf, SnapshotEntry>,
}

impl PhaseSnapshot {
    pub fn content(&self, file: &Path) -> Option<&str> {
        self.files.get(file).map(|e| e.content.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSnapshots {
    stages: Vec<PhaseSnapshot>,
}

impl PhaseSnapshots {
    pub fn capture<'a, I>(&mut self, stage: &str, files: I)
    where
        I: IntoIterator<Item = (&'a Path, &'a str)>,
    {
        self.stages.push(PhaseSnapshot {
            stage: stage.to_string(),
            files: files
                .into_iter()
                .map(|(path, content)| (path.to_path_buf(), SnapshotEntry::new(content.to_string())))
                .collect(),
        });
    }

    pub fn after(&self, stage: &str) -> Option<&PhaseSnapshot> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn stages(&self) -> &[PhaseSnapshot] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages that left `file` with different content than the stage before.
    pub fn stages_touching(&self, file: &Path) -> Vec<&str> {
        let mut touched = Vec::new();
        let mut previous: Option<&str> = None;
        for snapshot in &self.stages {
            let hash = snapshot.files.get(file).map(|e| e.hash.as_str());
            if previous.is_some() && hash != previous {
                touched.push(snapshot.stage.as_str());
            }
            previous = hash.or(previous);
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_sha256() {
        assert_eq!(
            compute_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_capture_and_lookup() {
        let path = Path::new("src/Button.tsx");
        let mut snapshots = PhaseSnapshots::default();
        snapshots.capture("input", [(path, "a")]);
        snapshots.capture("structure", [(path, "b")]);
        snapshots.capture("color", [(path, "b")]);

        assert_eq!(snapshots.after("structure").unwrap().content(path), Some("b"));
        assert_eq!(snapshots.stages_touching(path), vec!["structure"]);
    }
}
