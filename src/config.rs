//! Pipeline configuration
//!
//! Handed over by the CLI layer as JSON. Every field has a default so a
//! partial document is enough.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub src_dir: PathBuf,
    /// When set (and different from `src_dir`), rewritten files go to the
    /// mirrored path under this directory.
    pub out_dir: Option<PathBuf>,
    pub verbose: bool,
    pub dry_run: bool,
    /// Run no transform phases, only the external tooling step.
    pub skip_transforms: bool,
    /// Phase paths, concrete paths or component ids. Empty means all.
    pub enabled_transforms: Vec<String>,
    pub disabled_transforms: Vec<String>,
    /// Worker count for parallel phases; defaults to available cores.
    pub concurrency: Option<usize>,
    pub capture_snapshots: bool,
    pub run_external_tools: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            src_dir: PathBuf::from("src"),
            out_dir: None,
            verbose: false,
            dry_run: false,
            skip_transforms: false,
            enabled_transforms: Vec::new(),
            disabled_transforms: Vec::new(),
            concurrency: None,
            capture_snapshots: false,
            run_external_tools: true,
        }
    }
}

impl PipelineConfig {
    pub fn new(src_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            src_dir: src_dir.into(),
            ..PipelineConfig::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.src_dir.as_os_str().is_empty() {
            return Err(PipelineError::InvalidConfig("srcDir must not be empty".to_string()));
        }
        if self.concurrency == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(name) = self
            .enabled_transforms
            .iter()
            .find(|name| self.disabled_transforms.contains(name))
        {
            return Err(PipelineError::InvalidConfig(format!(
                "`{}` is both enabled and disabled",
                name
            )));
        }
        Ok(())
    }

    /// Where a rewritten source file is persisted.
    pub fn output_path(&self, file: &Path) -> PathBuf {
        match &self.out_dir {
            Some(out_dir) if out_dir != &self.src_dir => match file.strip_prefix(&self.src_dir) {
                Ok(relative) => out_dir.join(relative),
                Err(_) => file.to_path_buf(),
            },
            _ => file.to_path_buf(),
        }
    }

    /// Inclusion/exclusion check. A candidate matches a list entry by exact
    /// equality with any of `names` (phase path, concrete path, component).
    pub fn allows(&self, names: &[&str]) -> bool {
        let listed = |list: &[String]| list.iter().any(|entry| names.contains(&entry.as_str()));
        if !self.enabled_transforms.is_empty() && !listed(&self.enabled_transforms) {
            return false;
        }
        !listed(&self.disabled_transforms)
    }

    pub fn worker_count(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
