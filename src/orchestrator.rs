//! Pipeline Orchestrator
//!
//! Runs a plan against a directory of component files. Stages run strictly
//! in order and each phase finishes across all files before the next one
//! starts. Work inside a phase is grouped per file, so a parallel phase never
//! has two workers on the same path; results are folded and written back on
//! the calling thread, in file order.

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::factory::panic_message;
use crate::fs::{component_id_for, is_component_file, FileSystem, OsFileSystem};
use crate::logger::{Logger, TracingLogger};
use crate::parse::{classify_message, ParseIssueKind};
use crate::phase::{stages, Stage, TransformPhase};
use crate::registry::{Registry, ResolvedTransform};
use crate::snapshot::{compute_hash, PhaseSnapshots};
use crate::tooling::{default_post_processors, PostProcessor};
use crate::types::{Change, TransformConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub file: PathBuf,
    /// Concrete transform path, e.g. `components/button/color-mapping`.
    pub transform: String,
    pub change: Change,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub files_processed: usize,
    pub files_modified: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub changes: Vec<FileChange>,
    #[serde(skip_serializing_if = "PhaseSnapshots::is_empty", default)]
    pub snapshots: PhaseSnapshots,
}

impl PipelineResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Non-error changes recorded against `file`.
    pub fn changes_for<'r>(&'r self, file: &'r Path) -> impl Iterator<Item = &'r FileChange> + 'r {
        self.changes
            .iter()
            .filter(move |c| c.file == file && !c.change.is_error())
    }

    pub fn count_of(&self, kind: &str) -> usize {
        self.changes.iter().filter(|c| c.change.kind == kind).count()
    }
}

/// 2 for a fatal error, 1 when errors were collected, 0 otherwise.
pub fn exit_code(result: &Result<PipelineResult, PipelineError>) -> i32 {
    match result {
        Err(_) => 2,
        Ok(result) if !result.is_clean() => 1,
        Ok(_) => 0,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORK UNITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Every transform of one phase that applies to one file.
struct WorkUnit<'p> {
    file: PathBuf,
    component: Option<String>,
    source: String,
    transforms: Vec<&'p ResolvedTransform>,
}

#[derive(Default)]
struct UnitOutcome {
    file: PathBuf,
    content: String,
    changed: bool,
    changes: Vec<FileChange>,
    warnings: Vec<String>,
    errors: Vec<String>,
    /// Benign parser panics, reported only in verbose mode.
    suppressed: Vec<String>,
}

fn run_unit(unit: &WorkUnit, verbose: bool) -> UnitOutcome {
    let mut outcome = UnitOutcome {
        file: unit.file.clone(),
        content: unit.source.clone(),
        ..UnitOutcome::default()
    };
    let shown = unit.file.display().to_string();

    for resolved in &unit.transforms {
        let mut config = TransformConfig::for_file(&unit.file);
        if let Some(component) = &unit.component {
            config = config.with_component(component.clone());
        }
        config.verbose = verbose;

        let applied = panic::catch_unwind(AssertUnwindSafe(|| {
            resolved.transform.apply(&outcome.content, &config)
        }));
        let result = match applied {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                let line = format!("{}: {}: {}", resolved.path, shown, message);
                match classify_message(&message) {
                    ParseIssueKind::RestElementOrder => outcome.suppressed.push(line),
                    ParseIssueKind::Syntax => outcome.errors.push(line),
                }
                continue;
            }
        };

        for warning in &result.warnings {
            outcome
                .warnings
                .push(format!("{}: {}: {}", resolved.path, shown, warning));
        }
        for change in &result.changes {
            if change.is_error() {
                outcome
                    .errors
                    .push(format!("{}: {}: {}", resolved.path, shown, change.description));
            }
        }
        outcome
            .changes
            .extend(result.changes.iter().cloned().map(|change| FileChange {
                file: unit.file.clone(),
                transform: resolved.path.clone(),
                change,
            }));

        if result.has_changes {
            outcome.content = result.content;
            outcome.changed = true;
        }
    }
    outcome
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Pipeline {
    phases: Vec<TransformPhase>,
    registry: Arc<Registry>,
    fs: Arc<dyn FileSystem>,
    logger: Arc<dyn Logger>,
    post_processors: Vec<Box<dyn PostProcessor>>,
}

/// Mutable state of one run.
struct RunState {
    /// Current content of every loaded file. Dry runs read later stages
    /// from here instead of the filesystem.
    workspace: BTreeMap<PathBuf, String>,
    modified: BTreeSet<PathBuf>,
    result: PipelineResult,
}

impl Pipeline {
    pub fn new(phases: Vec<TransformPhase>, registry: Arc<Registry>) -> Self {
        Pipeline {
            phases,
            registry,
            fs: Arc::new(OsFileSystem),
            logger: Arc::new(TracingLogger),
            post_processors: default_post_processors(),
        }
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the external tooling step.
    pub fn with_post_processors(mut self, post_processors: Vec<Box<dyn PostProcessor>>) -> Self {
        self.post_processors = post_processors;
        self
    }

    pub fn phases(&self) -> &[TransformPhase] {
        &self.phases
    }

    pub fn run(&self, config: &PipelineConfig) -> Result<PipelineResult, PipelineError> {
        config.validate()?;

        let files: Vec<PathBuf> = self
            .fs
            .read_directory(&config.src_dir)
            .map_err(PipelineError::SourceDirectory)?
            .into_iter()
            .filter(|path| is_component_file(path))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count())
            .build()?;

        let mut state = RunState {
            workspace: BTreeMap::new(),
            modified: BTreeSet::new(),
            result: PipelineResult::default(),
        };
        self.load(&files, &mut state);
        state.result.files_processed = state.workspace.len();

        if config.verbose {
            self.logger.info(&format!(
                "processing {} component file(s) in {}",
                state.workspace.len(),
                config.src_dir.display()
            ));
        }
        if config.capture_snapshots {
            capture(&mut state, "input");
        }

        if config.skip_transforms {
            self.logger.info("transforms skipped");
        } else {
            for (stage, phases) in stages(&self.phases) {
                if stage == Stage::ExternalTooling {
                    continue;
                }
                for phase in phases {
                    self.run_phase(phase, config, &pool, &mut state);
                }
                if config.capture_snapshots {
                    capture(&mut state, stage.as_str());
                }
            }
        }

        self.run_external_tools(config, &mut state);

        let mut result = state.result;
        result.files_modified = state.modified.len();
        self.logger.info(&format!(
            "{} file(s) modified, {} error(s), {} warning(s)",
            result.files_modified,
            result.errors.len(),
            result.warnings.len()
        ));
        Ok(result)
    }

    fn load(&self, files: &[PathBuf], state: &mut RunState) {
        for file in files {
            match self.fs.read_file(file) {
                Ok(content) => {
                    state.workspace.insert(file.clone(), content);
                }
                Err(e) => {
                    self.logger.error(&e.to_string());
                    state.result.errors.push(e.to_string());
                }
            }
        }
    }

    fn run_phase(
        &self,
        phase: &TransformPhase,
        config: &PipelineConfig,
        pool: &ThreadPool,
        state: &mut RunState,
    ) {
        let resolution = self.registry.resolve(phase);

        for gap in &resolution.gaps {
            if phase.optional {
                if config.verbose {
                    self.logger.debug(&format!("no transform for {}, skipped", gap));
                }
            } else {
                let message = format!("no transform registered for {}", gap);
                self.logger.error(&message);
                state.result.errors.push(message);
            }
        }

        let transforms: Vec<&ResolvedTransform> = resolution
            .transforms
            .iter()
            .filter(|resolved| {
                let allowed = config.allows(&resolved.filter_names());
                if !allowed && config.verbose {
                    self.logger.debug(&format!("{} excluded by filter", resolved.path));
                }
                allowed
            })
            .collect();
        if transforms.is_empty() {
            return;
        }

        let units: Vec<WorkUnit> = state
            .workspace
            .iter()
            .filter_map(|(file, source)| {
                let component = component_id_for(file);
                let applicable: Vec<&ResolvedTransform> = transforms
                    .iter()
                    .copied()
                    .filter(|t| t.component.is_none() || t.component == component)
                    .collect();
                if applicable.is_empty() {
                    return None;
                }
                Some(WorkUnit {
                    file: file.clone(),
                    component,
                    source: source.clone(),
                    transforms: applicable,
                })
            })
            .collect();

        if config.verbose {
            self.logger.debug(&format!(
                "{}: {} file(s){}",
                phase.path,
                units.len(),
                if phase.parallel { ", parallel" } else { "" }
            ));
        }

        let verbose = config.verbose;
        let outcomes: Vec<UnitOutcome> = if phase.parallel {
            pool.install(|| units.par_iter().map(|unit| run_unit(unit, verbose)).collect())
        } else {
            units.iter().map(|unit| run_unit(unit, verbose)).collect()
        };

        for outcome in outcomes {
            self.fold(outcome, config, state);
        }
    }

    fn fold(&self, outcome: UnitOutcome, config: &PipelineConfig, state: &mut RunState) {
        for line in &outcome.suppressed {
            if config.verbose {
                self.logger.debug(&format!("suppressed benign parse warning: {}", line));
            }
        }
        for warning in &outcome.warnings {
            self.logger.warn(warning);
        }
        for error in &outcome.errors {
            self.logger.error(error);
        }
        if config.verbose {
            for change in outcome.changes.iter().filter(|c| !c.change.is_error()) {
                self.logger.debug(&format!(
                    "{}: {}: {}",
                    change.transform,
                    change.file.display(),
                    change.change.description
                ));
            }
        }

        state.result.warnings.extend(outcome.warnings);
        state.result.errors.extend(outcome.errors);
        state.result.changes.extend(outcome.changes);

        if !outcome.changed {
            return;
        }
        let previous = state.workspace.get(&outcome.file).map(|s| compute_hash(s));
        if previous.as_deref() == Some(compute_hash(&outcome.content).as_str()) {
            return;
        }

        if !config.dry_run {
            let target = config.output_path(&outcome.file);
            if let Err(e) = self.fs.write_file(&target, &outcome.content) {
                self.logger.error(&e.to_string());
                state.result.errors.push(e.to_string());
                return;
            }
            state.modified.insert(outcome.file.clone());
        }
        state.workspace.insert(outcome.file, outcome.content);
    }

    fn run_external_tools(&self, config: &PipelineConfig, state: &mut RunState) {
        if config.dry_run || !config.run_external_tools {
            return;
        }
        let dir = config.out_dir.as_deref().unwrap_or(&config.src_dir);
        for tool in &self.post_processors {
            match tool.run(dir) {
                Ok(()) => {
                    if config.verbose {
                        self.logger.debug(&format!("{} finished", tool.name()));
                    }
                }
                Err(e) => {
                    let message = format!("external tool: {}", e);
                    self.logger.warn(&message);
                    state.result.warnings.push(message);
                }
            }
        }
    }
}

fn capture(state: &mut RunState, stage: &str) {
    state.result.snapshots.capture(
        stage,
        state
            .workspace
            .iter()
            .map(|(path, content)| (path.as_path(), content.as_str())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let fatal: Result<PipelineResult, PipelineError> =
            Err(PipelineError::InvalidConfig("bad".to_string()));
        assert_eq!(exit_code(&fatal), 2);

        let with_errors = Ok(PipelineResult {
            errors: vec!["x".to_string()],
            ..PipelineResult::default()
        });
        assert_eq!(exit_code(&with_errors), 1);
        assert_eq!(exit_code(&Ok(PipelineResult::default())), 0);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let json = serde_json::to_value(PipelineResult::default()).unwrap();
        assert_eq!(json["filesModified"], 0);
        assert!(json.get("snapshots").is_none());
    }
}
