//! # Token Codemod Engine
//!
//! Rewrites UI component sources so hard-coded styling values become
//! semantic design tokens.
//!
//! ## Pipeline Invariants
//!
//! 1. **Stage Order**: Import → Structure → Color → Edge-Case → Cleanup →
//!    Formatting → External-Tooling. A stage starts only after the previous
//!    one has finished for every file.
//!
//! 2. **Result Shape**: `apply` always returns a `TransformResult`. A rule
//!    that fails (or panics) yields its input, `has_changes == false` and a
//!    single `error` change.
//!
//! 3. **Idempotency**: running the whole plan twice produces no changes on
//!    the second pass. Protected substitution skips anything already in the
//!    output vocabulary; structural rules short-circuit on nodes they added.
//!
//! 4. **No Needless Reformatting**: structural rules re-emit a file only
//!    when they recorded a change.
//!
//! 5. **Isolation**: files are rewritten independently. Parallel phases
//!    never have two workers on the same file.
//!
//! ## Layout
//!
//! - `types`, `transform`: the transform contract.
//! - `factory`, `protect`, `template`, `resolution`: how rules are built.
//! - `phase`, `registry`, `orchestrator`: what runs, in which order.
//! - `rules`, `catalog`: the built-in rule set and component data.

#[cfg(feature = "napi")]
mod bridge;

pub mod catalog;
pub mod codegen;
pub mod config;
pub mod error;
pub mod factory;
pub mod fs;
pub mod logger;
pub mod orchestrator;
pub mod parse;
pub mod phase;
pub mod protect;
pub mod registry;
pub mod resolution;
pub mod rules;
pub mod snapshot;
pub mod template;
pub mod tooling;
pub mod transform;
pub mod types;


#[cfg(feature = "napi")]
pub use bridge::run_pipeline_native;

pub use catalog::builtin_registry;
pub use config::PipelineConfig;
pub use error::{FsError, PipelineError, ToolError};
pub use factory::{
    noop_transform, pattern_transform, protected_pattern_transform, structural_transform,
    StructuralContext,
};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use orchestrator::{exit_code, FileChange, Pipeline, PipelineResult};
pub use phase::{default_plan, Stage, TransformPhase};
pub use registry::Registry;
pub use resolution::{build_resolution, ResolutionProfile, ResolutionShape};
pub use transform::{Transform, TransformMeta};
pub use types::{Category, Change, ChangeSet, Rewrite, Strategy, TransformConfig, TransformResult};
