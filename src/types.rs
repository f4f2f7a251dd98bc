//! Transform contract types
//!
//! Everything a rewrite rule produces or consumes: change records, the
//! per-call result, the per-call configuration and the explicit rewrite
//! outcome that replaces exception-style control flow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// How a transform reaches the text it rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Parse, mutate the tree, re-emit.
    Structural,
    /// Search-and-replace directly on text.
    Pattern,
    /// Parse to locate spans, then edit text.
    Hybrid,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::Structural => "structural",
            Strategy::Pattern => "pattern",
            Strategy::Hybrid => "hybrid",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Import,
    Structure,
    Color,
    EdgeCase,
    Quality,
    Formatting,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHANGE RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Well-known change types. Rules may use other strings.
pub mod change_kind {
    pub const ERROR: &str = "error";
    pub const IMPORT_REWRITTEN: &str = "import-rewritten";
    pub const IMPORT_ADDED: &str = "import-added";
    pub const PARAM_ADDED: &str = "param-added";
    pub const COLOR_MAPPED: &str = "color-mapped";
    pub const RESOLUTION_INSERTED: &str = "resolution-inserted";
    pub const DUPLICATE_REMOVED: &str = "duplicate-removed";
    pub const CLASS_NAMES_NORMALIZED: &str = "class-names-normalized";
    pub const WHITESPACE_NORMALIZED: &str = "whitespace-normalized";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// 1-based line/column of a byte offset.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() as u32 + 1;
        let column = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() as u32 + 1,
            None => before.chars().count() as u32 + 1,
        };
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One atomic edit record. Reporting only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub location: Option<Location>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl Change {
    pub fn new(kind: &str, description: impl Into<String>) -> Self {
        Change {
            kind: kind.to_string(),
            description: description.into(),
            location: None,
            before: None,
            after: None,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Change::new(change_kind::ERROR, description)
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_snippets(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self.after = Some(after.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == change_kind::ERROR
    }
}

/// The `changes` list handed to rule callbacks. Also collects warnings.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
    warnings: Vec<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        ChangeSet::default()
    }

    pub fn record(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// True once at least one non-error change has been recorded.
    pub fn has_edits(&self) -> bool {
        self.changes.iter().any(|c| !c.is_error())
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_parts(self) -> (Vec<Change>, Vec<String>) {
        (self.changes, self.warnings)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORM RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// Output of one `apply` call.
///
/// `has_changes` is true exactly when `changes` holds at least one
/// non-error change. A failed rule carries a single `error` change and
/// `has_changes == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub content: String,
    pub has_changes: bool,
    pub changes: Vec<Change>,
    pub warnings: Vec<String>,
}

impl TransformResult {
    pub fn unchanged(source: &str) -> Self {
        TransformResult {
            content: source.to_string(),
            has_changes: false,
            changes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn failed(source: &str, reason: impl Into<String>) -> Self {
        TransformResult {
            content: source.to_string(),
            has_changes: false,
            changes: vec![Change::error(reason)],
            warnings: Vec::new(),
        }
    }

    pub fn from_parts(content: String, changes: Vec<Change>, warnings: Vec<String>) -> Self {
        let has_changes = changes.iter().any(|c| !c.is_error());
        TransformResult {
            content,
            has_changes,
            changes,
            warnings,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn error_changes(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| c.is_error())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-CALL CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// The `config` argument of `apply`.
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    pub file_path: Option<PathBuf>,
    pub component: Option<String>,
    pub verbose: bool,
}

impl TransformConfig {
    pub fn for_file(path: impl AsRef<Path>) -> Self {
        TransformConfig {
            file_path: Some(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITE OUTCOME
// ═══════════════════════════════════════════════════════════════════════════════

/// What a rule callback hands back to its factory.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite<T> {
    Applied(T),
    /// Nothing to do for this file; not an error.
    Skip,
    Failed(String),
}

impl<T> Rewrite<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Rewrite<U> {
        match self {
            Rewrite::Applied(value) => Rewrite::Applied(f(value)),
            Rewrite::Skip => Rewrite::Skip,
            Rewrite::Failed(reason) => Rewrite::Failed(reason),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Rewrite<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Rewrite::Applied(value),
            Err(e) => Rewrite::Failed(e.to_string()),
        }
    }
}
