//! Transform factories
//!
//! Rule authors write a rewrite callback; the factories own everything
//! else: choosing the parser dialect, catching failures (including panics),
//! re-emitting text only when something changed, and keeping the
//! `TransformResult` shape intact no matter what the callback does.

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_ast::AstBuilder;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::codegen::print_program;
use crate::parse::{parse_program, SourceDialect};
use crate::protect::SubstitutionTable;
use crate::transform::{Transform, TransformMeta};
use crate::types::{ChangeSet, Rewrite, TransformConfig, TransformResult};

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURAL CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// What a structural callback gets to work with. All nodes it creates must
/// come from `allocator` (via `ast` or `crate::template`).
pub struct StructuralContext<'a, 'b> {
    pub allocator: &'a Allocator,
    pub ast: AstBuilder<'a>,
    pub program: &'b mut Program<'a>,
    pub source: &'a str,
    pub dialect: SourceDialect,
    pub config: &'b TransformConfig,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PANIC CAPTURE
// ═══════════════════════════════════════════════════════════════════════════════

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}

/// Run a callback, turning a panic into `Rewrite::Failed`.
fn guarded<T>(f: impl FnOnce() -> Rewrite<T>) -> Rewrite<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(outcome) => outcome,
        Err(payload) => Rewrite::Failed(panic_message(&*payload)),
    }
}

fn failure_message(name: &str, reason: &str) -> String {
    format!("{} failed: {}", name, reason)
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURAL FACTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Build a transform that parses the file, lets `rewrite` mutate the tree,
/// and prints the tree back only when a change was recorded.
pub fn structural_transform<F>(meta: TransformMeta, rewrite: F) -> Transform
where
    F: for<'a, 'b> Fn(&mut StructuralContext<'a, 'b>, &mut ChangeSet) -> Rewrite<()>
        + Send
        + Sync
        + 'static,
{
    let name = meta.name.clone();
    Transform::new(meta, move |source, config| {
        run_structural(&name, &rewrite, source, config)
    })
}

fn run_structural<F>(name: &str, rewrite: &F, source: &str, config: &TransformConfig) -> TransformResult
where
    F: for<'a, 'b> Fn(&mut StructuralContext<'a, 'b>, &mut ChangeSet) -> Rewrite<()>,
{
    let allocator = Allocator::default();
    let dialect = SourceDialect::for_config(config);

    let mut program = match parse_program(&allocator, source, dialect) {
        Ok(program) => program,
        // Benign parser quirks leave the file to other rules, silently.
        Err(issue) if issue.is_benign() => return TransformResult::unchanged(source),
        Err(issue) => {
            return TransformResult::failed(source, failure_message(name, &issue.to_string()))
        }
    };

    let mut changes = ChangeSet::new();
    let outcome = guarded(|| {
        let mut cx = StructuralContext {
            allocator: &allocator,
            ast: AstBuilder::new(&allocator),
            program: &mut program,
            source,
            dialect,
            config,
        };
        rewrite(&mut cx, &mut changes)
    });

    match outcome {
        Rewrite::Applied(()) => {
            let has_edits = changes.has_edits();
            let (changes, warnings) = changes.into_parts();
            let content = if has_edits {
                print_program(&program)
            } else {
                source.to_string()
            };
            TransformResult::from_parts(content, changes, warnings)
        }
        Rewrite::Skip => {
            let (_, warnings) = changes.into_parts();
            TransformResult::unchanged(source).with_warnings(warnings)
        }
        Rewrite::Failed(reason) => {
            let (_, warnings) = changes.into_parts();
            TransformResult::failed(source, failure_message(name, &reason)).with_warnings(warnings)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PATTERN FACTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Build a transform whose callback rewrites raw text and returns the final
/// text directly.
pub fn pattern_transform<F>(meta: TransformMeta, rewrite: F) -> Transform
where
    F: Fn(&str, &TransformConfig, &mut ChangeSet) -> Rewrite<String> + Send + Sync + 'static,
{
    let name = meta.name.clone();
    Transform::new(meta, move |source, config| {
        run_pattern(&name, &rewrite, source, config)
    })
}

fn run_pattern<F>(name: &str, rewrite: &F, source: &str, config: &TransformConfig) -> TransformResult
where
    F: Fn(&str, &TransformConfig, &mut ChangeSet) -> Rewrite<String>,
{
    let mut changes = ChangeSet::new();
    let outcome = guarded(|| rewrite(source, config, &mut changes));

    match outcome {
        Rewrite::Applied(text) => {
            let has_edits = changes.has_edits();
            let (changes, mut warnings) = changes.into_parts();
            if !has_edits && text != source {
                warnings.push(format!(
                    "{} altered content without recording a change; output discarded",
                    name
                ));
                return TransformResult::from_parts(source.to_string(), changes, warnings);
            }
            TransformResult::from_parts(text, changes, warnings)
        }
        Rewrite::Skip => {
            let (_, warnings) = changes.into_parts();
            TransformResult::unchanged(source).with_warnings(warnings)
        }
        Rewrite::Failed(reason) => {
            let (_, warnings) = changes.into_parts();
            TransformResult::failed(source, failure_message(name, &reason)).with_warnings(warnings)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROTECTED PATTERN FACTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// A pattern transform driven by a substitution table. Occurrences already
/// expressed in the output vocabulary, or sitting in a protected region,
/// are left alone; this is what makes repeated runs converge.
pub fn protected_pattern_transform(meta: TransformMeta, table: SubstitutionTable) -> Transform {
    pattern_transform(meta, move |source, _config, changes| {
        Rewrite::Applied(table.apply(source, changes))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// NO-OP FACTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// For components that are already fully converted.
pub fn noop_transform(meta: TransformMeta) -> Transform {
    Transform::new(meta, |source, _config| TransformResult::unchanged(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::Substitution;
    use crate::types::{change_kind, Category, Change, Strategy};
    use oxc_ast::ast::Statement;

    fn meta(name: &str, strategy: Strategy) -> TransformMeta {
        TransformMeta::new(name, "test rule", Category::Quality, strategy)
    }

    #[test]
    fn test_structural_without_changes_returns_original_text() {
        let t = structural_transform(meta("noop-structural", Strategy::Structural), |_cx, _changes| {
            Rewrite::Applied(())
        });
        let src = "const   a =  1 ;";
        let result = t.apply(src, &TransformConfig::default());
        assert!(!result.has_changes);
        assert_eq!(result.content, src);
    }

    #[test]
    fn test_structural_reprints_when_changed() {
        let t = structural_transform(meta("drop-debugger", Strategy::Structural), |cx, changes| {
            let before = cx.program.body.len();
            cx.program
                .body
                .retain(|stmt| !matches!(stmt, Statement::DebuggerStatement(_)));
            if cx.program.body.len() != before {
                changes.record(Change::new("debugger-removed", "removed debugger"));
            }
            Rewrite::Applied(())
        });
        let result = t.apply("debugger;\nconst a = 1;", &TransformConfig::default());
        assert!(result.has_changes);
        assert!(!result.content.contains("debugger"));
        assert!(result.content.contains("const a = 1"));
    }

    #[test]
    fn test_structural_panic_becomes_error_change() {
        let t = structural_transform(meta("explodes", Strategy::Structural), |_cx, _changes| {
            panic!("boom")
        });
        let result = t.apply("const a = 1;", &TransformConfig::default());
        assert!(!result.has_changes);
        assert_eq!(result.content, "const a = 1;");
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].kind, change_kind::ERROR);
        assert!(result.changes[0].description.contains("boom"));
    }

    #[test]
    fn test_structural_syntax_error_is_reported() {
        let t = structural_transform(meta("any", Strategy::Structural), |_cx, _changes| {
            Rewrite::Applied(())
        });
        let result = t.apply("const = ;", &TransformConfig::default());
        assert!(!result.has_changes);
        assert_eq!(result.error_changes().count(), 1);
    }

    #[test]
    fn test_pattern_failed_outcome() {
        let t = pattern_transform(meta("fails", Strategy::Pattern), |_src, _cfg, _changes| {
            Rewrite::Failed("cannot handle".to_string())
        });
        let result = t.apply("abc", &TransformConfig::default());
        assert!(!result.has_changes);
        assert_eq!(result.content, "abc");
        assert!(result.changes[0].description.contains("cannot handle"));
    }

    #[test]
    fn test_pattern_unrecorded_edit_is_discarded() {
        let t = pattern_transform(meta("sneaky", Strategy::Pattern), |src, _cfg, _changes| {
            Rewrite::Applied(src.replace('a', "b"))
        });
        let result = t.apply("aaa", &TransformConfig::default());
        assert_eq!(result.content, "aaa");
        assert!(!result.has_changes);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_protected_pattern_skips_converted_tokens() {
        let table = SubstitutionTable::new(vec![Substitution::literal("bg-blue-500", "bg-primary")]);
        let t = protected_pattern_transform(meta("colors", Strategy::Pattern), table);
        let first = t.apply("<a className=\"bg-blue-500\" />", &TransformConfig::default());
        assert!(first.has_changes);
        assert_eq!(first.content, "<a className=\"bg-primary\" />");
        let second = t.apply(&first.content, &TransformConfig::default());
        assert!(!second.has_changes);
        assert_eq!(second.content, first.content);
    }

    #[test]
    fn test_noop_transform() {
        let t = noop_transform(meta("done", Strategy::Pattern));
        let result = t.apply("anything", &TransformConfig::default());
        assert!(!result.has_changes);
        assert_eq!(result.content, "anything");
    }
}
