//! Import stage: point legacy color modules at the token module.

use oxc_allocator::Allocator;
use oxc_ast::ast::{ExportAllDeclaration, ExportNamedDeclaration, ImportDeclaration, StringLiteral};
use oxc_ast_visit::VisitMut;
use std::collections::HashMap;

use crate::factory::structural_transform;
use crate::transform::{Transform, TransformMeta};
use crate::types::{change_kind, Category, Change, ChangeSet, Location, Rewrite, Strategy};

struct SourceRewriter<'a, 'm> {
    allocator: &'a Allocator,
    source: &'a str,
    table: &'m HashMap<String, String>,
    changes: &'m mut ChangeSet,
}

impl<'a, 'm> SourceRewriter<'a, 'm> {
    fn rewrite(&mut self, literal: &mut StringLiteral<'a>) {
        let Some(target) = self.table.get(literal.value.as_str()) else {
            return;
        };
        let before = literal.value.to_string();
        literal.value = self.allocator.alloc_str(target).into();
        literal.raw = None;
        self.changes.record(
            Change::new(
                change_kind::IMPORT_REWRITTEN,
                format!("import source `{}` rewritten to `{}`", before, target),
            )
            .at(Location::from_offset(self.source, literal.span.start as usize))
            .with_snippets(before, target.clone()),
        );
    }
}

impl<'a, 'm> VisitMut<'a> for SourceRewriter<'a, 'm> {
    fn visit_import_declaration(&mut self, decl: &mut ImportDeclaration<'a>) {
        self.rewrite(&mut decl.source);
    }

    fn visit_export_named_declaration(&mut self, decl: &mut ExportNamedDeclaration<'a>) {
        if let Some(source) = &mut decl.source {
            self.rewrite(source);
        }
    }

    fn visit_export_all_declaration(&mut self, decl: &mut ExportAllDeclaration<'a>) {
        self.rewrite(&mut decl.source);
    }
}

/// `table` maps legacy module specifiers to their replacements.
pub fn token_utils_transform(table: &[(&str, &str)]) -> Transform {
    let table: HashMap<String, String> = table
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
    let meta = TransformMeta::new(
        "token-utils-imports",
        "Rewrite legacy color module imports to the token module",
        Category::Import,
        Strategy::Structural,
    );
    structural_transform(meta, move |cx, changes| {
        let mut rewriter = SourceRewriter {
            allocator: cx.allocator,
            source: cx.source,
            table: &table,
            changes,
        };
        rewriter.visit_program(cx.program);
        Rewrite::Applied(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformConfig;

    fn transform() -> Transform {
        token_utils_transform(&[("@/lib/colors", "@/lib/tokens")])
    }

    #[test]
    fn test_rewrites_imports_and_reexports() {
        let src = "import { blue } from \"@/lib/colors\";\nexport { red } from \"@/lib/colors\";\nimport x from \"react\";\n";
        let result = transform().apply(src, &TransformConfig::default());
        assert!(result.has_changes);
        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.changes[1].location.map(|l| l.line), Some(2));
        assert!(!result.content.contains("@/lib/colors"));
        assert!(result.content.contains("import x from \"react\""));
    }

    #[test]
    fn test_unrelated_imports_keep_formatting() {
        let src = "import   React   from 'react'\n";
        let result = transform().apply(src, &TransformConfig::default());
        assert!(!result.has_changes);
        assert_eq!(result.content, src);
    }
}
