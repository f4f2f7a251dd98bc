//! Color stage: insert the runtime color resolution into a component.
//!
//! Depends on the Structure stage having added the color parameter. The
//! expression itself comes from the Resolution Builder; this rule only
//! decides where it goes and makes sure the predicate is imported.

use oxc_allocator::{Allocator, CloneIn};
use oxc_ast::ast::{BindingPattern, ImportDeclarationSpecifier, Program, Statement};

use crate::factory::{structural_transform, StructuralContext};
use crate::resolution::{build_resolution_declaration, ResolutionProfile};
use crate::rules::{find_component, pattern_keys};
use crate::template::{self, ensure_identifier, string_literal};
use crate::transform::{Transform, TransformMeta};
use crate::types::{change_kind, Category, Change, ChangeSet, Rewrite, Strategy};

pub const RESOLVED_BINDING: &str = "resolvedColorClasses";

fn declares(statements: &[Statement], binding: &str) -> bool {
    statements.iter().any(|stmt| match stmt {
        Statement::VariableDeclaration(decl) => decl.declarations.iter().any(|d| {
            matches!(&d.id, BindingPattern::BindingIdentifier(id) if id.name.as_str() == binding)
        }),
        _ => false,
    })
}

/// Whether `local` is already imported from `module`.
fn imports_binding(program: &Program, module: &str, local: &str) -> bool {
    program.body.iter().any(|stmt| match stmt {
        Statement::ImportDeclaration(decl) if decl.source.value.as_str() == module => decl
            .specifiers
            .as_ref()
            .is_some_and(|specs| specs.iter().any(|s| s.local().name.as_str() == local)),
        _ => false,
    })
}

/// Add `import { local } from "module"`, merging into an existing named
/// import from the same module when there is one.
fn ensure_import<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
    module: &str,
    local: &str,
) -> Result<bool, String> {
    if imports_binding(program, module, local) {
        return Ok(false);
    }
    let local = ensure_identifier(local).map_err(|e| e.to_string())?;
    let import = template::statement(
        allocator,
        &format!("import {{ {} }} from {};", local, string_literal(module)),
        vec![],
    )
    .map_err(|e| e.to_string())?;

    let mergeable = program.body.iter_mut().find_map(|stmt| match stmt {
        Statement::ImportDeclaration(decl)
            if decl.source.value.as_str() == module
                && decl.specifiers.as_ref().is_some_and(|specs| {
                    !specs.is_empty()
                        && specs
                            .iter()
                            .all(|s| !matches!(s, ImportDeclarationSpecifier::ImportNamespaceSpecifier(_)))
                }) =>
        {
            decl.specifiers.as_mut()
        }
        _ => None,
    });

    if let Some(specifiers) = mergeable {
        if let Statement::ImportDeclaration(new_decl) = &import {
            if let Some(spec) = new_decl.specifiers.as_ref().and_then(|s| s.first()) {
                specifiers.push(spec.clone_in(allocator));
                return Ok(true);
            }
        }
    }

    let position = program
        .body
        .iter()
        .take_while(|stmt| matches!(stmt, Statement::ImportDeclaration(_)))
        .count();
    program.body.insert(position, import);
    Ok(true)
}

fn insert_resolution(
    cx: &mut StructuralContext,
    component_name: &str,
    profile: &ResolutionProfile,
    token_module: &str,
    changes: &mut ChangeSet,
) -> Rewrite<()> {
    let allocator = cx.allocator;
    {
        let Some(mut component) = find_component(&mut cx.program.body, component_name) else {
            changes.warn(format!("component `{}` not found", component_name));
            return Rewrite::Skip;
        };

        let has_param = component
            .first_object_param()
            .is_some_and(|obj| pattern_keys(obj).iter().any(|k| k == &profile.param));
        if !has_param {
            changes.warn(format!(
                "{} has no `{}` parameter; run the styling-params stage first",
                component_name, profile.param
            ));
            return Rewrite::Skip;
        }

        let Some(statements) = component.block_statements(allocator) else {
            return Rewrite::Failed(format!("{} has no body", component_name));
        };
        if !declares(statements, RESOLVED_BINDING) {
            let declaration = match build_resolution_declaration(allocator, RESOLVED_BINDING, profile) {
                Ok(stmt) => stmt,
                Err(e) => return Rewrite::Failed(e.to_string()),
            };
            statements.insert(0, declaration);
            changes.record(Change::new(
                change_kind::RESOLUTION_INSERTED,
                format!(
                    "inserted {:?} color resolution into {}",
                    profile.shape(),
                    component_name
                ),
            ));
        }
    }

    // Only import the predicate when this file actually uses it.
    if changes.has_edits() {
        match ensure_import(allocator, cx.program, token_module, &profile.predicate) {
            Ok(true) => changes.record(Change::new(
                change_kind::IMPORT_ADDED,
                format!("imported {} from {}", profile.predicate, token_module),
            )),
            Ok(false) => {}
            Err(reason) => return Rewrite::Failed(reason),
        }
    }
    Rewrite::Applied(())
}

pub fn color_resolution_transform(
    component_id: &str,
    component_name: &str,
    profile: ResolutionProfile,
    token_module: &str,
) -> Transform {
    let meta = TransformMeta::new(
        format!("{}-color-resolution", component_id),
        format!("Resolve {} colors through semantic tokens at runtime", component_name),
        Category::Color,
        Strategy::Structural,
    );
    let component_name = component_name.to_string();
    let token_module = token_module.to_string();
    structural_transform(meta, move |cx, changes| {
        insert_resolution(cx, &component_name, &profile, &token_module, changes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformConfig;

    fn transform(needs_color_object: bool) -> Transform {
        color_resolution_transform(
            "button",
            "Button",
            ResolutionProfile {
                needs_color_object,
                ..ResolutionProfile::default()
            },
            "@/lib/tokens",
        )
    }

    fn config() -> TransformConfig {
        TransformConfig::for_file("ui/Button.tsx")
    }

    #[test]
    fn test_inserts_declaration_and_import() {
        let src = "import { cn } from \"@/lib/utils\";\nexport function Button({ className, color }) {\n  return <button className={className} />;\n}\n";
        let result = transform(true).apply(src, &config());
        assert!(result.has_changes);
        let kinds: Vec<_> = result.changes.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, vec![change_kind::RESOLUTION_INSERTED, change_kind::IMPORT_ADDED]);
        assert!(result.content.contains("import { isSemanticToken } from \"@/lib/tokens\";"));
        assert!(result
            .content
            .contains("const resolvedColorClasses = isSemanticToken(color) ?"));
        let import_at = result.content.find("isSemanticToken }").unwrap();
        let utils_at = result.content.find("@/lib/utils").unwrap();
        assert!(utils_at < import_at);
    }

    #[test]
    fn test_merges_into_existing_token_import() {
        let src = "import { tokens } from \"@/lib/tokens\";\nconst Button = ({ color }) => <b>{color}</b>;\n";
        let result = transform(false).apply(src, &config());
        assert!(result.content.contains("import { tokens, isSemanticToken } from \"@/lib/tokens\";"));
        assert!(result.content.contains("return <b>{color}</b>;"));
    }

    #[test]
    fn test_missing_color_param_skips_with_warning() {
        let src = "export function Button({ className }) { return null; }";
        let result = transform(true).apply(src, &config());
        assert!(!result.has_changes);
        assert_eq!(result.content, src);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_already_resolved_is_unchanged() {
        let src = "import { isSemanticToken } from \"@/lib/tokens\";\nexport function Button({ color }) {\n  const resolvedColorClasses = isSemanticToken(color) ? `bg-${color}` : \"\";\n  return null;\n}\n";
        let result = transform(false).apply(src, &config());
        assert!(!result.has_changes);
        assert_eq!(result.content, src);
    }
}
