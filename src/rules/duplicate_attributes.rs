//! Edge-case stage: drop duplicated JSX attributes, keeping the last one.
//!
//! Hybrid rule: the parser supplies attribute spans, the edit itself is a
//! text splice so the rest of the file keeps its formatting.

use oxc_allocator::Allocator;
use oxc_ast::ast::{JSXAttributeItem, JSXAttributeName, JSXOpeningElement};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;
use std::ops::Range;

use crate::factory::pattern_transform;
use crate::parse::{parse_program, SourceDialect};
use crate::protect::{ProtectedRegions, ProtectionRules};
use crate::transform::{Transform, TransformMeta};
use crate::types::{change_kind, Category, Change, ChangeSet, Location, Rewrite, Strategy};

#[derive(Debug)]
struct AttributeSlot {
    span: Range<usize>,
    key: String,
}

/// Attribute keys per opening element, in source order.
struct AttributeCollector<'s> {
    source: &'s str,
    elements: Vec<(Range<usize>, Vec<AttributeSlot>)>,
}

impl<'a, 's> Visit<'a> for AttributeCollector<'s> {
    fn visit_jsx_opening_element(&mut self, element: &JSXOpeningElement<'a>) {
        let slots = element
            .attributes
            .iter()
            .map(|item| {
                let span = item.span();
                let key = match item {
                    JSXAttributeItem::Attribute(attr) => match &attr.name {
                        JSXAttributeName::Identifier(id) => format!("attr:{}", id.name),
                        JSXAttributeName::NamespacedName(ns) => {
                            format!("attr:{}:{}", ns.namespace.name, ns.name.name)
                        }
                    },
                    JSXAttributeItem::SpreadAttribute(spread) => {
                        let arg = spread.argument.span();
                        format!("spread:{}", &self.source[arg.start as usize..arg.end as usize])
                    }
                };
                AttributeSlot {
                    span: span.start as usize..span.end as usize,
                    key,
                }
            })
            .collect();
        let span = element.span;
        self.elements.push((span.start as usize..span.end as usize, slots));
        walk::walk_jsx_opening_element(self, element);
    }
}

struct Removal {
    range: Range<usize>,
    attribute: Range<usize>,
}

/// Earlier duplicates of each element's attributes. A removed range runs up
/// to the next attribute so the separating whitespace goes with it.
fn removals(elements: &[(Range<usize>, Vec<AttributeSlot>)], protected: &ProtectedRegions) -> Vec<Removal> {
    let mut found = Vec::new();
    for (element, slots) in elements {
        if protected.overlaps(element) {
            continue;
        }
        for (i, slot) in slots.iter().enumerate() {
            if slots[i + 1..].iter().any(|later| later.key == slot.key) {
                found.push(Removal {
                    range: slot.span.start..slots[i + 1].span.start,
                    attribute: slot.span.clone(),
                });
            }
        }
    }

    found.sort_by_key(|r| r.range.start);
    // An attribute holding a nested element may be removed as a whole.
    let mut accepted: Vec<Removal> = Vec::new();
    for removal in found {
        if accepted.last().is_some_and(|last| removal.range.start < last.range.end) {
            continue;
        }
        accepted.push(removal);
    }
    accepted
}

fn dedupe(source: &str, dialect: SourceDialect, changes: &mut ChangeSet) -> Rewrite<String> {
    let allocator = Allocator::default();
    let program = match parse_program(&allocator, source, dialect) {
        Ok(program) => program,
        Err(issue) if issue.is_benign() => return Rewrite::Skip,
        Err(issue) => return Rewrite::Failed(issue.to_string()),
    };

    let mut collector = AttributeCollector {
        source,
        elements: Vec::new(),
    };
    collector.visit_program(&program);

    let protected = ProtectionRules {
        style_objects: false,
        css_variables: false,
        template_holes: false,
        ignore_markers: true,
    }
    .ranges(source);

    let removals = removals(&collector.elements, &protected);
    if removals.is_empty() {
        return Rewrite::Applied(source.to_string());
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for removal in &removals {
        let attribute = &source[removal.attribute.clone()];
        changes.record(
            Change::new(
                change_kind::DUPLICATE_REMOVED,
                format!("removed duplicate attribute `{}`", attribute),
            )
            .at(Location::from_offset(source, removal.range.start))
            .with_snippets(attribute, ""),
        );
        out.push_str(&source[cursor..removal.range.start]);
        cursor = removal.range.end;
    }
    out.push_str(&source[cursor..]);
    Rewrite::Applied(out)
}

pub fn duplicate_attributes_transform() -> Transform {
    pattern_transform(
        TransformMeta::new(
            "duplicate-attributes",
            "Remove duplicated JSX attributes and spreads, keeping the last",
            Category::EdgeCase,
            Strategy::Hybrid,
        ),
        |source, config, changes| dedupe(source, SourceDialect::for_config(config), changes),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformConfig;

    fn run(src: &str) -> crate::types::TransformResult {
        duplicate_attributes_transform().apply(src, &TransformConfig::for_file("ui/Box.tsx"))
    }

    #[test]
    fn test_duplicate_spread_keeps_last() {
        let result = run(r#"<div {...props} className="x" {...props} />"#);
        assert!(result.has_changes);
        assert_eq!(result.content, r#"<div className="x" {...props} />"#);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].kind, change_kind::DUPLICATE_REMOVED);
    }

    #[test]
    fn test_duplicate_named_attribute() {
        let result = run("const a = <a href=\"/x\" id=\"a\" href=\"/y\" />;\n");
        assert_eq!(result.content, "const a = <a id=\"a\" href=\"/y\" />;\n");
        assert_eq!(result.changes.len(), 1);
    }

    #[test]
    fn test_distinct_spreads_are_kept() {
        let src = "const a = <a {...one} {...two} />;";
        let result = run(src);
        assert!(!result.has_changes);
        assert_eq!(result.content, src);
    }

    #[test]
    fn test_ignored_region_is_untouched() {
        let src = "// codemod-ignore-start\nconst a = <a {...p} {...p} />;\n// codemod-ignore-end\n";
        let result = run(src);
        assert!(!result.has_changes);
        assert_eq!(result.content, src);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let result = run("<div {...props} ");
        assert!(!result.has_changes);
        assert_eq!(result.error_changes().count(), 1);
    }
}
