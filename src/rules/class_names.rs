//! Cleanup stage: tidy static class lists.

use lazy_static::lazy_static;
use regex::Regex;

use crate::factory::pattern_transform;
use crate::protect::ProtectionRules;
use crate::transform::{Transform, TransformMeta};
use crate::types::{change_kind, Category, Change, ChangeSet, Location, Rewrite, Strategy};

lazy_static! {
    static ref CLASS_ATTR_RE: Regex = Regex::new(
        r#"\b(?:className|class)\s*=\s*\{?\s*(?:"(?P<dq>[^"\n]*)"|'(?P<sq>[^'\n]*)')"#
    )
    .unwrap();
}

/// Collapse whitespace and drop repeated tokens, first occurrence kept.
pub fn normalize_class_list(classes: &str) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for token in classes.split_whitespace() {
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen.join(" ")
}

fn tidy(source: &str, changes: &mut ChangeSet) -> Rewrite<String> {
    let protected = ProtectionRules {
        style_objects: false,
        css_variables: false,
        template_holes: true,
        ignore_markers: true,
    }
    .ranges(source);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for caps in CLASS_ATTR_RE.captures_iter(source) {
        let Some(list) = caps.name("dq").or_else(|| caps.name("sq")) else {
            continue;
        };
        if protected.overlaps(&list.range()) {
            continue;
        }
        let normalized = normalize_class_list(list.as_str());
        if normalized == list.as_str() {
            continue;
        }
        changes.record(
            Change::new(change_kind::CLASS_NAMES_NORMALIZED, "normalized class list")
                .at(Location::from_offset(source, list.start()))
                .with_snippets(list.as_str(), normalized.clone()),
        );
        out.push_str(&source[cursor..list.start()]);
        out.push_str(&normalized);
        cursor = list.end();
    }
    out.push_str(&source[cursor..]);
    Rewrite::Applied(out)
}

pub fn class_names_transform() -> Transform {
    pattern_transform(
        TransformMeta::new(
            "class-names",
            "Collapse whitespace and remove repeated classes in static class lists",
            Category::Quality,
            Strategy::Pattern,
        ),
        |source, _config, changes| tidy(source, changes),
    )
}
