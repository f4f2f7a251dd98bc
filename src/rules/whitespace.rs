//! Formatting stage: trailing whitespace and final newline.

use crate::factory::pattern_transform;
use crate::transform::{Transform, TransformMeta};
use crate::types::{change_kind, Category, Change, ChangeSet, Rewrite, Strategy};

/// Line terminator used by `source`, judged by its first line break.
fn line_ending(source: &str) -> &'static str {
    match source.find('\n') {
        Some(i) if source[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn normalize(source: &str, changes: &mut ChangeSet) -> Rewrite<String> {
    if source.trim().is_empty() {
        return Rewrite::Skip;
    }
    let eol = line_ending(source);

    let mut trimmed_lines = 0;
    let mut lines: Vec<&str> = source
        .split('\n')
        .map(|raw| {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() != line.len() {
                trimmed_lines += 1;
            }
            trimmed
        })
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let mut out = lines.join(eol);
    out.push_str(eol);

    if out != source {
        let description = if trimmed_lines > 0 {
            format!("trimmed trailing whitespace on {} line(s)", trimmed_lines)
        } else {
            "normalized final newline".to_string()
        };
        changes.record(Change::new(change_kind::WHITESPACE_NORMALIZED, description));
    }
    Rewrite::Applied(out)
}

pub fn whitespace_transform() -> Transform {
    pattern_transform(
        TransformMeta::new(
            "whitespace",
            "Strip trailing whitespace and end files with one newline",
            Category::Formatting,
            Strategy::Pattern,
        ),
        |source, _config, changes| normalize(source, changes),
    )
}
