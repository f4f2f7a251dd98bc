//! Protected substitution
//!
//! Token-wise search-and-replace over class-like text that refuses to touch
//! anything already expressed in the output vocabulary, or anything inside
//! a protected region. Every substitution in a table is matched against the
//! original text in a single scan, so mappings never chain within one run.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

use crate::types::{change_kind, Change, ChangeSet, Location};

// ═══════════════════════════════════════════════════════════════════════════════
// SUBSTITUTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct Substitution {
    matcher: Matcher,
    replacement: String,
}

impl Substitution {
    pub fn literal(from: &str, to: &str) -> Self {
        Substitution {
            matcher: Matcher::Literal(from.to_string()),
            replacement: to.to_string(),
        }
    }

    /// `to` may reference capture groups (`$1`, `${name}`).
    pub fn pattern(pattern: &str, to: &str) -> Result<Self, regex::Error> {
        Ok(Substitution {
            matcher: Matcher::Pattern(Regex::new(pattern)?),
            replacement: to.to_string(),
        })
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    fn is_literal(&self) -> bool {
        matches!(self.matcher, Matcher::Literal(_))
    }

    /// Every raw occurrence with its expanded replacement.
    fn occurrences(&self, source: &str) -> Vec<(Range<usize>, String)> {
        match &self.matcher {
            Matcher::Literal(from) if from.is_empty() => Vec::new(),
            Matcher::Literal(from) => source
                .match_indices(from.as_str())
                .map(|(i, m)| (i..i + m.len(), self.replacement.clone()))
                .collect(),
            Matcher::Pattern(re) => re
                .captures_iter(source)
                .filter_map(|caps| {
                    let m = caps.get(0)?;
                    let mut replacement = String::new();
                    caps.expand(&self.replacement, &mut replacement);
                    Some((m.range(), replacement))
                })
                .collect(),
        }
    }
}

fn is_class_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.' | '[' | ']' | '#' | '%' | '!' | ':')
}

/// A match must cover a whole class segment. A variant prefix (`hover:`)
/// in front of it is fine.
fn on_token_boundary(source: &str, range: &Range<usize>) -> bool {
    let before_ok = match source[..range.start].chars().next_back() {
        None => true,
        Some(':') => true,
        Some(c) => !is_class_char(c),
    };
    let after_ok = match source[range.end..].chars().next() {
        None => true,
        Some(c) => !is_class_char(c),
    };
    before_ok && after_ok
}

/// The whole class token around a match, variant prefixes stripped.
fn enclosing_token_base<'s>(source: &'s str, range: &Range<usize>) -> &'s str {
    let start = source[..range.start]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_class_char(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(range.start);
    let end = source[range.end..]
        .char_indices()
        .find(|(_, c)| !is_class_char(*c))
        .map(|(i, _)| range.end + i)
        .unwrap_or(source.len());
    let token = &source[start..end];
    token.rsplit(':').next().unwrap_or(token)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROTECTED REGIONS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref STYLE_OBJECT_RE: Regex = Regex::new(r"style\s*=\s*\{\{").unwrap();
    static ref CSS_VAR_RE: Regex = Regex::new(r"\bvar\(").unwrap();
    static ref TEMPLATE_HOLE_RE: Regex = Regex::new(r"\$\{").unwrap();
    static ref IGNORE_BLOCK_RE: Regex =
        Regex::new(r"(?s)codemod-ignore-start.*?(codemod-ignore-end|\z)").unwrap();
}

/// Index of the bracket closing the one at `open_idx`, skipping string
/// contents.
pub(crate) fn find_balanced(source: &str, open_idx: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = source.as_bytes();
    if bytes.get(open_idx)? != &open {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut i = open_idx;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(quote) = in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
        } else if c == b'"' || c == b'\'' {
            in_string = Some(c);
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Which kinds of region are off limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionRules {
    pub style_objects: bool,
    pub css_variables: bool,
    pub template_holes: bool,
    pub ignore_markers: bool,
}

impl Default for ProtectionRules {
    fn default() -> Self {
        ProtectionRules {
            style_objects: true,
            css_variables: true,
            template_holes: true,
            ignore_markers: true,
        }
    }
}

impl ProtectionRules {
    pub fn ranges(&self, source: &str) -> ProtectedRegions {
        let mut ranges = Vec::new();

        if self.style_objects {
            for m in STYLE_OBJECT_RE.find_iter(source) {
                // The outer brace of `{{`.
                let open = m.end() - 2;
                let end = find_balanced(source, open, b'{', b'}').unwrap_or(source.len() - 1);
                ranges.push(m.start()..end + 1);
            }
        }
        if self.css_variables {
            for m in CSS_VAR_RE.find_iter(source) {
                let open = m.end() - 1;
                let end = find_balanced(source, open, b'(', b')').unwrap_or(source.len() - 1);
                ranges.push(m.start()..end + 1);
            }
        }
        if self.template_holes {
            for m in TEMPLATE_HOLE_RE.find_iter(source) {
                let open = m.end() - 1;
                let end = find_balanced(source, open, b'{', b'}').unwrap_or(source.len() - 1);
                ranges.push(m.start()..end + 1);
            }
        }
        if self.ignore_markers {
            for m in IGNORE_BLOCK_RE.find_iter(source) {
                ranges.push(m.range());
            }
        }

        ProtectedRegions { ranges }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtectedRegions {
    ranges: Vec<Range<usize>>,
}

impl ProtectedRegions {
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.ranges
            .iter()
            .any(|r| r.start < range.end && range.start < r.end)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUBSTITUTION TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    substitutions: Vec<Substitution>,
    vocabulary: HashSet<String>,
    rules: ProtectionRules,
}

struct Candidate {
    range: Range<usize>,
    replacement: String,
}

impl SubstitutionTable {
    /// Literal replacement values join the output vocabulary automatically.
    pub fn new(substitutions: Vec<Substitution>) -> Self {
        let vocabulary = substitutions
            .iter()
            .filter(|s| s.is_literal())
            .flat_map(|s| s.replacement.split_whitespace().map(str::to_string))
            .collect();
        SubstitutionTable {
            substitutions,
            vocabulary,
            rules: ProtectionRules::default(),
        }
    }

    pub fn with_vocabulary<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn with_rules(mut self, rules: ProtectionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn vocabulary(&self) -> &HashSet<String> {
        &self.vocabulary
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    fn candidates(&self, source: &str) -> Vec<Candidate> {
        let protected = self.rules.ranges(source);
        let mut found: Vec<(usize, Candidate)> = Vec::new();

        for (order, sub) in self.substitutions.iter().enumerate() {
            for (range, replacement) in sub.occurrences(source) {
                if range.is_empty() || !on_token_boundary(source, &range) {
                    continue;
                }
                if protected.overlaps(&range) {
                    continue;
                }
                if self.vocabulary.contains(enclosing_token_base(source, &range)) {
                    continue;
                }
                if replacement == source[range.clone()] {
                    continue;
                }
                found.push((order, Candidate { range, replacement }));
            }
        }

        // Earliest start wins; ties go to the table's order.
        found.sort_by(|a, b| a.1.range.start.cmp(&b.1.range.start).then(a.0.cmp(&b.0)));
        let mut accepted: Vec<Candidate> = Vec::new();
        for (_, candidate) in found {
            if let Some(last) = accepted.last() {
                if candidate.range.start < last.range.end {
                    continue;
                }
            }
            accepted.push(candidate);
        }
        accepted
    }

    /// Rewrite `source`, recording one change per replaced occurrence.
    pub fn apply(&self, source: &str, changes: &mut ChangeSet) -> String {
        let candidates = self.candidates(source);
        if candidates.is_empty() {
            return source.to_string();
        }

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for candidate in candidates {
            let before = &source[candidate.range.clone()];
            changes.record(
                Change::new(
                    change_kind::COLOR_MAPPED,
                    format!("mapped `{}` to `{}`", before, candidate.replacement),
                )
                .at(Location::from_offset(source, candidate.range.start))
                .with_snippets(before, candidate.replacement.clone()),
            );
            out.push_str(&source[cursor..candidate.range.start]);
            out.push_str(&candidate.replacement);
            cursor = candidate.range.end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SubstitutionTable {
        SubstitutionTable::new(vec![
            Substitution::literal("bg-blue-500", "bg-primary"),
            Substitution::literal("text-white", "text-primary-foreground"),
            Substitution::literal("bg-primary", "bg-brand"),
        ])
    }

    fn run(table: &SubstitutionTable, src: &str) -> (String, ChangeSet) {
        let mut changes = ChangeSet::new();
        let out = table.apply(src, &mut changes);
        (out, changes)
    }

    #[test]
    fn test_maps_whole_tokens_and_keeps_variants() {
        let (out, changes) = run(&table(), r#"<b className="bg-blue-500 hover:text-white" />"#);
        assert_eq!(out, r#"<b className="bg-primary hover:text-primary-foreground" />"#);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.changes()[0].before.as_deref(), Some("bg-blue-500"));
    }

    #[test]
    fn test_partial_tokens_are_not_matched() {
        let (out, changes) = run(&table(), r#"<b className="bg-blue-5000 xtext-white" />"#);
        assert_eq!(changes.len(), 0);
        assert_eq!(out, r#"<b className="bg-blue-5000 xtext-white" />"#);
    }

    #[test]
    fn test_vocabulary_blocks_chained_mappings() {
        // bg-primary is both an output and an input; the output wins.
        let (out, _) = run(&table(), r#"<b className="bg-blue-500" />"#);
        assert_eq!(out, r#"<b className="bg-primary" />"#);
        let (again, changes) = run(&table(), &out);
        assert_eq!(again, out);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_protected_regions_are_skipped() {
        let src = concat!(
            "<b style={{ background: \"bg-blue-500\" }} className=\"bg-blue-500\" />\n",
            "const v = \"var(--text-white)\";\n",
            "const t = `${\"text-white\"}`;\n",
            "// codemod-ignore-start\nconst keep = \"bg-blue-500\";\n// codemod-ignore-end\n",
        );
        let (out, changes) = run(&table(), src);
        assert_eq!(changes.len(), 1);
        assert!(out.contains("style={{ background: \"bg-blue-500\" }}"));
        assert!(out.contains("className=\"bg-primary\""));
        assert!(out.contains("var(--text-white)"));
        assert!(out.contains("const keep = \"bg-blue-500\""));
    }

    #[test]
    fn test_pattern_substitution_with_captures() {
        let table = SubstitutionTable::new(vec![
            Substitution::pattern(r"border-gray-(\d00)", "border-muted-$1").unwrap(),
        ]);
        let (out, changes) = run(&table, r#"<i className="border-gray-200" />"#);
        assert_eq!(out, r#"<i className="border-muted-200" />"#);
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_enclosing_token_strips_variant_prefix() {
        let src = r#"className="md:hover:bg-primary/90 px-2""#;
        let start = src.find("bg-primary").unwrap();
        let base = enclosing_token_base(src, &(start..start + "bg-primary".len()));
        assert_eq!(base, "bg-primary/90");

        // The returned slice borrows from the source, not the range.
        let owned = String::from("focus:text-white");
        let base = {
            let range = 6..16;
            enclosing_token_base(&owned, &range)
        };
        assert_eq!(base, "text-white");
    }

    #[test]
    fn test_variant_token_in_vocabulary_is_skipped() {
        let src = r#"<b className="hover:bg-primary" />"#;
        let (out, changes) = run(&table(), src);
        assert_eq!(out, src);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_find_balanced_skips_strings() {
        let src = r#"{ a: "}" , b: { c: 1 } }"#;
        assert_eq!(find_balanced(src, 0, b'{', b'}'), Some(src.len() - 1));
    }
}
