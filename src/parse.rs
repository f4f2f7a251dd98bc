//! Parse Module
//!
//! Chooses the source dialect for a file and runs the oxc parser over it.
//! Parser diagnostics are turned into a structured `ParseIssue` here and
//! nowhere else.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::fmt;
use std::path::Path;

use crate::types::TransformConfig;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE DIALECT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDialect {
    Tsx,
    TypeScript,
    Jsx,
}

impl SourceDialect {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("mts") | Some("cts") => SourceDialect::TypeScript,
            Some("jsx") | Some("js") | Some("mjs") | Some("cjs") => SourceDialect::Jsx,
            _ => SourceDialect::Tsx,
        }
    }

    pub fn for_config(config: &TransformConfig) -> Self {
        config
            .file_path
            .as_deref()
            .map(SourceDialect::from_path)
            .unwrap_or(SourceDialect::Tsx)
    }

    pub fn source_type(self) -> SourceType {
        let (typescript, jsx) = match self {
            SourceDialect::Tsx => (true, true),
            SourceDialect::TypeScript => (true, false),
            SourceDialect::Jsx => (false, true),
        };
        SourceType::default()
            .with_module(true)
            .with_typescript(typescript)
            .with_jsx(jsx)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSE ISSUES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseIssueKind {
    /// A rest element/parameter that is not last. Harmless for our rewrites:
    /// the file is left alone and nothing is reported.
    RestElementOrder,
    Syntax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub kind: ParseIssueKind,
    pub message: String,
}

impl ParseIssue {
    pub fn is_benign(&self) -> bool {
        self.kind == ParseIssueKind::RestElementOrder
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

lazy_static! {
    // Wording differs between parsers; keep every known phrasing here.
    static ref REST_ORDER_MESSAGES: Vec<&'static str> = vec![
        "rest element must be last element",
        "a rest parameter must be last in a parameter list",
        "rest parameter must be last formal parameter",
        "a rest element must be last in a destructuring pattern",
        "spread element must be the last element",
    ];
}

/// Classify one diagnostic message.
pub fn classify_message(message: &str) -> ParseIssueKind {
    let lower = message.to_lowercase();
    if REST_ORDER_MESSAGES.iter().any(|m| lower.contains(m)) {
        ParseIssueKind::RestElementOrder
    } else {
        ParseIssueKind::Syntax
    }
}

/// Fold a batch of diagnostics into one issue. The batch is benign only if
/// every message in it is.
pub fn issue_from_messages(messages: &[String]) -> ParseIssue {
    let all_benign = !messages.is_empty()
        && messages
            .iter()
            .all(|m| classify_message(m) == ParseIssueKind::RestElementOrder);
    ParseIssue {
        kind: if all_benign {
            ParseIssueKind::RestElementOrder
        } else {
            ParseIssueKind::Syntax
        },
        message: messages.join("; "),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a whole file. Any diagnostic makes the file unsafe to re-emit, so
/// the program is only returned when the parse was clean.
pub fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    dialect: SourceDialect,
) -> Result<Program<'a>, ParseIssue> {
    let ret = Parser::new(allocator, source, dialect.source_type()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let mut messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        if messages.is_empty() {
            messages.push("parser aborted".to_string());
        }
        return Err(issue_from_messages(&messages));
    }
    Ok(ret.program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(SourceDialect::from_path(Path::new("a/Button.tsx")), SourceDialect::Tsx);
        assert_eq!(SourceDialect::from_path(Path::new("a/util.ts")), SourceDialect::TypeScript);
        assert_eq!(SourceDialect::from_path(Path::new("a/Card.jsx")), SourceDialect::Jsx);
        assert_eq!(SourceDialect::from_path(Path::new("README")), SourceDialect::Tsx);
    }

    #[test]
    fn test_parse_tsx_component() {
        let allocator = Allocator::default();
        let src = "export function Button({ label }: { label: string }) { return <button>{label}</button>; }";
        let program = parse_program(&allocator, src, SourceDialect::Tsx).unwrap();
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn test_parse_error_is_syntax() {
        let allocator = Allocator::default();
        let issue = parse_program(&allocator, "const = ;", SourceDialect::Tsx).unwrap_err();
        assert_eq!(issue.kind, ParseIssueKind::Syntax);
        assert!(!issue.is_benign());
    }

    #[test]
    fn test_classify_rest_order_messages() {
        assert_eq!(
            classify_message("Rest element must be last element"),
            ParseIssueKind::RestElementOrder
        );
        assert_eq!(
            classify_message("A rest parameter must be last in a parameter list"),
            ParseIssueKind::RestElementOrder
        );
        assert_eq!(classify_message("Unexpected token"), ParseIssueKind::Syntax);
    }

    #[test]
    fn test_mixed_batch_is_not_benign() {
        let issue = issue_from_messages(&[
            "Rest element must be last element".to_string(),
            "Unexpected token".to_string(),
        ]);
        assert_eq!(issue.kind, ParseIssueKind::Syntax);
    }
}
