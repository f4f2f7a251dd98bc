//! Code templates
//!
//! Small snippets of source parsed straight into the caller's arena. A
//! template may name placeholder identifiers (`__TEST__`); each one is
//! replaced by a caller-supplied expression node, so the result is always
//! a tree node that composes with later structural rewrites.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, Statement};
use oxc_ast_visit::walk_mut::walk_expression;
use oxc_ast_visit::VisitMut;
use oxc_parser::Parser;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

use crate::parse::SourceDialect;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template `{template}` failed to parse: {message}")]
    Parse { template: String, message: String },
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),
    #[error("placeholder `{0}` does not occur in the template")]
    UnusedPlaceholder(String),
}

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

pub fn ensure_identifier(name: &str) -> Result<&str, TemplateError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(name)
    } else {
        Err(TemplateError::InvalidIdentifier(name.to_string()))
    }
}

/// Quote a value as a JS string literal.
pub fn string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLACEHOLDER FILLING
// ═══════════════════════════════════════════════════════════════════════════════

struct PlaceholderFiller<'a> {
    slots: HashMap<String, Expression<'a>>,
}

impl<'a> PlaceholderFiller<'a> {
    fn new(slots: Vec<(&str, Expression<'a>)>) -> Self {
        PlaceholderFiller {
            slots: slots
                .into_iter()
                .map(|(name, expr)| (name.to_string(), expr))
                .collect(),
        }
    }

    fn finish(self) -> Result<(), TemplateError> {
        match self.slots.into_keys().next() {
            Some(name) => Err(TemplateError::UnusedPlaceholder(name)),
            None => Ok(()),
        }
    }
}

impl<'a> VisitMut<'a> for PlaceholderFiller<'a> {
    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        if let Expression::Identifier(id) = expr {
            if let Some(replacement) = self.slots.remove(id.name.as_str()) {
                *expr = replacement;
                return;
            }
        }
        walk_expression(self, expr);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse `text` as a single expression and fill its placeholders.
pub fn expression<'a>(
    allocator: &'a Allocator,
    text: &str,
    slots: Vec<(&str, Expression<'a>)>,
) -> Result<Expression<'a>, TemplateError> {
    let source: &'a str = allocator.alloc_str(text);
    let mut expr = Parser::new(allocator, source, SourceDialect::Tsx.source_type())
        .parse_expression()
        .map_err(|errors| TemplateError::Parse {
            template: text.to_string(),
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })?;

    let mut filler = PlaceholderFiller::new(slots);
    filler.visit_expression(&mut expr);
    filler.finish()?;
    Ok(expr)
}

/// Parse `text` as module-level statements and fill their placeholders.
pub fn statements<'a>(
    allocator: &'a Allocator,
    text: &str,
    slots: Vec<(&str, Expression<'a>)>,
) -> Result<Vec<Statement<'a>>, TemplateError> {
    let source: &'a str = allocator.alloc_str(text);
    let ret = Parser::new(allocator, source, SourceDialect::Tsx.source_type()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(TemplateError::Parse {
            template: text.to_string(),
            message: ret
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        });
    }

    let mut program = ret.program;
    let mut filler = PlaceholderFiller::new(slots);
    filler.visit_program(&mut program);
    filler.finish()?;
    Ok(program.body.into_iter().collect())
}

/// Like `statements`, for templates that must yield exactly one statement.
pub fn statement<'a>(
    allocator: &'a Allocator,
    text: &str,
    slots: Vec<(&str, Expression<'a>)>,
) -> Result<Statement<'a>, TemplateError> {
    let mut stmts = statements(allocator, text, slots)?;
    if stmts.len() != 1 {
        return Err(TemplateError::Parse {
            template: text.to_string(),
            message: format!("expected one statement, found {}", stmts.len()),
        });
    }
    Ok(stmts.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::print_expression;
    use oxc_ast::AstBuilder;
    use oxc_span::SPAN;

    #[test]
    fn test_expression_placeholder_is_filled() {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);
        let value = ast.expression_string_literal(SPAN, "bg-primary", None);
        let expr = expression(&allocator, "flag ? __VALUE__ : null", vec![("__VALUE__", value)])
            .unwrap();
        let code = print_expression(&allocator, expr);
        assert!(code.contains("\"bg-primary\""));
        assert!(!code.contains("__VALUE__"));
    }

    #[test]
    fn test_unused_placeholder_is_an_error() {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);
        let value = ast.expression_identifier(SPAN, "x");
        let err = expression(&allocator, "a + b", vec![("__MISSING__", value)]).unwrap_err();
        assert_eq!(err, TemplateError::UnusedPlaceholder("__MISSING__".to_string()));
    }

    #[test]
    fn test_statement_template() {
        let allocator = Allocator::default();
        let stmt = statement(&allocator, "import { a } from \"b\";", vec![]).unwrap();
        assert!(matches!(stmt, Statement::ImportDeclaration(_)));
        assert!(statement(&allocator, "a; b;", vec![]).is_err());
    }

    #[test]
    fn test_identifier_validation() {
        assert!(ensure_identifier("colorClasses").is_ok());
        assert!(ensure_identifier("$el").is_ok());
        assert!(ensure_identifier("bad-name").is_err());
        assert!(ensure_identifier("").is_err());
    }

    #[test]
    fn test_string_literal_quotes() {
        assert_eq!(string_literal("default"), "\"default\"");
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
    }
}
