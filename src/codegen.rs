//! Codegen helpers
//!
//! Re-emission of mutated trees through `oxc_codegen`. Structural
//! transforms print whole programs; standalone nodes (template output,
//! resolution expressions) are printed by wrapping them in a throwaway
//! program, the same way imports are printed one at a time.

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, Program, Statement};
use oxc_ast::AstBuilder;
use oxc_codegen::Codegen;
use oxc_span::SPAN;

use crate::parse::SourceDialect;

pub fn print_program(program: &Program) -> String {
    Codegen::new().build(program).code
}

/// Print a single statement, trailing newline trimmed.
pub fn print_statement<'a>(allocator: &'a Allocator, stmt: Statement<'a>) -> String {
    let ast = AstBuilder::new(allocator);
    let program = Program {
        span: SPAN,
        source_type: SourceDialect::Tsx.source_type(),
        hashbang: None,
        directives: ast.vec(),
        body: {
            let mut b = ast.vec();
            b.push(stmt);
            b
        },
        source_text: "",
        comments: ast.vec(),
        scope_id: std::cell::Cell::new(None),
    };
    print_program(&program).trim().to_string()
}

/// Print a single expression without the statement terminator.
pub fn print_expression<'a>(allocator: &'a Allocator, expr: Expression<'a>) -> String {
    let ast = AstBuilder::new(allocator);
    let stmt = ast.statement_expression(SPAN, expr);
    print_statement(allocator, stmt)
        .trim_end_matches(';')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_program;

    #[test]
    fn test_print_program_round_trips_jsx() {
        let allocator = Allocator::default();
        let src = "const a = <div className=\"x\" />;";
        let program = parse_program(&allocator, src, SourceDialect::Tsx).unwrap();
        let out = print_program(&program);
        assert!(out.contains("<div className=\"x\" />"));
    }

    #[test]
    fn test_print_expression_strips_semicolon() {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);
        let expr = ast.expression_identifier(SPAN, "color");
        assert_eq!(print_expression(&allocator, expr), "color");
    }
}
