//! Resolution Builder
//!
//! Synthesizes the runtime expression that picks a component's color
//! classes: semantic tokens get generated classes, legacy color names go
//! through the component's lookup object. The shape is chosen from a fixed
//! decision table; the output is always a tree node in the caller's arena.
//!
//! | needs color object | needs multi statement | shape          |
//! |--------------------|-----------------------|----------------|
//! | true               | true                  | IIFE           |
//! | true               | false                 | lookup ternary |
//! | false              | any                   | empty ternary  |

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, Statement};
use oxc_ast::AstBuilder;
use oxc_span::SPAN;
use serde::{Deserialize, Serialize};

use crate::template::{self, ensure_identifier, string_literal, TemplateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionShape {
    Iife,
    LookupTernary,
    EmptyTernary,
}

impl ResolutionShape {
    pub fn select(needs_color_object: bool, needs_multi_statement: bool) -> Self {
        match (needs_color_object, needs_multi_statement) {
            (true, true) => ResolutionShape::Iife,
            (true, false) => ResolutionShape::LookupTernary,
            // Without a lookup object there is nothing to evaluate in
            // several statements.
            (false, _) => ResolutionShape::EmptyTernary,
        }
    }
}

/// Per-component inputs to the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionProfile {
    pub needs_color_object: bool,
    pub needs_multi_statement: bool,
    /// Parameter carrying the caller's color.
    pub param: String,
    pub predicate: String,
    pub lookup_object: String,
    pub default_key: String,
    /// Class list with `{token}` standing for the color value.
    pub class_template: String,
}

impl Default for ResolutionProfile {
    fn default() -> Self {
        ResolutionProfile {
            needs_color_object: false,
            needs_multi_statement: false,
            param: "color".to_string(),
            predicate: "isSemanticToken".to_string(),
            lookup_object: "colorClasses".to_string(),
            default_key: "default".to_string(),
            class_template: "bg-{token} text-{token}-foreground".to_string(),
        }
    }
}

impl ResolutionProfile {
    pub fn shape(&self) -> ResolutionShape {
        ResolutionShape::select(self.needs_color_object, self.needs_multi_statement)
    }
}

/// Turn `bg-{token}` into the template literal `` `bg-${color}` ``.
fn class_template_literal(class_template: &str, param: &str) -> String {
    let escaped = class_template
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${");
    format!("`{}`", escaped.replace("{token}", &format!("${{{}}}", param)))
}

pub fn build_resolution<'a>(
    allocator: &'a Allocator,
    profile: &ResolutionProfile,
) -> Result<Expression<'a>, TemplateError> {
    let param = ensure_identifier(&profile.param)?;
    let predicate = ensure_identifier(&profile.predicate)?;

    let test = template::expression(allocator, &format!("{}({})", predicate, param), vec![])?;
    let synthesized = template::expression(
        allocator,
        &class_template_literal(&profile.class_template, param),
        vec![],
    )?;

    let shape = profile.shape();
    let fallback = match shape {
        ResolutionShape::EmptyTernary => AstBuilder::new(allocator).expression_string_literal(SPAN, "", None),
        ResolutionShape::Iife | ResolutionShape::LookupTernary => {
            let object = ensure_identifier(&profile.lookup_object)?;
            template::expression(
                allocator,
                &format!(
                    "{obj}[{param}] ?? {obj}[{key}]",
                    obj = object,
                    param = param,
                    key = string_literal(&profile.default_key)
                ),
                vec![],
            )?
        }
    };

    match shape {
        ResolutionShape::Iife => template::expression(
            allocator,
            "(() => { if (__TEST__) { return __SYNTH__; } return __FALLBACK__; })()",
            vec![
                ("__TEST__", test),
                ("__SYNTH__", synthesized),
                ("__FALLBACK__", fallback),
            ],
        ),
        ResolutionShape::LookupTernary | ResolutionShape::EmptyTernary => {
            Ok(AstBuilder::new(allocator).expression_conditional(SPAN, test, synthesized, fallback))
        }
    }
}

/// `const <binding> = <resolution>;`
pub fn build_resolution_declaration<'a>(
    allocator: &'a Allocator,
    binding: &str,
    profile: &ResolutionProfile,
) -> Result<Statement<'a>, TemplateError> {
    let binding = ensure_identifier(binding)?;
    let value = build_resolution(allocator, profile)?;
    template::statement(
        allocator,
        &format!("const {} = __VALUE__;", binding),
        vec![("__VALUE__", value)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{print_expression, print_statement};

    fn profile(needs_color_object: bool, needs_multi_statement: bool) -> ResolutionProfile {
        ResolutionProfile {
            needs_color_object,
            needs_multi_statement,
            ..ResolutionProfile::default()
        }
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(ResolutionShape::select(true, true), ResolutionShape::Iife);
        assert_eq!(ResolutionShape::select(true, false), ResolutionShape::LookupTernary);
        assert_eq!(ResolutionShape::select(false, false), ResolutionShape::EmptyTernary);
        assert_eq!(ResolutionShape::select(false, true), ResolutionShape::EmptyTernary);
    }

    #[test]
    fn test_iife_shape() {
        let allocator = Allocator::default();
        let expr = build_resolution(&allocator, &profile(true, true)).unwrap();
        assert!(matches!(expr, Expression::CallExpression(_)));
        let code = print_expression(&allocator, expr);
        assert!(code.contains("isSemanticToken(color)"));
        assert!(code.contains("return `bg-${color} text-${color}-foreground`"));
        assert!(code.contains("colorClasses[color] ??"));
        assert!(code.contains("\"default\""));
    }

    #[test]
    fn test_lookup_ternary_shape() {
        let allocator = Allocator::default();
        let expr = build_resolution(&allocator, &profile(true, false)).unwrap();
        assert!(matches!(expr, Expression::ConditionalExpression(_)));
        let code = print_expression(&allocator, expr);
        assert!(code.starts_with("isSemanticToken(color) ?"));
        assert!(code.contains("colorClasses[color]"));
    }

    #[test]
    fn test_empty_ternary_shape() {
        let allocator = Allocator::default();
        let expr = build_resolution(&allocator, &profile(false, false)).unwrap();
        let code = print_expression(&allocator, expr);
        assert!(code.ends_with(": \"\""));
        assert!(!code.contains("colorClasses"));
    }

    #[test]
    fn test_declaration_wraps_expression() {
        let allocator = Allocator::default();
        let stmt =
            build_resolution_declaration(&allocator, "resolvedColorClasses", &profile(true, false)).unwrap();
        let code = print_statement(&allocator, stmt);
        assert!(code.starts_with("const resolvedColorClasses = isSemanticToken(color)"));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let allocator = Allocator::default();
        let mut bad = profile(true, false);
        bad.lookup_object = "color-classes".to_string();
        assert_eq!(
            build_resolution(&allocator, &bad).unwrap_err(),
            TemplateError::InvalidIdentifier("color-classes".to_string())
        );
    }

    #[test]
    fn test_class_template_escaping() {
        assert_eq!(class_template_literal("bg-{token}", "c"), "`bg-${c}`");
        assert_eq!(class_template_literal("a`b", "c"), "`a\\`b`");
    }
}
