//! Built-in rewrite rules
//!
//! Each sub-module exposes a constructor returning a factory-built
//! `Transform`. Shared tree lookups used by the component rules live here.

pub mod class_names;
pub mod color_mapping;
pub mod color_resolution;
pub mod duplicate_attributes;
pub mod imports;
pub mod styling_params;
pub mod whitespace;

use oxc_allocator::{Allocator, CloneIn};
use oxc_ast::ast::{
    ArrowFunctionExpression, BindingPattern, Declaration, ExportDefaultDeclarationKind, Expression,
    FormalParameters, Function, ObjectPattern, Statement, VariableDeclaration,
};
use oxc_ast::AstBuilder;
use oxc_span::SPAN;

/// A component's function, however it was declared.
pub enum ComponentFn<'r, 'a> {
    Function(&'r mut Function<'a>),
    Arrow(&'r mut ArrowFunctionExpression<'a>),
}

impl<'r, 'a> ComponentFn<'r, 'a> {
    pub fn params(&self) -> &FormalParameters<'a> {
        match self {
            ComponentFn::Function(f) => &f.params,
            ComponentFn::Arrow(a) => &a.params,
        }
    }

    pub fn params_mut(&mut self) -> &mut FormalParameters<'a> {
        match self {
            ComponentFn::Function(f) => &mut f.params,
            ComponentFn::Arrow(a) => &mut a.params,
        }
    }

    /// Body statements; an expression-bodied arrow is turned into a block
    /// body returning that expression first.
    pub fn block_statements(
        &mut self,
        allocator: &'a Allocator,
    ) -> Option<&mut oxc_allocator::Vec<'a, Statement<'a>>> {
        match self {
            ComponentFn::Function(f) => f.body.as_mut().map(|body| &mut body.statements),
            ComponentFn::Arrow(a) => {
                if a.expression {
                    let value = match a.body.statements.first() {
                        Some(Statement::ExpressionStatement(stmt)) => {
                            stmt.expression.clone_in(allocator)
                        }
                        _ => return None,
                    };
                    let ast = AstBuilder::new(allocator);
                    a.body.statements.clear();
                    a.body.statements.push(ast.statement_return(SPAN, Some(value)));
                    a.expression = false;
                }
                Some(&mut a.body.statements)
            }
        }
    }

    pub fn first_object_param(&self) -> Option<&ObjectPattern<'a>> {
        match &self.params().items.first()?.pattern {
            BindingPattern::ObjectPattern(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Names bound at the top level of an object pattern, by key.
pub fn pattern_keys(pattern: &ObjectPattern) -> Vec<String> {
    pattern
        .properties
        .iter()
        .filter_map(|prop| prop.key.static_name().map(|name| name.to_string()))
        .collect()
}

fn binding_name<'p>(pattern: &'p BindingPattern) -> Option<&'p str> {
    match pattern {
        BindingPattern::BindingIdentifier(id) => Some(id.name.as_str()),
        _ => None,
    }
}

/// `(props) => …`, `function (props) {…}`, or the first function argument of
/// a wrapper call such as `forwardRef(…)` / `memo(forwardRef(…))`.
fn from_expression<'r, 'a>(expr: &'r mut Expression<'a>) -> Option<ComponentFn<'r, 'a>> {
    match expr {
        Expression::ArrowFunctionExpression(arrow) => Some(ComponentFn::Arrow(&mut **arrow)),
        Expression::FunctionExpression(func) => Some(ComponentFn::Function(&mut **func)),
        Expression::ParenthesizedExpression(paren) => from_expression(&mut paren.expression),
        Expression::CallExpression(call) => {
            let first = call.arguments.first_mut()?;
            from_expression(first.as_expression_mut()?)
        }
        _ => None,
    }
}

fn from_variable_declaration<'r, 'a>(
    decl: &'r mut VariableDeclaration<'a>,
    name: &str,
) -> Option<ComponentFn<'r, 'a>> {
    for declarator in decl.declarations.iter_mut() {
        if binding_name(&declarator.id) != Some(name) {
            continue;
        }
        return from_expression(declarator.init.as_mut()?);
    }
    None
}

fn is_named(func: &Function, name: &str) -> bool {
    func.id.as_ref().is_some_and(|id| id.name.as_str() == name)
}

fn from_statement<'r, 'a>(stmt: &'r mut Statement<'a>, name: &str) -> Option<ComponentFn<'r, 'a>> {
    match stmt {
        Statement::FunctionDeclaration(func) if is_named(func, name) => {
            Some(ComponentFn::Function(&mut **func))
        }
        Statement::VariableDeclaration(decl) => from_variable_declaration(decl, name),
        Statement::ExportNamedDeclaration(export) => match export.declaration.as_mut()? {
            Declaration::FunctionDeclaration(func) if is_named(func, name) => {
                Some(ComponentFn::Function(&mut **func))
            }
            Declaration::VariableDeclaration(decl) => from_variable_declaration(decl, name),
            _ => None,
        },
        Statement::ExportDefaultDeclaration(export) => match &mut export.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) if is_named(func, name) => {
                Some(ComponentFn::Function(&mut **func))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Locate the declaration of component `name` among top-level statements.
pub fn find_component<'r, 'a>(
    body: &'r mut oxc_allocator::Vec<'a, Statement<'a>>,
    name: &str,
) -> Option<ComponentFn<'r, 'a>> {
    body.iter_mut().find_map(|stmt| from_statement(stmt, name))
}
