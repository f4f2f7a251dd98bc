//! Structure stage: guarantee styling parameters on a component signature.

use oxc_allocator::{Allocator, CloneIn};
use oxc_ast::ast::{BindingPattern, BindingProperty, Expression, FormalParameter};

use crate::factory::{structural_transform, StructuralContext};
use crate::rules::{find_component, pattern_keys};
use crate::template::{self, ensure_identifier, TemplateError};
use crate::transform::{Transform, TransformMeta};
use crate::types::{change_kind, Category, Change, ChangeSet, Rewrite, Strategy};

/// `({ a, b }) => null`, parsed so its parameter can be lifted out.
fn pattern_template<'a>(allocator: &'a Allocator, names: &[&str]) -> Result<Expression<'a>, TemplateError> {
    for name in names {
        ensure_identifier(name)?;
    }
    template::expression(allocator, &format!("({{ {} }}) => null", names.join(", ")), vec![])
}

fn template_parameter<'a>(allocator: &'a Allocator, names: &[&str]) -> Result<FormalParameter<'a>, String> {
    match pattern_template(allocator, names).map_err(|e| e.to_string())? {
        Expression::ArrowFunctionExpression(arrow) => arrow
            .params
            .items
            .first()
            .map(|param| param.clone_in(allocator))
            .ok_or_else(|| "parameter template produced no parameter".to_string()),
        _ => Err("parameter template is not an arrow function".to_string()),
    }
}

fn template_property<'a>(allocator: &'a Allocator, name: &str) -> Result<BindingProperty<'a>, String> {
    let param = template_parameter(allocator, &[name])?;
    match &param.pattern {
        BindingPattern::ObjectPattern(obj) => obj
            .properties
            .first()
            .map(|prop| prop.clone_in(allocator))
            .ok_or_else(|| "property template produced no property".to_string()),
        _ => Err("property template is not an object pattern".to_string()),
    }
}

fn ensure_params(
    cx: &mut StructuralContext,
    component_name: &str,
    params: &[String],
    changes: &mut ChangeSet,
) -> Rewrite<()> {
    let allocator = cx.allocator;
    let Some(mut component) = find_component(&mut cx.program.body, component_name) else {
        changes.warn(format!("component `{}` not found", component_name));
        return Rewrite::Skip;
    };

    let formal = component.params_mut();
    if formal.items.is_empty() && formal.rest.is_none() {
        let names: Vec<&str> = params.iter().map(String::as_str).collect();
        match template_parameter(allocator, &names) {
            Ok(param) => formal.items.push(param),
            Err(reason) => return Rewrite::Failed(reason),
        }
        for name in params {
            changes.record(Change::new(
                change_kind::PARAM_ADDED,
                format!("added `{}` to {} props", name, component_name),
            ));
        }
        return Rewrite::Applied(());
    }

    let Some(first) = formal.items.first_mut() else {
        changes.warn(format!(
            "{} only takes rest parameters; styling params not added",
            component_name
        ));
        return Rewrite::Skip;
    };
    let BindingPattern::ObjectPattern(obj) = &mut first.pattern else {
        changes.warn(format!(
            "{} does not destructure its props; add {} manually",
            component_name,
            params.join(", ")
        ));
        return Rewrite::Skip;
    };

    let existing = pattern_keys(obj);
    for name in params.iter().filter(|name| !existing.contains(name)) {
        match template_property(allocator, name) {
            Ok(prop) => obj.properties.push(prop),
            Err(reason) => return Rewrite::Failed(reason),
        }
        changes.record(Change::new(
            change_kind::PARAM_ADDED,
            format!("added `{}` to {} props", name, component_name),
        ));
    }
    Rewrite::Applied(())
}

pub fn styling_params_transform(component_id: &str, component_name: &str, params: Vec<String>) -> Transform {
    let meta = TransformMeta::new(
        format!("{}-styling-params", component_id),
        format!("Ensure {} accepts {}", component_name, params.join(", ")),
        Category::Structure,
        Strategy::Structural,
    );
    let component_name = component_name.to_string();
    structural_transform(meta, move |cx, changes| {
        ensure_params(cx, &component_name, &params, changes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformConfig;

    fn transform() -> Transform {
        styling_params_transform(
            "button",
            "Button",
            vec!["className".to_string(), "color".to_string()],
        )
    }

    #[test]
    fn test_adds_missing_params_before_rest() {
        let src = "export function Button({ label, ...rest }) { return <button {...rest}>{label}</button>; }";
        let result = transform().apply(src, &TransformConfig::for_file("ui/Button.tsx"));
        assert!(result.has_changes);
        assert_eq!(result.changes.len(), 2);
        assert!(result.content.contains("{ label, className, color,...rest }")
            || result.content.contains("{ label, className, color, ...rest }"));
    }

    #[test]
    fn test_keeps_existing_params() {
        let src = "const Button = forwardRef(({ className }, ref) => <button ref={ref} className={className} />);";
        let result = transform().apply(src, &TransformConfig::for_file("ui/Button.tsx"));
        assert_eq!(result.changes.len(), 1);
        assert!(result.changes[0].description.contains("`color`"));
    }

    #[test]
    fn test_parameterless_component_gets_pattern() {
        let src = "function Button() { return <button />; }";
        let result = transform().apply(src, &TransformConfig::for_file("ui/Button.tsx"));
        assert!(result.has_changes);
        assert!(result.content.contains("function Button({ className, color })"));
    }

    #[test]
    fn test_identifier_param_warns() {
        let src = "function Button(props) { return <button {...props} />; }";
        let result = transform().apply(src, &TransformConfig::for_file("ui/Button.tsx"));
        assert!(!result.has_changes);
        assert_eq!(result.content, src);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_second_run_is_noop() {
        let src = "function Button({ label }) { return <button>{label}</button>; }";
        let config = TransformConfig::for_file("ui/Button.tsx");
        let first = transform().apply(src, &config);
        let second = transform().apply(&first.content, &config);
        assert!(!second.has_changes);
        assert_eq!(second.content, first.content);
    }
}
