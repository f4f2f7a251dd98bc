//! Color stage: legacy utility classes to semantic tokens.

use crate::factory::protected_pattern_transform;
use crate::protect::{Substitution, SubstitutionTable};
use crate::transform::{Transform, TransformMeta};
use crate::types::{Category, Strategy};

/// One entry of a component's color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorRule {
    Literal { from: String, to: String },
    Pattern { pattern: String, to: String },
}

impl ColorRule {
    pub fn literal(from: &str, to: &str) -> Self {
        ColorRule::Literal {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn pattern(pattern: &str, to: &str) -> Self {
        ColorRule::Pattern {
            pattern: pattern.to_string(),
            to: to.to_string(),
        }
    }

    fn substitution(&self) -> Result<Substitution, regex::Error> {
        match self {
            ColorRule::Literal { from, to } => Ok(Substitution::literal(from, to)),
            ColorRule::Pattern { pattern, to } => Substitution::pattern(pattern, to),
        }
    }
}

pub fn color_table(rules: &[ColorRule], vocabulary: &[&str]) -> Result<SubstitutionTable, regex::Error> {
    let substitutions = rules
        .iter()
        .map(ColorRule::substitution)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SubstitutionTable::new(substitutions).with_vocabulary(vocabulary.iter().copied()))
}

pub fn color_mapping_transform(component_id: &str, table: SubstitutionTable) -> Transform {
    protected_pattern_transform(
        TransformMeta::new(
            format!("{}-color-mapping", component_id),
            format!("Map legacy color classes in {} to semantic tokens", component_id),
            Category::Color,
            Strategy::Pattern,
        ),
        table,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{change_kind, TransformConfig};

    fn transform() -> Transform {
        let table = color_table(
            &[
                ColorRule::literal("bg-blue-500", "bg-primary"),
                ColorRule::literal("text-white", "text-primary-foreground"),
                ColorRule::pattern(r"ring-blue-\d00", "ring-ring"),
            ],
            &["bg-destructive"],
        )
        .unwrap();
        color_mapping_transform("button", table)
    }

    #[test]
    fn test_maps_each_occurrence_with_location() {
        let src = "const c = \"bg-blue-500 text-white\";\nconst d = \"focus:ring-blue-400\";\n";
        let result = transform().apply(src, &TransformConfig::for_file("ui/Button.tsx"));
        assert!(result.has_changes);
        assert_eq!(result.changes.len(), 3);
        assert!(result.changes.iter().all(|c| c.kind == change_kind::COLOR_MAPPED));
        assert_eq!(result.changes[2].location.map(|l| l.line), Some(2));
        assert_eq!(
            result.content,
            "const c = \"bg-primary text-primary-foreground\";\nconst d = \"focus:ring-ring\";\n"
        );
    }

    #[test]
    fn test_converted_file_is_untouched() {
        let src = "export function Button({ className }) {\n  return <button className=\"bg-primary text-primary-foreground hover:bg-destructive\" />;\n}\n";
        let result = transform().apply(src, &TransformConfig::for_file("ui/Button.tsx"));
        assert!(!result.has_changes);
        assert!(result.changes.is_empty());
        assert_eq!(result.content, src);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        assert!(color_table(&[ColorRule::pattern("ring-(", "x")], &[]).is_err());
    }
}
