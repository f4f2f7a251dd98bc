//! Execution plan
//!
//! A plan is an ordered list of `TransformPhase`s, each tagged with the
//! stage it belongs to. Stages always run in `Stage::ORDER`; phases within a
//! stage keep the order they were listed in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Strategy;

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Import,
    Structure,
    Color,
    EdgeCase,
    Cleanup,
    Formatting,
    ExternalTooling,
}

impl Stage {
    pub const ORDER: [Stage; 7] = [
        Stage::Import,
        Stage::Structure,
        Stage::Color,
        Stage::EdgeCase,
        Stage::Cleanup,
        Stage::Formatting,
        Stage::ExternalTooling,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Import => "import",
            Stage::Structure => "structure",
            Stage::Color => "color",
            Stage::EdgeCase => "edge-case",
            Stage::Cleanup => "cleanup",
            Stage::Formatting => "formatting",
            Stage::ExternalTooling => "external-tooling",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformPhase {
    /// Logical path, e.g. `components/*/color-mapping`.
    pub path: String,
    pub stage: Stage,
    #[serde(rename = "type")]
    pub strategy: Strategy,
    pub parallel: bool,
    pub optional: bool,
}

impl TransformPhase {
    pub fn new(path: impl Into<String>, stage: Stage, strategy: Strategy) -> Self {
        TransformPhase {
            path: path.into(),
            stage,
            strategy,
            parallel: false,
            optional: false,
        }
    }

    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        is_wildcard_path(&self.path)
    }

    /// Concrete path for one component.
    pub fn expand(&self, component: &str) -> String {
        expand_path(&self.path, component)
    }
}

pub fn is_wildcard_path(path: &str) -> bool {
    path.split('/').any(|segment| segment == WILDCARD)
}

pub fn expand_path(path: &str, component: &str) -> String {
    path.split('/')
        .map(|segment| if segment == WILDCARD { component } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

/// Phases regrouped by stage in execution order. Empty stages are kept so
/// every stage boundary is visible to the orchestrator.
pub fn stages(plan: &[TransformPhase]) -> Vec<(Stage, Vec<&TransformPhase>)> {
    Stage::ORDER
        .iter()
        .map(|stage| (*stage, plan.iter().filter(|p| p.stage == *stage).collect()))
        .collect()
}

/// The built-in plan.
pub fn default_plan() -> Vec<TransformPhase> {
    vec![
        TransformPhase::new("imports/token-utils", Stage::Import, Strategy::Structural),
        TransformPhase::new("components/*/styling-params", Stage::Structure, Strategy::Structural)
            .parallel()
            .optional(),
        TransformPhase::new("components/*/color-mapping", Stage::Color, Strategy::Pattern)
            .parallel()
            .optional(),
        TransformPhase::new("components/*/color-resolution", Stage::Color, Strategy::Structural)
            .parallel()
            .optional(),
        TransformPhase::new("edge-cases/duplicate-attributes", Stage::EdgeCase, Strategy::Hybrid),
        TransformPhase::new("cleanup/class-names", Stage::Cleanup, Strategy::Pattern),
        TransformPhase::new("formatting/whitespace", Stage::Formatting, Strategy::Pattern),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_expansion() {
        let phase = TransformPhase::new("components/*/color-mapping", Stage::Color, Strategy::Pattern);
        assert!(phase.is_wildcard());
        assert_eq!(phase.expand("button"), "components/button/color-mapping");
        assert!(!is_wildcard_path("cleanup/class-names"));
        assert_eq!(expand_path("cleanup/class-names", "button"), "cleanup/class-names");
    }

    #[test]
    fn test_stages_follow_fixed_order() {
        let plan = vec![
            TransformPhase::new("formatting/whitespace", Stage::Formatting, Strategy::Pattern),
            TransformPhase::new("imports/token-utils", Stage::Import, Strategy::Structural),
        ];
        let grouped = stages(&plan);
        assert_eq!(grouped.len(), Stage::ORDER.len());
        assert_eq!(grouped[0].0, Stage::Import);
        assert_eq!(grouped[0].1[0].path, "imports/token-utils");
        assert_eq!(grouped[5].1[0].path, "formatting/whitespace");
    }

    #[test]
    fn test_default_plan_is_stage_sorted() {
        let plan = default_plan();
        assert!(plan.windows(2).all(|w| w[0].stage <= w[1].stage));
        assert!(plan.iter().filter(|p| p.is_wildcard()).all(|p| p.parallel && p.optional));
    }
}
