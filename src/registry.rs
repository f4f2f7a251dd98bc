//! Component Registry and wildcard resolution
//!
//! An explicit, immutable table built once at startup. Global phases are
//! keyed by their path; wildcard phases by `(phase pattern, component id)`.
//! Resolving a wildcard phase walks the fixed component list in order.

use std::collections::HashMap;
use thiserror::Error;

use crate::phase::{is_wildcard_path, TransformPhase};
use crate::transform::Transform;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown component `{0}`")]
    UnknownComponent(String),
    #[error("`{0}` is registered twice")]
    Duplicate(String),
    #[error("`{0}` must contain a `*` segment to take per-component transforms")]
    NotWildcard(String),
    #[error("`{0}` contains a `*` segment; register per component instead")]
    UnexpectedWildcard(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedTransform {
    /// Concrete path, wildcard expanded.
    pub path: String,
    pub phase_path: String,
    pub component: Option<String>,
    pub transform: Transform,
}

impl ResolvedTransform {
    /// Every name a filter entry may use to select this transform.
    pub fn filter_names(&self) -> Vec<&str> {
        let mut names = vec![self.path.as_str(), self.phase_path.as_str()];
        if let Some(component) = &self.component {
            names.push(component.as_str());
        }
        names
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseResolution {
    pub transforms: Vec<ResolvedTransform>,
    /// Concrete paths with no implementation.
    pub gaps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    components: Vec<String>,
    global: HashMap<String, Transform>,
    per_component: HashMap<(String, String), Transform>,
}

impl Registry {
    pub fn builder<I, S>(components: I) -> RegistryBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RegistryBuilder {
            registry: Registry {
                components: components.into_iter().map(Into::into).collect(),
                global: HashMap::new(),
                per_component: HashMap::new(),
            },
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn has_component(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }

    pub fn get(&self, path: &str) -> Option<&Transform> {
        self.global.get(path)
    }

    pub fn get_for(&self, pattern: &str, component: &str) -> Option<&Transform> {
        self.per_component
            .get(&(pattern.to_string(), component.to_string()))
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.per_component.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand `phase` into concrete transforms plus the paths that have no
    /// implementation.
    pub fn resolve(&self, phase: &TransformPhase) -> PhaseResolution {
        let mut resolution = PhaseResolution::default();

        if !phase.is_wildcard() {
            match self.global.get(&phase.path) {
                Some(transform) => resolution.transforms.push(ResolvedTransform {
                    path: phase.path.clone(),
                    phase_path: phase.path.clone(),
                    component: None,
                    transform: transform.clone(),
                }),
                None => resolution.gaps.push(phase.path.clone()),
            }
            return resolution;
        }

        for component in &self.components {
            let path = phase.expand(component);
            match self.get_for(&phase.path, component) {
                Some(transform) => resolution.transforms.push(ResolvedTransform {
                    path,
                    phase_path: phase.path.clone(),
                    component: Some(component.clone()),
                    transform: transform.clone(),
                }),
                None => resolution.gaps.push(path),
            }
        }
        resolution
    }
}

pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn register(mut self, path: &str, transform: Transform) -> Result<Self, RegistryError> {
        if is_wildcard_path(path) {
            return Err(RegistryError::UnexpectedWildcard(path.to_string()));
        }
        if self.registry.global.contains_key(path) {
            return Err(RegistryError::Duplicate(path.to_string()));
        }
        self.registry.global.insert(path.to_string(), transform);
        Ok(self)
    }

    pub fn register_component(
        mut self,
        pattern: &str,
        component: &str,
        transform: Transform,
    ) -> Result<Self, RegistryError> {
        if !is_wildcard_path(pattern) {
            return Err(RegistryError::NotWildcard(pattern.to_string()));
        }
        if !self.registry.has_component(component) {
            return Err(RegistryError::UnknownComponent(component.to_string()));
        }
        let key = (pattern.to_string(), component.to_string());
        if self.registry.per_component.contains_key(&key) {
            return Err(RegistryError::Duplicate(format!("{} ({})", pattern, component)));
        }
        self.registry.per_component.insert(key, transform);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::noop_transform;
    use crate::phase::Stage;
    use crate::transform::TransformMeta;
    use crate::types::{Category, Strategy};

    fn noop(name: &str) -> Transform {
        noop_transform(TransformMeta::new(name, "", Category::Quality, Strategy::Pattern))
    }

    fn registry() -> Registry {
        Registry::builder(["button", "badge", "card"])
            .register("cleanup/class-names", noop("class-names"))
            .unwrap()
            .register_component("components/*/color-mapping", "button", noop("button-colors"))
            .unwrap()
            .register_component("components/*/color-mapping", "card", noop("card-colors"))
            .unwrap()
            .build()
    }

    #[test]
    fn test_resolve_global_phase() {
        let phase = TransformPhase::new("cleanup/class-names", Stage::Cleanup, Strategy::Pattern);
        let resolution = registry().resolve(&phase);
        assert_eq!(resolution.transforms.len(), 1);
        assert_eq!(resolution.transforms[0].component, None);
        assert!(resolution.gaps.is_empty());
    }

    #[test]
    fn test_resolve_wildcard_in_component_order_with_gaps() {
        let phase = TransformPhase::new("components/*/color-mapping", Stage::Color, Strategy::Pattern);
        let resolution = registry().resolve(&phase);
        let paths: Vec<_> = resolution.transforms.iter().map(|t| t.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["components/button/color-mapping", "components/card/color-mapping"]
        );
        assert_eq!(resolution.gaps, vec!["components/badge/color-mapping".to_string()]);
        assert_eq!(resolution.transforms[1].transform.name(), "card-colors");
    }

    #[test]
    fn test_missing_global_is_a_gap() {
        let phase = TransformPhase::new("formatting/whitespace", Stage::Formatting, Strategy::Pattern);
        let resolution = registry().resolve(&phase);
        assert!(resolution.transforms.is_empty());
        assert_eq!(resolution.gaps, vec!["formatting/whitespace".to_string()]);
    }

    #[test]
    fn test_builder_rejects_bad_registrations() {
        let err = Registry::builder(["button"])
            .register_component("components/*/color-mapping", "modal", noop("x"))
            .err();
        assert_eq!(err, Some(RegistryError::UnknownComponent("modal".to_string())));

        let err = Registry::builder(["button"])
            .register("a/b", noop("x"))
            .unwrap()
            .register("a/b", noop("y"))
            .err();
        assert_eq!(err, Some(RegistryError::Duplicate("a/b".to_string())));

        assert!(Registry::builder(["button"])
            .register("components/*/x", noop("x"))
            .is_err());
    }

    #[test]
    fn test_filter_names() {
        let phase = TransformPhase::new("components/*/color-mapping", Stage::Color, Strategy::Pattern);
        let resolution = registry().resolve(&phase);
        assert_eq!(
            resolution.transforms[0].filter_names(),
            vec!["components/button/color-mapping", "components/*/color-mapping", "button"]
        );
    }
}
