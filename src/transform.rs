//! Transform contract
//!
//! A `Transform` is a named, described unit of rewrite logic with a pure
//! `apply(source, config) -> TransformResult`. Structural and pattern rules
//! both satisfy this one contract; the factories in `factory.rs` build them.

use std::fmt;
use std::sync::Arc;

use crate::types::{Category, Strategy, TransformConfig, TransformResult};

pub type ApplyFn = dyn Fn(&str, &TransformConfig) -> TransformResult + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformMeta {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub strategy: Strategy,
}

impl TransformMeta {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        strategy: Strategy,
    ) -> Self {
        TransformMeta {
            name: name.into(),
            description: description.into(),
            category,
            strategy,
        }
    }
}

/// Cheap to clone; the registry hands out clones to worker threads.
#[derive(Clone)]
pub struct Transform {
    meta: Arc<TransformMeta>,
    apply: Arc<ApplyFn>,
}

impl Transform {
    /// Wrap a raw apply function. Prefer the factories: they add parsing,
    /// panic capture and change bookkeeping.
    pub fn new<F>(meta: TransformMeta, apply: F) -> Self
    where
        F: Fn(&str, &TransformConfig) -> TransformResult + Send + Sync + 'static,
    {
        Transform {
            meta: Arc::new(meta),
            apply: Arc::new(apply),
        }
    }

    pub fn apply(&self, source: &str, config: &TransformConfig) -> TransformResult {
        (self.apply)(source, config)
    }

    pub fn meta(&self) -> &TransformMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn description(&self) -> &str {
        &self.meta.description
    }

    pub fn category(&self) -> Category {
        self.meta.category
    }

    pub fn strategy(&self) -> Strategy {
        self.meta.strategy
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.meta.name)
            .field("category", &self.meta.category)
            .field("strategy", &self.meta.strategy)
            .finish()
    }
}
