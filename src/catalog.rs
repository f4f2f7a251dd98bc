//! Built-in component catalog
//!
//! Data, not engine logic: which components exist, what their signatures
//! must accept, how their legacy classes map onto semantic tokens, and how
//! their color is resolved at runtime. `builtin_registry` turns it into the
//! registry the default plan runs against.

use crate::registry::{Registry, RegistryError};
use crate::resolution::ResolutionProfile;
use crate::rules::class_names::class_names_transform;
use crate::rules::color_mapping::{color_mapping_transform, color_table, ColorRule};
use crate::rules::color_resolution::color_resolution_transform;
use crate::rules::duplicate_attributes::duplicate_attributes_transform;
use crate::rules::imports::token_utils_transform;
use crate::rules::styling_params::styling_params_transform;
use crate::rules::whitespace::whitespace_transform;

pub const TOKEN_MODULE: &str = "@/lib/tokens";

pub const LEGACY_MODULES: &[(&str, &str)] = &[
    ("@/lib/colors", TOKEN_MODULE),
    ("@/lib/theme-colors", TOKEN_MODULE),
    ("@/utils/colors", TOKEN_MODULE),
];

pub const SEMANTIC_TOKENS: &[&str] = &[
    "bg-background",
    "text-foreground",
    "bg-primary",
    "text-primary-foreground",
    "bg-secondary",
    "text-secondary-foreground",
    "bg-destructive",
    "text-destructive-foreground",
    "bg-muted",
    "text-muted-foreground",
    "bg-accent",
    "text-accent-foreground",
    "bg-card",
    "text-card-foreground",
    "border-border",
    "border-input",
    "ring-ring",
];

#[derive(Debug, Clone)]
pub struct ComponentProfile {
    pub id: &'static str,
    pub declared_name: &'static str,
    pub styling_params: &'static [&'static str],
    pub colors: Vec<ColorRule>,
    pub resolution: Option<ResolutionProfile>,
}

fn shared_colors() -> Vec<ColorRule> {
    vec![
        ColorRule::literal("bg-blue-500", "bg-primary"),
        ColorRule::literal("bg-blue-600", "bg-primary/90"),
        ColorRule::literal("text-white", "text-primary-foreground"),
        ColorRule::literal("bg-red-500", "bg-destructive"),
        ColorRule::literal("text-gray-500", "text-muted-foreground"),
        ColorRule::literal("border-gray-200", "border-border"),
        ColorRule::pattern(r"ring-blue-[1-9]00", "ring-ring"),
    ]
}

fn with_shared(mut specific: Vec<ColorRule>) -> Vec<ColorRule> {
    specific.extend(shared_colors());
    specific
}

/// The fixed component list, in resolution order.
pub fn components() -> Vec<ComponentProfile> {
    vec![
        ComponentProfile {
            id: "alert",
            declared_name: "Alert",
            styling_params: &["className", "color"],
            colors: with_shared(vec![
                ColorRule::literal("bg-yellow-50", "bg-accent"),
                ColorRule::literal("text-yellow-800", "text-accent-foreground"),
            ]),
            resolution: Some(ResolutionProfile {
                needs_color_object: true,
                needs_multi_statement: true,
                lookup_object: "alertColors".to_string(),
                class_template: "border-{token} bg-{token}/10 text-{token}".to_string(),
                ..ResolutionProfile::default()
            }),
        },
        ComponentProfile {
            id: "badge",
            declared_name: "Badge",
            styling_params: &["className", "color"],
            colors: with_shared(vec![
                ColorRule::literal("bg-gray-100", "bg-secondary"),
                ColorRule::literal("text-gray-900", "text-secondary-foreground"),
            ]),
            resolution: Some(ResolutionProfile::default()),
        },
        ComponentProfile {
            id: "button",
            declared_name: "Button",
            styling_params: &["className", "color"],
            colors: with_shared(vec![
                ColorRule::literal("bg-gray-100", "bg-secondary"),
                ColorRule::literal("text-gray-900", "text-secondary-foreground"),
            ]),
            resolution: Some(ResolutionProfile {
                needs_color_object: true,
                lookup_object: "buttonColors".to_string(),
                ..ResolutionProfile::default()
            }),
        },
        ComponentProfile {
            id: "card",
            declared_name: "Card",
            styling_params: &["className"],
            colors: with_shared(vec![
                ColorRule::literal("bg-white", "bg-card"),
                ColorRule::literal("text-gray-900", "text-card-foreground"),
            ]),
            resolution: None,
        },
        ComponentProfile {
            id: "input",
            declared_name: "Input",
            styling_params: &["className"],
            colors: with_shared(vec![
                ColorRule::literal("border-gray-300", "border-input"),
                ColorRule::literal("bg-white", "bg-background"),
            ]),
            resolution: None,
        },
    ]
}

pub fn component_ids() -> Vec<&'static str> {
    components().iter().map(|c| c.id).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid color pattern for `{component}`: {source}")]
    ColorPattern {
        component: String,
        #[source]
        source: regex::Error,
    },
}

/// Registry for `phase::default_plan`.
pub fn builtin_registry() -> Result<Registry, CatalogError> {
    let profiles = components();
    let mut builder = Registry::builder(profiles.iter().map(|p| p.id))
        .register("imports/token-utils", token_utils_transform(LEGACY_MODULES))?
        .register("edge-cases/duplicate-attributes", duplicate_attributes_transform())?
        .register("cleanup/class-names", class_names_transform())?
        .register("formatting/whitespace", whitespace_transform())?;

    for profile in &profiles {
        let params = profile.styling_params.iter().map(|p| p.to_string()).collect();
        builder = builder.register_component(
            "components/*/styling-params",
            profile.id,
            styling_params_transform(profile.id, profile.declared_name, params),
        )?;

        let table = color_table(&profile.colors, SEMANTIC_TOKENS).map_err(|source| {
            CatalogError::ColorPattern {
                component: profile.id.to_string(),
                source,
            }
        })?;
        builder = builder.register_component(
            "components/*/color-mapping",
            profile.id,
            color_mapping_transform(profile.id, table),
        )?;

        if let Some(resolution) = &profile.resolution {
            builder = builder.register_component(
                "components/*/color-resolution",
                profile.id,
                color_resolution_transform(
                    profile.id,
                    profile.declared_name,
                    resolution.clone(),
                    TOKEN_MODULE,
                ),
            )?;
        }
    }
    Ok(builder.build())
}
