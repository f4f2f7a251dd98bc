//! Node bridge
//!
//! Lets the JavaScript CLI drive the engine: configuration goes in as JSON,
//! the serialized `PipelineResult` comes back out.

use napi_derive::napi;
use std::sync::Arc;

use crate::catalog::builtin_registry;
use crate::config::PipelineConfig;
use crate::orchestrator::Pipeline;
use crate::phase::default_plan;

#[napi]
pub fn run_pipeline_native(config_json: String) -> napi::Result<String> {
    let config = PipelineConfig::from_json_str(&config_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let registry = builtin_registry().map_err(|e| napi::Error::from_reason(e.to_string()))?;

    let result = Pipeline::new(default_plan(), Arc::new(registry))
        .run(&config)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    serde_json::to_string(&result).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[napi]
pub fn default_plan_native() -> napi::Result<String> {
    serde_json::to_string(&default_plan()).map_err(|e| napi::Error::from_reason(e.to_string()))
}
