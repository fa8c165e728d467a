pub mod config;
pub mod listing;
pub mod mcd;
pub mod mld;
pub mod naming;
pub mod overrides;
pub mod pipeline;
pub mod project;
pub mod sql;
pub mod validate;

use wasm_bindgen::prelude::*;

pub use mld::transform;
pub use overrides::apply_overrides;
pub use sql::emit_sql;
pub use validate::validate;

use config::PipelineConfig;
use pipeline::{PipelineError, generate};
use project::Project;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Validate a project document; returns the findings as JSON.
#[wasm_bindgen(js_name = "validateMcd")]
pub fn validate_project(source: &str, strict: Option<bool>) -> Result<String, String> {
    let project = Project::from_json(source).map_err(|e| e.to_string())?;
    let config = web_config(strict);
    let report = project.validate_with(&config.policy);
    serde_json::to_string(&report).map_err(|e| e.to_string())
}

/// Render a project document's logical model as text.
#[wasm_bindgen(js_name = "mcdToMld")]
pub fn render_mld(source: &str, strict: Option<bool>) -> Result<String, String> {
    let generated = generate_project(source, strict)?;
    Ok(listing::render(&generated.model))
}

/// Generate the SQL DDL of a project document.
#[wasm_bindgen(js_name = "mcdToSql")]
pub fn render_sql(source: &str, strict: Option<bool>) -> Result<String, String> {
    let generated = generate_project(source, strict)?;
    Ok(generated.sql)
}

fn web_config(strict: Option<bool>) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    if strict.unwrap_or(false) {
        config.policy = validate::ValidationPolicy::strict();
    }
    config
}

fn generate_project(source: &str, strict: Option<bool>) -> Result<pipeline::Generated, String> {
    let project = Project::from_json(source).map_err(|e| e.to_string())?;
    generate(&project.graph, &project.overrides, &web_config(strict)).map_err(|e| match &e {
        PipelineError::Invalid(report) => format!("{}\n{}", e, report),
    })
}
