//! The gated generation chain: validate, transform, apply overrides, emit.

use crate::config::PipelineConfig;
use crate::mcd::Graph;
use crate::mld::{LogicalModel, transform};
use crate::overrides::{ColumnOverrides, apply_overrides};
use crate::sql::emit_sql;
use crate::validate::{Report, validate_with};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed with {} error(s)", .0.errors().count())]
    Invalid(Report),
}

#[derive(Debug, Clone)]
pub struct Generated {
    /// Findings of the gate; warnings only.
    pub report: Report,
    /// Model after overrides.
    pub model: LogicalModel,
    pub sql: String,
}

/// Run the whole chain, refusing to transform a graph with validation errors.
pub fn generate(
    graph: &Graph,
    overrides: &ColumnOverrides,
    config: &PipelineConfig,
) -> Result<Generated, PipelineError> {
    let report = validate_with(graph, &config.policy);
    if !report.is_success() {
        return Err(PipelineError::Invalid(report));
    }

    let model = apply_overrides(&transform(graph), overrides);
    let sql = emit_sql(&model, config.dialect);
    log::info!("generated {} table(s)", model.tables.len());

    Ok(Generated { report, model, sql })
}
