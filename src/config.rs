//! Generation settings: defaults, overridable from the environment.

use crate::sql::Dialect;
use crate::validate::{Severity, ValidationPolicy};
use std::env;
use thiserror::Error;

pub const ORPHAN_POLICY_VAR: &str = "MERISIO_ORPHAN_POLICY";
pub const DIALECT_VAR: &str = "MERISIO_DIALECT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub policy: ValidationPolicy,
    pub dialect: Dialect,
}

impl PipelineConfig {
    /// Defaults, then `MERISIO_ORPHAN_POLICY` and `MERISIO_DIALECT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ORPHAN_POLICY_VAR) {
            config.policy.orphan_entity = parse_severity(ORPHAN_POLICY_VAR, &value)?;
        }
        if let Some(value) = lookup(DIALECT_VAR) {
            config.dialect = parse_dialect(DIALECT_VAR, &value)?;
        }

        Ok(config)
    }
}

pub fn parse_severity(field: &'static str, value: &str) -> Result<Severity, ConfigError> {
    Severity::from_str(value.trim()).ok_or_else(|| ConfigError::Invalid {
        field,
        value: value.to_string(),
    })
}

pub fn parse_dialect(field: &'static str, value: &str) -> Result<Dialect, ConfigError> {
    Dialect::from_str(value.trim()).ok_or_else(|| ConfigError::Invalid {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.policy.orphan_entity, Severity::Warning);
        assert_eq!(config.dialect, Dialect::PostgreSQL);
    }

    #[test]
    fn test_env_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            (ORPHAN_POLICY_VAR, "error"),
            (DIALECT_VAR, "postgres"),
        ]))
        .unwrap();
        assert_eq!(config.policy.orphan_entity, Severity::Error);
    }

    #[test]
    fn test_invalid_values() {
        let err = PipelineConfig::from_lookup(lookup(&[(ORPHAN_POLICY_VAR, "fatal")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                field: ORPHAN_POLICY_VAR,
                value: "fatal".to_string()
            }
        );
        assert!(PipelineConfig::from_lookup(lookup(&[(DIALECT_VAR, "oracle")])).is_err());
    }
}
