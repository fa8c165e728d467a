//! Well-formedness checks run before a schema is generated.

use crate::mcd::{AssociationId, EntityId, Graph};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    Warning,
}

impl Severity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// How each rule reports. Only the orphan rule is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationPolicy {
    pub orphan_entity: Severity,
}

impl ValidationPolicy {
    pub fn strict() -> Self {
        Self {
            orphan_entity: Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Subject {
    Entity(EntityId),
    Association(AssociationId),
    /// The project as a whole, for checks outside the graph.
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    MissingPrimaryKey,
    UnderConnectedAssociation,
    OrphanEntity,
    EmptyDictionary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub rule: Rule,
    pub subject: Subject,
    /// Name of the offending element, for messages.
    pub name: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            Rule::MissingPrimaryKey => {
                write!(f, "Entity '{}' has no primary key attribute.", self.name)
            }
            Rule::UnderConnectedAssociation => write!(
                f,
                "Association '{}' must be connected to at least 2 entities.",
                self.name
            ),
            Rule::OrphanEntity => write!(
                f,
                "Entity '{}' is not connected to any association.",
                self.name
            ),
            Rule::EmptyDictionary => f.write_str("Dictionary is empty. Add attributes first."),
        }
    }
}

/// Ordered findings of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
}

impl Report {
    /// True when no finding blocks generation. Warnings never count.
    pub fn is_success(&self) -> bool {
        !self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{}: {}", finding.severity, finding)?;
        }
        Ok(())
    }
}

pub fn validate(graph: &Graph) -> Report {
    validate_with(graph, &ValidationPolicy::default())
}

pub fn validate_with(graph: &Graph, policy: &ValidationPolicy) -> Report {
    let mut findings = Vec::new();

    for entity in graph.entities() {
        if !entity.has_primary_key() {
            findings.push(Finding {
                severity: Severity::Error,
                rule: Rule::MissingPrimaryKey,
                subject: Subject::Entity(entity.id),
                name: entity.name.clone(),
            });
        }
    }

    for association in graph.associations() {
        if graph.links_for_association(association.id).count() < 2 {
            findings.push(Finding {
                severity: Severity::Error,
                rule: Rule::UnderConnectedAssociation,
                subject: Subject::Association(association.id),
                name: association.name.clone(),
            });
        }
    }

    for entity in graph.entities() {
        if graph.links_for_entity(entity.id).next().is_none() {
            findings.push(Finding {
                severity: policy.orphan_entity,
                rule: Rule::OrphanEntity,
                subject: Subject::Entity(entity.id),
                name: entity.name.clone(),
            });
        }
    }

    log::debug!(
        "validation produced {} finding(s), success={}",
        findings.len(),
        !findings.iter().any(|f| f.severity == Severity::Error)
    );

    Report { findings }
}
