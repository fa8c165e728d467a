//! Loading `.merisio` project documents (JSON) into a conceptual graph.

use crate::mcd::{
    Attribute, Cardinality, Dictionary, EntityId, Graph, GraphError, SqlType, Statistics,
};
use crate::overrides::ColumnOverrides;
use crate::validate::{self, Finding, Report, Rule, Severity, Subject, ValidationPolicy};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Attribute '{name}' has invalid type {data_type} (size {size:?})")]
    InvalidType {
        name: String,
        data_type: String,
        size: Option<u32>,
    },
    #[error("'{owner}' references unknown attribute '{attribute}'")]
    UnknownAttribute { owner: String, attribute: String },
    #[error("Link references unknown entity '{0}'")]
    UnknownEntity(String),
    #[error("Link references unknown association '{0}'")]
    UnknownAssociation(String),
    #[error("Invalid cardinality {min},{max}")]
    InvalidCardinality { min: String, max: String },
    #[error("Duplicate id '{0}'")]
    DuplicateId(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Deserialize)]
struct ProjectDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    modified_at: String,
    #[serde(default)]
    dictionary: Vec<AttributeDocument>,
    #[serde(default)]
    entities: Vec<NodeDocument>,
    #[serde(default)]
    associations: Vec<NodeDocument>,
    #[serde(default)]
    links: Vec<LinkDocument>,
    #[serde(default)]
    column_overrides: ColumnOverrides,
}

#[derive(Debug, Deserialize)]
struct AttributeDocument {
    name: String,
    data_type: String,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    is_primary_key: bool,
}

/// Entity or association; layout fields are ignored.
#[derive(Debug, Deserialize)]
struct NodeDocument {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    attributes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LinkDocument {
    entity_id: String,
    association_id: String,
    #[serde(default = "default_min")]
    cardinality_min: String,
    #[serde(default = "default_max")]
    cardinality_max: String,
}

fn default_min() -> String {
    "0".to_string()
}

fn default_max() -> String {
    "N".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub author: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub metadata: Metadata,
    pub dictionary: Dictionary,
    pub graph: Graph,
    pub overrides: ColumnOverrides,
}

impl Project {
    pub fn from_json(input: &str) -> Result<Self, ProjectError> {
        let doc: ProjectDocument = serde_json::from_str(input)?;

        let mut dictionary = Dictionary::new();
        for attr in doc.dictionary {
            let sql_type = SqlType::from_parts(&attr.data_type, attr.size).ok_or_else(|| {
                ProjectError::InvalidType {
                    name: attr.name.clone(),
                    data_type: attr.data_type.clone(),
                    size: attr.size,
                }
            })?;
            dictionary.add(Attribute {
                name: attr.name,
                sql_type,
                is_primary_key: attr.is_primary_key,
            })?;
        }

        let mut graph = Graph::new();
        let mut entities: HashMap<String, EntityId> = HashMap::new();
        for node in &doc.entities {
            let attributes = resolve_attributes(&dictionary, node)?;
            let id = graph.add_entity(node.name.clone(), attributes)?;
            if entities.insert(node.id.clone(), id).is_some() {
                return Err(ProjectError::DuplicateId(node.id.clone()));
            }
        }

        let mut associations = HashMap::new();
        for node in &doc.associations {
            let attributes = resolve_attributes(&dictionary, node)?
                .into_iter()
                .map(|attr| Attribute {
                    is_primary_key: false,
                    ..attr
                })
                .collect();
            let id = graph.add_association(node.name.clone(), attributes)?;
            if entities.contains_key(&node.id)
                || associations.insert(node.id.clone(), id).is_some()
            {
                return Err(ProjectError::DuplicateId(node.id.clone()));
            }
        }

        for link in &doc.links {
            let entity = *entities
                .get(&link.entity_id)
                .ok_or_else(|| ProjectError::UnknownEntity(link.entity_id.clone()))?;
            let association = *associations
                .get(&link.association_id)
                .ok_or_else(|| ProjectError::UnknownAssociation(link.association_id.clone()))?;
            let cardinality = Cardinality::parse(&link.cardinality_min, &link.cardinality_max)
                .ok_or_else(|| ProjectError::InvalidCardinality {
                    min: link.cardinality_min.clone(),
                    max: link.cardinality_max.clone(),
                })?;
            graph.add_link(entity, association, cardinality)?;
        }

        log::debug!(
            "loaded project '{}': {} entities, {} associations, {} links",
            doc.name,
            doc.entities.len(),
            doc.associations.len(),
            doc.links.len()
        );

        Ok(Self {
            metadata: Metadata {
                name: doc.name,
                author: doc.author,
                description: doc.description,
                created_at: doc.created_at,
                modified_at: doc.modified_at,
            },
            dictionary,
            graph,
            overrides: doc.column_overrides,
        })
    }

    /// Graph rules plus the project-level dictionary check, which comes first.
    /// Generation is gated on the graph rules alone.
    pub fn validate_with(&self, policy: &ValidationPolicy) -> Report {
        let mut report = Report::default();
        if self.dictionary.is_empty() {
            report.findings.push(Finding {
                severity: Severity::Error,
                rule: Rule::EmptyDictionary,
                subject: Subject::Project,
                name: self.metadata.name.clone(),
            });
        }
        report
            .findings
            .extend(validate::validate_with(&self.graph, policy).findings);
        report
    }

    /// Graph counts, with attributes counted over the whole dictionary.
    pub fn statistics(&self) -> Statistics {
        Statistics {
            attributes: self.dictionary.len(),
            ..self.graph.statistics()
        }
    }
}

fn resolve_attributes(
    dictionary: &Dictionary,
    node: &NodeDocument,
) -> Result<Vec<Attribute>, ProjectError> {
    node.attributes
        .iter()
        .map(|name| {
            dictionary
                .get(name)
                .cloned()
                .ok_or_else(|| ProjectError::UnknownAttribute {
                    owner: node.name.clone(),
                    attribute: name.clone(),
                })
        })
        .collect()
}
