//! Conceptual data model (MCD): entities, associations and the links between them.
//!
//! The graph is bipartite. Links only ever join one entity to one association,
//! and they refer to both endpoints by id so the arenas own every node.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),
    #[error("Unknown association: {0}")]
    UnknownAssociation(AssociationId),
    #[error("Duplicate attribute '{attribute}' in '{owner}'")]
    DuplicateAttribute { owner: String, attribute: String },
    #[error("Association '{association}' cannot carry primary key attribute '{attribute}'")]
    AssociationKey {
        association: String,
        attribute: String,
    },
    #[error("Attribute '{0}' already exists in the dictionary")]
    DuplicateDictionaryEntry(String),
    #[error("Attribute '{0}' not found in the dictionary")]
    MissingDictionaryEntry(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AssociationId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LinkId(u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl fmt::Display for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Conceptual attribute types. Sized types carry their size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SqlType {
    Int,
    BigInt,
    SmallInt,
    Varchar(u32),
    Char(u32),
    Text,
    Boolean,
    Date,
    Time,
    Timestamp,
    Decimal(u32),
    Float,
    Double,
}

impl SqlType {
    /// Build a type from its dictionary name and optional size.
    ///
    /// Returns `None` when the name is unknown or when the size is missing
    /// for VARCHAR, CHAR and DECIMAL (or given for any other type).
    pub fn from_parts(name: &str, size: Option<u32>) -> Option<Self> {
        let typ = match (name.to_uppercase().as_str(), size) {
            ("VARCHAR", Some(n)) => Self::Varchar(n),
            ("CHAR", Some(n)) => Self::Char(n),
            ("DECIMAL", Some(n)) => Self::Decimal(n),
            (_, Some(_)) => return None,
            ("INT", None) => Self::Int,
            ("BIGINT", None) => Self::BigInt,
            ("SMALLINT", None) => Self::SmallInt,
            ("TEXT", None) => Self::Text,
            ("BOOLEAN", None) => Self::Boolean,
            ("DATE", None) => Self::Date,
            ("TIME", None) => Self::Time,
            ("TIMESTAMP", None) => Self::Timestamp,
            ("FLOAT", None) => Self::Float,
            ("DOUBLE", None) => Self::Double,
            _ => return None,
        };
        Some(typ)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::BigInt => "BIGINT",
            Self::SmallInt => "SMALLINT",
            Self::Varchar(_) => "VARCHAR",
            Self::Char(_) => "CHAR",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Decimal(_) => "DECIMAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
        }
    }

    pub fn size(&self) -> Option<u32> {
        match self {
            Self::Varchar(n) | Self::Char(n) | Self::Decimal(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size() {
            Some(n) => write!(f, "{}({})", self.name(), n),
            None => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            is_primary_key: false,
        }
    }

    pub fn primary_key(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            is_primary_key: true,
            ..Self::new(name, sql_type)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MinCard {
    Zero,
    One,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MaxCard {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cardinality {
    pub min: MinCard,
    pub max: MaxCard,
}

impl Cardinality {
    pub const ZERO_ONE: Self = Self::new(MinCard::Zero, MaxCard::One);
    pub const ONE_ONE: Self = Self::new(MinCard::One, MaxCard::One);
    pub const ZERO_MANY: Self = Self::new(MinCard::Zero, MaxCard::Many);
    pub const ONE_MANY: Self = Self::new(MinCard::One, MaxCard::Many);

    pub const fn new(min: MinCard, max: MaxCard) -> Self {
        Self { min, max }
    }

    /// Parse the "0"/"1" and "1"/"N" notation used in project files.
    pub fn parse(min: &str, max: &str) -> Option<Self> {
        let min = match min.trim() {
            "0" => MinCard::Zero,
            "1" => MinCard::One,
            _ => return None,
        };
        let max = match max.trim() {
            "1" => MaxCard::One,
            "N" | "n" => MaxCard::Many,
            _ => return None,
        };
        Some(Self { min, max })
    }

    pub fn is_optional(&self) -> bool {
        self.min == MinCard::Zero
    }

    pub fn is_multiple(&self) -> bool {
        self.max == MaxCard::Many
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = match self.min {
            MinCard::Zero => "0",
            MinCard::One => "1",
        };
        let max = match self.max {
            MaxCard::One => "1",
            MaxCard::Many => "N",
        };
        write!(f, "{},{}", min, max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub fn primary_key(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is_primary_key)
    }

    pub fn has_primary_key(&self) -> bool {
        self.attributes.iter().any(|a| a.is_primary_key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub id: AssociationId,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub entity: EntityId,
    pub association: AssociationId,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub entities: usize,
    pub associations: usize,
    pub links: usize,
    pub attributes: usize,
}

/// The conceptual graph.
///
/// Ids are allocated from a single increasing counter, so iterating an arena
/// yields its nodes in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    entities: BTreeMap<EntityId, Entity>,
    associations: BTreeMap<AssociationId, Association>,
    links: BTreeMap<LinkId, Link>,
    next_id: u32,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_entity(
        &mut self,
        name: impl Into<String>,
        attributes: Vec<Attribute>,
    ) -> Result<EntityId, GraphError> {
        let name = name.into();
        check_unique_attributes(&name, &attributes)?;

        let id = EntityId(self.allocate());
        self.entities.insert(
            id,
            Entity {
                id,
                name,
                attributes,
            },
        );
        Ok(id)
    }

    pub fn add_association(
        &mut self,
        name: impl Into<String>,
        attributes: Vec<Attribute>,
    ) -> Result<AssociationId, GraphError> {
        let name = name.into();
        check_unique_attributes(&name, &attributes)?;
        if let Some(key) = attributes.iter().find(|a| a.is_primary_key) {
            return Err(GraphError::AssociationKey {
                association: name,
                attribute: key.name.clone(),
            });
        }

        let id = AssociationId(self.allocate());
        self.associations.insert(
            id,
            Association {
                id,
                name,
                attributes,
            },
        );
        Ok(id)
    }

    pub fn add_link(
        &mut self,
        entity: EntityId,
        association: AssociationId,
        cardinality: Cardinality,
    ) -> Result<LinkId, GraphError> {
        if !self.entities.contains_key(&entity) {
            return Err(GraphError::UnknownEntity(entity));
        }
        if !self.associations.contains_key(&association) {
            return Err(GraphError::UnknownAssociation(association));
        }

        let id = LinkId(self.allocate());
        self.links.insert(
            id,
            Link {
                id,
                entity,
                association,
                cardinality,
            },
        );
        Ok(id)
    }

    /// Remove an entity together with every link that references it.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.links.retain(|_, link| link.entity != id);
        Some(entity)
    }

    /// Remove an association together with every link that references it.
    pub fn remove_association(&mut self, id: AssociationId) -> Option<Association> {
        let association = self.associations.remove(&id)?;
        self.links.retain(|_, link| link.association != id);
        Some(association)
    }

    pub fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        self.links.remove(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn association(&self, id: AssociationId) -> Option<&Association> {
        self.associations.get(&id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn links_for_entity(&self, id: EntityId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.entity == id)
    }

    pub fn links_for_association(&self, id: AssociationId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.association == id)
    }

    pub fn statistics(&self) -> Statistics {
        let attributes: HashSet<&str> = self
            .entities
            .values()
            .flat_map(|e| e.attributes.iter())
            .chain(self.associations.values().flat_map(|a| a.attributes.iter()))
            .map(|a| a.name.as_str())
            .collect();

        Statistics {
            entities: self.entities.len(),
            associations: self.associations.len(),
            links: self.links.len(),
            attributes: attributes.len(),
        }
    }
}

fn check_unique_attributes(owner: &str, attributes: &[Attribute]) -> Result<(), GraphError> {
    let mut seen = HashSet::new();
    for attr in attributes {
        if !seen.insert(attr.name.as_str()) {
            return Err(GraphError::DuplicateAttribute {
                owner: owner.to_string(),
                attribute: attr.name.clone(),
            });
        }
    }
    Ok(())
}

/// Project-wide attribute dictionary. Entities and associations pick their
/// attributes from it by name.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    attributes: Vec<Attribute>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: Attribute) -> Result<(), GraphError> {
        if self.get(&attribute.name).is_some() {
            return Err(GraphError::DuplicateDictionaryEntry(attribute.name));
        }
        self.attributes.push(attribute);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Replace an entry in place, possibly renaming it.
    pub fn update(&mut self, name: &str, attribute: Attribute) -> Result<(), GraphError> {
        if attribute.name != name && self.get(&attribute.name).is_some() {
            return Err(GraphError::DuplicateDictionaryEntry(attribute.name));
        }
        let slot = self
            .attributes
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| GraphError::MissingDictionaryEntry(name.to_string()))?;
        *slot = attribute;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_from_parts() {
        assert_eq!(SqlType::from_parts("INT", None), Some(SqlType::Int));
        assert_eq!(SqlType::from_parts("varchar", Some(100)), Some(SqlType::Varchar(100)));
        assert_eq!(SqlType::from_parts("VARCHAR", None), None);
        assert_eq!(SqlType::from_parts("INT", Some(4)), None);
        assert_eq!(SqlType::from_parts("UUID", None), None);
        assert_eq!(SqlType::Varchar(100).to_string(), "VARCHAR(100)");
        assert_eq!(SqlType::Date.to_string(), "DATE");
    }

    #[test]
    fn test_cardinality_parse() {
        let card = Cardinality::parse("1", "N").unwrap();
        assert_eq!(card, Cardinality::ONE_MANY);
        assert!(card.is_multiple());
        assert!(!card.is_optional());
        assert_eq!(card.to_string(), "1,N");

        let card = Cardinality::parse("0", "1").unwrap();
        assert!(!card.is_multiple());
        assert!(card.is_optional());

        assert_eq!(Cardinality::parse("2", "N"), None);
        assert_eq!(Cardinality::parse("0", "*"), None);
    }

    #[test]
    fn test_duplicate_entity_attribute_rejected() {
        let mut graph = Graph::new();
        let result = graph.add_entity(
            "Client",
            vec![
                Attribute::primary_key("id", SqlType::Int),
                Attribute::new("id", SqlType::Text),
            ],
        );
        assert!(matches!(result, Err(GraphError::DuplicateAttribute { .. })));
        assert_eq!(graph.entities().count(), 0);
    }

    #[test]
    fn test_association_key_rejected() {
        let mut graph = Graph::new();
        let result =
            graph.add_association("Passer", vec![Attribute::primary_key("id", SqlType::Int)]);
        assert!(matches!(result, Err(GraphError::AssociationKey { .. })));
    }

    #[test]
    fn test_link_requires_endpoints() {
        let mut graph = Graph::new();
        let client = graph.add_entity("Client", vec![]).unwrap();
        let passer = graph.add_association("Passer", vec![]).unwrap();

        graph.remove_entity(client);
        assert_eq!(
            graph.add_link(client, passer, Cardinality::ONE_MANY),
            Err(GraphError::UnknownEntity(client))
        );
    }

    #[test]
    fn test_remove_entity_removes_links() {
        let mut graph = Graph::new();
        let client = graph.add_entity("Client", vec![]).unwrap();
        let passer = graph.add_association("Passer", vec![]).unwrap();
        graph.add_link(client, passer, Cardinality::ONE_MANY).unwrap();
        assert_eq!(graph.links().count(), 1);

        graph.remove_entity(client);
        assert_eq!(graph.entities().count(), 0);
        assert_eq!(graph.links().count(), 0);
        assert_eq!(graph.links_for_association(passer).count(), 0);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let mut graph = Graph::new();
        graph.add_entity("Zebra", vec![]).unwrap();
        graph.add_association("Between", vec![]).unwrap();
        graph.add_entity("Apple", vec![]).unwrap();

        let names: Vec<&str> = graph.entities().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zebra", "Apple"]);
    }

    #[test]
    fn test_statistics() {
        let mut graph = Graph::new();
        let client = graph
            .add_entity(
                "Client",
                vec![
                    Attribute::primary_key("id_client", SqlType::Int),
                    Attribute::new("nom", SqlType::Varchar(100)),
                ],
            )
            .unwrap();
        let commande = graph
            .add_entity("Commande", vec![Attribute::primary_key("id_commande", SqlType::Int)])
            .unwrap();
        let passer = graph
            .add_association("Passer", vec![Attribute::new("nom", SqlType::Varchar(100))])
            .unwrap();
        graph.add_link(client, passer, Cardinality::ZERO_MANY).unwrap();
        graph.add_link(commande, passer, Cardinality::ONE_ONE).unwrap();

        let stats = graph.statistics();
        assert_eq!(stats.entities, 2);
        assert_eq!(stats.associations, 1);
        assert_eq!(stats.links, 2);
        assert_eq!(stats.attributes, 3);
    }

    #[test]
    fn test_dictionary() {
        let mut dictionary = Dictionary::new();
        dictionary.add(Attribute::primary_key("id", SqlType::Int)).unwrap();
        assert_eq!(
            dictionary.add(Attribute::new("id", SqlType::Varchar(50))),
            Err(GraphError::DuplicateDictionaryEntry("id".to_string()))
        );
        assert_eq!(dictionary.len(), 1);

        dictionary
            .update("id", Attribute::new("new_name", SqlType::Varchar(100)))
            .unwrap();
        assert!(dictionary.get("id").is_none());
        assert_eq!(dictionary.get("new_name").unwrap().sql_type, SqlType::Varchar(100));
        assert!(dictionary.update("missing", Attribute::new("x", SqlType::Int)).is_err());
    }
}
