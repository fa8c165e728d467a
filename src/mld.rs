//! Logical data model (MLD) and the MCD → MLD lowering.

use crate::mcd::{
    Association, AssociationId, Attribute, EntityId, Graph, Link, MaxCard, MinCard, SqlType,
};
use crate::naming::{NameSet, canonical};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Derived 1:1 from an entity.
    Entity(EntityId),
    /// Generated for an N-N or N-ary association.
    Junction(AssociationId),
}

/// Reference to a column of another table, by canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Name used in emitted SQL. Equal to `canonical` until an override applies.
    pub name: String,
    pub canonical: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    fn new(canonical: String, sql_type: SqlType) -> Self {
        Self {
            name: canonical.clone(),
            canonical,
            sql_type,
            nullable: true,
            is_primary_key: false,
            foreign_key: None,
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_foreign_key())
    }

    /// Look a column up by canonical name.
    pub fn column(&self, canonical: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.canonical == canonical)
    }

    pub fn is_junction(&self) -> bool {
        matches!(self.kind, TableKind::Junction(_))
    }

    pub fn source_type(&self) -> &'static str {
        match self.kind {
            TableKind::Entity(_) => "entity",
            TableKind::Junction(_) => "association",
        }
    }
}

/// Tables in emission order: entity tables in declaration order, then
/// junction tables in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalModel {
    pub tables: Vec<Table>,
}

impl LogicalModel {
    pub fn from_graph(graph: &Graph) -> Self {
        Lowering::new(graph).run()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// The column a foreign key points at.
    pub fn resolve(&self, fk: &ForeignKey) -> Option<&Column> {
        self.table(&fk.table)?.column(&fk.column)
    }
}

/// Lower a conceptual graph into its logical model.
///
/// The graph is expected to have passed validation; associations with fewer
/// than two links are skipped rather than rejected.
pub fn transform(graph: &Graph) -> LogicalModel {
    LogicalModel::from_graph(graph)
}

/// Shape of an association, decided once from its links.
enum Shape<'g> {
    /// Foreign key goes on the `one` side, pointing at `many`.
    OneToMany { one: &'g Link, many: &'g Link },
    ManyToMany([&'g Link; 2]),
    NAry(Vec<&'g Link>),
    /// Both sides max 1; `holder` was picked by the tie-break rule.
    OneToOne { holder: &'g Link, target: &'g Link },
    Unconnected,
}

fn classify<'g>(graph: &Graph, links: &[&'g Link]) -> Shape<'g> {
    match links {
        [] | [_] => Shape::Unconnected,
        &[a, b] => match (a.cardinality.max, b.cardinality.max) {
            (MaxCard::One, MaxCard::Many) => Shape::OneToMany { one: a, many: b },
            (MaxCard::Many, MaxCard::One) => Shape::OneToMany { one: b, many: a },
            (MaxCard::Many, MaxCard::Many) => Shape::ManyToMany([a, b]),
            (MaxCard::One, MaxCard::One) => {
                let (holder, target) = one_to_one_holder(graph, a, b);
                Shape::OneToOne { holder, target }
            }
        },
        _ => Shape::NAry(links.to_vec()),
    }
}

/// A mandatory side (min 1) holds the key when the other side is optional.
/// Otherwise the entity whose name sorts first does, then the older link.
fn one_to_one_holder<'g>(graph: &Graph, a: &'g Link, b: &'g Link) -> (&'g Link, &'g Link) {
    match (a.cardinality.min, b.cardinality.min) {
        (MinCard::One, MinCard::Zero) => return (a, b),
        (MinCard::Zero, MinCard::One) => return (b, a),
        _ => {}
    }
    if participant_key(graph, a) <= participant_key(graph, b) {
        (a, b)
    } else {
        (b, a)
    }
}

fn participant_key<'g>(graph: &'g Graph, link: &Link) -> (&'g str, crate::mcd::LinkId) {
    let name = graph
        .entity(link.entity)
        .map(|e| e.name.as_str())
        .unwrap_or_default();
    (name, link.id)
}

struct Lowering<'g> {
    graph: &'g Graph,
    tables: Vec<Table>,
    table_names: NameSet,
    column_names: Vec<NameSet>,
    entity_tables: HashMap<EntityId, usize>,
}

impl<'g> Lowering<'g> {
    fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            tables: Vec::new(),
            table_names: NameSet::new(),
            column_names: Vec::new(),
            entity_tables: HashMap::new(),
        }
    }

    fn run(mut self) -> LogicalModel {
        let graph = self.graph;
        for entity in graph.entities() {
            let name = self.table_name(&entity.name, "entity");
            let index = self.push_table(name, TableKind::Entity(entity.id));
            for attr in &entity.attributes {
                self.push_attribute(index, attr);
            }
            self.entity_tables.insert(entity.id, index);
        }

        for association in graph.associations() {
            let links: Vec<&Link> = graph.links_for_association(association.id).collect();
            let shape = classify(graph, &links);
            log::debug!("association '{}' classified as {}", association.name, shape_name(&shape));

            match shape {
                Shape::OneToMany { one, many } => {
                    self.absorb(association, one, many);
                }
                Shape::OneToOne { holder, target } => {
                    log::debug!(
                        "one-to-one association '{}': foreign key placed on {}",
                        association.name,
                        holder.entity
                    );
                    self.absorb(association, holder, target);
                }
                Shape::ManyToMany(pair) => {
                    self.junction(association, pair.to_vec());
                }
                Shape::NAry(links) => {
                    self.junction(association, links);
                }
                Shape::Unconnected => {
                    log::warn!(
                        "association '{}' has {} link(s), skipped",
                        association.name,
                        links.len()
                    );
                }
            }
        }

        LogicalModel {
            tables: self.tables,
        }
    }

    fn table_name(&mut self, name: &str, fallback: &str) -> String {
        let base = canonical(name);
        if base.is_empty() {
            self.table_names.claim(fallback)
        } else {
            self.table_names.claim(&base)
        }
    }

    fn push_table(&mut self, name: String, kind: TableKind) -> usize {
        self.tables.push(Table {
            name,
            kind,
            columns: Vec::new(),
        });
        self.column_names.push(NameSet::new());
        self.tables.len() - 1
    }

    fn push_column(&mut self, table: usize, base: &str, mut column: Column) {
        let name = self.column_names[table].claim(base);
        column.name = name.clone();
        column.canonical = name;
        self.tables[table].columns.push(column);
    }

    fn push_attribute(&mut self, table: usize, attr: &Attribute) {
        let mut column = Column::new(attr.name.clone(), attr.sql_type);
        column.is_primary_key = attr.is_primary_key;
        column.nullable = !attr.is_primary_key;
        self.push_column(table, &attr.name, column);
    }

    /// Add one foreign key column per primary key column of `target`'s table.
    fn push_reference(&mut self, table: usize, target: EntityId, nullable: bool, primary: bool) {
        let Some(&target_index) = self.entity_tables.get(&target) else {
            return;
        };
        let target_table = &self.tables[target_index];
        let target_name = target_table.name.clone();
        let keys: Vec<(String, SqlType)> = target_table
            .primary_key()
            .map(|c| (c.canonical.clone(), c.sql_type))
            .collect();

        for (key, sql_type) in keys {
            let mut column = Column::new(key.clone(), sql_type);
            column.nullable = nullable;
            column.is_primary_key = primary;
            column.foreign_key = Some(ForeignKey {
                table: target_name.clone(),
                column: key.clone(),
            });
            self.push_column(table, &key, column);
        }
    }

    /// Binary association without a table: the holder's table gets the
    /// foreign key and the carrying attributes.
    fn absorb(&mut self, association: &Association, holder: &Link, target: &Link) {
        let Some(&table) = self.entity_tables.get(&holder.entity) else {
            return;
        };
        self.push_reference(table, target.entity, holder.cardinality.is_optional(), false);
        for attr in &association.attributes {
            self.push_attribute(table, attr);
        }
    }

    fn junction(&mut self, association: &Association, mut links: Vec<&Link>) {
        let graph = self.graph;
        links.sort_by(|a, b| participant_key(graph, a).cmp(&participant_key(graph, b)));

        let name = if canonical(&association.name).is_empty() {
            let names: Vec<&str> = links.iter().map(|l| participant_key(graph, l).0).collect();
            self.table_name(&names.join("_"), "association")
        } else {
            self.table_name(&association.name, "association")
        };

        let table = self.push_table(name, TableKind::Junction(association.id));
        for link in &links {
            self.push_reference(table, link.entity, link.cardinality.is_optional(), true);
        }
        for attr in &association.attributes {
            self.push_attribute(table, attr);
        }
    }
}

fn shape_name(shape: &Shape<'_>) -> &'static str {
    match shape {
        Shape::OneToMany { .. } => "one-to-many",
        Shape::ManyToMany(_) => "many-to-many",
        Shape::NAry(_) => "n-ary",
        Shape::OneToOne { .. } => "one-to-one",
        Shape::Unconnected => "unconnected",
    }
}
