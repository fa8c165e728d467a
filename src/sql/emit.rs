//! DDL generation from a logical model.

use super::Dialect;
use super::types::map_type;
use crate::mld::{Column, LogicalModel, Table};
use std::collections::HashMap;

/// Render `model` as a DDL script.
///
/// Tables are created in model order. A foreign key whose target table is
/// created later is added with `ALTER TABLE` once every table exists.
pub fn emit_sql(model: &LogicalModel, dialect: Dialect) -> String {
    let mut output = format!("-- Generated by merisio ({})\n", dialect);

    let positions: HashMap<&str, usize> = model
        .tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    let mut deferred: Vec<String> = Vec::new();

    for (index, table) in model.tables.iter().enumerate() {
        let mut clauses: Vec<String> = table
            .columns
            .iter()
            .map(|c| column_clause(c, dialect))
            .collect();

        let pk: Vec<String> = table
            .primary_key()
            .map(|c| dialect.quote_ident(&c.name))
            .collect();
        if !pk.is_empty() {
            clauses.push(format!("PRIMARY KEY ({})", pk.join(", ")));
        }

        for column in table.foreign_keys() {
            let Some(constraint) = foreign_key_clause(model, column, dialect) else {
                continue;
            };
            let target = column.foreign_key.as_ref().map(|fk| fk.table.as_str());
            let defined = target
                .and_then(|t| positions.get(t))
                .is_some_and(|&pos| pos <= index);
            if defined {
                clauses.push(constraint);
            } else {
                deferred.push(format!(
                    "ALTER TABLE {} ADD {};\n",
                    dialect.quote_ident(&table.name),
                    constraint
                ));
            }
        }

        output.push('\n');
        output.push_str(&create_table(table, &clauses, dialect));
    }

    if !deferred.is_empty() {
        output.push('\n');
        for statement in deferred {
            output.push_str(&statement);
        }
    }

    output
}

fn create_table(table: &Table, clauses: &[String], dialect: Dialect) -> String {
    let mut output = format!("CREATE TABLE {} (\n", dialect.quote_ident(&table.name));
    for (i, clause) in clauses.iter().enumerate() {
        output.push_str("    ");
        output.push_str(clause);
        if i + 1 < clauses.len() {
            output.push(',');
        }
        output.push('\n');
    }
    output.push_str(");\n");
    output
}

fn column_clause(column: &Column, dialect: Dialect) -> String {
    let mut clause = format!(
        "{} {}",
        dialect.quote_ident(&column.name),
        map_type(column.sql_type, dialect)
    );
    if !column.nullable {
        clause.push_str(" NOT NULL");
    }
    clause
}

/// FOREIGN KEY clause with both ends under their display names.
fn foreign_key_clause(model: &LogicalModel, column: &Column, dialect: Dialect) -> Option<String> {
    let fk = column.foreign_key.as_ref()?;
    let target_column = match model.resolve(fk) {
        Some(target) => target.name.as_str(),
        None => {
            log::warn!(
                "foreign key {} -> {}.{} has no target column",
                column.canonical,
                fk.table,
                fk.column
            );
            fk.column.as_str()
        }
    };
    Some(format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        dialect.quote_ident(&column.name),
        dialect.quote_ident(&fk.table),
        dialect.quote_ident(target_column)
    ))
}
