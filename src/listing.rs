//! Plain-text listing of a logical model, one block per table.

use crate::mld::{Column, LogicalModel, Table};
use unicode_width::UnicodeWidthStr;

/// Render every table with its columns aligned and their key flags.
pub fn render(model: &LogicalModel) -> String {
    if model.tables.is_empty() {
        return "No tables generated.\n".to_string();
    }

    let mut output = String::new();
    for (i, table) in model.tables.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        render_table(&mut output, model, table);
    }
    output
}

fn render_table(output: &mut String, model: &LogicalModel, table: &Table) {
    output.push_str(&format!("{} ({})\n", table.name, table.source_type()));

    let name_width = table
        .columns
        .iter()
        .map(|c| UnicodeWidthStr::width(c.name.as_str()))
        .max()
        .unwrap_or(0);
    let types: Vec<String> = table.columns.iter().map(|c| c.sql_type.to_string()).collect();
    let type_width = types.iter().map(|t| t.len()).max().unwrap_or(0);

    for (column, typ) in table.columns.iter().zip(&types) {
        let flags = flags(model, column);
        let mut line = format!("  {}{} {}", column.name, pad(&column.name, name_width), typ);
        if !flags.is_empty() {
            line.push_str(&" ".repeat(type_width - typ.len()));
            line.push_str(&format!("  [{}]", flags.join(", ")));
        }
        output.push_str(&line);
        output.push('\n');
    }
}

fn pad(text: &str, width: usize) -> String {
    " ".repeat(width.saturating_sub(UnicodeWidthStr::width(text)))
}

fn flags(model: &LogicalModel, column: &Column) -> Vec<String> {
    let mut flags = Vec::new();
    if column.is_primary_key {
        flags.push("PK".to_string());
    }
    if let Some(fk) = &column.foreign_key {
        let target = model
            .resolve(fk)
            .map(|c| c.name.as_str())
            .unwrap_or(fk.column.as_str());
        flags.push(format!("FK -> {}.{}", fk.table, target));
    }
    if !column.nullable {
        flags.push("NOT NULL".to_string());
    }
    flags
}
