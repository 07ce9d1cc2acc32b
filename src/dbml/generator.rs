//! Canonical graph to DBML text.

use super::types::to_dbml;
use crate::model::{Cardinality, Column, DiagramSchema, Table};
use tracing::{debug, debug_span, trace};

/// Render a schema as DBML.
pub fn generate_dbml(schema: &DiagramSchema) -> String {
    let span = debug_span!("generate_dbml", tables = schema.tables.len());
    let _enter = span.enter();

    let mut blocks: Vec<String> = schema.tables.iter().map(serialize_table).collect();

    let refs: Vec<String> = schema
        .relationships
        .iter()
        .filter_map(|rel| {
            let Some((source_table, source_column)) = schema.resolve(&rel.source) else {
                trace!(id = %rel.id, "skipping relationship with unknown source");
                return None;
            };
            let Some((target_table, target_column)) = schema.resolve(&rel.target) else {
                trace!(id = %rel.id, "skipping relationship with unknown target");
                return None;
            };
            Some(format!(
                "Ref: {}.{} {} {}.{}",
                quote_name(&source_table.name),
                quote_name(&source_column.name),
                ref_symbol(rel.cardinality),
                quote_name(&target_table.name),
                quote_name(&target_column.name),
            ))
        })
        .collect();
    if !refs.is_empty() {
        blocks.push(refs.join("\n"));
    }

    debug!(blocks = blocks.len(), refs = refs.len(), "generated DBML");

    if blocks.is_empty() {
        return String::new();
    }
    let mut output = blocks.join("\n\n");
    output.push('\n');
    output
}

fn serialize_table(table: &Table) -> String {
    let mut output = format!("Table {} {{\n", quote_name(&table.name));
    for column in &table.columns {
        serialize_column(&mut output, column);
    }
    output.push('}');
    output
}

fn serialize_column(output: &mut String, column: &Column) {
    output.push_str("  ");
    output.push_str(&quote_name(&column.name));
    output.push(' ');
    output.push_str(to_dbml(column.typ));

    let c = &column.constraints;
    let mut settings = Vec::new();
    if c.is_primary_key {
        settings.push("pk");
    } else {
        if c.is_unique {
            settings.push("unique");
        }
        if !c.is_nullable {
            settings.push("not null");
        }
    }
    if !settings.is_empty() {
        output.push_str(" [");
        output.push_str(&settings.join(", "));
        output.push(']');
    }
    output.push('\n');
}

/// `<` keeps the source on the left; `>` would flip it on re-parse.
fn ref_symbol(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::OneToOne => "-",
        Cardinality::OneToMany => "<",
        Cardinality::ManyToMany => "<>",
    }
}

fn quote_name(name: &str) -> String {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}
