//! Structural and referential checks for untrusted diagram blobs.

use crate::model::DiagramSchema;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// First problem found in a diagram blob.
#[derive(Debug, thiserror::Error)]
pub enum SchemaViolation {
    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("diagram must be a JSON object")]
    NotAnObject,
    #[error("\"{0}\" must be an array")]
    MissingArray(&'static str),
    #[error("table {index}: {problem}")]
    Table { index: usize, problem: &'static str },
    #[error("table {table}, column {index}: {problem}")]
    Column {
        table: usize,
        index: usize,
        problem: &'static str,
    },
    #[error("relationship {index} must be an object")]
    RelationshipShape { index: usize },
    #[error("relationship {index}: {field} does not resolve")]
    DanglingEndpoint { index: usize, field: &'static str },
    #[error("diagram does not decode: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Check `data` and report the first violation.
///
/// Structure is checked before referential integrity, so a dangling
/// endpoint is only reported for an otherwise well-formed blob.
pub fn check_diagram_schema(data: &Value) -> Result<(), SchemaViolation> {
    let root = data.as_object().ok_or(SchemaViolation::NotAnObject)?;
    let tables = array(root, "tables")?;
    let relationships = array(root, "relationships")?;

    let mut columns_by_table: HashMap<&str, HashSet<&str>> = HashMap::new();
    for (index, table) in tables.iter().enumerate() {
        let (id, columns) = check_table(index, table)?;
        columns_by_table.insert(id, columns);
    }

    for (index, rel) in relationships.iter().enumerate() {
        let rel = rel
            .as_object()
            .ok_or(SchemaViolation::RelationshipShape { index })?;
        for (table_field, column_field) in [
            ("sourceTableId", "sourceColumnId"),
            ("targetTableId", "targetColumnId"),
        ] {
            let columns = rel
                .get(table_field)
                .and_then(Value::as_str)
                .and_then(|id| columns_by_table.get(id))
                .ok_or(SchemaViolation::DanglingEndpoint {
                    index,
                    field: table_field,
                })?;
            let known = rel
                .get(column_field)
                .and_then(Value::as_str)
                .is_some_and(|id| columns.contains(id));
            if !known {
                return Err(SchemaViolation::DanglingEndpoint {
                    index,
                    field: column_field,
                });
            }
        }
    }
    Ok(())
}

pub fn validate_diagram_schema(data: &Value) -> bool {
    match check_diagram_schema(data) {
        Ok(()) => true,
        Err(violation) => {
            debug!(%violation, "rejected diagram");
            false
        }
    }
}

/// Parse, check and decode a persisted diagram blob.
pub fn load_diagram_schema(text: &str) -> Result<DiagramSchema, SchemaViolation> {
    let value: Value = serde_json::from_str(text).map_err(SchemaViolation::Syntax)?;
    check_diagram_schema(&value)?;
    serde_json::from_value(value).map_err(SchemaViolation::Decode)
}

fn array<'a>(
    root: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Vec<Value>, SchemaViolation> {
    root.get(key)
        .and_then(Value::as_array)
        .ok_or(SchemaViolation::MissingArray(key))
}

fn check_table(index: usize, table: &Value) -> Result<(&str, HashSet<&str>), SchemaViolation> {
    let fail = |problem| SchemaViolation::Table { index, problem };

    let table = table.as_object().ok_or(fail("not an object"))?;
    let id = table
        .get("id")
        .and_then(Value::as_str)
        .ok_or(fail("id must be a string"))?;
    if !table.get("name").is_some_and(Value::is_string) {
        return Err(fail("name must be a string"));
    }
    let position = table
        .get("position")
        .and_then(Value::as_object)
        .ok_or(fail("position must be an object"))?;
    let numeric = |key: &str| position.get(key).is_some_and(Value::is_number);
    if !numeric("x") || !numeric("y") {
        return Err(fail("position needs numeric x and y"));
    }
    let columns = table
        .get("columns")
        .and_then(Value::as_array)
        .ok_or(fail("columns must be an array"))?;

    let mut ids = HashSet::new();
    for (column_index, column) in columns.iter().enumerate() {
        let fail = |problem| SchemaViolation::Column {
            table: index,
            index: column_index,
            problem,
        };
        let column = column.as_object().ok_or(fail("not an object"))?;
        let column_id = column
            .get("id")
            .and_then(Value::as_str)
            .ok_or(fail("id must be a string"))?;
        for (key, problem) in [
            ("name", "name must be a string"),
            ("type", "type must be a string"),
        ] {
            if !column.get(key).is_some_and(Value::is_string) {
                return Err(fail(problem));
            }
        }
        if !column.get("constraints").is_some_and(Value::is_object) {
            return Err(fail("constraints must be an object"));
        }
        ids.insert(column_id);
    }
    Ok((id, ids))
}
