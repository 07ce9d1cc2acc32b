pub mod canvas;
pub mod dbml;
pub mod layout;
pub mod logging;
pub mod model;
pub mod sql;
pub mod text;
pub mod validate;

use wasm_bindgen::prelude::*;

use canvas::{CanvasEdge, CanvasNode};
use model::DiagramSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sql::Dialect;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn from_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {}: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn dialect(name: Option<String>) -> Result<Dialect, String> {
    match name.as_deref() {
        None => Ok(Dialect::default()),
        Some(name) => name.parse::<Dialect>().map_err(|e| e.to_string()),
    }
}

/// Parse SQL DDL into `{tables, relationships, errors}` JSON.
#[wasm_bindgen(js_name = "parseSqlDdl")]
pub fn parse_sql_ddl(source: &str, dialect_name: Option<String>) -> Result<String, String> {
    to_json(&sql::parse_sql(source, dialect(dialect_name)?))
}

/// Parse DBML into `{tables, relationships, errors}` JSON.
#[wasm_bindgen(js_name = "parseDbml")]
pub fn parse_dbml(source: &str) -> Result<String, String> {
    to_json(&dbml::parse_dbml(source))
}

#[wasm_bindgen(js_name = "generateSql")]
pub fn generate_sql(schema_json: &str, dialect_name: Option<String>) -> Result<String, String> {
    let schema: DiagramSchema = from_json("schema", schema_json)?;
    Ok(sql::generate_sql(&schema, dialect(dialect_name)?))
}

#[wasm_bindgen(js_name = "generateDbml")]
pub fn generate_dbml(schema_json: &str) -> Result<String, String> {
    let schema: DiagramSchema = from_json("schema", schema_json)?;
    Ok(dbml::generate_dbml(&schema))
}

/// Canvas nodes and edges to a persisted diagram blob.
#[wasm_bindgen(js_name = "serializeDiagram")]
pub fn serialize_diagram(nodes_json: &str, edges_json: &str) -> Result<String, String> {
    let nodes: Vec<CanvasNode> = from_json("nodes", nodes_json)?;
    let edges: Vec<CanvasEdge> = from_json("edges", edges_json)?;
    to_json(&canvas::serialize_diagram(&nodes, &edges))
}

/// Persisted diagram blob to `{nodes, edges}`.
#[wasm_bindgen(js_name = "deserializeDiagram")]
pub fn deserialize_diagram(schema_json: &str) -> Result<String, String> {
    let schema: DiagramSchema = from_json("schema", schema_json)?;
    to_json(&canvas::deserialize_diagram(&schema))
}

/// `false` for malformed JSON as well as for an invalid diagram.
#[wasm_bindgen(js_name = "validateDiagramSchema")]
pub fn validate_diagram_schema(json: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(json)
        .is_ok_and(|value| validate::validate_diagram_schema(&value))
}
