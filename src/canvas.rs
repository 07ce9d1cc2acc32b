//! Conversion between the canonical graph and the canvas node/edge shape.
//!
//! A canvas edge names its endpoints by handle strings of the form
//! `<tableId>-<columnId>-source` / `-target`. Ids may themselves contain
//! hyphens, so endpoints are recovered by rebuilding the handle for every
//! column of the owning node and taking the exact match.

use crate::model::{Cardinality, Column, DiagramSchema, Endpoint, Position, Relationship, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

pub const NODE_TYPE: &str = "table";
pub const EDGE_TYPE: &str = "relationship";

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Editor callbacks attached to a node. Never persisted.
#[derive(Clone)]
pub struct NodeHooks {
    pub on_rename: Callback<String>,
    pub on_add_column: Callback<()>,
    pub on_update_column: Callback<Column>,
    pub on_delete_column: Callback<String>,
}

impl Default for NodeHooks {
    fn default() -> Self {
        Self {
            on_rename: Arc::new(|_| {}),
            on_add_column: Arc::new(|_| {}),
            on_update_column: Arc::new(|_| {}),
            on_delete_column: Arc::new(|_| {}),
        }
    }
}

impl fmt::Debug for NodeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeHooks { .. }")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNodeData {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(skip)]
    pub hooks: NodeHooks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Position,
    pub data: TableNodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EdgeData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanvasGraph {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

pub fn source_handle(table_id: &str, column_id: &str) -> String {
    format!("{}-{}-source", table_id, column_id)
}

pub fn target_handle(table_id: &str, column_id: &str) -> String {
    format!("{}-{}-target", table_id, column_id)
}

/// Strip canvas-only state and rebuild the canonical graph.
///
/// Edges whose node or handle does not resolve are skipped.
pub fn serialize_diagram(nodes: &[CanvasNode], edges: &[CanvasEdge]) -> DiagramSchema {
    let span = debug_span!("serialize_diagram", nodes = nodes.len(), edges = edges.len());
    let _enter = span.enter();

    let tables: Vec<Table> = nodes
        .iter()
        .map(|node| Table {
            id: node.id.clone(),
            name: node.data.name.clone(),
            position: node.position,
            columns: node.data.columns.clone(),
        })
        .collect();

    let relationships: Vec<Relationship> = edges
        .iter()
        .filter_map(|edge| {
            let source = recover_endpoint(nodes, &edge.source, &edge.source_handle, source_handle);
            let target = recover_endpoint(nodes, &edge.target, &edge.target_handle, target_handle);
            match (source, target) {
                (Some(source), Some(target)) => Some(Relationship {
                    id: edge.id.clone(),
                    cardinality: edge.data.cardinality,
                    source,
                    target,
                }),
                _ => {
                    warn!(
                        edge = %edge.id,
                        source_handle = %edge.source_handle,
                        target_handle = %edge.target_handle,
                        "skipping edge with unresolved handle"
                    );
                    None
                }
            }
        })
        .collect();

    debug!(
        tables = tables.len(),
        relationships = relationships.len(),
        "serialized diagram"
    );
    DiagramSchema {
        tables,
        relationships,
    }
}

fn recover_endpoint(
    nodes: &[CanvasNode],
    node_id: &str,
    handle: &str,
    build: fn(&str, &str) -> String,
) -> Option<Endpoint> {
    let node = nodes.iter().find(|n| n.id == node_id)?;
    node.data
        .columns
        .iter()
        .find(|c| build(&node.id, &c.id) == handle)
        .map(|c| Endpoint::new(node.id.clone(), c.id.clone()))
}

/// Rebuild canvas nodes and edges with inert hooks.
pub fn deserialize_diagram(schema: &DiagramSchema) -> CanvasGraph {
    let nodes = schema
        .tables
        .iter()
        .map(|table| CanvasNode {
            id: table.id.clone(),
            kind: NODE_TYPE.to_string(),
            position: table.position,
            data: TableNodeData {
                name: table.name.clone(),
                columns: table.columns.clone(),
                hooks: NodeHooks::default(),
            },
        })
        .collect();

    let edges = schema
        .relationships
        .iter()
        .map(|rel| CanvasEdge {
            id: rel.id.clone(),
            source: rel.source.table_id.clone(),
            target: rel.target.table_id.clone(),
            source_handle: source_handle(&rel.source.table_id, &rel.source.column_id),
            target_handle: target_handle(&rel.target.table_id, &rel.target.column_id),
            kind: EDGE_TYPE.to_string(),
            data: EdgeData {
                cardinality: rel.cardinality,
            },
        })
        .collect();

    CanvasGraph { nodes, edges }
}
