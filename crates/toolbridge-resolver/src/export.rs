//! Node-link dump of the resolution graph.
//!
//! The format mirrors the common node-link JSON layout (`nodes` plus
//! `links` with `source`/`target`) so the graph can be inspected with
//! generic graph tooling. Nothing reads it back.

use anyhow::Result;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use toolbridge_types::TypeKey;

use crate::registry::ResolveEdge;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinkGraph {
    pub directed: bool,
    pub multigraph: bool,
    pub nodes: Vec<NodeEntry>,
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub source: String,
    pub target: String,
    pub weight: u32,
    pub namespace: String,
    pub resolver: String,
}

impl NodeLinkGraph {
    pub(crate) fn from_graph(graph: &DiGraph<TypeKey, ResolveEdge>) -> Self {
        let nodes = graph
            .node_indices()
            .map(|node| NodeEntry {
                id: graph[node].to_string(),
            })
            .collect();
        let links = graph
            .edge_references()
            .map(|edge| LinkEntry {
                source: graph[edge.source()].to_string(),
                target: graph[edge.target()].to_string(),
                weight: edge.weight().weight,
                namespace: edge.weight().namespace.to_string(),
                resolver: edge.weight().resolver.name().to_string(),
            })
            .collect();
        Self {
            directed: true,
            multigraph: true,
            nodes,
            links,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Links registered explicitly, skipping generated downcast edges.
    pub fn explicit_links(&self) -> impl Iterator<Item = &LinkEntry> {
        self.links
            .iter()
            .filter(|link| link.namespace != toolbridge_types::DOWNCAST_NAMESPACE)
    }
}
