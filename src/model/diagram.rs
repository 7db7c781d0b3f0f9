// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, NodeId};

/// Opaque key/value bag carried by nodes and edges (icon identifier, technology, notes, ...).
///
/// Ordered so every projection of the same state is byte-identical.
pub type Metadata = BTreeMap<String, serde_json::Value>;

pub const ICON_KEY: &str = "icon";
pub const LABEL_KEY: &str = "label";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    #[serde(rename = "type")]
    kind: String,
    label: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    metadata: Metadata,
}

impl Node {
    pub fn new(id: NodeId, kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            label: label.into(),
            position: Position::default(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn icon(&self) -> Option<&str> {
        self.metadata.get(ICON_KEY).and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: EdgeId,
    source_id: NodeId,
    target_id: NodeId,
    #[serde(default)]
    metadata: Metadata,
}

impl Edge {
    pub fn new(id: EdgeId, source_id: NodeId, target_id: NodeId) -> Self {
        Self {
            id,
            source_id,
            target_id,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    pub fn source_id(&self) -> &NodeId {
        &self.source_id
    }

    pub fn target_id(&self) -> &NodeId {
        &self.target_id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.get(LABEL_KEY).and_then(serde_json::Value::as_str)
    }
}

/// The canonical, versioned node/edge graph of one project/session.
///
/// Instances handed out by the store are immutable snapshots; the only way to obtain a newer
/// version is `DiagramStore::apply_mutation`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramState {
    version: u64,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(default)]
    pinned_node_ids: BTreeSet<NodeId>,
}

impl DiagramState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        version: u64,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        pinned_node_ids: BTreeSet<NodeId>,
    ) -> Self {
        Self {
            version,
            nodes,
            edges,
            pinned_node_ids,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn pinned_node_ids(&self) -> &BTreeSet<NodeId> {
        &self.pinned_node_ids
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id().as_str() == node_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id().as_str() == edge_id)
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node(node_id).is_some()
    }

    pub fn is_pinned(&self, node_id: &str) -> bool {
        self.pinned_node_ids.contains(node_id)
    }

    /// Checks the structural invariants every stored version must satisfy.
    pub fn validate(&self) -> Result<(), GraphViolation> {
        validate_graph(&self.nodes, &self.edges, &self.pinned_node_ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphViolation {
    #[error("duplicate node id {0}")]
    DuplicateNodeId(NodeId),
    #[error("duplicate edge id {0}")]
    DuplicateEdgeId(EdgeId),
    #[error("edge {edge_id} references missing node {node_id}")]
    DanglingEdge { edge_id: EdgeId, node_id: NodeId },
    #[error("pinned node {0} does not exist")]
    UnknownPinnedNode(NodeId),
}

pub fn validate_graph(
    nodes: &[Node],
    edges: &[Edge],
    pinned_node_ids: &BTreeSet<NodeId>,
) -> Result<(), GraphViolation> {
    let mut node_ids = HashSet::<&str>::with_capacity(nodes.len());
    for node in nodes {
        if !node_ids.insert(node.id().as_str()) {
            return Err(GraphViolation::DuplicateNodeId(node.id().clone()));
        }
    }

    let mut edge_ids = HashSet::<&str>::with_capacity(edges.len());
    for edge in edges {
        if !edge_ids.insert(edge.id().as_str()) {
            return Err(GraphViolation::DuplicateEdgeId(edge.id().clone()));
        }
        for endpoint in [edge.source_id(), edge.target_id()] {
            if !node_ids.contains(endpoint.as_str()) {
                return Err(GraphViolation::DanglingEdge {
                    edge_id: edge.id().clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }

    if let Some(unknown) = pinned_node_ids.iter().find(|id| !node_ids.contains(id.as_str())) {
        return Err(GraphViolation::UnknownPinnedNode(unknown.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{validate_graph, Edge, GraphViolation, Metadata, Node, ICON_KEY, LABEL_KEY};
    use crate::model::{EdgeId, NodeId};

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    fn eid(value: &str) -> EdgeId {
        EdgeId::new(value).expect("edge id")
    }

    #[test]
    fn node_icon_and_edge_label_come_from_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert(ICON_KEY.to_owned(), "aws-lambda".into());
        let node = Node::new(nid("fn"), "service", "Function").with_metadata(metadata);
        assert_eq!(node.icon(), Some("aws-lambda"));

        let mut metadata = Metadata::new();
        metadata.insert(LABEL_KEY.to_owned(), "invokes".into());
        let edge = Edge::new(eid("e1"), nid("a"), nid("b")).with_metadata(metadata);
        assert_eq!(edge.label(), Some("invokes"));
    }

    #[test]
    fn validate_graph_reports_dangling_edges_and_unknown_pins() {
        let nodes = vec![Node::new(nid("a"), "service", "A")];
        let edges = vec![Edge::new(eid("e1"), nid("a"), nid("ghost"))];
        assert_eq!(
            validate_graph(&nodes, &edges, &BTreeSet::new()),
            Err(GraphViolation::DanglingEdge {
                edge_id: eid("e1"),
                node_id: nid("ghost")
            })
        );

        let pins = BTreeSet::from([nid("ghost")]);
        assert_eq!(
            validate_graph(&nodes, &[], &pins),
            Err(GraphViolation::UnknownPinnedNode(nid("ghost")))
        );
    }

    #[test]
    fn validate_graph_rejects_duplicate_ids() {
        let nodes = vec![
            Node::new(nid("a"), "service", "A"),
            Node::new(nid("a"), "service", "A again"),
        ];
        assert_eq!(
            validate_graph(&nodes, &[], &BTreeSet::new()),
            Err(GraphViolation::DuplicateNodeId(nid("a")))
        );
    }
}
