// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use super::diagram::{DiagramState, Edge, Metadata, Node, Position, ICON_KEY, LABEL_KEY};
use super::ids::{EdgeId, NodeId};

pub(crate) fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub(crate) fn eid(value: &str) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

pub(crate) fn node(id: &str, kind: &str, label: &str, x: f64, y: f64) -> Node {
    Node::new(nid(id), kind, label).with_position(Position::new(x, y))
}

pub(crate) fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge::new(eid(id), nid(source), nid(target))
}

pub(crate) fn labeled_edge(id: &str, source: &str, target: &str, label: &str) -> Edge {
    let mut metadata = Metadata::new();
    metadata.insert(LABEL_KEY.to_owned(), label.into());
    edge(id, source, target).with_metadata(metadata)
}

/// Small three-tier architecture: user -> web -> api -> db.
pub(crate) fn three_tier(version: u64) -> DiagramState {
    let mut web_meta = Metadata::new();
    web_meta.insert(ICON_KEY.to_owned(), "react".into());

    let nodes = vec![
        node("user", "person", "Customer", 0.0, 0.0),
        node("web", "service", "Web App", 200.0, 0.0).with_metadata(web_meta),
        node("api", "service", "API", 400.0, 0.0),
        node("db", "database", "Postgres", 600.0, 0.0),
    ];
    let edges = vec![
        labeled_edge("e:user-web", "user", "web", "uses"),
        edge("e:web-api", "web", "api"),
        edge("e:api-db", "api", "db"),
    ];

    DiagramState::from_parts(version, nodes, edges, BTreeSet::new())
}

pub(crate) fn with_pins(state: DiagramState, pins: &[&str]) -> DiagramState {
    DiagramState::from_parts(
        state.version(),
        state.nodes().to_vec(),
        state.edges().to_vec(),
        pins.iter().map(|id| nid(id)).collect(),
    )
}
