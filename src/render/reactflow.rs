// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Graph-canvas projection: the node/edge document a ReactFlow canvas consumes.

use serde::Serialize;

use crate::model::{DiagramState, Metadata, Position, LABEL_KEY};

use super::ProjectionError;

#[derive(Serialize)]
struct CanvasDocument<'a> {
    version: u64,
    nodes: Vec<CanvasNode<'a>>,
    edges: Vec<CanvasEdge<'a>>,
}

#[derive(Serialize)]
struct CanvasNode<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    position: Position,
    data: Metadata,
    /// Pinned nodes are locked on the canvas.
    draggable: bool,
}

#[derive(Serialize)]
struct CanvasEdge<'a> {
    id: &'a str,
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    data: Metadata,
}

pub(crate) fn project_canvas(state: &DiagramState) -> Result<String, ProjectionError> {
    let nodes = state
        .nodes()
        .iter()
        .map(|node| {
            let mut data = node.metadata().clone();
            data.insert(LABEL_KEY.to_owned(), node.label().into());
            CanvasNode {
                id: node.id().as_str(),
                kind: node.kind(),
                position: node.position(),
                data,
                draggable: !state.is_pinned(node.id().as_str()),
            }
        })
        .collect();

    let edges = state
        .edges()
        .iter()
        .map(|edge| {
            let mut data = edge.metadata().clone();
            data.remove(LABEL_KEY);
            CanvasEdge {
                id: edge.id().as_str(),
                source: edge.source_id().as_str(),
                target: edge.target_id().as_str(),
                label: edge.label(),
                data,
            }
        })
        .collect();

    let document = CanvasDocument {
        version: state.version(),
        nodes,
        edges,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Fallback for server-registered views without a built-in projection.
pub(crate) fn project_canonical_json(state: &DiagramState) -> Result<String, ProjectionError> {
    Ok(serde_json::to_string_pretty(state)?)
}
