// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Serde shapes of the node/edge payloads produced by the classification service.
//!
//! Nodes follow the graph-canvas convention (`id`, `type`, `position`, `data`) with an optional
//! flat `label` and `metadata` bag; edges accept both `source`/`target` and
//! `source_id`/`target_id` spellings.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Edge, EdgeId, Metadata, Node, NodeId, Position, LABEL_KEY};

use super::MalformedReason;

const DEFAULT_NODE_TYPE: &str = "default";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct WirePosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WireNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub position: Option<WirePosition>,
    #[serde(default)]
    pub data: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WireEdge {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "source_id", alias = "sourceId")]
    pub source: String,
    #[serde(alias = "target_id", alias = "targetId")]
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub data: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl WireNode {
    pub(crate) fn into_node(self) -> Result<Node, MalformedReason> {
        let id = NodeId::new(self.id.clone()).map_err(|source| MalformedReason::InvalidId {
            field: "node.id",
            value: self.id,
            source,
        })?;

        let mut metadata = Metadata::new();
        let mut data_label = None;
        for (key, value) in self.data.into_iter().flatten() {
            if key == LABEL_KEY {
                data_label = value.as_str().map(ToOwned::to_owned);
                continue;
            }
            metadata.insert(key, value);
        }
        metadata.extend(self.metadata.into_iter().flatten());

        let label = self
            .label
            .or(data_label)
            .unwrap_or_else(|| id.as_str().to_owned());
        let kind = self.kind.unwrap_or_else(|| DEFAULT_NODE_TYPE.to_owned());
        let position = self
            .position
            .map(|p| Position::new(p.x, p.y))
            .unwrap_or_default();

        Ok(Node::new(id, kind, label)
            .with_position(position)
            .with_metadata(metadata))
    }
}

impl WireEdge {
    pub(crate) fn into_edge(self) -> Result<Edge, MalformedReason> {
        let source = NodeId::new(self.source.clone()).map_err(|source| {
            MalformedReason::InvalidId {
                field: "edge.source",
                value: self.source.clone(),
                source,
            }
        })?;
        let target = NodeId::new(self.target.clone()).map_err(|source| {
            MalformedReason::InvalidId {
                field: "edge.target",
                value: self.target.clone(),
                source,
            }
        })?;

        let raw_id = self
            .id
            .unwrap_or_else(|| format!("{}->{}", source.as_str(), target.as_str()));
        let id = EdgeId::new(raw_id.clone()).map_err(|source| MalformedReason::InvalidId {
            field: "edge.id",
            value: raw_id,
            source,
        })?;

        let mut metadata = Metadata::new();
        metadata.extend(self.data.into_iter().flatten());
        metadata.extend(self.metadata.into_iter().flatten());
        if let Some(label) = self.label {
            metadata.insert(LABEL_KEY.to_owned(), label.into());
        }

        Ok(Edge::new(id, source, target).with_metadata(metadata))
    }
}
