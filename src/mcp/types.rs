// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::session::Exchange;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SessionParams {
    pub project_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TurnAskParams {
    pub project_id: String,
    pub session_id: String,
    /// Free-text request forwarded to the classification service.
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TurnApplyResponseParams {
    pub project_id: String,
    pub session_id: String,
    /// A raw intent-response envelope (`intent`, `message`, `confidence`, payload...).
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeEditParams {
    pub project_id: String,
    pub session_id: String,
    pub node_id: String,
    /// Version the edit was made against; stale edits are rejected.
    pub base_version: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MoveNodeParams {
    pub project_id: String,
    pub session_id: String,
    pub node_id: String,
    pub x: f64,
    pub y: f64,
    pub base_version: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewSwitchParams {
    pub project_id: String,
    pub session_id: String,
    pub view_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewRenderParams {
    pub project_id: String,
    pub session_id: String,
    /// Defaults to the active view.
    pub view_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramSnapshotResponse {
    pub version: u64,
    pub nodes: Vec<McpNode>,
    pub edges: Vec<McpEdge>,
    pub pinned_node_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpMergeSummary {
    /// `create` or `update`.
    pub mode: String,
    /// Object refs formatted as `node:<id>` / `edge:<id>`.
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpToggle {
    pub view_id: String,
    pub newly_registered: bool,
    pub overlay_attached: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TurnResponse {
    /// One of `merged`, `view_switched`, `recorded`.
    pub outcome: String,
    pub version: u64,
    pub merge: Option<McpMergeSummary>,
    pub view: Option<McpToggle>,
    pub exchange: Option<Exchange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TurnBeginResponse {
    pub generation: u64,
    /// Clarification questions answered by starting this turn.
    pub resolved_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewListResponse {
    pub views: Vec<String>,
    pub active: String,
    /// `disabled` with fewer than two views, `selector` otherwise.
    pub control: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewRenderResponse {
    pub view_id: String,
    pub version: u64,
    pub format: String,
    pub from_overlay: bool,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SessionExchangesResponse {
    pub exchanges: Vec<Exchange>,
    pub pending_questions: Vec<String>,
}
