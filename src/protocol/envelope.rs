// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Edge, Node, NodeId, SessionId, ViewId};

/// The classified purpose of a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intent {
    DslCreate,
    DslUpdate,
    ViewToggle,
    ExpertQa,
    Clarify,
    OutOfScope,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::DslCreate,
        Intent::DslUpdate,
        Intent::ViewToggle,
        Intent::ExpertQa,
        Intent::Clarify,
        Intent::OutOfScope,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DslCreate => "DSL_CREATE",
            Self::DslUpdate => "DSL_UPDATE",
            Self::ViewToggle => "VIEW_TOGGLE",
            Self::ExpertQa => "EXPERT_QA",
            Self::Clarify => "CLARIFY",
            Self::OutOfScope => "OUT_OF_SCOPE",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|intent| intent.as_str() == tag)
    }

    /// Whether a response with this intent may change the canonical diagram.
    pub fn mutates_diagram(self) -> bool {
        matches!(self, Self::DslCreate | Self::DslUpdate)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every response variant.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeMeta {
    message: String,
    confidence: f64,
    session_id: Option<SessionId>,
    classification_source: Option<String>,
}

impl EnvelopeMeta {
    pub(crate) fn new(
        message: String,
        confidence: f64,
        session_id: Option<SessionId>,
        classification_source: Option<String>,
    ) -> Self {
        Self {
            message,
            confidence,
            session_id,
            classification_source,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn classification_source(&self) -> Option<&str> {
        self.classification_source.as_deref()
    }
}

/// Node/edge data proposed by an AI turn, in payload order with ids de-duplicated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiagramPayload {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl DiagramPayload {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Payload of `DSL_CREATE` and `DSL_UPDATE`.
#[derive(Debug, Clone, PartialEq)]
pub struct DslChange {
    meta: EnvelopeMeta,
    version_id: u64,
    diagram: DiagramPayload,
    pinned_nodes: Option<Vec<NodeId>>,
}

impl DslChange {
    pub(crate) fn new(
        meta: EnvelopeMeta,
        version_id: u64,
        diagram: DiagramPayload,
        pinned_nodes: Option<Vec<NodeId>>,
    ) -> Self {
        Self {
            meta,
            version_id,
            diagram,
            pinned_nodes,
        }
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        &self.meta
    }

    /// The version the canonical state must have once this change is applied.
    pub fn version_id(&self) -> u64 {
        self.version_id
    }

    pub fn diagram(&self) -> &DiagramPayload {
        &self.diagram
    }

    pub fn pinned_nodes(&self) -> Option<&[NodeId]> {
        self.pinned_nodes.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewToggle {
    meta: EnvelopeMeta,
    target_view: ViewId,
    diagram: Option<DiagramPayload>,
}

impl ViewToggle {
    pub(crate) fn new(
        meta: EnvelopeMeta,
        target_view: ViewId,
        diagram: Option<DiagramPayload>,
    ) -> Self {
        Self {
            meta,
            target_view,
            diagram,
        }
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        &self.meta
    }

    pub fn target_view(&self) -> &ViewId {
        &self.target_view
    }

    pub fn diagram(&self) -> Option<&DiagramPayload> {
        self.diagram.as_ref()
    }
}

/// One reference attached to an expert answer (title, url, ...).
pub type Reference = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct ExpertAnswer {
    meta: EnvelopeMeta,
    references: Vec<Reference>,
}

impl ExpertAnswer {
    pub(crate) fn new(meta: EnvelopeMeta, references: Vec<Reference>) -> Self {
        Self { meta, references }
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        &self.meta
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClarifyRequest {
    meta: EnvelopeMeta,
    questions: Vec<String>,
}

impl ClarifyRequest {
    pub(crate) fn new(meta: EnvelopeMeta, questions: Vec<String>) -> Self {
        Self { meta, questions }
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        &self.meta
    }

    /// Never empty.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutOfScopeNotice {
    meta: EnvelopeMeta,
    suggestion: Option<String>,
}

impl OutOfScopeNotice {
    pub(crate) fn new(meta: EnvelopeMeta, suggestion: Option<String>) -> Self {
        Self { meta, suggestion }
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        &self.meta
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }
}

/// A validated classification response; each variant carries only the fields valid for its
/// intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    DslCreate(DslChange),
    DslUpdate(DslChange),
    ViewToggle(ViewToggle),
    ExpertQa(ExpertAnswer),
    Clarify(ClarifyRequest),
    OutOfScope(OutOfScopeNotice),
}

impl Response {
    pub fn intent(&self) -> Intent {
        match self {
            Self::DslCreate(_) => Intent::DslCreate,
            Self::DslUpdate(_) => Intent::DslUpdate,
            Self::ViewToggle(_) => Intent::ViewToggle,
            Self::ExpertQa(_) => Intent::ExpertQa,
            Self::Clarify(_) => Intent::Clarify,
            Self::OutOfScope(_) => Intent::OutOfScope,
        }
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        match self {
            Self::DslCreate(change) | Self::DslUpdate(change) => change.meta(),
            Self::ViewToggle(toggle) => toggle.meta(),
            Self::ExpertQa(answer) => answer.meta(),
            Self::Clarify(request) => request.meta(),
            Self::OutOfScope(notice) => notice.meta(),
        }
    }
}
