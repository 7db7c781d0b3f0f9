// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations for the canonical diagram.
//!
//! AI-proposed changes (`DSL_CREATE`/`DSL_UPDATE`) and user edits (pin, unpin, move) are turned
//! into a full `Mutation` and applied with optimistic concurrency (version checks). Each merge
//! produces a minimal delta that views can use to refresh derived state.

mod edit;
mod merge;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub use edit::{apply_user_edit, EditError, UserEdit};
pub use merge::{merge_into_store, plan_merge, MergePlan};

use crate::model::{DiagramState, EdgeId, NodeId};
use crate::store::StoreError;

/// How an incoming payload is combined with the current diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Incoming nodes/edges replace the diagram; pinned nodes survive.
    Create,
    /// Incoming nodes/edges are merged by id into the diagram.
    Update,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// Non-fatal findings reported alongside a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    DanglingEdgeDropped {
        edge_id: EdgeId,
        missing_node_id: NodeId,
    },
    /// The payload tried to overwrite or drop a pinned node; the existing value was kept.
    PinnedNodeRetained { node_id: NodeId },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEdgeDropped { edge_id, missing_node_id } => {
                write!(f, "dropped edge {edge_id}: node {missing_node_id} does not exist")
            }
            Self::PinnedNodeRetained { node_id } => {
                write!(f, "kept pinned node {node_id} unchanged")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectRef {
    Node(NodeId),
    Edge(EdgeId),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node_id) => write!(f, "node:{node_id}"),
            Self::Edge(edge_id) => write!(f, "edge:{edge_id}"),
        }
    }
}

/// Minimal delta describing which objects changed as the result of a mutation.
///
/// This is intentionally coarse: it reports only added/removed/updated object ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<ObjectRef>,
    pub removed: Vec<ObjectRef>,
    pub updated: Vec<ObjectRef>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: BTreeSet<ObjectRef>,
    removed: BTreeSet<ObjectRef>,
    updated: BTreeSet<ObjectRef>,
}

impl DeltaBuilder {
    fn record_added(&mut self, object_ref: ObjectRef) {
        self.removed.remove(&object_ref);
        self.updated.remove(&object_ref);
        self.added.insert(object_ref);
    }

    fn record_removed(&mut self, object_ref: ObjectRef) {
        self.added.remove(&object_ref);
        self.updated.remove(&object_ref);
        self.removed.insert(object_ref);
    }

    fn record_updated(&mut self, object_ref: ObjectRef) {
        if self.added.contains(&object_ref) || self.removed.contains(&object_ref) {
            return;
        }
        self.updated.insert(object_ref);
    }

    fn finish(self) -> Delta {
        Delta {
            added: self.added.into_iter().collect(),
            removed: self.removed.into_iter().collect(),
            updated: self.updated.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub mode: MergeMode,
    pub snapshot: Arc<DiagramState>,
    pub warnings: Vec<MergeWarning>,
    pub delta: Delta,
}

impl MergeOutcome {
    pub fn dropped_edges(&self) -> impl Iterator<Item = &EdgeId> {
        self.warnings.iter().filter_map(|warning| match warning {
            MergeWarning::DanglingEdgeDropped { edge_id, .. } => Some(edge_id),
            MergeWarning::PinnedNodeRetained { .. } => None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The response was generated against a different version; its payload is discarded.
    #[error("version mismatch (expected version_id={expected}, received={received})")]
    VersionMismatch { expected: u64, received: u64 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MergeError {
    /// Conflicts and mismatches are resolved by re-synchronizing and re-issuing the query.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::VersionMismatch { .. } | Self::Store(StoreError::VersionConflict { .. })
        )
    }
}
