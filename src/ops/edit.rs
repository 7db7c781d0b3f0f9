// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::model::{DiagramState, NodeId, Position};
use crate::store::{DiagramStore, Mutation, StoreError};

/// A direct manipulation performed by the user on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEdit {
    Pin(NodeId),
    Unpin(NodeId),
    Move { node_id: NodeId, position: Position },
}

impl UserEdit {
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Pin(node_id) | Self::Unpin(node_id) => node_id,
            Self::Move { node_id, .. } => node_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies a user edit against `base_version`. Every edit produces a new version, even when it is
/// a no-op (pinning an already pinned node), so clients can rely on version monotonicity.
pub fn apply_user_edit(
    store: &DiagramStore,
    edit: &UserEdit,
    base_version: u64,
) -> Result<Arc<DiagramState>, EditError> {
    let current = store.snapshot();
    if !current.contains_node(edit.node_id().as_str()) {
        return Err(EditError::UnknownNode(edit.node_id().clone()));
    }

    let mut mutation = Mutation::from_state(&current);
    match edit {
        UserEdit::Pin(node_id) => {
            mutation.pinned_node_ids_mut().insert(node_id.clone());
        }
        UserEdit::Unpin(node_id) => {
            mutation.pinned_node_ids_mut().remove(node_id);
        }
        UserEdit::Move { node_id, position } => {
            if let Some(node) = mutation
                .nodes_mut()
                .iter_mut()
                .find(|node| node.id() == node_id)
            {
                node.set_position(*position);
            }
        }
    }

    let snapshot = store.apply_mutation(mutation, base_version)?;
    tracing::debug!(
        node_id = %edit.node_id(),
        version = snapshot.version(),
        "user edit applied"
    );
    Ok(snapshot)
}
