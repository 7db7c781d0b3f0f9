// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::model::{validate_graph, DiagramState, Edge, Node, NodeId};

use super::StoreError;

/// Full replacement of the node/edge sequences and the pin set.
///
/// Producers (the merge engine, user edits) are responsible for ordering: entries unaffected by
/// the change keep their relative order and new entries are appended in arrival order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mutation {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    pinned_node_ids: BTreeSet<NodeId>,
}

impl Mutation {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>, pinned_node_ids: BTreeSet<NodeId>) -> Self {
        Self {
            nodes,
            edges,
            pinned_node_ids,
        }
    }

    /// Starts a mutation from an existing snapshot (used for user edits).
    pub fn from_state(state: &DiagramState) -> Self {
        Self {
            nodes: state.nodes().to_vec(),
            edges: state.edges().to_vec(),
            pinned_node_ids: state.pinned_node_ids().clone(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn pinned_node_ids(&self) -> &BTreeSet<NodeId> {
        &self.pinned_node_ids
    }

    pub fn pinned_node_ids_mut(&mut self) -> &mut BTreeSet<NodeId> {
        &mut self.pinned_node_ids
    }
}

/// Holds the canonical diagram of one project/session.
///
/// Readers get `Arc` snapshots and never block writers for longer than a pointer swap.
/// `apply_mutation` is optimistic: it succeeds only if `base_version` is still current.
#[derive(Debug, Default)]
pub struct DiagramStore {
    state: RwLock<Arc<DiagramState>>,
}

impl DiagramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-hydrates a store from a persisted state after checking its invariants.
    pub fn from_state(state: DiagramState) -> Result<Self, StoreError> {
        state.validate()?;
        Ok(Self {
            state: RwLock::new(Arc::new(state)),
        })
    }

    pub fn current_version(&self) -> u64 {
        self.read().version()
    }

    pub fn snapshot(&self) -> Arc<DiagramState> {
        self.read()
    }

    pub fn apply_mutation(
        &self,
        mutation: Mutation,
        base_version: u64,
    ) -> Result<Arc<DiagramState>, StoreError> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let current_version = guard.version();
        if base_version != current_version {
            return Err(StoreError::VersionConflict {
                base_version,
                current_version,
            });
        }

        validate_graph(&mutation.nodes, &mutation.edges, &mutation.pinned_node_ids)?;
        let next_version = current_version
            .checked_add(1)
            .ok_or(StoreError::VersionOverflow)?;

        let next = Arc::new(DiagramState::from_parts(
            next_version,
            mutation.nodes,
            mutation.edges,
            mutation.pinned_node_ids,
        ));
        *guard = next.clone();

        tracing::debug!(
            version = next_version,
            nodes = next.nodes().len(),
            edges = next.edges().len(),
            "diagram state advanced"
        );
        Ok(next)
    }

    fn read(&self) -> Arc<DiagramState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
