// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{DiagramState, Edge, Node};
use crate::protocol::DslChange;
use crate::store::{DiagramStore, Mutation, StoreError};

use super::{Delta, DeltaBuilder, MergeError, MergeMode, MergeOutcome, MergeWarning, ObjectRef};

/// A fully validated merge, ready to be applied against `base_version`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub base_version: u64,
    pub mutation: Mutation,
    pub warnings: Vec<MergeWarning>,
    pub delta: Delta,
}

/// Computes the result of merging `change` into `current` without touching any store.
///
/// Pins are evaluated against `current`: a pinned node keeps its existing value whatever the
/// payload says. The payload's `pinned_nodes` (if any) only becomes the pin set afterwards.
pub fn plan_merge(
    current: &DiagramState,
    mode: MergeMode,
    change: &DslChange,
) -> Result<MergePlan, MergeError> {
    let expected = current
        .version()
        .checked_add(1)
        .ok_or(StoreError::VersionOverflow)?;
    if change.version_id() != expected {
        return Err(MergeError::VersionMismatch {
            expected,
            received: change.version_id(),
        });
    }

    let mut warnings = Vec::new();
    let payload = change.diagram();

    let nodes = match mode {
        MergeMode::Create => create_nodes(current, payload.nodes(), &mut warnings),
        MergeMode::Update => update_nodes(current, payload.nodes(), &mut warnings),
    };

    let candidate_edges = match mode {
        MergeMode::Create => payload.edges().to_vec(),
        MergeMode::Update => upsert_by_id(current.edges(), payload.edges(), |edge| {
            edge.id().as_str()
        }),
    };
    let edges = drop_dangling_edges(&nodes, candidate_edges, &mut warnings);

    let node_ids = nodes
        .iter()
        .map(|node| node.id().as_str())
        .collect::<HashSet<_>>();
    let pinned_node_ids = match change.pinned_nodes() {
        Some(pins) => pins
            .iter()
            .filter(|id| node_ids.contains(id.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>(),
        None => current
            .pinned_node_ids()
            .iter()
            .filter(|id| node_ids.contains(id.as_str()))
            .cloned()
            .collect(),
    };

    let delta = diff(current, &nodes, &edges);

    Ok(MergePlan {
        base_version: current.version(),
        mutation: Mutation::new(nodes, edges, pinned_node_ids),
        warnings,
        delta,
    })
}

/// Merges `change` into the store at the version it was planned against.
///
/// A writer that lands between the snapshot and the apply surfaces as
/// [`StoreError::VersionConflict`]. `change.version_id()` is fixed, so only re-issuing the query
/// can recover.
pub fn merge_into_store(
    store: &DiagramStore,
    mode: MergeMode,
    change: &DslChange,
) -> Result<MergeOutcome, MergeError> {
    let current = store.snapshot();
    let plan = plan_merge(&current, mode, change)?;
    let snapshot = store.apply_mutation(plan.mutation, plan.base_version)?;

    for warning in &plan.warnings {
        match warning {
            MergeWarning::DanglingEdgeDropped {
                edge_id,
                missing_node_id,
            } => tracing::warn!(
                edge_id = %edge_id,
                missing_node_id = %missing_node_id,
                "dropped edge referencing a missing node"
            ),
            MergeWarning::PinnedNodeRetained { node_id } => tracing::debug!(
                node_id = %node_id,
                "kept pinned node over incoming value"
            ),
        }
    }
    tracing::info!(
        ?mode,
        version = snapshot.version(),
        added = plan.delta.added.len(),
        removed = plan.delta.removed.len(),
        updated = plan.delta.updated.len(),
        "merge applied"
    );
    Ok(MergeOutcome {
        mode,
        snapshot,
        warnings: plan.warnings,
        delta: plan.delta,
    })
}

fn create_nodes(
    current: &DiagramState,
    incoming: &[Node],
    warnings: &mut Vec<MergeWarning>,
) -> Vec<Node> {
    let mut nodes = current
        .nodes()
        .iter()
        .filter(|node| current.is_pinned(node.id().as_str()))
        .cloned()
        .collect::<Vec<_>>();

    for node in incoming {
        match current.node(node.id().as_str()) {
            Some(existing) if current.is_pinned(existing.id().as_str()) => {
                if existing != node {
                    warnings.push(MergeWarning::PinnedNodeRetained {
                        node_id: node.id().clone(),
                    });
                }
            }
            _ => nodes.push(node.clone()),
        }
    }

    nodes
}

fn update_nodes(
    current: &DiagramState,
    incoming: &[Node],
    warnings: &mut Vec<MergeWarning>,
) -> Vec<Node> {
    let mut pinned_conflicts = Vec::new();
    let nodes = upsert_by_id(current.nodes(), incoming, |node| node.id().as_str())
        .into_iter()
        .map(|merged| {
            let id = merged.id().as_str();
            match current.node(id) {
                Some(existing) if current.is_pinned(id) => {
                    if existing != &merged {
                        pinned_conflicts.push(existing.id().clone());
                    }
                    existing.clone()
                }
                _ => merged,
            }
        })
        .collect();

    warnings.extend(
        pinned_conflicts
            .into_iter()
            .map(|node_id| MergeWarning::PinnedNodeRetained { node_id }),
    );
    nodes
}

/// Existing entries keep their slots (overwritten by id); incoming-only entries are appended in
/// payload order.
fn upsert_by_id<T: Clone>(existing: &[T], incoming: &[T], key: impl Fn(&T) -> &str) -> Vec<T> {
    let incoming_by_id = incoming
        .iter()
        .map(|item| (key(item), item))
        .collect::<HashMap<_, _>>();
    let existing_ids = existing.iter().map(&key).collect::<HashSet<_>>();

    let mut out = existing
        .iter()
        .map(|item| {
            incoming_by_id
                .get(key(item))
                .map_or_else(|| item.clone(), |replacement| (*replacement).clone())
        })
        .collect::<Vec<_>>();
    out.extend(
        incoming
            .iter()
            .filter(|item| !existing_ids.contains(key(*item)))
            .cloned(),
    );
    out
}

fn drop_dangling_edges(
    nodes: &[Node],
    edges: Vec<Edge>,
    warnings: &mut Vec<MergeWarning>,
) -> Vec<Edge> {
    let node_ids = nodes
        .iter()
        .map(|node| node.id().as_str())
        .collect::<HashSet<_>>();

    edges
        .into_iter()
        .filter(|edge| {
            let missing = [edge.source_id(), edge.target_id()]
                .into_iter()
                .find(|endpoint| !node_ids.contains(endpoint.as_str()));
            match missing {
                Some(missing_node_id) => {
                    warnings.push(MergeWarning::DanglingEdgeDropped {
                        edge_id: edge.id().clone(),
                        missing_node_id: missing_node_id.clone(),
                    });
                    false
                }
                None => true,
            }
        })
        .collect()
}

fn diff(current: &DiagramState, nodes: &[Node], edges: &[Edge]) -> Delta {
    let mut delta = DeltaBuilder::default();

    let next_nodes = nodes
        .iter()
        .map(|node| (node.id().as_str(), node))
        .collect::<HashMap<_, _>>();
    for existing in current.nodes() {
        let object_ref = ObjectRef::Node(existing.id().clone());
        match next_nodes.get(existing.id().as_str()) {
            None => delta.record_removed(object_ref),
            Some(next) if *next != existing => delta.record_updated(object_ref),
            Some(_) => {}
        }
    }
    for node in nodes {
        if !current.contains_node(node.id().as_str()) {
            delta.record_added(ObjectRef::Node(node.id().clone()));
        }
    }

    let next_edges = edges
        .iter()
        .map(|edge| (edge.id().as_str(), edge))
        .collect::<HashMap<_, _>>();
    for existing in current.edges() {
        let object_ref = ObjectRef::Edge(existing.id().clone());
        match next_edges.get(existing.id().as_str()) {
            None => delta.record_removed(object_ref),
            Some(next) if *next != existing => delta.record_updated(object_ref),
            Some(_) => {}
        }
    }
    for edge in edges {
        if current.edge(edge.id().as_str()).is_none() {
            delta.record_added(ObjectRef::Edge(edge.id().clone()));
        }
    }

    delta.finish()
}
