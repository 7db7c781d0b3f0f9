// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// MCP server helper functions:
/// diagram/view mapping, turn summaries, and error translation.
fn snapshot_response(state: &DiagramState) -> DiagramSnapshotResponse {
    DiagramSnapshotResponse {
        version: state.version(),
        nodes: state
            .nodes()
            .iter()
            .map(|node| McpNode {
                id: node.id().to_string(),
                kind: node.kind().to_owned(),
                label: node.label().to_owned(),
                x: node.position().x,
                y: node.position().y,
                metadata: node.metadata().clone(),
                pinned: state.is_pinned(node.id().as_str()),
            })
            .collect(),
        edges: state
            .edges()
            .iter()
            .map(|edge| McpEdge {
                id: edge.id().to_string(),
                source: edge.source_id().to_string(),
                target: edge.target_id().to_string(),
                label: edge.label().map(ToOwned::to_owned),
            })
            .collect(),
        pinned_node_ids: state.pinned_node_ids().iter().map(ToString::to_string).collect(),
    }
}

fn merge_summary(outcome: &MergeOutcome) -> McpMergeSummary {
    McpMergeSummary {
        mode: outcome.mode.as_str().to_owned(),
        added: outcome.delta.added.iter().map(ToString::to_string).collect(),
        removed: outcome.delta.removed.iter().map(ToString::to_string).collect(),
        updated: outcome.delta.updated.iter().map(ToString::to_string).collect(),
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
    }
}

fn turn_response(session: &DiagramSession, outcome: TurnOutcome) -> TurnResponse {
    match outcome {
        TurnOutcome::Merged(merged) => TurnResponse {
            outcome: "merged".to_owned(),
            version: merged.snapshot.version(),
            merge: Some(merge_summary(&merged)),
            view: None,
            exchange: None,
        },
        TurnOutcome::ViewSwitched(toggle) => TurnResponse {
            outcome: "view_switched".to_owned(),
            version: session.current_version(),
            merge: None,
            view: Some(McpToggle {
                view_id: toggle.view_id.to_string(),
                newly_registered: toggle.newly_registered,
                overlay_attached: toggle.overlay_attached,
            }),
            exchange: None,
        },
        TurnOutcome::Recorded(exchange) => TurnResponse {
            outcome: "recorded".to_owned(),
            version: session.current_version(),
            merge: None,
            view: None,
            exchange: Some(exchange),
        },
    }
}

fn listing_response(listing: ViewListing) -> ViewListResponse {
    ViewListResponse {
        views: listing.views.iter().map(ToString::to_string).collect(),
        active: listing.active.to_string(),
        control: listing.control.as_str().to_owned(),
    }
}

fn render_response(projection: &Projection) -> ViewRenderResponse {
    ViewRenderResponse {
        view_id: projection.view_id.to_string(),
        version: projection.version,
        format: projection.format.as_str().to_owned(),
        from_overlay: projection.from_overlay,
        body: projection.body.clone(),
    }
}

fn parse_node_id(node_id: &str) -> Result<NodeId, ErrorData> {
    NodeId::new(node_id).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid node_id: {err}"),
            Some(serde_json::json!({ "node_id": node_id })),
        )
    })
}

fn map_store_error(err: StoreError) -> ErrorData {
    match err {
        StoreError::VersionConflict {
            base_version,
            current_version,
        } => ErrorData::invalid_request(
            format!(
                "version conflict (base_version={base_version}, current_version={current_version})"
            ),
            Some(serde_json::json!({
                "base_version": base_version,
                "current_version": current_version,
                "retryable": true,
            })),
        ),
        StoreError::InvalidMutation(violation) => {
            ErrorData::invalid_request(format!("invalid mutation: {violation}"), None)
        }
        other => ErrorData::internal_error(other.to_string(), None),
    }
}

fn map_turn_error(err: TurnError) -> ErrorData {
    let retryable = err.is_retryable();
    match err {
        TurnError::Malformed(err) => ErrorData::invalid_params(
            format!("malformed response: {err}"),
            Some(serde_json::json!({ "retryable": false })),
        ),
        TurnError::Merge(MergeError::VersionMismatch { expected, received }) => {
            ErrorData::invalid_request(
                format!("version mismatch (expected version_id={expected}, received={received})"),
                Some(serde_json::json!({
                    "expected": expected,
                    "received": received,
                    "retryable": true,
                })),
            )
        }
        TurnError::Merge(MergeError::Store(err)) => map_store_error(err),
        TurnError::View(ViewError::UnknownView(view_id)) => ErrorData::resource_not_found(
            format!("unknown view: {view_id}"),
            Some(serde_json::json!({ "view_id": view_id })),
        ),
        TurnError::View(err @ ViewError::Projection(_)) => {
            ErrorData::internal_error(err.to_string(), None)
        }
        TurnError::ClassificationTimeout { after } => ErrorData::internal_error(
            format!("classification timed out after {after:?}"),
            Some(serde_json::json!({
                "timeout_ms": after.as_millis() as u64,
                "retryable": retryable,
            })),
        ),
        TurnError::Classifier(ClassifierError::NotConfigured) => ErrorData::invalid_request(
            "no classification service configured; use turn.apply_response",
            None,
        ),
        TurnError::Classifier(err) => ErrorData::internal_error(err.to_string(), None),
        TurnError::Superseded { generation } => ErrorData::invalid_request(
            format!("turn superseded by a newer query (generation {generation})"),
            Some(serde_json::json!({ "generation": generation })),
        ),
        TurnError::AwaitingClarification { questions } => ErrorData::invalid_request(
            format!("{questions} clarification question(s) must be answered first; call turn.begin"),
            Some(serde_json::json!({ "questions": questions })),
        ),
        TurnError::UserEdit(EditError::UnknownNode(node_id)) => ErrorData::resource_not_found(
            format!("unknown node: {node_id}"),
            Some(serde_json::json!({ "node_id": node_id.as_str() })),
        ),
        TurnError::UserEdit(EditError::Store(err)) | TurnError::Store(err) => map_store_error(err),
    }
}
