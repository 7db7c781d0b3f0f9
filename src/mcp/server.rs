// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};

use crate::classify::{Classifier, ClassifierError};
use crate::model::{DiagramState, NodeId, Position, ProjectId, SessionId};
use crate::ops::{EditError, MergeError, MergeOutcome};
use crate::render::{Projection, ViewError, ViewListing};
use crate::session::{DiagramSession, TurnError, TurnOutcome, Workspace};
use crate::store::StoreError;

use super::types::*;

#[derive(Clone)]
pub struct ProteusMcp {
    workspace: Arc<Workspace>,
    classifier: Arc<dyn Classifier>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ProteusMcp {
    pub fn new(workspace: Arc<Workspace>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            workspace,
            classifier,
            tool_router: Self::tool_router(),
        }
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    fn session(
        &self,
        project_id: &str,
        session_id: &str,
    ) -> Result<Arc<DiagramSession>, ErrorData> {
        let project = ProjectId::new(project_id).map_err(|err| {
            ErrorData::invalid_params(
                format!("invalid project_id: {err}"),
                Some(serde_json::json!({ "project_id": project_id })),
            )
        })?;
        let session = SessionId::new(session_id).map_err(|err| {
            ErrorData::invalid_params(
                format!("invalid session_id: {err}"),
                Some(serde_json::json!({ "session_id": session_id })),
            )
        })?;
        self.workspace.session(&project, &session).map_err(|err| {
            ErrorData::internal_error(format!("failed to open session: {err}"), None)
        })
    }

    /// Classifies a free-text query and applies the resulting intent to the session.
    ///
    /// Starting a turn answers any open clarification and abandons older turns of the same
    /// session that are still waiting on the classifier.
    #[tool(name = "turn.ask")]
    async fn turn_ask(
        &self,
        params: Parameters<TurnAskParams>,
    ) -> Result<Json<TurnResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        let outcome = session
            .run_turn(self.classifier.as_ref(), &params.0.query)
            .await
            .map_err(map_turn_error)?;
        Ok(Json(turn_response(&session, outcome)))
    }

    /// Applies an intent-response envelope that was classified elsewhere.
    #[tool(name = "turn.apply_response")]
    async fn turn_apply_response(
        &self,
        params: Parameters<TurnApplyResponseParams>,
    ) -> Result<Json<TurnResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        let outcome = session.dispatch_value(&params.0.response).await.map_err(map_turn_error)?;
        Ok(Json(turn_response(&session, outcome)))
    }

    /// Marks the start of a user turn without classifying anything.
    ///
    /// Use before `turn.apply_response` when the user answered a clarification.
    #[tool(name = "turn.begin")]
    async fn turn_begin(
        &self,
        params: Parameters<SessionParams>,
    ) -> Result<Json<TurnBeginResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        let resolved_questions =
            session.pending_clarification().map(|pending| pending.questions).unwrap_or_default();
        let generation = session.begin_user_turn();
        Ok(Json(TurnBeginResponse {
            generation,
            resolved_questions,
        }))
    }

    /// Returns the canonical diagram and its version.
    #[tool(name = "diagram.snapshot")]
    async fn diagram_snapshot(
        &self,
        params: Parameters<SessionParams>,
    ) -> Result<Json<DiagramSnapshotResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        Ok(Json(snapshot_response(&session.snapshot())))
    }

    /// Pins a node so later AI merges cannot alter or remove it.
    #[tool(name = "diagram.pin")]
    async fn diagram_pin(
        &self,
        params: Parameters<NodeEditParams>,
    ) -> Result<Json<DiagramSnapshotResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        let node_id = parse_node_id(&params.0.node_id)?;
        let snapshot =
            session.pin_node(node_id, params.0.base_version).await.map_err(map_turn_error)?;
        Ok(Json(snapshot_response(&snapshot)))
    }

    #[tool(name = "diagram.unpin")]
    async fn diagram_unpin(
        &self,
        params: Parameters<NodeEditParams>,
    ) -> Result<Json<DiagramSnapshotResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        let node_id = parse_node_id(&params.0.node_id)?;
        let snapshot =
            session.unpin_node(node_id, params.0.base_version).await.map_err(map_turn_error)?;
        Ok(Json(snapshot_response(&snapshot)))
    }

    /// Moves a node on the canvas. Pinned nodes can still be moved by the user.
    #[tool(name = "diagram.move_node")]
    async fn diagram_move_node(
        &self,
        params: Parameters<MoveNodeParams>,
    ) -> Result<Json<DiagramSnapshotResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        let node_id = parse_node_id(&params.0.node_id)?;
        if !params.0.x.is_finite() || !params.0.y.is_finite() {
            return Err(ErrorData::invalid_params(
                "position must be finite",
                Some(serde_json::json!({ "x": params.0.x, "y": params.0.y })),
            ));
        }
        let position = Position::new(params.0.x, params.0.y);
        let snapshot = session
            .move_node(node_id, position, params.0.base_version)
            .await
            .map_err(map_turn_error)?;
        Ok(Json(snapshot_response(&snapshot)))
    }

    /// Lists registered views and the active one.
    #[tool(name = "view.list")]
    async fn view_list(
        &self,
        params: Parameters<SessionParams>,
    ) -> Result<Json<ViewListResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        Ok(Json(listing_response(session.listing())))
    }

    /// Activates an already-registered view.
    #[tool(name = "view.switch")]
    async fn view_switch(
        &self,
        params: Parameters<ViewSwitchParams>,
    ) -> Result<Json<ViewListResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        session.switch_view(&params.0.view_id).await.map_err(map_turn_error)?;
        Ok(Json(listing_response(session.listing())))
    }

    /// Renders a view (the active one when `view_id` is omitted) from the canonical diagram.
    #[tool(name = "view.render")]
    async fn view_render(
        &self,
        params: Parameters<ViewRenderParams>,
    ) -> Result<Json<ViewRenderResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        let projection = match params.0.view_id.as_deref() {
            Some(view_id) => session.project(view_id),
            None => session.project_active(),
        }
        .map_err(map_turn_error)?;
        Ok(Json(render_response(&projection)))
    }

    /// Non-mutating exchanges (answers, clarifications, out-of-scope notices) in order.
    #[tool(name = "session.exchanges")]
    async fn session_exchanges(
        &self,
        params: Parameters<SessionParams>,
    ) -> Result<Json<SessionExchangesResponse>, ErrorData> {
        let session = self.session(&params.0.project_id, &params.0.session_id)?;
        Ok(Json(SessionExchangesResponse {
            exchanges: session.exchanges(),
            pending_questions: session
                .pending_clarification()
                .map(|pending| pending.questions)
                .unwrap_or_default(),
        }))
    }
}

#[tool_handler]
impl ServerHandler for ProteusMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Proteus diagram synchronization server (tools: turn.ask, turn.apply_response, turn.begin, diagram.snapshot, diagram.pin, diagram.unpin, diagram.move_node, view.list, view.switch, view.render, session.exchanges)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Response mapping and error translation for the tool handlers.
include!("server/helpers.rs");
