// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tokio::sync::watch;

use crate::classify::{ClassificationRequest, Classifier};
use crate::config::Config;
use crate::model::{DiagramState, NodeId, Position, ProjectId, SessionId, ViewId};
use crate::ops::{apply_user_edit, merge_into_store, MergeMode, MergeOutcome, UserEdit};
use crate::protocol::{parse_response, DslChange, Response};
use crate::render::{Projection, ToggleOutcome, ViewListing, ViewProjector};
use crate::store::{DiagramStore, PersistedSession, SessionFolder};

use super::tracker::{Exchange, PendingClarification, SessionTracker};
use super::TurnError;

/// What a processed envelope did. Exactly one of these happens per turn.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Merged(MergeOutcome),
    ViewSwitched(ToggleOutcome),
    Recorded(Exchange),
}

/// One project/session: the canonical diagram, its views, and its conversation state.
///
/// Mutations (AI merges, user edits, view changes) are serialized through an async turn lock.
/// Reads (snapshots, projections) never take it.
#[derive(Debug)]
pub struct DiagramSession {
    project_id: ProjectId,
    session_id: SessionId,
    config: Arc<Config>,
    store: DiagramStore,
    views: RwLock<ViewProjector>,
    tracker: Mutex<SessionTracker>,
    turn_lock: tokio::sync::Mutex<()>,
    generation: watch::Sender<u64>,
    folder: Option<SessionFolder>,
}

impl DiagramSession {
    pub fn new(project_id: ProjectId, session_id: SessionId, config: Arc<Config>) -> Self {
        let views = ViewProjector::new(config.canonical_view.clone());
        Self::from_parts(project_id, session_id, config, DiagramStore::new(), views, None)
    }

    pub(crate) fn from_parts(
        project_id: ProjectId,
        session_id: SessionId,
        config: Arc<Config>,
        store: DiagramStore,
        views: ViewProjector,
        folder: Option<SessionFolder>,
    ) -> Self {
        let tracker = SessionTracker::new(config.exchange_history_limit);
        let (generation, _) = watch::channel(0);
        Self {
            project_id,
            session_id,
            config,
            store,
            views: RwLock::new(views),
            tracker: Mutex::new(tracker),
            turn_lock: tokio::sync::Mutex::new(()),
            generation,
            folder,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn current_version(&self) -> u64 {
        self.store.current_version()
    }

    pub fn snapshot(&self) -> Arc<DiagramState> {
        self.store.snapshot()
    }

    /// Runs one full turn: classify `query`, parse the envelope and dispatch it.
    ///
    /// Starting a turn resolves any pending clarification and supersedes every older turn of this
    /// session that is still waiting on the classifier. A stale response (version conflict or
    /// mismatch) re-issues the query, up to `max_turn_attempts` in total.
    pub async fn run_turn(
        &self,
        classifier: &dyn Classifier,
        query: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let generation = self.begin_user_turn();
        let request = ClassificationRequest {
            project_id: self.project_id.clone(),
            query: query.to_owned(),
            session_id: Some(self.session_id.clone()),
        };
        let max_attempts = self.config.max_turn_attempts.max(1);

        let mut attempt = 1;
        loop {
            tracing::info!(
                project_id = %self.project_id,
                session_id = %self.session_id,
                generation,
                attempt,
                "turn started"
            );
            let raw = self.classify(classifier, &request, generation).await?;

            match self.dispatch_value(&raw).await {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::info!(
                        session_id = %self.session_id,
                        error = %err,
                        "stale response; re-issuing query"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Marks the start of a user turn: answers any open clarification and returns the new
    /// generation. In-flight classifications from earlier generations are abandoned.
    pub fn begin_user_turn(&self) -> u64 {
        let mut generation = 0;
        self.generation.send_modify(|current| {
            *current += 1;
            generation = *current;
        });
        if let Some(resolved) = self.tracker().resolve_pending() {
            tracing::debug!(
                session_id = %self.session_id,
                sequence = resolved.sequence,
                "clarification resolved by user turn"
            );
        }
        generation
    }

    async fn classify(
        &self,
        classifier: &dyn Classifier,
        request: &ClassificationRequest,
        generation: u64,
    ) -> Result<Value, TurnError> {
        let mut newer = self.generation.subscribe();
        let after = self.config.classification_timeout;

        tokio::select! {
            result = tokio::time::timeout(after, classifier.classify(request)) => match result {
                Ok(Ok(raw)) => Ok(raw),
                Ok(Err(err)) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        error = %err,
                        "classification failed"
                    );
                    Err(err.into())
                }
                Err(_) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        ?after,
                        "classification timed out"
                    );
                    Err(TurnError::ClassificationTimeout { after })
                }
            },
            () = superseded(&mut newer, generation) => {
                tracing::info!(session_id = %self.session_id, generation, "turn superseded");
                Err(TurnError::Superseded { generation })
            }
        }
    }

    /// Parses and dispatches a raw envelope (e.g. one delivered out of band).
    pub async fn dispatch_value(&self, raw: &Value) -> Result<TurnOutcome, TurnError> {
        let response = parse_response(raw).map_err(|err| {
            tracing::warn!(
                session_id = %self.session_id,
                error = %err,
                "discarding malformed response"
            );
            err
        })?;
        self.dispatch(response).await
    }

    /// Applies one parsed response. Failed turns leave the diagram untouched.
    pub async fn dispatch(&self, response: Response) -> Result<TurnOutcome, TurnError> {
        let _turn = self.turn_lock.lock().await;
        let intent = response.intent();
        tracing::debug!(
            session_id = %self.session_id,
            %intent,
            confidence = response.meta().confidence(),
            "dispatching response"
        );

        let outcome = match response {
            Response::DslCreate(change) => {
                TurnOutcome::Merged(self.merge(MergeMode::Create, &change)?)
            }
            Response::DslUpdate(change) => {
                TurnOutcome::Merged(self.merge(MergeMode::Update, &change)?)
            }
            Response::ViewToggle(toggle) => {
                let version = self.store.current_version();
                let outcome = self.views_mut().apply_toggle(&toggle, version);
                self.persist();
                TurnOutcome::ViewSwitched(outcome)
            }
            Response::ExpertQa(answer) => {
                TurnOutcome::Recorded(self.tracker().record_expert_qa(&answer))
            }
            Response::Clarify(request) => {
                let exchange = self.tracker().record_clarify(&request);
                tracing::info!(
                    session_id = %self.session_id,
                    questions = request.questions().len(),
                    "clarification requested"
                );
                TurnOutcome::Recorded(exchange)
            }
            Response::OutOfScope(notice) => {
                TurnOutcome::Recorded(self.tracker().record_out_of_scope(&notice))
            }
        };
        Ok(outcome)
    }

    fn merge(&self, mode: MergeMode, change: &DslChange) -> Result<MergeOutcome, TurnError> {
        if let Some(pending) = self.tracker().pending_clarification() {
            return Err(TurnError::AwaitingClarification {
                questions: pending.questions.len(),
            });
        }
        let outcome = merge_into_store(&self.store, mode, change)?;
        self.persist();
        Ok(outcome)
    }

    pub async fn pin_node(
        &self,
        node_id: NodeId,
        base_version: u64,
    ) -> Result<Arc<DiagramState>, TurnError> {
        self.edit(UserEdit::Pin(node_id), base_version).await
    }

    pub async fn unpin_node(
        &self,
        node_id: NodeId,
        base_version: u64,
    ) -> Result<Arc<DiagramState>, TurnError> {
        self.edit(UserEdit::Unpin(node_id), base_version).await
    }

    pub async fn move_node(
        &self,
        node_id: NodeId,
        position: Position,
        base_version: u64,
    ) -> Result<Arc<DiagramState>, TurnError> {
        self.edit(UserEdit::Move { node_id, position }, base_version).await
    }

    async fn edit(
        &self,
        edit: UserEdit,
        base_version: u64,
    ) -> Result<Arc<DiagramState>, TurnError> {
        let _turn = self.turn_lock.lock().await;
        let snapshot = apply_user_edit(&self.store, &edit, base_version)?;
        self.persist();
        Ok(snapshot)
    }

    pub async fn switch_view(&self, view_id: &str) -> Result<ViewId, TurnError> {
        let _turn = self.turn_lock.lock().await;
        let active = self.views_mut().switch_view(view_id)?;
        self.persist();
        Ok(active)
    }

    pub fn listing(&self) -> ViewListing {
        self.views().listing()
    }

    pub fn project(&self, view_id: &str) -> Result<Arc<Projection>, TurnError> {
        let state = self.store.snapshot();
        Ok(self.views().project(view_id, &state)?)
    }

    pub fn project_active(&self) -> Result<Arc<Projection>, TurnError> {
        let state = self.store.snapshot();
        Ok(self.views().project_active(&state)?)
    }

    pub fn project_all(&self) -> Result<Vec<Arc<Projection>>, TurnError> {
        let state = self.store.snapshot();
        Ok(self.views().project_all(&state)?)
    }

    pub fn pending_clarification(&self) -> Option<PendingClarification> {
        self.tracker().pending_clarification().cloned()
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.tracker().exchanges().cloned().collect()
    }

    /// Best effort: a failed write is logged and the in-memory state stays authoritative.
    fn persist(&self) {
        let Some(folder) = &self.folder else {
            return;
        };
        let record = {
            let views = self.views();
            let listing = views.listing();
            PersistedSession::new(
                self.store.snapshot().as_ref().clone(),
                listing.views.iter().map(ToString::to_string).collect(),
                listing.active.to_string(),
            )
        };
        if let Err(err) = folder.save_session(&self.project_id, &self.session_id, &record) {
            tracing::error!(
                project_id = %self.project_id,
                session_id = %self.session_id,
                error = %err,
                "failed to persist session"
            );
        }
    }

    fn views(&self) -> RwLockReadGuard<'_, ViewProjector> {
        self.views.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn views_mut(&self) -> RwLockWriteGuard<'_, ViewProjector> {
        self.views.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn tracker(&self) -> MutexGuard<'_, SessionTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves once the session's generation has moved past `generation`.
async fn superseded(newer: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *newer.borrow_and_update() != generation {
            return;
        }
        if newer.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests;
