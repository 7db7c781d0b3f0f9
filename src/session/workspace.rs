// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::model::{ProjectId, SessionId, ViewId};
use crate::render::ViewProjector;
use crate::store::{DiagramStore, SessionFolder, StoreError};

use super::DiagramSession;

type SessionKey = (ProjectId, SessionId);

/// Every live session, keyed by `(project_id, session_id)`.
///
/// Sessions share nothing mutable; the map lock is held only to look up or insert a session.
#[derive(Debug)]
pub struct Workspace {
    config: Arc<Config>,
    folder: Option<SessionFolder>,
    sessions: Mutex<HashMap<SessionKey, Arc<DiagramSession>>>,
}

impl Workspace {
    pub fn new(config: Config) -> Self {
        let folder = config
            .session_dir
            .as_ref()
            .map(|dir| SessionFolder::new(dir.clone()).with_durability(config.durability));
        Self {
            config: Arc::new(config),
            folder,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the session, creating it (or re-hydrating it from the session folder) on first use.
    pub fn session(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
    ) -> Result<Arc<DiagramSession>, StoreError> {
        let key = (project_id.clone(), session_id.clone());
        if let Some(session) = self.lock_sessions().get(&key) {
            return Ok(Arc::clone(session));
        }

        // Loading reads the session folder, so it runs without holding the map lock. When two
        // callers race on the same key the first insert wins.
        let opened = Arc::new(self.open(project_id, session_id)?);
        let session = self.lock_sessions().entry(key).or_insert(opened).clone();
        Ok(session)
    }

    /// Already-open sessions, sorted.
    pub fn open_sessions(&self) -> Vec<SessionKey> {
        let mut keys = self.lock_sessions().keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, Arc<DiagramSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
    ) -> Result<DiagramSession, StoreError> {
        let canonical = self.config.canonical_view.clone();
        let persisted = match &self.folder {
            Some(folder) => folder.load_session(project_id, session_id)?,
            None => None,
        };

        let Some(persisted) = persisted else {
            tracing::debug!(%project_id, %session_id, "new session");
            return Ok(DiagramSession::from_parts(
                project_id.clone(),
                session_id.clone(),
                Arc::clone(&self.config),
                DiagramStore::new(),
                ViewProjector::new(canonical),
                self.folder.clone(),
            ));
        };

        tracing::info!(
            %project_id,
            %session_id,
            version = persisted.diagram.version(),
            "session restored"
        );
        let views = persisted
            .views
            .iter()
            .filter_map(|raw| ViewId::new(raw.clone()).ok())
            .collect::<Vec<_>>();
        Ok(DiagramSession::from_parts(
            project_id.clone(),
            session_id.clone(),
            Arc::clone(&self.config),
            DiagramStore::from_state(persisted.diagram)?,
            ViewProjector::restore(views, &persisted.active_view, canonical),
            self.folder.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::Workspace;
    use crate::config::Config;
    use crate::model::{ProjectId, SessionId};

    fn ids(project: &str, session: &str) -> (ProjectId, SessionId) {
        (
            ProjectId::new(project).expect("project id"),
            SessionId::new(session).expect("session id"),
        )
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_project_and_session() {
        let workspace = Workspace::new(Config::default());
        let (p1, s1) = ids("p1", "s1");
        let (p2, s2) = ids("p2", "s1");

        let first = workspace.session(&p1, &s1).expect("first");
        let second = workspace.session(&p2, &s2).expect("second");
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &workspace.session(&p1, &s1).expect("again")));

        first
            .dispatch_value(&json!({
                "intent": "DSL_CREATE",
                "message": "",
                "confidence": 1.0,
                "payload": {
                    "version_id": 1,
                    "diagram_state": { "nodes": [{ "id": "a" }], "edges": [] }
                }
            }))
            .await
            .expect("create");

        assert_eq!(first.current_version(), 1);
        assert_eq!(second.current_version(), 0);
        assert_eq!(workspace.open_sessions().len(), 2);
    }

    #[test]
    fn racing_first_access_yields_one_shared_session() {
        let workspace = Arc::new(Workspace::new(Config::default()));
        let handles = (0..8)
            .map(|idx| {
                let workspace = Arc::clone(&workspace);
                std::thread::spawn(move || {
                    let (project, session) = ids("p1", if idx % 2 == 0 { "even" } else { "odd" });
                    workspace.session(&project, &session).expect("open")
                })
            })
            .collect::<Vec<_>>();
        let sessions = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect::<Vec<_>>();

        let (p1, even) = ids("p1", "even");
        let (_, odd) = ids("p1", "odd");
        let even = workspace.session(&p1, &even).expect("even");
        let odd = workspace.session(&p1, &odd).expect("odd");
        for (idx, session) in sessions.iter().enumerate() {
            let expected = if idx % 2 == 0 { &even } else { &odd };
            assert!(Arc::ptr_eq(session, expected));
        }
        assert_eq!(workspace.open_sessions().len(), 2);
    }
}
