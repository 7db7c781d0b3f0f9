// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};

use super::{fs_segment, PersistedSession, SessionFolder, WriteDurability};
use crate::model::fixtures::{three_tier, with_pins};
use crate::model::{ProjectId, SessionId};
use crate::store::StoreError;

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("proteus-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct FolderTestCtx {
    _tmp: TempDir,
    folder: SessionFolder,
    project_id: ProjectId,
    session_id: SessionId,
}

#[fixture]
fn ctx() -> FolderTestCtx {
    let tmp = TempDir::new("session-folder");
    let folder = SessionFolder::new(tmp.path().join("sessions"));
    FolderTestCtx {
        _tmp: tmp,
        folder,
        project_id: ProjectId::new("proj-1").expect("project id"),
        session_id: SessionId::new("sess-1").expect("session id"),
    }
}

#[rstest]
fn load_session_returns_none_when_nothing_saved(ctx: FolderTestCtx) {
    let loaded = ctx.folder.load_session(&ctx.project_id, &ctx.session_id).expect("load");
    assert!(loaded.is_none());
}

#[rstest]
#[case(WriteDurability::BestEffort)]
#[case(WriteDurability::Durable)]
fn save_then_load_preserves_diagram_and_views(
    ctx: FolderTestCtx,
    #[case] durability: WriteDurability,
) {
    let folder = ctx.folder.clone().with_durability(durability);
    let session = PersistedSession::new(
        with_pins(three_tier(7), &["api"]),
        vec!["reactflow".to_owned(), "d2".to_owned()],
        "d2".to_owned(),
    );

    folder.save_session(&ctx.project_id, &ctx.session_id, &session).expect("save");
    let loaded = folder
        .load_session(&ctx.project_id, &ctx.session_id)
        .expect("load")
        .expect("present");

    assert_eq!(loaded, session);
    assert_eq!(loaded.diagram.version(), 7);
    assert!(loaded.diagram.is_pinned("api"));
}

#[rstest]
fn load_rejects_state_that_violates_invariants(ctx: FolderTestCtx) {
    let path = ctx.folder.state_path(&ctx.project_id, &ctx.session_id);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    let raw = serde_json::json!({
        "format_version": 1,
        "diagram": {
            "version": 2,
            "nodes": [{ "id": "a", "type": "service", "label": "A" }],
            "edges": [{ "id": "e", "source_id": "a", "target_id": "ghost" }]
        },
        "views": ["reactflow"],
        "active_view": "reactflow"
    });
    std::fs::write(&path, serde_json::to_vec(&raw).expect("json")).expect("write");

    let err = ctx
        .folder
        .load_session(&ctx.project_id, &ctx.session_id)
        .expect_err("invalid");
    assert!(matches!(err, StoreError::InvalidMutation(_)));
}

#[test]
fn fs_segment_never_traverses() {
    assert_eq!(fs_segment("proj-1_a"), "proj-1_a");
    assert_eq!(fs_segment(".."), "%2E%2E");
    assert_eq!(fs_segment("a/b"), "a%2Fb");
}
