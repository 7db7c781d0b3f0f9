// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{DiagramSession, TurnOutcome};
use crate::classify::{ClassificationRequest, Classifier, ClassifierError};
use crate::config::Config;
use crate::model::{NodeId, Position, ProjectId, SessionId};
use crate::ops::{EditError, MergeError};
use crate::render::{SwitchControl, ViewError};
use crate::session::{ExchangeKind, TurnError};

/// Replays queued responses in order, each after its own delay.
struct ScriptedClassifier {
    script: tokio::sync::Mutex<VecDeque<(Duration, Value)>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    fn new(script: impl IntoIterator<Item = (Duration, Value)>) -> Self {
        Self {
            script: tokio::sync::Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    fn immediate(responses: impl IntoIterator<Item = Value>) -> Self {
        Self::new(responses.into_iter().map(|raw| (Duration::ZERO, raw)))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<Value, ClassifierError> {
        assert_eq!(request.project_id.as_str(), "proj");
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().await.pop_front();
        let Some((delay, raw)) = next else {
            return Err(ClassifierError::Rejected("script exhausted".to_owned()));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(raw)
    }
}

fn config() -> Arc<Config> {
    Arc::new(Config {
        classification_timeout: Duration::from_secs(5),
        ..Config::default()
    })
}

fn session() -> DiagramSession {
    DiagramSession::new(
        ProjectId::new("proj").expect("project id"),
        SessionId::new("sess").expect("session id"),
        config(),
    )
}

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn dsl(intent: &str, version_id: u64, nodes: &[&str], edges: &[(&str, &str)]) -> Value {
    let nodes = nodes
        .iter()
        .map(|id| json!({ "id": id, "label": id.to_uppercase() }))
        .collect::<Vec<_>>();
    let edges = edges
        .iter()
        .map(|(source, target)| json!({ "source": source, "target": target }))
        .collect::<Vec<_>>();
    json!({
        "intent": intent,
        "message": "diagram",
        "confidence": 0.9,
        "payload": {
            "version_id": version_id,
            "diagram_state": {
                "nodes": nodes,
                "edges": edges,
            }
        }
    })
}

fn clarify(questions: &[&str]) -> Value {
    json!({
        "intent": "CLARIFY",
        "message": "A few questions first",
        "confidence": 0.5,
        "questions": questions,
    })
}

#[tokio::test]
async fn clarify_leaves_diagram_untouched_and_blocks_dsl_until_next_turn() {
    let session = session();
    session
        .dispatch_value(&dsl("DSL_CREATE", 1, &["a", "b"], &[("a", "b")]))
        .await
        .expect("create");
    let before = session.snapshot();

    let outcome = session
        .dispatch_value(&clarify(&["Which region?", "Which database?"]))
        .await
        .expect("clarify");
    let TurnOutcome::Recorded(exchange) = outcome else {
        panic!("expected a recorded exchange");
    };
    assert!(matches!(
        exchange.kind,
        ExchangeKind::Clarify { ref questions } if questions.len() == 2
    ));
    assert_eq!(session.snapshot(), before);
    assert_eq!(
        session.pending_clarification().map(|p| p.questions),
        Some(vec!["Which region?".to_owned(), "Which database?".to_owned()])
    );

    let err = session
        .dispatch_value(&dsl("DSL_UPDATE", 2, &["c"], &[]))
        .await
        .expect_err("blocked");
    assert!(matches!(err, TurnError::AwaitingClarification { questions: 2 }));
    assert_eq!(session.current_version(), 1);

    session.begin_user_turn();
    assert!(session.pending_clarification().is_none());
    session
        .dispatch_value(&dsl("DSL_UPDATE", 2, &["c"], &[]))
        .await
        .expect("update after answer");
    assert_eq!(session.current_version(), 2);
}

#[tokio::test]
async fn view_toggle_switches_view_without_mutating_diagram() {
    let session = session();
    assert_eq!(session.listing().control, SwitchControl::Disabled);

    let outcome = session
        .dispatch_value(&json!({
            "intent": "VIEW_TOGGLE",
            "message": "Here is the D2 export",
            "confidence": 0.95,
            "target_view": "d2"
        }))
        .await
        .expect("toggle");

    assert!(matches!(outcome, TurnOutcome::ViewSwitched(ref t) if t.newly_registered));
    assert_eq!(session.current_version(), 0);
    let listing = session.listing();
    assert_eq!(listing.active.as_str(), "d2");
    assert_eq!(listing.control, SwitchControl::Selector);
    assert!(session.exchanges().is_empty());

    let err = session.switch_view("context").await.expect_err("unknown view");
    assert!(matches!(err, TurnError::View(ViewError::UnknownView(_))));
    assert_eq!(session.listing().active.as_str(), "d2");
}

#[tokio::test]
async fn malformed_response_is_discarded() {
    let session = session();
    let err = session
        .dispatch_value(&json!({ "intent": "DSL_CREATE", "message": "", "confidence": 1 }))
        .await
        .expect_err("malformed");
    assert!(matches!(err, TurnError::Malformed(_)));
    assert!(!err.is_retryable());
    assert_eq!(session.current_version(), 0);
}

#[tokio::test]
async fn stale_response_is_reissued_once() {
    let session = session();
    session
        .dispatch_value(&dsl("DSL_CREATE", 1, &["a"], &[]))
        .await
        .expect("create");

    let classifier = ScriptedClassifier::immediate([
        dsl("DSL_UPDATE", 1, &["b"], &[]),
        dsl("DSL_UPDATE", 2, &["b"], &[("a", "b")]),
    ]);
    let outcome = session.run_turn(&classifier, "add b").await.expect("turn");

    assert_eq!(classifier.calls(), 2);
    let TurnOutcome::Merged(merged) = outcome else {
        panic!("expected a merge");
    };
    assert_eq!(merged.snapshot.version(), 2);
    assert_eq!(merged.snapshot.edges().len(), 1);
}

#[tokio::test]
async fn repeated_staleness_surfaces_to_the_caller() {
    let session = session();
    let classifier = ScriptedClassifier::immediate([
        dsl("DSL_CREATE", 7, &["a"], &[]),
        dsl("DSL_CREATE", 7, &["a"], &[]),
    ]);

    let err = session.run_turn(&classifier, "draw").await.expect_err("stale");
    assert_eq!(classifier.calls(), 2);
    assert!(matches!(
        err,
        TurnError::Merge(MergeError::VersionMismatch { expected: 1, received: 7 })
    ));
    assert_eq!(session.current_version(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_classifier_times_out_without_touching_state() {
    let session = session();
    let classifier = ScriptedClassifier::new([(
        Duration::from_secs(60),
        dsl("DSL_CREATE", 1, &["a"], &[]),
    )]);

    let err = session.run_turn(&classifier, "draw").await.expect_err("timeout");
    assert!(matches!(
        err,
        TurnError::ClassificationTimeout { after } if after == Duration::from_secs(5)
    ));
    assert!(err.is_retryable());
    assert_eq!(session.current_version(), 0);
}

#[tokio::test(start_paused = true)]
async fn newer_query_supersedes_in_flight_turn() {
    let session = Arc::new(session());
    let classifier = Arc::new(ScriptedClassifier::new([
        (Duration::from_secs(3), dsl("DSL_CREATE", 1, &["old"], &[])),
        (Duration::ZERO, dsl("DSL_CREATE", 1, &["new"], &[])),
    ]));

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        let classifier = Arc::clone(&classifier);
        async move { session.run_turn(classifier.as_ref(), "first").await }
    });
    tokio::task::yield_now().await;

    session
        .run_turn(classifier.as_ref(), "second")
        .await
        .expect("second turn");

    let err = first.await.expect("join").expect_err("superseded");
    assert!(matches!(err, TurnError::Superseded { generation: 1 }));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.version(), 1);
    assert!(snapshot.contains_node("new"));
    assert!(!snapshot.contains_node("old"));
}

#[tokio::test]
async fn user_edits_pin_move_and_unpin() {
    let session = session();
    session
        .dispatch_value(&dsl("DSL_CREATE", 1, &["a", "b"], &[("a", "b")]))
        .await
        .expect("create");

    let pinned = session.pin_node(nid("a"), 1).await.expect("pin");
    assert!(pinned.is_pinned("a"));
    let moved = session
        .move_node(nid("a"), Position::new(10.0, 20.0), 2)
        .await
        .expect("move");
    assert_eq!(moved.node("a").map(|n| n.position()), Some(Position::new(10.0, 20.0)));

    let recreated = session
        .dispatch_value(&dsl("DSL_CREATE", 4, &["c"], &[]))
        .await
        .expect("recreate");
    let TurnOutcome::Merged(merged) = recreated else {
        panic!("expected a merge");
    };
    assert_eq!(merged.snapshot.node("a"), moved.node("a"));
    assert!(!merged.snapshot.contains_node("b"));

    let err = session.unpin_node(nid("a"), 3).await.expect_err("stale base");
    assert!(matches!(err, TurnError::UserEdit(EditError::Store(_))));
    assert!(err.is_retryable());
    let unpinned = session.unpin_node(nid("a"), 4).await.expect("unpin");
    assert!(!unpinned.is_pinned("a"));
}

#[tokio::test]
async fn projections_follow_the_canonical_state() {
    let session = session();
    session
        .dispatch_value(&dsl("DSL_CREATE", 1, &["a", "b"], &[("a", "b")]))
        .await
        .expect("create");

    let canvas = session.project_active().expect("canvas");
    assert_eq!(canvas.version, 1);
    assert!(Arc::ptr_eq(&canvas, &session.project_active().expect("cached")));

    let err = session.project("d2").expect_err("not registered");
    assert!(matches!(err, TurnError::View(ViewError::UnknownView(_))));
    assert_eq!(session.project_all().expect("all").len(), 1);
}

#[tokio::test]
async fn concurrent_updates_for_one_session_are_serialized() {
    let session = session();
    session
        .dispatch_value(&dsl("DSL_CREATE", 1, &["a"], &[]))
        .await
        .expect("create");

    let first = dsl("DSL_UPDATE", 2, &["b"], &[("a", "b")]);
    let second = dsl("DSL_UPDATE", 2, &["c"], &[("a", "c")]);
    let (left, right) =
        tokio::join!(session.dispatch_value(&first), session.dispatch_value(&second));

    let results = [left, right];
    let merged = results
        .iter()
        .filter(|result| matches!(result, Ok(TurnOutcome::Merged(_))))
        .count();
    assert_eq!(merged, 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(TurnError::Merge(MergeError::VersionMismatch { expected: 3, received: 2 }))
    )));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.version(), 2);
    assert_eq!(snapshot.nodes().len(), 2);
    assert_eq!(snapshot.edges().len(), 1);
    snapshot.validate().expect("consistent state");
}

#[tokio::test(start_paused = true)]
async fn turn_overtaken_by_a_user_edit_is_reissued_at_the_new_version() {
    let session = Arc::new(session());
    session
        .dispatch_value(&dsl("DSL_CREATE", 1, &["a"], &[]))
        .await
        .expect("create");
    let classifier = Arc::new(ScriptedClassifier::new([
        (Duration::from_secs(1), dsl("DSL_UPDATE", 2, &["b"], &[])),
        (Duration::ZERO, dsl("DSL_UPDATE", 3, &["b"], &[("a", "b")])),
    ]));

    let turn = tokio::spawn({
        let session = Arc::clone(&session);
        let classifier = Arc::clone(&classifier);
        async move { session.run_turn(classifier.as_ref(), "add b").await }
    });
    tokio::task::yield_now().await;

    let pinned = session.pin_node(nid("a"), 1).await.expect("pin while classifying");
    assert_eq!(pinned.version(), 2);

    let outcome = turn.await.expect("join").expect("reissued turn");
    assert_eq!(classifier.calls(), 2);
    let TurnOutcome::Merged(merged) = outcome else {
        panic!("expected a merge");
    };
    assert_eq!(merged.snapshot.version(), 3);
    assert!(merged.snapshot.is_pinned("a"));
    assert_eq!(merged.snapshot.edges().len(), 1);
}
