// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::rstest;
use serde_json::json;

use super::{parse_response, parse_response_str, Intent, MalformedReason, Response};

fn dsl(intent: &str) -> serde_json::Value {
    json!({
        "intent": intent,
        "message": "Here is your diagram",
        "confidence": 0.92,
        "session_id": "s-1",
        "classification_source": "llm",
        "payload": {
            "version_id": 4,
            "diagram_state": {
                "nodes": [
                    { "id": "api", "type": "service", "position": { "x": 10.0, "y": 20.0 },
                      "data": { "label": "API", "icon": "aws-api-gateway" } },
                    { "id": "db", "label": "Orders DB", "metadata": { "icon": "postgres" } }
                ],
                "edges": [
                    { "source": "api", "target": "db", "label": "reads" }
                ]
            },
            "pinned_nodes": ["api"]
        }
    })
}

#[test]
fn dsl_create_parses_nodes_edges_and_pins() {
    let response = parse_response(&dsl("DSL_CREATE")).expect("parse");
    assert_eq!(response.intent(), Intent::DslCreate);
    assert_eq!(response.meta().message(), "Here is your diagram");
    assert_eq!(response.meta().session_id().map(|s| s.as_str()), Some("s-1"));
    assert_eq!(response.meta().classification_source(), Some("llm"));

    let Response::DslCreate(change) = response else {
        panic!("expected DSL_CREATE");
    };
    assert_eq!(change.version_id(), 4);

    let nodes = change.diagram().nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].label(), "API");
    assert_eq!(nodes[0].kind(), "service");
    assert_eq!(nodes[0].icon(), Some("aws-api-gateway"));
    assert_eq!(nodes[0].position().x, 10.0);
    assert_eq!(nodes[1].label(), "Orders DB");
    assert_eq!(nodes[1].kind(), "default");
    assert_eq!(nodes[1].icon(), Some("postgres"));

    let edges = change.diagram().edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].id().as_str(), "api->db");
    assert_eq!(edges[0].label(), Some("reads"));

    let pins = change.pinned_nodes().expect("pins");
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].as_str(), "api");
}

#[test]
fn repeated_node_ids_overwrite_in_place() {
    let raw = json!({
        "intent": "DSL_UPDATE",
        "message": "",
        "confidence": 1,
        "payload": {
            "version_id": 1,
            "diagram_state": {
                "nodes": [
                    { "id": "a", "label": "first" },
                    { "id": "b" },
                    { "id": "a", "label": "second" }
                ],
                "edges": []
            }
        }
    });

    let Response::DslUpdate(change) = parse_response(&raw).expect("parse") else {
        panic!("expected DSL_UPDATE");
    };
    let labels = change
        .diagram()
        .nodes()
        .iter()
        .map(|node| (node.id().as_str(), node.label()))
        .collect::<Vec<_>>();
    assert_eq!(labels, vec![("a", "second"), ("b", "b")]);
}

#[rstest]
#[case::unknown_intent(json!({"intent": "DRAW", "message": "", "confidence": 0.5}), MalformedReason::UnknownIntent("DRAW".to_owned()))]
#[case::missing_intent(json!({"message": "", "confidence": 0.5}), MalformedReason::MissingField("intent"))]
#[case::missing_message(json!({"intent": "CLARIFY", "confidence": 0.5, "questions": ["?"]}), MalformedReason::MissingField("message"))]
#[case::confidence_range(json!({"intent": "OUT_OF_SCOPE", "message": "", "confidence": 1.5}), MalformedReason::ConfidenceOutOfRange(1.5))]
#[case::missing_version(json!({"intent": "DSL_CREATE", "message": "", "confidence": 0.5, "payload": {"diagram_state": {"nodes": [], "edges": []}}}), MalformedReason::MissingField("version_id"))]
#[case::missing_nodes(json!({"intent": "DSL_CREATE", "message": "", "confidence": 0.5, "payload": {"version_id": 1, "diagram_state": {"edges": []}}}), MalformedReason::MissingField("diagram_state.nodes"))]
#[case::edges_not_array(json!({"intent": "DSL_UPDATE", "message": "", "confidence": 0.5, "payload": {"version_id": 1, "diagram_state": {"nodes": [], "edges": {}}}}), MalformedReason::WrongType { field: "diagram_state.edges", expected: "array" })]
#[case::missing_target_view(json!({"intent": "VIEW_TOGGLE", "message": "", "confidence": 0.5}), MalformedReason::MissingField("target_view"))]
#[case::empty_questions(json!({"intent": "CLARIFY", "message": "", "confidence": 0.5, "questions": []}), MalformedReason::EmptyQuestions)]
#[case::bad_references(json!({"intent": "EXPERT_QA", "message": "", "confidence": 0.5, "references": ["x"]}), MalformedReason::WrongType { field: "references", expected: "array of objects" })]
fn malformed_envelopes_are_rejected(
    #[case] raw: serde_json::Value,
    #[case] expected: MalformedReason,
) {
    let err = parse_response(&raw).expect_err("should be malformed");
    assert_eq!(err.reason, expected);
}

#[test]
fn node_without_id_is_reported_with_its_index() {
    let raw = json!({
        "intent": "DSL_CREATE",
        "message": "",
        "confidence": 0.5,
        "payload": {
            "version_id": 1,
            "diagram_state": { "nodes": [{ "id": "a" }, { "label": "no id" }], "edges": [] }
        }
    });
    let err = parse_response(&raw).expect_err("malformed");
    assert!(matches!(err.reason, MalformedReason::InvalidNode { index: 1, .. }));
}

#[test]
fn view_toggle_reads_top_level_fields_and_optional_diagram() {
    let raw = json!({
        "intent": "VIEW_TOGGLE",
        "message": "Switching to D2",
        "confidence": 0.8,
        "target_view": "d2",
        "diagram_state": { "nodes": [{ "id": "a" }], "edges": [] }
    });
    let Response::ViewToggle(toggle) = parse_response(&raw).expect("parse") else {
        panic!("expected VIEW_TOGGLE");
    };
    assert_eq!(toggle.target_view().as_str(), "d2");
    assert_eq!(toggle.diagram().map(|d| d.nodes().len()), Some(1));
}

#[test]
fn non_mutating_variants_carry_only_their_fields() {
    let raw = json!({
        "intent": "EXPERT_QA",
        "message": "Use a queue.",
        "confidence": 0.7,
        "references": [{ "title": "Queues", "url": "https://example.com" }]
    });
    let Response::ExpertQa(answer) = parse_response(&raw).expect("parse") else {
        panic!("expected EXPERT_QA");
    };
    assert_eq!(answer.references().len(), 1);
    assert_eq!(answer.references()[0]["title"], "Queues");

    let raw = json!({
        "intent": "CLARIFY",
        "message": "Need details",
        "confidence": 0.4,
        "questions": ["Which cloud?", "Expected load?"]
    });
    let Response::Clarify(request) = parse_response(&raw).expect("parse") else {
        panic!("expected CLARIFY");
    };
    assert_eq!(request.questions(), ["Which cloud?", "Expected load?"]);

    let raw = json!({
        "intent": "OUT_OF_SCOPE",
        "message": "I only do diagrams",
        "confidence": 0.9,
        "suggestion": "Ask about your architecture"
    });
    let Response::OutOfScope(notice) = parse_response(&raw).expect("parse") else {
        panic!("expected OUT_OF_SCOPE");
    };
    assert_eq!(notice.suggestion(), Some("Ask about your architecture"));
    assert!(!Intent::OutOfScope.mutates_diagram());
}

#[test]
fn invalid_json_text_is_malformed() {
    let err = parse_response_str("{ not json").expect_err("malformed");
    assert!(matches!(err.reason, MalformedReason::InvalidJson(_)));
}
