// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::{Edge, Node, NodeId, SessionId, ViewId};

use super::envelope::{
    ClarifyRequest, DiagramPayload, DslChange, EnvelopeMeta, ExpertAnswer, Intent,
    OutOfScopeNotice, Reference, Response, ViewToggle,
};
use super::wire::{WireEdge, WireNode};
use super::{MalformedReason, MalformedResponse};

/// Parses a raw JSON document into a validated [`Response`].
pub fn parse_response_str(raw: &str) -> Result<Response, MalformedResponse> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| MalformedReason::InvalidJson(err.to_string()))?;
    parse_response(&value)
}

/// Validates a raw envelope against the required shape of its intent.
///
/// Variant fields are looked up in `payload` first and then on the envelope itself; `null` counts
/// as absent.
pub fn parse_response(raw: &Value) -> Result<Response, MalformedResponse> {
    let envelope = raw.as_object().ok_or(MalformedReason::NotAnObject)?;

    let tag = required_str(envelope, "intent")?;
    let intent =
        Intent::from_tag(tag).ok_or_else(|| MalformedReason::UnknownIntent(tag.to_owned()))?;
    let meta = parse_meta(envelope)?;
    let fields = Fields::new(envelope)?;

    let response = match intent {
        Intent::DslCreate => Response::DslCreate(parse_dsl_change(meta, &fields)?),
        Intent::DslUpdate => Response::DslUpdate(parse_dsl_change(meta, &fields)?),
        Intent::ViewToggle => {
            let raw_view = match fields.get("target_view") {
                Some(Value::String(view)) => view,
                Some(_) => return Err(wrong_type("target_view", "string")),
                None => return Err(MalformedReason::MissingField("target_view").into()),
            };
            let target_view =
                ViewId::new(raw_view.clone()).map_err(|source| MalformedReason::InvalidId {
                    field: "target_view",
                    value: raw_view.clone(),
                    source,
                })?;
            let diagram = fields
                .get("diagram_state")
                .map(parse_diagram_payload)
                .transpose()?;
            Response::ViewToggle(ViewToggle::new(meta, target_view, diagram))
        }
        Intent::ExpertQa => {
            let references = match fields.get("references") {
                None => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => Ok(map
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect::<Reference>()),
                        _ => Err(wrong_type("references", "array of objects")),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => return Err(wrong_type("references", "array of objects")),
            };
            Response::ExpertQa(ExpertAnswer::new(meta, references))
        }
        Intent::Clarify => {
            let questions = match fields.get("questions") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(ToOwned::to_owned)
                            .ok_or_else(|| wrong_type("questions", "array of strings"))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => return Err(wrong_type("questions", "array of strings")),
                None => return Err(MalformedReason::MissingField("questions").into()),
            };
            if questions.is_empty() {
                return Err(MalformedReason::EmptyQuestions.into());
            }
            Response::Clarify(ClarifyRequest::new(meta, questions))
        }
        Intent::OutOfScope => {
            let suggestion = match fields.get("suggestion") {
                None => None,
                Some(Value::String(suggestion)) => Some(suggestion.clone()),
                Some(_) => return Err(wrong_type("suggestion", "string")),
            };
            Response::OutOfScope(OutOfScopeNotice::new(meta, suggestion))
        }
    };

    Ok(response)
}

struct Fields<'a> {
    envelope: &'a Map<String, Value>,
    payload: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn new(envelope: &'a Map<String, Value>) -> Result<Self, MalformedResponse> {
        let payload = match envelope.get("payload") {
            None | Some(Value::Null) => None,
            Some(Value::Object(payload)) => Some(payload),
            Some(_) => return Err(wrong_type("payload", "object")),
        };
        Ok(Self { envelope, payload })
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.payload
            .and_then(|payload| payload.get(name))
            .filter(|value| !value.is_null())
            .or_else(|| self.envelope.get(name).filter(|value| !value.is_null()))
    }
}

fn wrong_type(field: &'static str, expected: &'static str) -> MalformedResponse {
    MalformedReason::WrongType { field, expected }.into()
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, MalformedResponse> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value),
        None | Some(Value::Null) => Err(MalformedReason::MissingField(field).into()),
        Some(_) => Err(wrong_type(field, "string")),
    }
}

fn optional_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, MalformedResponse> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(wrong_type(field, "string")),
    }
}

fn parse_meta(envelope: &Map<String, Value>) -> Result<EnvelopeMeta, MalformedResponse> {
    let message = required_str(envelope, "message")?.to_owned();

    let confidence = match envelope.get("confidence") {
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| wrong_type("confidence", "number"))?,
        None | Some(Value::Null) => return Err(MalformedReason::MissingField("confidence").into()),
        Some(_) => return Err(wrong_type("confidence", "number")),
    };
    if !(0.0..=1.0).contains(&confidence) {
        return Err(MalformedReason::ConfidenceOutOfRange(confidence).into());
    }

    let session_id = optional_str(envelope, "session_id")?
        .map(|raw| {
            SessionId::new(raw).map_err(|source| MalformedReason::InvalidId {
                field: "session_id",
                value: raw.to_owned(),
                source,
            })
        })
        .transpose()?;
    let classification_source = optional_str(envelope, "classification_source")?.map(str::to_owned);

    Ok(EnvelopeMeta::new(
        message,
        confidence,
        session_id,
        classification_source,
    ))
}

fn parse_dsl_change(
    meta: EnvelopeMeta,
    fields: &Fields<'_>,
) -> Result<DslChange, MalformedResponse> {
    let version_id = match fields.get("version_id") {
        Some(Value::Number(number)) => number
            .as_u64()
            .ok_or_else(|| wrong_type("version_id", "non-negative integer"))?,
        Some(_) => return Err(wrong_type("version_id", "non-negative integer")),
        None => return Err(MalformedReason::MissingField("version_id").into()),
    };

    let diagram = match fields.get("diagram_state") {
        Some(value) => parse_diagram_payload(value)?,
        None => return Err(MalformedReason::MissingField("diagram_state").into()),
    };

    let pinned_nodes = match fields.get("pinned_nodes") {
        None => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| {
                    let raw = item
                        .as_str()
                        .ok_or_else(|| wrong_type("pinned_nodes", "array of strings"))?;
                    NodeId::new(raw).map_err(|source| {
                        MalformedResponse::from(MalformedReason::InvalidId {
                            field: "pinned_nodes",
                            value: raw.to_owned(),
                            source,
                        })
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => return Err(wrong_type("pinned_nodes", "array of strings")),
    };

    Ok(DslChange::new(meta, version_id, diagram, pinned_nodes))
}

fn parse_diagram_payload(value: &Value) -> Result<DiagramPayload, MalformedResponse> {
    let Value::Object(state) = value else {
        return Err(wrong_type("diagram_state", "object"));
    };

    let raw_nodes = match state.get("nodes") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(wrong_type("diagram_state.nodes", "array")),
        None => return Err(MalformedReason::MissingField("diagram_state.nodes").into()),
    };
    let raw_edges = match state.get("edges") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(wrong_type("diagram_state.edges", "array")),
        None => return Err(MalformedReason::MissingField("diagram_state.edges").into()),
    };

    let mut nodes = Vec::<Node>::with_capacity(raw_nodes.len());
    for (index, item) in raw_nodes.iter().enumerate() {
        let wire = WireNode::deserialize(item).map_err(|err| MalformedReason::InvalidNode {
            index,
            message: err.to_string(),
        })?;
        upsert_in_place(&mut nodes, wire.into_node()?, |node| node.id().as_str());
    }

    let mut edges = Vec::<Edge>::with_capacity(raw_edges.len());
    for (index, item) in raw_edges.iter().enumerate() {
        let wire = WireEdge::deserialize(item).map_err(|err| MalformedReason::InvalidEdge {
            index,
            message: err.to_string(),
        })?;
        upsert_in_place(&mut edges, wire.into_edge()?, |edge| edge.id().as_str());
    }

    Ok(DiagramPayload::new(nodes, edges))
}

/// A repeated id overwrites the earlier entry without moving it.
fn upsert_in_place<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &str) {
    let new_key = key(&item).to_owned();
    match items.iter().position(|existing| key(existing) == new_key) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}
