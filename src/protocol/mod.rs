// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Intent-response protocol.
//!
//! Every AI turn yields one JSON envelope tagged by `intent`. The parser validates the payload that
//! intent requires and produces exactly one [`Response`] variant; it has no side effects.

mod envelope;
mod parse;
mod wire;

pub use envelope::{
    ClarifyRequest, DiagramPayload, DslChange, EnvelopeMeta, ExpertAnswer, Intent,
    OutOfScopeNotice, Reference, Response, ViewToggle,
};
pub use parse::{parse_response, parse_response_str};
pub use wire::{WireEdge, WireNode, WirePosition};

use crate::model::IdError;

/// The envelope could not be turned into a typed response; the turn is discarded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed response: {reason}")]
pub struct MalformedResponse {
    pub reason: MalformedReason,
}

impl From<MalformedReason> for MalformedResponse {
    fn from(reason: MalformedReason) -> Self {
        Self { reason }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedReason {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("envelope is not a JSON object")]
    NotAnObject,
    #[error("unrecognized intent '{0}'")]
    UnknownIntent(String),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("confidence {0} is outside 0..1")]
    ConfidenceOutOfRange(f64),
    #[error("questions must not be empty")]
    EmptyQuestions,
    #[error("invalid node at index {index}: {message}")]
    InvalidNode { index: usize, message: String },
    #[error("invalid edge at index {index}: {message}")]
    InvalidEdge { index: usize, message: String },
    #[error("invalid id in '{field}' ({value:?}): {source}")]
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
}

#[cfg(test)]
mod tests;
