// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-session turn orchestration.
//!
//! A turn is: classify the user query, parse the envelope, then do exactly one of
//! {merge into the diagram, switch view, record a non-mutating exchange}.

mod runtime;
mod tracker;
mod workspace;

use std::time::Duration;

pub use runtime::{DiagramSession, TurnOutcome};
pub use tracker::{Exchange, ExchangeKind, PendingClarification, SessionTracker};
pub use workspace::Workspace;

use crate::classify::ClassifierError;
use crate::ops::{EditError, MergeError};
use crate::protocol::MalformedResponse;
use crate::render::ViewError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Malformed(#[from] MalformedResponse),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error("classification timed out after {after:?}")]
    ClassificationTimeout { after: Duration },
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    /// A newer query for the same session arrived before this one was classified.
    #[error("turn superseded by a newer query (generation {generation})")]
    Superseded { generation: u64 },
    #[error("diagram changes are on hold until {questions} clarification question(s) are answered")]
    AwaitingClarification { questions: usize },
    #[error(transparent)]
    UserEdit(#[from] EditError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TurnError {
    /// Whether re-issuing the same query may succeed without user involvement.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Merge(err) => err.is_stale(),
            Self::UserEdit(EditError::Store(StoreError::VersionConflict { .. })) => true,
            Self::ClassificationTimeout { .. } => true,
            _ => false,
        }
    }
}
