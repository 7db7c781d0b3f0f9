// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Projections of the canonical diagram into alternate presentations.
//!
//! Each view is a pure function from `(DiagramState, view id)` to text. The [`ViewProjector`]
//! tracks which views are registered, which one is active, and caches projections per
//! `(view, version)` so re-projecting an unchanged state is free and byte-identical.

mod d2;
mod ident;
mod mermaid;
mod projector;
mod reactflow;

use serde::Serialize;

use crate::model::{DiagramState, ViewId, CANONICAL_VIEW};

pub use projector::{SwitchControl, ToggleOutcome, ViewListing, ViewProjector};

pub const D2_VIEW: &str = "d2";
pub const MERMAID_VIEW: &str = "mermaid";
pub const CONTEXT_VIEW: &str = "context";

/// Content type of a projection body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionFormat {
    Json,
    D2,
    Mermaid,
}

impl ProjectionFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::D2 => "d2",
            Self::Mermaid => "mermaid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub view_id: ViewId,
    /// Canonical version the projection was derived from.
    pub version: u64,
    pub format: ProjectionFormat,
    /// True when a view-local overlay was projected instead of the canonical state.
    pub from_overlay: bool,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to serialize projection: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("unknown view: {0}")]
    UnknownView(String),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Projects `state` for `view_id`. Unknown view ids fall back to the canonical JSON snapshot.
pub fn project_state(
    view_id: &ViewId,
    state: &DiagramState,
) -> Result<(ProjectionFormat, String), ProjectionError> {
    Ok(match view_id.as_str() {
        CANONICAL_VIEW => (ProjectionFormat::Json, reactflow::project_canvas(state)?),
        D2_VIEW => (ProjectionFormat::D2, d2::project_d2(state)),
        MERMAID_VIEW => (ProjectionFormat::Mermaid, mermaid::project_flowchart(state)),
        CONTEXT_VIEW => (ProjectionFormat::Mermaid, mermaid::project_context(state)),
        _ => (ProjectionFormat::Json, reactflow::project_canonical_json(state)?),
    })
}
