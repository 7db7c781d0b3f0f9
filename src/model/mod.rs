// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A session owns one canonical `DiagramState` (versioned nodes/edges plus the pinned-node set)
//! and the list of view descriptors it can be presented through.

pub mod diagram;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod view;

pub use diagram::{
    validate_graph, DiagramState, Edge, GraphViolation, Metadata, Node, Position, ICON_KEY,
    LABEL_KEY,
};
pub use ids::{EdgeId, Id, IdError, NodeId, ProjectId, SessionId, ViewId};
pub use view::{ViewDescriptor, ViewOverlay, CANONICAL_VIEW};
