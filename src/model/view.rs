// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use super::diagram::DiagramState;
use super::ids::ViewId;

/// The canonical graph-canvas view every session starts with.
pub const CANONICAL_VIEW: &str = "reactflow";

/// One entry of the "available views" list surfaced to the switching control.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDescriptor {
    view_id: ViewId,
    active: bool,
    overlay: Option<ViewOverlay>,
}

/// A view-local diagram carried by a `VIEW_TOGGLE`; it never reaches the canonical state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOverlay {
    base_version: u64,
    state: Arc<DiagramState>,
}

impl ViewOverlay {
    pub fn new(base_version: u64, state: DiagramState) -> Self {
        Self {
            base_version,
            state: Arc::new(state),
        }
    }

    /// Canonical version the overlay was received against.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn state(&self) -> &Arc<DiagramState> {
        &self.state
    }
}

impl ViewDescriptor {
    pub fn new(view_id: ViewId) -> Self {
        Self {
            view_id,
            active: false,
            overlay: None,
        }
    }

    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn overlay(&self) -> Option<&ViewOverlay> {
        self.overlay.as_ref()
    }

    pub(crate) fn set_overlay(&mut self, overlay: Option<ViewOverlay>) {
        self.overlay = overlay;
    }
}
