// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use serde::Serialize;

use crate::model::{DiagramState, Edge, ViewDescriptor, ViewId, ViewOverlay};
use crate::protocol::{DiagramPayload, ViewToggle};

use super::{project_state, Projection, ViewError};

/// How the view-switching control must be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchControl {
    /// Fewer than two views: a single-valued, non-interactive affordance.
    Disabled,
    Selector,
}

impl SwitchControl {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Selector => "selector",
        }
    }
}

/// The "available views" surface: ordered ids plus the active one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewListing {
    pub views: Vec<ViewId>,
    pub active: ViewId,
    pub control: SwitchControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub view_id: ViewId,
    pub newly_registered: bool,
    pub overlay_attached: bool,
}

type CacheKey = (ViewId, u64, bool);

/// Registered views for one session, exactly one of which is active.
///
/// Views are appended in registration order and never removed. Projections are computed lazily
/// and cached; the cache only keeps entries for the most recently projected version.
#[derive(Debug)]
pub struct ViewProjector {
    views: Vec<ViewDescriptor>,
    cache: Mutex<HashMap<CacheKey, Arc<Projection>>>,
}

impl ViewProjector {
    /// Starts with `initial` registered and active.
    pub fn new(initial: ViewId) -> Self {
        let mut descriptor = ViewDescriptor::new(initial);
        descriptor.set_active(true);
        Self {
            views: vec![descriptor],
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Rebuilds a projector from persisted view ids. `canonical` is always registered, first when
    /// the record lacks it. Falls back to the first view when `active` is not among them;
    /// duplicates are ignored.
    pub fn restore(
        views: impl IntoIterator<Item = ViewId>,
        active: &str,
        canonical: ViewId,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut descriptors = views
            .into_iter()
            .filter(|view_id| seen.insert(view_id.clone()))
            .map(ViewDescriptor::new)
            .collect::<Vec<_>>();
        if !seen.contains(&canonical) {
            descriptors.insert(0, ViewDescriptor::new(canonical));
        }

        let active_index = descriptors
            .iter()
            .position(|descriptor| descriptor.view_id().as_str() == active)
            .unwrap_or(0);
        for (index, descriptor) in descriptors.iter_mut().enumerate() {
            descriptor.set_active(index == active_index);
        }

        Self {
            views: descriptors,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn descriptors(&self) -> &[ViewDescriptor] {
        &self.views
    }

    pub fn active(&self) -> &ViewDescriptor {
        self.views
            .iter()
            .find(|descriptor| descriptor.is_active())
            .unwrap_or(&self.views[0])
    }

    pub fn active_view_id(&self) -> &ViewId {
        self.active().view_id()
    }

    pub fn is_registered(&self, view_id: &str) -> bool {
        self.views
            .iter()
            .any(|descriptor| descriptor.view_id().as_str() == view_id)
    }

    pub fn listing(&self) -> ViewListing {
        ViewListing {
            views: self
                .views
                .iter()
                .map(|descriptor| descriptor.view_id().clone())
                .collect(),
            active: self.active_view_id().clone(),
            control: if self.views.len() < 2 {
                SwitchControl::Disabled
            } else {
                SwitchControl::Selector
            },
        }
    }

    /// Activates a registered view; the diagram state is never touched.
    pub fn switch_view(&mut self, view_id: &str) -> Result<ViewId, ViewError> {
        let Some(index) = self
            .views
            .iter()
            .position(|descriptor| descriptor.view_id().as_str() == view_id)
        else {
            tracing::debug!(view_id, "switch to unregistered view rejected");
            return Err(ViewError::UnknownView(view_id.to_owned()));
        };

        self.activate(index);
        let active = self.views[index].view_id().clone();
        tracing::debug!(view_id = %active, "active view switched");
        Ok(active)
    }

    /// Handles a `VIEW_TOGGLE`: registers the target if needed and activates it. A carried
    /// diagram becomes that view's overlay, valid while the canonical version stays at
    /// `canonical_version`.
    pub fn apply_toggle(&mut self, toggle: &ViewToggle, canonical_version: u64) -> ToggleOutcome {
        let target = toggle.target_view();
        let (index, newly_registered) = match self
            .views
            .iter()
            .position(|descriptor| descriptor.view_id() == target)
        {
            Some(index) => (index, false),
            None => {
                self.views.push(ViewDescriptor::new(target.clone()));
                tracing::info!(view_id = %target, "registered view from toggle");
                (self.views.len() - 1, true)
            }
        };

        self.activate(index);

        let overlay = toggle.diagram().map(|payload| {
            ViewOverlay::new(canonical_version, overlay_state(canonical_version, payload))
        });
        let overlay_attached = overlay.is_some();
        if overlay_attached || self.views[index].overlay().is_some() {
            self.views[index].set_overlay(overlay);
            self.evict_view(target);
        }

        ToggleOutcome {
            view_id: target.clone(),
            newly_registered,
            overlay_attached,
        }
    }

    /// Projects `view_id` for `state`. Repeated calls for the same version return the cached,
    /// byte-identical projection.
    pub fn project(
        &self,
        view_id: &str,
        state: &DiagramState,
    ) -> Result<Arc<Projection>, ViewError> {
        let descriptor = self
            .views
            .iter()
            .find(|descriptor| descriptor.view_id().as_str() == view_id)
            .ok_or_else(|| ViewError::UnknownView(view_id.to_owned()))?;
        self.project_descriptor(descriptor, state)
    }

    /// Projects only the active view; inactive views are not recomputed.
    pub fn project_active(&self, state: &DiagramState) -> Result<Arc<Projection>, ViewError> {
        self.project_descriptor(self.active(), state)
    }

    /// Projects every registered view in parallel, in registration order.
    pub fn project_all(&self, state: &DiagramState) -> Result<Vec<Arc<Projection>>, ViewError> {
        self.views
            .par_iter()
            .map(|descriptor| self.project_descriptor(descriptor, state))
            .collect()
    }

    fn project_descriptor(
        &self,
        descriptor: &ViewDescriptor,
        state: &DiagramState,
    ) -> Result<Arc<Projection>, ViewError> {
        let version = state.version();
        let overlay = descriptor
            .overlay()
            .filter(|overlay| overlay.base_version() == version);
        let key = (descriptor.view_id().clone(), version, overlay.is_some());

        if let Some(hit) = self.lock_cache().get(&key) {
            return Ok(hit.clone());
        }

        let source = overlay.map_or(state, |overlay| overlay.state().as_ref());
        let (format, body) = project_state(descriptor.view_id(), source)?;
        let projection = Arc::new(Projection {
            view_id: descriptor.view_id().clone(),
            version,
            format,
            from_overlay: overlay.is_some(),
            body,
        });

        let mut cache = self.lock_cache();
        cache.retain(|(_, cached_version, _), _| *cached_version == version);
        let projection = cache.entry(key).or_insert(projection).clone();
        Ok(projection)
    }

    fn activate(&mut self, index: usize) {
        for (i, descriptor) in self.views.iter_mut().enumerate() {
            descriptor.set_active(i == index);
        }
    }

    fn evict_view(&self, view_id: &ViewId) {
        self.lock_cache().retain(|(cached_view, _, _), _| cached_view != view_id);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Arc<Projection>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turns a toggle payload into a renderable state; edges with missing endpoints are skipped.
fn overlay_state(version: u64, payload: &DiagramPayload) -> DiagramState {
    let node_ids = payload
        .nodes()
        .iter()
        .map(|node| node.id().as_str())
        .collect::<HashSet<_>>();
    let edges = payload
        .edges()
        .iter()
        .filter(|edge| {
            node_ids.contains(edge.source_id().as_str())
                && node_ids.contains(edge.target_id().as_str())
        })
        .cloned()
        .collect::<Vec<Edge>>();
    DiagramState::from_parts(version, payload.nodes().to_vec(), edges, BTreeSet::new())
}
