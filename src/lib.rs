// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus: intent-response protocol and multi-view diagram synchronization.
//!
//! A classification service answers each user query with one of six intents. Diagram intents
//! are merged into a versioned canonical diagram, view toggles change which projection
//! (React Flow canvas, D2, Mermaid) is active, and the remaining intents are recorded as
//! conversation exchanges. Everything is exposed over MCP.

pub mod classify;
pub mod config;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod protocol;
pub mod render;
pub mod session;
pub mod store;
