// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;
use std::time::Duration;

use crate::model::{ViewId, CANONICAL_VIEW};
use crate::store::WriteDurability;

pub const DEFAULT_MCP_HTTP_PORT: u16 = 27436;
pub const DEFAULT_CLASSIFICATION_TIMEOUT: Duration = Duration::from_secs(30);

/// How the MCP surface is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    /// Streamable HTTP at `http://127.0.0.1:<port>/mcp`; port 0 picks an ephemeral port.
    Http { port: u16 },
}

impl Default for Transport {
    fn default() -> Self {
        Self::Http {
            port: DEFAULT_MCP_HTTP_PORT,
        }
    }
}

/// Runtime settings shared by every session of a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sessions are persisted below this directory when set; otherwise they live in memory only.
    pub session_dir: Option<PathBuf>,
    pub durability: WriteDurability,
    pub transport: Transport,
    pub classifier_url: Option<String>,
    pub classification_timeout: Duration,
    /// Total attempts for a turn whose response turned out stale (first try included).
    pub max_turn_attempts: usize,
    pub exchange_history_limit: usize,
    pub canonical_view: ViewId,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_dir: None,
            durability: WriteDurability::default(),
            transport: Transport::default(),
            classifier_url: None,
            classification_timeout: DEFAULT_CLASSIFICATION_TIMEOUT,
            max_turn_attempts: 2,
            exchange_history_limit: 64,
            canonical_view: ViewId::new(CANONICAL_VIEW).expect("static view id"),
        }
    }
}
