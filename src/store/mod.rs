// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canonical diagram state and its persistence.
//!
//! `DiagramStore` is the single source of truth for one project/session; `SessionFolder` mirrors
//! it to disk after each successful mutation.

pub mod diagram_store;
pub mod session_folder;

use std::io;
use std::path::PathBuf;

pub use diagram_store::{DiagramStore, Mutation};
pub use session_folder::{PersistedSession, SessionFolder, WriteDurability};

use crate::model::GraphViolation;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("version conflict (base_version={base_version}, current_version={current_version})")]
    VersionConflict {
        base_version: u64,
        current_version: u64,
    },
    #[error("invalid mutation: {0}")]
    InvalidMutation(#[from] GraphViolation),
    #[error("version counter exhausted")]
    VersionOverflow,
    #[error("io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unsupported session format {found} at {path:?}")]
    UnsupportedFormat { path: PathBuf, found: u32 },
    #[error("refusing to write through symlink {path:?}")]
    SymlinkRefused { path: PathBuf },
}
