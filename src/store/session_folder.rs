// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::model::{DiagramState, ProjectId, SessionId};

use super::StoreError;

const STATE_FILE_SUFFIX: &str = ".diagram.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// - Syncs the temp file before the rename.
    /// - On Unix, also syncs the parent directory after the rename.
    Durable,
}

/// On-disk record of one session: the canonical diagram plus the registered views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub format_version: u32,
    pub diagram: DiagramState,
    pub views: Vec<String>,
    pub active_view: String,
}

impl PersistedSession {
    pub fn new(diagram: DiagramState, views: Vec<String>, active_view: String) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            diagram,
            views,
            active_view,
        }
    }
}

/// A directory holding one `<project>/<session>.diagram.json` file per session.
#[derive(Debug, Clone)]
pub struct SessionFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl SessionFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn state_path(&self, project_id: &ProjectId, session_id: &SessionId) -> PathBuf {
        self.root
            .join(fs_segment(project_id.as_str()))
            .join(format!("{}{STATE_FILE_SUFFIX}", fs_segment(session_id.as_str())))
    }

    pub fn save_session(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
        session: &PersistedSession,
    ) -> Result<(), StoreError> {
        let path = self.state_path(project_id, session_id);
        let mut json = serde_json::to_vec_pretty(session).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        json.push(b'\n');
        write_atomic(&path, &json, self.durability)
    }

    /// Loads a session record; `Ok(None)` when nothing has been saved yet.
    pub fn load_session(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
    ) -> Result<Option<PersistedSession>, StoreError> {
        let path = self.state_path(project_id, session_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let session: PersistedSession =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
        if session.format_version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedFormat {
                path,
                found: session.format_version,
            });
        }
        session.diagram.validate()?;
        Ok(Some(session))
    }
}

/// Maps an id onto a single, non-traversing path component.
///
/// Alphanumerics, `-` and `_` pass through; every other byte is written as `%XX`.
fn fs_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };
    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".proteus.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
            dir.sync_all().map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
