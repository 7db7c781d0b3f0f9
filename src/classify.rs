// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Client side of the external classification/generation service.
//!
//! The service takes a free-text query plus project/session ids and answers with one raw
//! intent-response envelope. Parsing that envelope is the protocol module's job.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::model::{ProjectId, SessionId};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationRequest {
    pub project_id: ProjectId,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classification service rejected the request: {0}")]
    Rejected(String),
    #[error("no classification service configured")]
    NotConfigured,
}

/// One call per user turn. Implementations must be cancel-safe: a superseded or timed-out turn
/// simply drops the future.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<Value, ClassifierError>;
}

/// POSTs the request as JSON and returns the response body as-is.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<Value, ClassifierError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            project_id = %request.project_id,
            "sending classification request"
        );
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Rejected(format!("{status}: {body}")));
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Stand-in used when the binary runs without `--classifier-url`; responses can still be fed in
/// directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredClassifier;

#[async_trait]
impl Classifier for UnconfiguredClassifier {
    async fn classify(&self, _request: &ClassificationRequest) -> Result<Value, ClassifierError> {
        Err(ClassifierError::NotConfigured)
    }
}
