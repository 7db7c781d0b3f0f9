// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;

use schemars::JsonSchema;
use serde::Serialize;

use crate::protocol::{ClarifyRequest, EnvelopeMeta, ExpertAnswer, OutOfScopeNotice, Reference};

/// A non-mutating exchange surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Exchange {
    /// Monotonic per session; survives history eviction.
    pub sequence: u64,
    pub message: String,
    pub confidence: f64,
    #[serde(flatten)]
    pub kind: ExchangeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "intent", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeKind {
    ExpertQa { references: Vec<Reference> },
    Clarify { questions: Vec<String> },
    OutOfScope { suggestion: Option<String> },
}

/// Questions the user has to answer before the diagram may change again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PendingClarification {
    pub sequence: u64,
    pub questions: Vec<String>,
}

/// Holds clarification state and a bounded history of non-mutating exchanges.
#[derive(Debug)]
pub struct SessionTracker {
    pending: Option<PendingClarification>,
    history: VecDeque<Exchange>,
    limit: usize,
    next_sequence: u64,
}

impl SessionTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            pending: None,
            history: VecDeque::new(),
            limit: limit.max(1),
            next_sequence: 1,
        }
    }

    /// Stores the questions and suspends diagram mutation until [`Self::resolve_pending`].
    /// A newer clarification replaces an unanswered one.
    pub fn record_clarify(&mut self, request: &ClarifyRequest) -> Exchange {
        let exchange = self.push(
            request.meta(),
            ExchangeKind::Clarify {
                questions: request.questions().to_vec(),
            },
        );
        self.pending = Some(PendingClarification {
            sequence: exchange.sequence,
            questions: request.questions().to_vec(),
        });
        exchange
    }

    pub fn record_expert_qa(&mut self, answer: &ExpertAnswer) -> Exchange {
        self.push(
            answer.meta(),
            ExchangeKind::ExpertQa {
                references: answer.references().to_vec(),
            },
        )
    }

    pub fn record_out_of_scope(&mut self, notice: &OutOfScopeNotice) -> Exchange {
        self.push(
            notice.meta(),
            ExchangeKind::OutOfScope {
                suggestion: notice.suggestion().map(str::to_owned),
            },
        )
    }

    pub fn pending_clarification(&self) -> Option<&PendingClarification> {
        self.pending.as_ref()
    }

    /// Called when the user takes their next turn.
    pub fn resolve_pending(&mut self) -> Option<PendingClarification> {
        self.pending.take()
    }

    /// Oldest first.
    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.history.iter()
    }

    fn push(&mut self, meta: &EnvelopeMeta, kind: ExchangeKind) -> Exchange {
        let exchange = Exchange {
            sequence: self.next_sequence,
            message: meta.message().to_owned(),
            confidence: meta.confidence(),
            kind,
        };
        self.next_sequence += 1;

        if self.history.len() == self.limit {
            self.history.pop_front();
        }
        self.history.push_back(exchange.clone());
        exchange
    }
}
