//! One-shot user messages, kept per principal until the next page read drains them.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use tracker_auth::PrincipalId;

/// Oldest messages are dropped beyond this, so API-only callers that never
/// load a page cannot grow their queue without bound.
pub const MAX_PENDING: usize = 20;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct FlashStore {
    pending: Mutex<HashMap<PrincipalId, Vec<FlashMessage>>>,
}

impl FlashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, principal: PrincipalId, level: FlashLevel, text: impl Into<String>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = pending.entry(principal).or_default();
        if queue.len() >= MAX_PENDING {
            queue.remove(0);
        }
        queue.push(FlashMessage {
            level,
            text: text.into(),
        });
    }

    pub fn success(&self, principal: PrincipalId, text: impl Into<String>) {
        self.push(principal, FlashLevel::Success, text);
    }

    pub fn warning(&self, principal: PrincipalId, text: impl Into<String>) {
        self.push(principal, FlashLevel::Warning, text);
    }

    pub fn error(&self, principal: PrincipalId, text: impl Into<String>) {
        self.push(principal, FlashLevel::Error, text);
    }

    /// Returns and forgets everything queued for `principal`, oldest first.
    pub fn drain(&self, principal: PrincipalId) -> Vec<FlashMessage> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.remove(&principal).unwrap_or_default()
    }
}
