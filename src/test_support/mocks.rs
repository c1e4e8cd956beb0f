//! Mock implementations for unit testing.
//!
//! These mocks implement the traits from `crate::domain::traits` so the
//! transcription service can be exercised without network access.

use crate::domain::traits::MultiModalConversation;
use crate::domain::types::{ConversationRequest, ConversationResponse};
use anyhow::Result;
use std::sync::Mutex;

enum Outcome {
    Respond(ConversationResponse),
    Fail(String),
}

/// Mock conversation API for testing.
///
/// Replies with a scripted outcome and records every request it receives.
pub struct MockConversation {
    outcome: Outcome,
    requests: Mutex<Vec<ConversationRequest>>,
}

impl MockConversation {
    /// Create a mock that answers every call with `response`.
    pub fn responding(response: ConversationResponse) -> Self {
        Self {
            outcome: Outcome::Respond(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose calls fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Outcome::Fail(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ConversationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl MultiModalConversation for MockConversation {
    async fn call(&self, request: &ConversationRequest) -> Result<ConversationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.outcome {
            Outcome::Respond(response) => Ok(response.clone()),
            Outcome::Fail(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}
