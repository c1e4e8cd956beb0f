//! Core domain traits for dependency inversion.
//!
//! The transcription service talks to the remote API only through these
//! traits, so tests can substitute scripted implementations.

use crate::domain::types::{ConversationRequest, ConversationResponse};
use anyhow::Result;
use std::future::Future;

/// Multimodal conversation API abstraction.
///
/// `call` returns `Ok` for every response the service produced, including
/// non-200 ones; `Err` is reserved for failures that prevented a response
/// (file access, upload, transport, undecodable body).
pub trait MultiModalConversation {
    fn call(
        &self,
        request: &ConversationRequest,
    ) -> impl Future<Output = Result<ConversationResponse>> + Send;
}
