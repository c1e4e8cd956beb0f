//! Transcription service layer.
//!
//! Turns an audio path into a [`TranscriptionResult`] through any
//! [`MultiModalConversation`] backend. Every failure is folded into the
//! result; nothing propagates to the caller.

use crate::app::config::Config;
use crate::domain::traits::MultiModalConversation;
use crate::domain::types::{audio_locator, ConversationRequest, TranscriptionResult, STATUS_OK};
use crate::infrastructure::DashScopeClient;
use anyhow::{Context, Result};
use tracing::{debug, error};

/// Transcription service over a conversation backend.
pub struct TranscriptionService<C> {
    client: C,
}

impl<C: MultiModalConversation> TranscriptionService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Transcribe the audio at `file_path` with `model`.
    pub async fn transcribe(&self, file_path: &str, model: &str) -> TranscriptionResult {
        match self.request_transcript(file_path, model).await {
            Ok(result) => result,
            Err(e) => {
                error!("Transcription failed: {:#}", e);
                TranscriptionResult::failure(format!("{:#}", e))
            }
        }
    }

    async fn request_transcript(&self, file_path: &str, model: &str) -> Result<TranscriptionResult> {
        let request = ConversationRequest::single_audio(model, audio_locator(file_path));
        debug!(model, file_path, "Built transcription request");

        let response = self.client.call(&request).await?;

        if response.status_code != STATUS_OK {
            return Ok(TranscriptionResult::api_error(
                response.code.as_deref().unwrap_or_default(),
                response.message.as_deref().unwrap_or_default(),
            ));
        }

        let text = response
            .first_choice_text()
            .context("Response contained no transcription")?;
        Ok(TranscriptionResult::success(text))
    }
}

/// Configure a DashScope client with `api_key` and transcribe `file_path`,
/// blocking until the API answers.
pub fn transcribe_audio(
    file_path: &str,
    api_key: &str,
    model: &str,
    config: &Config,
) -> TranscriptionResult {
    match transcribe_blocking(file_path, api_key, model, config) {
        Ok(result) => result,
        Err(e) => {
            error!("Transcription setup failed: {:#}", e);
            TranscriptionResult::failure(format!("{:#}", e))
        }
    }
}

fn transcribe_blocking(
    file_path: &str,
    api_key: &str,
    model: &str,
    config: &Config,
) -> Result<TranscriptionResult> {
    let client = DashScopeClient::new(api_key, &config.base_url)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let service = TranscriptionService::new(client);
    Ok(runtime.block_on(service.transcribe(file_path, model)))
}
