//! DashScope HTTP client for the multimodal conversation API.
//!
//! Local `file://` audio is uploaded to DashScope's temporary object storage
//! first (the same flow the official SDKs use), then referenced as `oss://`.

use crate::domain::traits::MultiModalConversation;
use crate::domain::types::{
    ContentPart, ConversationOutput, ConversationRequest, ConversationResponse, Message, Usage,
    STATUS_OK,
};
use anyhow::{bail, Context, Result};
use reqwest::header::HeaderValue;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const GENERATION_PATH: &str = "/services/aigc/multimodal-generation/generation";
const UPLOADS_PATH: &str = "/uploads";
const OSS_RESOLVE_HEADER: &str = "X-DashScope-OssResourceResolve";
const FILE_SCHEME: &str = "file://";
const OSS_SCHEME: &str = "oss://";
const BODY_EXCERPT_CHARS: usize = 300;

pub struct DashScopeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// Signed form fields returned by `uploads?action=getPolicy`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadPolicy {
    pub policy: String,
    pub signature: String,
    pub upload_dir: String,
    pub upload_host: String,
    pub oss_access_key_id: String,
    #[serde(default)]
    pub x_oss_object_acl: Option<String>,
    #[serde(default)]
    pub x_oss_forbid_overwrite: Option<String>,
    #[serde(default)]
    pub max_file_size_mb: Option<u64>,
}

#[derive(Deserialize)]
struct PolicyEnvelope {
    #[serde(default)]
    request_id: Option<String>,
    data: UploadPolicy,
}

#[derive(Serialize)]
struct GenerationInput<'a> {
    messages: &'a [Message],
}

#[derive(Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    input: GenerationInput<'a>,
    parameters: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerationReply {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    output: Option<ConversationOutput>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

impl DashScopeClient {
    /// Create a client bound to `api_key` and an API base such as
    /// `https://dashscope.aliyuncs.com/api/v1`.
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("API key is empty");
        }
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("API key contains characters not allowed in an HTTP header")?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("dashscope-transcribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request a fresh upload policy for `model`.
    pub async fn fetch_upload_policy(&self, model: &str) -> Result<UploadPolicy> {
        let url = format!("{}{}", self.base_url, UPLOADS_PATH);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("action", "getPolicy"), ("model", model)])
            .send()
            .await
            .with_context(|| format!("Failed to request upload policy from {}", url))?;

        let status = response.status();
        let body = response.text().await.context("Failed to read upload policy response")?;
        if !status.is_success() {
            bail!("Failed to get upload policy: {} {}", status, excerpt(&body));
        }

        let envelope: PolicyEnvelope =
            serde_json::from_str(&body).context("Failed to decode upload policy")?;
        debug!(request_id = ?envelope.request_id, upload_host = %envelope.data.upload_host, "Upload policy received");
        Ok(envelope.data)
    }

    /// Upload a local file under `policy` and return its `oss://` locator.
    pub async fn upload_file(&self, policy: &UploadPolicy, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("Audio path has no file name: {}", path.display()))?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read audio file: {}", path.display()))?;

        if let Some(limit_mb) = policy.max_file_size_mb {
            let limit = limit_mb.saturating_mul(1024 * 1024);
            if bytes.len() as u64 > limit {
                bail!(
                    "Audio file {} is {} bytes, larger than the {} MB upload limit",
                    path.display(),
                    bytes.len(),
                    limit_mb
                );
            }
        }

        let key = format!("{}/{}", policy.upload_dir.trim_end_matches('/'), file_name);
        let mut form = Form::new()
            .text("OSSAccessKeyId", policy.oss_access_key_id.clone())
            .text("Signature", policy.signature.clone())
            .text("policy", policy.policy.clone())
            .text("key", key.clone());
        if let Some(acl) = &policy.x_oss_object_acl {
            form = form.text("x-oss-object-acl", acl.clone());
        }
        if let Some(forbid) = &policy.x_oss_forbid_overwrite {
            form = form.text("x-oss-forbid-overwrite", forbid.clone());
        }
        // OSS requires the file field to come last.
        form = form
            .text("success_action_status", "200")
            .part("file", Part::bytes(bytes).file_name(file_name));

        debug!(key = %key, host = %policy.upload_host, "Uploading audio file");
        let response = self
            .http
            .post(&policy.upload_host)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to upload audio file: {}", path.display()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Failed to upload audio file: {} {}", status, excerpt(&body));
        }

        Ok(format!("{}{}", OSS_SCHEME, key))
    }

    /// Replace every `file://` audio part with an uploaded `oss://` locator.
    async fn resolve_local_audio(&self, request: &ConversationRequest) -> Result<Vec<Message>> {
        let local_files: Vec<PathBuf> = request
            .audio_locators()
            .filter_map(local_path)
            .collect();

        // Fail on unreadable files before touching the network.
        for path in &local_files {
            let metadata = tokio::fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read audio file: {}", path.display()))?;
            if !metadata.is_file() {
                bail!("Audio path is not a file: {}", path.display());
            }
        }

        if local_files.is_empty() {
            return Ok(request.messages.clone());
        }

        let policy = self.fetch_upload_policy(&request.model).await?;
        let mut messages = request.messages.clone();
        for part in messages.iter_mut().flat_map(|m| m.content.iter_mut()) {
            if let ContentPart::Audio(locator) = part {
                if let Some(path) = local_path(locator) {
                    *locator = self.upload_file(&policy, &path).await?;
                }
            }
        }
        Ok(messages)
    }
}

impl MultiModalConversation for DashScopeClient {
    async fn call(&self, request: &ConversationRequest) -> Result<ConversationResponse> {
        let messages = self.resolve_local_audio(request).await?;
        let uses_oss = messages
            .iter()
            .flat_map(|m| m.content.iter())
            .any(|part| matches!(part, ContentPart::Audio(l) if l.starts_with(OSS_SCHEME)));

        let body = GenerationBody {
            model: &request.model,
            input: GenerationInput {
                messages: &messages,
            },
            parameters: serde_json::Map::new(),
        };

        let url = format!("{}{}", self.base_url, GENERATION_PATH);
        let mut builder = self.http.post(&url).bearer_auth(&self.api_key).json(&body);
        if uses_oss {
            builder = builder.header(OSS_RESOLVE_HEADER, "enable");
        }

        info!(model = %request.model, "Sending transcription request");
        let response = builder
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status_code = response.status().as_u16();
        let text = response.text().await.context("Failed to read response body")?;
        parse_generation_reply(status_code, &text)
    }
}

/// Decode a generation reply body for the given HTTP status.
pub fn parse_generation_reply(status_code: u16, body: &str) -> Result<ConversationResponse> {
    if status_code == STATUS_OK {
        let reply: GenerationReply =
            serde_json::from_str(body).context("Failed to decode API response")?;
        let usage: Option<Usage> = reply.usage.and_then(|v| serde_json::from_value(v).ok());
        info!(request_id = ?reply.request_id, usage = ?usage, "Transcription response received");
        return Ok(ConversationResponse {
            status_code,
            request_id: reply.request_id,
            code: reply.code,
            message: reply.message,
            output: reply.output,
            usage,
        });
    }

    match serde_json::from_str::<GenerationReply>(body) {
        Ok(reply) => {
            warn!(status_code, code = ?reply.code, request_id = ?reply.request_id, "API returned an error");
            Ok(ConversationResponse {
                status_code,
                request_id: reply.request_id,
                code: Some(reply.code.unwrap_or_default()),
                message: Some(reply.message.unwrap_or_default()),
                ..Default::default()
            })
        }
        Err(_) => {
            warn!(status_code, "API returned a non-JSON error body");
            Ok(ConversationResponse {
                status_code,
                code: Some(String::new()),
                message: Some(body.trim().to_string()),
                ..Default::default()
            })
        }
    }
}

/// Local filesystem path behind a `file://` locator.
fn local_path(locator: &str) -> Option<PathBuf> {
    locator.strip_prefix(FILE_SCHEME).map(PathBuf::from)
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
