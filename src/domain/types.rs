//! Shared types used across multiple modules.
//!
//! Contains the result object printed by the CLI and the request/response
//! shapes exchanged with the multimodal conversation API.

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::io;

/// Model used when neither the command line nor the config names one.
pub const DEFAULT_MODEL: &str = "qwen-audio-asr";

/// Status code the conversation API reports for a successful call.
pub const STATUS_OK: u16 = 200;

/// Outcome of a single transcription, serialized as the CLI's only output.
///
/// All three keys are always present; absent values are written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub success: bool,
    pub text: Option<String>,
    pub error: Option<String>,
}

impl TranscriptionResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.into()),
        }
    }

    /// Failure built from a non-200 API response.
    pub fn api_error(code: &str, message: &str) -> Self {
        Self::failure(format!("API Error: {} - {}", code, message))
    }

    /// Single-line JSON rendering.
    ///
    /// Separators are `", "` and `": "`, matching what existing callers of
    /// the tool already parse.
    pub fn to_json_line(&self) -> String {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        match self.serialize(&mut serializer) {
            Ok(()) => String::from_utf8(buf).unwrap_or_default(),
            Err(_) => {
                r#"{"success": false, "text": null, "error": "failed to serialize result"}"#
                    .to_string()
            }
        }
    }
}

/// Compact single-line JSON with a space after `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// One part of a message's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentPart {
    Audio(String),
    Text(String),
}

impl ContentPart {
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(text) => Some(text),
            ContentPart::Audio(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

/// Request handed to a [`MultiModalConversation`](crate::domain::traits::MultiModalConversation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

impl ConversationRequest {
    /// One user message referencing a single audio source.
    pub fn single_audio(model: &str, locator: String) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![Message {
                role: Role::User,
                content: vec![ContentPart::Audio(locator)],
            }],
        }
    }

    /// Audio locators in message order.
    pub fn audio_locators(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .flat_map(|m| m.content.iter())
            .filter_map(|part| match part {
                ContentPart::Audio(locator) => Some(locator.as_str()),
                ContentPart::Text(_) => None,
            })
    }
}

/// Turn a path argument into an audio locator.
///
/// URLs and explicit `file://` locators are passed through; anything else
/// is a local path.
pub fn audio_locator(path: &str) -> String {
    const PASSTHROUGH_SCHEMES: [&str; 4] = ["http://", "https://", "oss://", "file://"];
    if PASSTHROUGH_SCHEMES.iter().any(|scheme| path.starts_with(scheme)) {
        path.to_string()
    } else {
        format!("file://{}", path)
    }
}

/// Assistant message content: a plain string or a list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the content, `None` when it carries no text.
    pub fn text(&self) -> Option<String> {
        match self {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Parts(parts) => {
                let texts: Vec<&str> = parts.iter().filter_map(ContentPart::text).collect();
                if texts.is_empty() {
                    None
                } else {
                    Some(texts.concat())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationOutput {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub audio_tokens: Option<u64>,
    #[serde(default)]
    pub seconds: Option<u64>,
}

/// Response of a conversation call, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationResponse {
    pub status_code: u16,
    pub request_id: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub output: Option<ConversationOutput>,
    pub usage: Option<Usage>,
}

impl ConversationResponse {
    /// Successful response whose first choice carries `text`.
    pub fn with_text(text: &str) -> Self {
        Self {
            status_code: STATUS_OK,
            output: Some(ConversationOutput {
                choices: vec![Choice {
                    finish_reason: Some("stop".to_string()),
                    message: ChoiceMessage {
                        role: Role::Assistant,
                        content: MessageContent::Parts(vec![ContentPart::Text(text.to_string())]),
                    },
                }],
            }),
            ..Default::default()
        }
    }

    pub fn error(status_code: u16, code: &str, message: &str) -> Self {
        Self {
            status_code,
            code: Some(code.to_string()),
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Text of the first choice, if any.
    pub fn first_choice_text(&self) -> Option<String> {
        self.output
            .as_ref()?
            .choices
            .first()
            .and_then(|choice| choice.message.content.text())
    }
}
