//! CLI argument definitions using clap.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// DashScope Transcribe - speech-to-text through the DashScope API
#[derive(Parser, Debug)]
#[command(name = "dashscope-transcribe")]
#[command(about = "Transcribe an audio file with the DashScope multimodal conversation API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the audio file (or an http(s):// / oss:// URL)
    #[arg(allow_hyphen_values = true)]
    pub file_path: PathBuf,

    /// DashScope API key
    #[arg(allow_hyphen_values = true)]
    pub api_key: String,

    /// Model identifier (default: qwen-audio-asr)
    #[arg(allow_hyphen_values = true)]
    pub model: Option<String>,

    /// Extra positional arguments are accepted and ignored
    #[arg(hide = true, allow_hyphen_values = true)]
    pub ignored: Vec<OsString>,

    /// Config file path (default: ~/.config/dashscope-transcribe/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
