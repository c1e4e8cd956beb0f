//! CLI mode for dashscope-transcribe.
//!
//! Parses `<file_path> <api_key> [model]`, runs one transcription and
//! prints the JSON result object on stdout.

pub mod args;
pub mod transcribe;

pub use args::Cli;
pub use transcribe::run_from;
