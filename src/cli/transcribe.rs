//! CLI transcription command implementation.

use crate::app::config::{load_config, load_config_from, Config};
use crate::cli::args::Cli;
use crate::domain::types::TranscriptionResult;
use crate::services::transcribe_audio;
use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::io::{self, Write};
use tracing::debug;

pub const MISSING_ARGUMENTS: &str = "Missing required arguments: file_path api_key [model]";

/// Process exit code when transcription ran, whatever its outcome.
pub const EXIT_OK: i32 = 0;
/// Process exit code when fewer than two positional arguments were given.
pub const EXIT_USAGE: i32 = 1;

/// Parse `args`, transcribe, print the JSON result and return the exit code.
pub fn run_from<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let given = args.len().saturating_sub(1);
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if let Err(e) = err.print() {
                        tracing::error!("Failed to write help: {}", e);
                    }
                    EXIT_OK
                }
                ErrorKind::MissingRequiredArgument => {
                    emit(&mut handle, &TranscriptionResult::failure(MISSING_ARGUMENTS));
                    EXIT_USAGE
                }
                _ => {
                    let message = err.render().to_string();
                    emit(&mut handle, &TranscriptionResult::failure(message.trim()));
                    if given < 2 {
                        EXIT_USAGE
                    } else {
                        EXIT_OK
                    }
                }
            };
        }
    };

    let result = run(&cli);
    emit(&mut handle, &result);
    EXIT_OK
}

/// Run the transcribe command for already-parsed arguments.
pub fn run(args: &Cli) -> TranscriptionResult {
    let config = match load_config_cascade(args) {
        Ok(config) => config,
        Err(e) => return TranscriptionResult::failure(format!("{:#}", e)),
    };

    let model = config.resolve_model(args.model.as_deref());
    debug!(model, base_url = %config.base_url, "Resolved settings");
    let file_path = args.file_path.to_string_lossy();
    transcribe_audio(&file_path, &args.api_key, model, &config)
}

/// Load config with cascade: custom path -> default path -> defaults,
/// then environment overrides.
fn load_config_cascade(args: &Cli) -> Result<Config> {
    let mut config = match args.config {
        Some(ref custom_path) => load_config_from(custom_path)?,
        None => load_config()?,
    };
    config.apply_env()?;
    Ok(config)
}

/// Write the result as one JSON line.
pub fn write_result(out: &mut impl Write, result: &TranscriptionResult) -> io::Result<()> {
    writeln!(out, "{}", result.to_json_line())?;
    out.flush()
}

fn emit(out: &mut impl Write, result: &TranscriptionResult) {
    if let Err(e) = write_result(out, result) {
        tracing::error!("Failed to write result: {}", e);
    }
}
