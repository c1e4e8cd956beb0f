pub mod transcription;

pub use transcription::{transcribe_audio, TranscriptionService};
