use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout is reserved for the JSON result line.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
}

fn main() {
    init_logging();
    let code = dashscope_transcribe::cli::run_from(std::env::args_os());
    std::process::exit(code);
}
