use clap::Parser;
use std::process::ExitCode;
use trailhead::cli::{run_cli, Cli};
use trailhead::logging::{init_logging_with_config, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Command output is the point here; keep routine logs out of it unless asked.
    let mut log_config = LogConfig::from_env();
    if std::env::var_os("TRAILHEAD_LOG_LEVEL").is_none() {
        log_config.log_level = "warn".to_string();
    }
    let _guard = match init_logging_with_config(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {e:#}");
            None
        }
    };

    match run_cli(cli, &mut std::io::stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
