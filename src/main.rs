//! Sanjivani storefront session CLI

use std::process::ExitCode;

use crate::cli::{commands, config::CliConfig, logging};

mod cli;

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(error) => {
            // Help and version output also arrive here.
            _ = error.print();

            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(error) = logging::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Failed to initialize logging: {error}");
        }

        return ExitCode::FAILURE;
    }

    match commands::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "command errors are reported to the user regardless of log level"
            )]
            {
                eprintln!("{error}");
            }

            ExitCode::FAILURE
        }
    }
}
