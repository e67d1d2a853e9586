//! CLI configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sanjivani::session::{MissingExpiryPolicy, SessionConfig};

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Handling of tokens without a usable expiry.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum MissingExpiry {
    /// Refuse on sign-in, drop on restore.
    Discard,

    /// Keep the session until logout.
    NonExpiring,
}

impl From<MissingExpiry> for MissingExpiryPolicy {
    fn from(value: MissingExpiry) -> Self {
        match value {
            MissingExpiry::Discard => Self::Discard,
            MissingExpiry::NonExpiring => Self::NonExpiring,
        }
    }
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub(crate) log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub(crate) log_format: LogFormat,
}

/// Session settings.
#[derive(Debug, Args)]
pub(crate) struct SessionArgs {
    /// File holding the persisted session
    #[arg(long, env = "SANJIVANI_SESSION_FILE", default_value = ".sanjivani/session.json", global = true)]
    pub(crate) session_file: PathBuf,

    /// Storefront API base URL
    #[arg(long, env = "API_BASE", default_value = "http://localhost:5000", global = true)]
    pub(crate) api_base: String,

    /// Handling of tokens without a usable expiry
    #[arg(long, env = "MISSING_EXPIRY_POLICY", value_enum, default_value_t = MissingExpiry::Discard, global = true)]
    pub(crate) missing_expiry: MissingExpiry,

    /// Page the session is being used from
    #[arg(long, env = "SANJIVANI_PAGE", default_value = "/", global = true)]
    pub(crate) page: String,
}

impl SessionArgs {
    pub(crate) fn session_config(&self) -> SessionConfig {
        SessionConfig {
            missing_expiry: self.missing_expiry.into(),
            ..SessionConfig::default()
        }
    }
}

/// Sanjivani storefront session tool
#[derive(Debug, Parser)]
#[command(name = "sanjivani", about = "Sanjivani storefront session tool", long_about = None)]
pub(crate) struct CliConfig {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    pub(crate) session: SessionArgs,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Restore the stored session and describe it
    Status,

    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "SANJIVANI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the stored session
    Logout,

    /// Create an account
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "SANJIVANI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Email a password reset link
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// Set a new password with the token from a reset link
    ResetPassword {
        #[arg(long)]
        token: String,

        #[arg(long, env = "SANJIVANI_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        confirm: String,
    },

    /// Print the expiry embedded in a token
    Token {
        token: String,
    },

    /// Show the headers an API request would carry
    Headers,

    /// Complete a Google OAuth callback URL
    Callback {
        url: String,
    },

    /// Send an authorized GET to the API and print the body
    Get {
        path: String,
    },
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
