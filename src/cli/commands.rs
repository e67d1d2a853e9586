//! Command handlers.

use std::sync::Arc;

use reqwest::{Url, header::HeaderMap};
use sanjivani::{
    api::{ApiError, ReqwestAuthApi, register, request_password_reset, reset_password, sign_in},
    auth::{LoginCredentials, PasswordReset, PasswordResetRequest, Registration, expiry_of},
    callback::{CallbackError, complete_oauth_callback},
    clock::SystemClock,
    gate::{AuthorizationGate, GateError},
    session::{MemoryNavigator, SessionError, SessionManager, SessionStatus, SessionStore},
    storage::FileStorage,
};
use thiserror::Error;

use crate::cli::config::{CliConfig, Command, SessionArgs};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("failed to create session manager: {0}")]
    Session(#[from] SessionError),

    #[error("{}", describe_api_error(.0))]
    Api(#[from] ApiError),

    #[error("failed to build request headers: {0}")]
    Gate(#[from] GateError),

    #[error("oauth callback failed: {0}")]
    Callback(#[from] CallbackError),

    #[error("header value is not printable: {0}")]
    HeaderText(#[from] reqwest::header::ToStrError),

    #[error("invalid callback url: {0}")]
    ParseUrl(String),

    #[error("token has no usable expiry")]
    NoExpiry,

    #[error("not signed in")]
    NotSignedIn,
}

fn describe_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Credentials(errors) => errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
        ApiError::Rejected { .. } => "Invalid email or password".to_string(),
        other => other.to_string(),
    }
}

fn build_manager(args: &SessionArgs) -> Result<SessionManager, SessionError> {
    SessionManager::new(
        SessionStore::new(Arc::new(FileStorage::new(&args.session_file))),
        Arc::new(SystemClock),
        Arc::new(MemoryNavigator::at(args.page.clone())),
        args.session_config(),
    )
}

#[expect(
    clippy::print_stdout,
    reason = "command output is the point of the CLI"
)]
pub(crate) async fn run(config: CliConfig) -> Result<(), CliError> {
    let CliConfig {
        session, command, ..
    } = config;

    // Commands that never touch the stored session.
    match &command {
        Command::Token { token } => {
            let expiry = expiry_of(token).ok_or(CliError::NoExpiry)?;

            println!("expires_at: {expiry}");
            println!("expires_at_ms: {}", expiry.as_millisecond());

            return Ok(());
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let api = ReqwestAuthApi::new(&session.api_base);

            register(&api, &Registration::new(username, email, password)).await?;

            println!("registered, sign in at {}", session.session_config().login_path);

            return Ok(());
        }
        Command::ForgotPassword { email } => {
            let api = ReqwestAuthApi::new(&session.api_base);

            request_password_reset(&api, &PasswordResetRequest::new(email)).await?;

            println!(
                "If the email exists, a password reset link has been sent to your inbox. \
                 Check your email (and spam folder)."
            );

            return Ok(());
        }
        Command::ResetPassword {
            token,
            password,
            confirm,
        } => {
            let api = ReqwestAuthApi::new(&session.api_base);

            reset_password(&api, &PasswordReset::new(token, password, confirm)).await?;

            println!("password reset, sign in at {}", session.session_config().login_path);

            return Ok(());
        }
        _ => {}
    }

    let manager = build_manager(&session)?;
    let status = manager.start();

    match command {
        Command::Token { .. }
        | Command::Register { .. }
        | Command::ForgotPassword { .. }
        | Command::ResetPassword { .. }
        | Command::Status => print_status(&status),
        Command::Login { email, password } => {
            let api = ReqwestAuthApi::new(&session.api_base);
            let landing =
                sign_in(&api, &manager, &LoginCredentials::new(email, password)).await?;

            print_status(&manager.status());
            println!("landing: {landing}");
        }
        Command::Logout => {
            manager.logout();

            println!("logged out");
        }
        Command::Headers => {
            if !status.is_authenticated() {
                return Err(CliError::NotSignedIn);
            }

            let headers = manager.authorization_headers(&HeaderMap::new())?;

            for (name, value) in &headers {
                let shown = if value.is_sensitive() { "<redacted>" } else { value.to_str()? };

                println!("{name}: {shown}");
            }
        }
        Command::Callback { url } => {
            let url = Url::parse(&url).map_err(|error| CliError::ParseUrl(error.to_string()))?;
            let landing = complete_oauth_callback(&manager, &url)?;

            print_status(&manager.status());
            println!("landing: {landing}");
        }
        Command::Get { path } => {
            let api = ReqwestAuthApi::new(&session.api_base);
            let response = api.authorized_get(&manager, &path).await?;
            let body = response.text().await.map_err(ApiError::from)?;

            println!("{body}");
        }
    }

    Ok(())
}

#[expect(
    clippy::print_stdout,
    reason = "command output is the point of the CLI"
)]
fn print_status(status: &SessionStatus) {
    match status {
        SessionStatus::Anonymous => println!("anonymous"),
        SessionStatus::Authenticated {
            identity,
            expires_at,
        } => {
            println!("user_id: {}", identity.id);
            println!("name: {}", identity.name);
            println!("email: {}", identity.email);
            println!("roles: {}", identity.roles.join(","));

            match expires_at {
                Some(at) => println!("expires_at: {at}"),
                None => println!("expires_at: never"),
            }
        }
    }
}
