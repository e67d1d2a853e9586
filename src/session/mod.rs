//! Session lifecycle: persistence, expiry countdown, login and logout.

mod config;
mod errors;
mod events;
mod manager;
mod navigator;
mod store;
mod timer;

pub use config::*;
pub use errors::*;
pub use events::*;
pub use manager::{SessionManager, SessionStatus};
pub use navigator::*;
pub use store::*;
