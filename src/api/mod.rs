//! Storefront REST API: sign-in, account flows and authorized requests.

mod account;
mod client;
mod errors;
mod models;
mod sign_in;

pub use account::*;
pub use client::*;
pub use errors::*;
pub use models::*;
pub use sign_in::*;
