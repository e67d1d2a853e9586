//! Sanjivani storefront sessions.
//!
//! Keeps the signed-in customer or admin across restarts, logs them out when their bearer
//! token expires, and decorates API requests with that token.

pub mod api;
pub mod auth;
pub mod callback;
pub mod clock;
pub mod gate;
pub mod session;
pub mod storage;
