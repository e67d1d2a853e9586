//! Session change notifications.

use crate::auth::Identity;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// `logout()` was called.
    Requested,

    /// The countdown for the token's expiry fired.
    Expired,
}

/// Broadcast whenever the live session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A stored session was restored on start.
    Restored(Identity),

    /// A user signed in.
    LoggedIn(Identity),

    /// The session ended.
    LoggedOut(LogoutReason),
}
