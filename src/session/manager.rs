//! Session lifecycle.

use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::broadcast};
use tracing::{debug, error, info, warn};

use crate::{
    auth::{Identity, expiry_of},
    clock::Clock,
    session::{
        LogoutReason, MissingExpiryPolicy, Navigator, SessionConfig, SessionError, SessionEvent,
        SessionStore, timer::CountdownTimer,
    },
    storage::StorageError,
};

const EVENT_CAPACITY: usize = 16;

/// Public view of the live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nobody is signed in.
    Anonymous,

    /// A token is held for `identity`.
    Authenticated {
        /// The signed-in user.
        identity: Identity,

        /// `None` when the token carries no expiry and the policy admits it.
        expires_at: Option<Timestamp>,
    },
}

impl SessionStatus {
    /// True for [`SessionStatus::Authenticated`].
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Owner of the live session.
///
/// Restores the persisted session on [`start`](Self::start), persists on
/// [`login`](Self::login), and logs out when the token's expiry passes. Construct one per
/// application and hand it to consumers; dropping it cancels any pending expiry.
pub struct SessionManager {
    shared: Arc<Shared>,
}

struct Shared {
    store: SessionStore,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    runtime: Handle,
    events: broadcast::Sender<SessionEvent>,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    active: Option<ActiveSession>,
    timer: Option<CountdownTimer>,
    generation: u64,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    identity: Identity,
    token: String,
    expires_at: Option<Timestamp>,
}

enum Expiry {
    Remaining { at: Timestamp, delay: Duration },
    Passed(Timestamp),
    Missing,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();

        f.debug_struct("SessionManager")
            .field("config", &self.shared.config)
            .field("authenticated", &state.active.is_some())
            .field("timer_armed", &state.timer.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create an anonymous manager bound to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a Tokio runtime.
    pub fn new(
        store: SessionStore,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(SessionError::NoRuntime)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                clock,
                navigator,
                config,
                runtime,
                events,
                state: Mutex::new(SessionState::default()),
            }),
        })
    }

    /// Restore the persisted session, if it is still valid.
    ///
    /// Expired or undecodable sessions are removed from storage. Storage failures are
    /// logged and leave the manager anonymous.
    #[tracing::instrument(skip_all)]
    pub fn start(&self) -> SessionStatus {
        let record = match self.shared.store.read() {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("no stored session");

                return self.status();
            }
            Err(source) => {
                error!("failed to read stored session: {source}");

                return self.status();
            }
        };

        let delay = match self.shared.evaluate(&record.token) {
            Expiry::Remaining { at, delay } => Some((at, delay)),
            Expiry::Missing if self.shared.config.missing_expiry == MissingExpiryPolicy::NonExpiring => {
                None
            }
            Expiry::Missing => {
                warn!("stored token has no usable expiry, clearing session");

                self.shared.clear_store();

                return self.status();
            }
            Expiry::Passed(expired_at) => {
                warn!(%expired_at, "stored token expired, clearing session");

                self.shared.clear_store();

                return self.status();
            }
        };

        let identity = record.identity.clone();

        self.shared.establish(
            ActiveSession {
                identity: record.identity,
                token: record.token,
                expires_at: delay.map(|(at, _)| at),
            },
            delay.map(|(_, delay)| delay),
        );

        info!(user_id = %identity.id, "session restored");

        self.shared.publish(SessionEvent::Restored(identity));

        self.status()
    }

    /// Sign `identity` in with `token`, replacing any current session.
    ///
    /// # Errors
    ///
    /// - [`SessionError::EmptyRoles`] when `identity` has no roles.
    /// - [`SessionError::MissingExpiry`] when the token has no usable expiry and the policy
    ///   is [`MissingExpiryPolicy::Discard`]. The current session is left untouched.
    /// - [`SessionError::TokenExpired`] when the token has already expired. The current
    ///   session is ended as if by [`logout`](Self::logout).
    /// - [`SessionError::Storage`] when the session cannot be persisted. The current session
    ///   is left untouched.
    #[tracing::instrument(skip_all, fields(user_id = %identity.id))]
    pub fn login(&self, identity: Identity, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();

        if identity.roles.is_empty() {
            return Err(SessionError::EmptyRoles);
        }

        let (expires_at, delay) = match self.shared.evaluate(&token) {
            Expiry::Remaining { at, delay } => (Some(at), Some(delay)),
            Expiry::Missing => match self.shared.config.missing_expiry {
                MissingExpiryPolicy::Discard => return Err(SessionError::MissingExpiry),
                MissingExpiryPolicy::NonExpiring => {
                    warn!("token has no usable expiry, session will not auto-expire");

                    (None, None)
                }
            },
            Expiry::Passed(expired_at) => {
                warn!(%expired_at, "token already expired, logging out");

                self.shared.end(LogoutReason::Expired, None);

                return Err(SessionError::TokenExpired { expired_at });
            }
        };

        self.shared.persist_and_establish(
            ActiveSession {
                identity: identity.clone(),
                token,
                expires_at,
            },
            delay,
        )?;

        info!(?expires_at, "logged in");

        self.shared.publish(SessionEvent::LoggedIn(identity));

        Ok(())
    }

    /// End the session, clear storage, and leave authenticated-only pages.
    ///
    /// Safe to call when already anonymous.
    #[tracing::instrument(skip_all)]
    pub fn logout(&self) {
        self.shared.end(LogoutReason::Requested, None);
    }

    /// Snapshot of the live session.
    pub fn status(&self) -> SessionStatus {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .map_or(SessionStatus::Anonymous, |session| SessionStatus::Authenticated {
                identity: session.identity.clone(),
                expires_at: session.expires_at,
            })
    }

    /// The signed-in user, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .map(|session| session.identity.clone())
    }

    /// The held bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .map(|session| session.token.clone())
    }

    /// Expiry of the held token. `None` when anonymous or non-expiring.
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .and_then(|session| session.expires_at)
    }

    /// True while a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.shared.state.lock().active.is_some()
    }

    /// When the armed countdown will fire, if one is armed.
    pub fn countdown_deadline(&self) -> Option<Timestamp> {
        self.shared
            .state
            .lock()
            .timer
            .as_ref()
            .map(CountdownTimer::deadline)
    }

    /// Receive an event for every restore, login and logout from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Paths, roles and policy this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Where the current user should land after signing in.
    pub fn landing_path(&self) -> String {
        let state = self.shared.state.lock();
        let roles = state
            .active
            .as_ref()
            .map(|session| session.identity.roles.as_slice())
            .unwrap_or_default();

        self.shared.config.landing_path(roles).to_string()
    }

    pub(crate) fn holds_role(&self, role: &str) -> bool {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .is_some_and(|session| session.identity.has_role(role))
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.state.lock().timer.take() {
            timer.cancel();
        }
    }
}

impl Shared {
    fn evaluate(&self, token: &str) -> Expiry {
        let Some(at) = expiry_of(token) else {
            return Expiry::Missing;
        };

        let remaining = self.clock.now().duration_until(at);

        if remaining.is_positive() {
            Expiry::Remaining {
                at,
                delay: remaining.unsigned_abs(),
            }
        } else {
            Expiry::Passed(at)
        }
    }

    fn persist_and_establish(
        self: &Arc<Self>,
        session: ActiveSession,
        delay: Option<Duration>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock();

        self.store.write(&session.identity, &session.token)?;
        self.install(&mut state, session, delay);

        Ok(())
    }

    fn establish(self: &Arc<Self>, session: ActiveSession, delay: Option<Duration>) {
        let mut state = self.state.lock();

        self.install(&mut state, session, delay);
    }

    fn install(
        self: &Arc<Self>,
        state: &mut SessionState,
        session: ActiveSession,
        delay: Option<Duration>,
    ) {
        if let Some(previous) = state.timer.take() {
            previous.cancel();
        }

        state.generation += 1;

        state.timer = match (session.expires_at, delay) {
            (Some(deadline), Some(delay)) => Some(self.arm(state.generation, deadline, delay)),
            _ => None,
        };

        state.active = Some(session);
    }

    fn arm(self: &Arc<Self>, generation: u64, deadline: Timestamp, delay: Duration) -> CountdownTimer {
        let shared = Arc::downgrade(self);

        CountdownTimer::arm(&self.runtime, generation, deadline, delay, move |generation| {
            if let Some(shared) = shared.upgrade() {
                shared.end(LogoutReason::Expired, Some(generation));
            }
        })
    }

    /// Tear the session down. With `only_generation`, do nothing unless that countdown is
    /// still the armed one.
    fn end(&self, reason: LogoutReason, only_generation: Option<u64>) {
        let ended = {
            let mut state = self.state.lock();

            if let Some(generation) = only_generation {
                let armed = state.timer.as_ref().map(CountdownTimer::generation);

                if armed != Some(generation) {
                    debug!(generation, "ignoring superseded countdown");

                    return;
                }
            }

            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }

            self.clear_store();

            state.active.take()
        };

        if let Some(session) = ended {
            info!(user_id = %session.identity.id, ?reason, "logged out");

            self.publish(SessionEvent::LoggedOut(reason));
        }

        let current_path = self.navigator.current_path();

        if self.config.redirects_from(&current_path) {
            debug!(from = %current_path, to = %self.config.home_path, "redirecting after logout");

            self.navigator.redirect(&self.config.home_path);
        }
    }

    fn clear_store(&self) {
        if let Err(source) = self.store.clear() {
            error!("failed to clear stored session: {source}");
        }
    }

    fn publish(&self, event: SessionEvent) {
        // Sending fails only when nobody is subscribed.
        _ = self.events.send(event);
    }
}
