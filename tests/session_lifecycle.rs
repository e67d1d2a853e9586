//! Integration tests for the session lifecycle and authorization gate

use std::{sync::Arc, time::Duration};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jiff::{SignedDuration, Timestamp};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use testresult::TestResult;
use tokio::sync::broadcast::error::TryRecvError;

use sanjivani::{
    auth::Identity,
    clock::{Clock, ManualClock},
    gate::AuthorizationGate,
    session::{
        IDENTITY_KEY, LogoutReason, MemoryNavigator, Navigator, SessionConfig, SessionEvent,
        SessionManager, SessionRecord, SessionStatus, SessionStore, TOKEN_KEY,
    },
    storage::{KeyValueStorage, MemoryStorage},
};

const NOW: i64 = 1_760_000_000;

struct Storefront {
    storage: Arc<MemoryStorage>,
    clock: Arc<ManualClock>,
    navigator: Arc<MemoryNavigator>,
    manager: SessionManager,
}

impl Storefront {
    fn open(storage: Arc<MemoryStorage>, clock: Arc<ManualClock>) -> TestResult<Self> {
        let navigator = Arc::new(MemoryNavigator::at("/"));

        let manager = SessionManager::new(
            SessionStore::new(Arc::clone(&storage) as Arc<dyn KeyValueStorage>),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&navigator) as Arc<dyn Navigator>,
            SessionConfig::default(),
        )?;

        Ok(Self {
            storage,
            clock,
            navigator,
            manager,
        })
    }

    fn fresh() -> TestResult<Self> {
        Self::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(Timestamp::from_second(NOW)?)),
        )
    }

    fn stored(&self) -> TestResult<Option<SessionRecord>> {
        Ok(SessionStore::new(Arc::clone(&self.storage) as Arc<dyn KeyValueStorage>).read()?)
    }
}

fn token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u-1","exp":{exp}}}"#));

    format!("{header}.{claims}.sig")
}

fn admin() -> Identity {
    Identity::new(
        "a-1",
        "Mahesh Patel",
        "mahesh@example.com",
        vec!["admin".into()],
    )
}

fn customer() -> Identity {
    Identity::new("c-1", "Geeta", "geeta@example.com", vec!["user".into()])
}

fn logouts(events: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> usize {
    let mut count = 0;

    loop {
        match events.try_recv() {
            Ok(SessionEvent::LoggedOut(_)) => count += 1,
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => return count,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn login_round_trips_through_the_store() -> TestResult {
    let shop = Storefront::fresh()?;
    let token = token(NOW + 3600);

    shop.manager.login(customer(), token.clone())?;

    assert_eq!(
        shop.stored()?,
        Some(SessionRecord {
            identity: customer(),
            token,
        })
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn restore_depends_on_expiry() -> TestResult {
    let expiry = NOW + 600;

    for (offset, restored) in [(-1, true), (0, false), (1, false)] {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_second(NOW)?));

        Storefront::open(Arc::clone(&storage), Arc::clone(&clock))?
            .manager
            .login(customer(), token(expiry))?;

        clock.set(Timestamp::from_second(expiry + offset)?);

        let shop = Storefront::open(storage, clock)?;
        let status = shop.manager.start();

        assert_eq!(
            status.is_authenticated(),
            restored,
            "restore at expiry{offset:+}s"
        );

        if !restored {
            assert!(shop.storage.is_empty(), "expired session left in storage");
        }
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn second_login_replaces_the_countdown() -> TestResult {
    let shop = Storefront::fresh()?;
    let mut events = shop.manager.subscribe();

    shop.manager.login(customer(), token(NOW + 60))?;
    shop.manager.login(admin(), token(NOW + 120))?;

    tokio::time::sleep(Duration::from_secs(61)).await;

    assert!(
        shop.manager.is_authenticated(),
        "superseded countdown logged out"
    );

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(!shop.manager.is_authenticated());
    assert_eq!(logouts(&mut events), 1, "expected exactly one logout");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn logout_is_idempotent() -> TestResult {
    let shop = Storefront::fresh()?;
    let mut events = shop.manager.subscribe();

    shop.manager.logout();
    shop.manager.logout();

    assert!(shop.storage.is_empty());
    assert_eq!(shop.manager.status(), SessionStatus::Anonymous);
    assert_eq!(logouts(&mut events), 0, "anonymous logout announced a logout");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn anonymous_users_hold_no_roles() -> TestResult {
    let shop = Storefront::fresh()?;

    assert!(!shop.manager.has_role("admin"));
    assert!(!shop.manager.has_role("user"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn corrupted_identity_is_discarded_on_start() -> TestResult {
    let shop = Storefront::fresh()?;

    shop.storage.set(IDENTITY_KEY, "definitely not json")?;
    shop.storage.set(TOKEN_KEY, &token(NOW + 600))?;

    assert_eq!(shop.manager.start(), SessionStatus::Anonymous);
    assert!(shop.storage.is_empty());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn admin_session_expires_after_five_minutes() -> TestResult {
    let shop = Storefront::fresh()?;
    let mut events = shop.manager.subscribe();

    shop.navigator.redirect("/admin");
    shop.manager.login(admin(), token(NOW + 5 * 60))?;

    assert!(shop.manager.has_role("admin"));

    shop.clock.advance(SignedDuration::from_secs(5 * 60 + 1));
    tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;

    assert!(!shop.manager.has_role("admin"));
    assert!(shop.storage.is_empty());
    assert_eq!(
        shop.navigator.current_path(),
        "/",
        "expired admin left on dashboard"
    );

    assert_eq!(
        events.try_recv()?,
        SessionEvent::LoggedIn(admin()),
        "first event should be the login"
    );
    assert_eq!(
        events.try_recv()?,
        SessionEvent::LoggedOut(LogoutReason::Expired)
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn headers_are_merged_into_a_copy() -> TestResult {
    let shop = Storefront::fresh()?;

    let mut base = HeaderMap::new();
    base.insert("X-Foo", HeaderValue::from_static("bar"));

    assert_eq!(shop.manager.authorization_headers(&base)?, base);

    shop.manager.login(customer(), token(NOW + 600))?;

    let headers = shop.manager.authorization_headers(&base)?;
    let expected = format!("Bearer {}", token(NOW + 600));

    assert_eq!(headers.len(), 2);
    assert_eq!(headers.get("X-Foo"), Some(&HeaderValue::from_static("bar")));
    assert_eq!(
        headers.get(AUTHORIZATION).map(HeaderValue::to_str).transpose()?,
        Some(expected.as_str())
    );

    assert_eq!(base.len(), 1, "caller headers were modified");
    assert!(base.get(AUTHORIZATION).is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn restored_session_is_announced() -> TestResult {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(Timestamp::from_second(NOW)?));

    Storefront::open(Arc::clone(&storage), Arc::clone(&clock))?
        .manager
        .login(admin(), token(NOW + 600))?;

    let shop = Storefront::open(storage, clock)?;
    let mut events = shop.manager.subscribe();

    let status = shop.manager.start();

    assert_eq!(
        status,
        SessionStatus::Authenticated {
            identity: admin(),
            expires_at: Some(Timestamp::from_second(NOW + 600)?),
        }
    );
    assert_eq!(events.try_recv()?, SessionEvent::Restored(admin()));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unrelated_claims_keep_the_expiry() -> TestResult {
    let shop = Storefront::fresh()?;
    let claims = format!(r#"{{"sub":42,"roles":"admin","exp":{}}}"#, NOW + 600);
    let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(claims));

    shop.manager.login(admin(), token)?;

    assert_eq!(
        shop.manager.expires_at(),
        Some(Timestamp::from_second(NOW + 600)?),
        "login lost the expiry"
    );

    tokio::time::sleep(Duration::from_secs(601)).await;

    assert!(!shop.manager.is_authenticated(), "session outlived its token");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn multi_year_token_is_not_cut_short() -> TestResult {
    let shop = Storefront::fresh()?;
    let year = 365 * 24 * 60 * 60;

    shop.manager.login(customer(), token(NOW + 5 * year))?;

    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(year.unsigned_abs())).await;
    }

    assert!(
        shop.manager.is_authenticated(),
        "five-year session ended after three years"
    );
    assert_eq!(
        shop.manager.countdown_deadline(),
        Some(Timestamp::from_second(NOW + 5 * year)?)
    );

    Ok(())
}
