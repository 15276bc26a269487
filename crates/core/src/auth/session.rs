//! Password login with server-side sessions.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use super::{AuthError, AuthRequest, Authenticator, Identity, LoginSession};

/// Authenticator issuing session tokens for a single shared password.
///
/// After `max_failed_attempts` consecutive failures every login is refused
/// for `lockout`, correct password or not. A successful login resets the
/// count. Tokens are accepted from `Authorization: Bearer <token>` or the
/// `session` cookie.
pub struct SessionAuthenticator {
    password_digest: [u8; 32],
    max_failed_attempts: u32,
    lockout: Duration,
    session_ttl: Duration,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    sessions: HashMap<String, DateTime<Utc>>,
}

impl SessionAuthenticator {
    pub fn new(
        password: &str,
        max_failed_attempts: u32,
        lockout_secs: u64,
        session_ttl_secs: u64,
    ) -> Self {
        Self {
            password_digest: digest(password),
            max_failed_attempts: max_failed_attempts.max(1),
            lockout: seconds(lockout_secs),
            session_ttl: seconds(session_ttl_secs),
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live sessions.
    pub fn active_sessions(&self) -> usize {
        let now = Utc::now();
        self.state()
            .sessions
            .values()
            .filter(|expires| **expires > now)
            .count()
    }
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let token = request.session_token().ok_or(AuthError::NotAuthenticated)?;
        let now = Utc::now();

        let mut state = self.state();
        match state.sessions.get(&token).copied() {
            Some(expires_at) if expires_at > now => Ok(Identity {
                user_id: "operator".to_string(),
                method: "session".to_string(),
                session_expires_at: Some(expires_at),
            }),
            Some(_) => {
                state.sessions.remove(&token);
                Err(AuthError::InvalidCredentials("Session expired".to_string()))
            }
            None => Err(AuthError::InvalidCredentials("Unknown session".to_string())),
        }
    }

    async fn login(&self, password: &str) -> Result<LoginSession, AuthError> {
        let now = Utc::now();
        let mut state = self.state();

        if let Some(until) = state.locked_until {
            if now < until {
                let retry_after_secs = (until - now).num_seconds().max(1) as u64;
                return Err(AuthError::LockedOut { retry_after_secs });
            }
            state.locked_until = None;
            state.failed_attempts = 0;
        }

        if !constant_time_eq(&digest(password), &self.password_digest) {
            state.failed_attempts += 1;
            warn!(
                attempts = state.failed_attempts,
                max = self.max_failed_attempts,
                "Failed login attempt"
            );
            if state.failed_attempts >= self.max_failed_attempts {
                state.locked_until = Some(later(now, self.lockout));
                warn!(
                    "Login locked for {}s after {} failed attempts",
                    self.lockout.num_seconds(),
                    state.failed_attempts
                );
            }
            return Err(AuthError::InvalidCredentials("Wrong password".to_string()));
        }

        state.failed_attempts = 0;
        state.sessions.retain(|_, expires| *expires > now);

        let token = Uuid::new_v4().to_string();
        let expires_at = later(now, self.session_ttl);
        state.sessions.insert(token.clone(), expires_at);
        info!("Login succeeded, {} active sessions", state.sessions.len());

        Ok(LoginSession {
            token,
            expires_at: Some(expires_at),
        })
    }

    async fn logout(&self, request: &AuthRequest) -> bool {
        match request.session_token() {
            Some(token) => self.state().sessions.remove(&token).is_some(),
            None => false,
        }
    }

    fn method_name(&self) -> &'static str {
        "session"
    }
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// `now + delta`, saturating at the latest representable instant.
fn later(now: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    now.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
