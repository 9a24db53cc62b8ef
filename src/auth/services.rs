use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{load_last_username_change, save_last_username_change};
use crate::auth::repo_types::{CredentialRecord, Session};
use crate::clock::{Clock, Delay};
use crate::config::AuthConfig;
use crate::storage::{KeyValueStore, StoreError};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Email ID is already registered.")]
    DuplicateEmail,
    #[error("This email may not be registered on the site.")]
    UnknownEmail,
    #[error("Invalid password.")]
    InvalidPassword,
    #[error("Username can only be changed once per month; {remaining_days} day(s) remaining.")]
    RateLimited { remaining_days: i64 },
    #[error("Not signed in.")]
    NotAuthenticated,
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Clears the authenticating marker when the operation finishes or is abandoned.
pub struct AuthenticatingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for AuthenticatingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Single-account credential store with one persisted session slot.
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    delay: Arc<dyn Delay>,
    config: AuthConfig,
    // serializes writers; the slot is last-write-wins but never interleaved
    gate: Mutex<()>,
    authenticating: AtomicBool,
}

impl SessionStore {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        delay: Arc<dyn Delay>,
        config: AuthConfig,
    ) -> Self {
        Self {
            kv,
            clock,
            delay,
            config,
            gate: Mutex::new(()),
            authenticating: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> AuthPhase {
        if self.authenticating.load(Ordering::SeqCst) {
            AuthPhase::Authenticating
        } else if self.current_session().is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Anonymous
        }
    }

    pub(crate) fn mark_authenticating(&self) -> AuthenticatingGuard<'_> {
        self.authenticating.store(true, Ordering::SeqCst);
        AuthenticatingGuard {
            flag: &self.authenticating,
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        Session::load(self.kv.as_ref())
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        if email.is_empty()
            || username.trim().is_empty()
            || password.is_empty()
            || display_name.trim().is_empty()
        {
            return Err(AuthError::Validation("All fields are required."));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AuthError::Validation("Please enter a valid email address."));
        }
        if !is_valid_username(username) {
            warn!(username, "invalid username");
            return Err(AuthError::Validation(
                "Username can only contain letters, numbers, and underscores.",
            ));
        }

        let _gate = self.gate.lock().await;
        if let Some(existing) = CredentialRecord::load(self.kv.as_ref()) {
            if existing.email == email {
                warn!(email = %email, "email already registered");
                return Err(AuthError::DuplicateEmail);
            }
        }

        let _authenticating = self.mark_authenticating();
        self.delay.pause(self.config.delay()).await;

        let password_hash = hash_password(password)?;
        let record = CredentialRecord {
            email,
            password_hash,
            username: username.to_owned(),
            display_name: display_name.trim().to_owned(),
        };
        record.save(self.kv.as_ref())?;

        let session = Session::issue(&record);
        session.save(self.kv.as_ref())?;
        info!(email = %session.email, username = %session.username, "user registered");
        Ok(session)
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let _gate = self.gate.lock().await;
        let _authenticating = self.mark_authenticating();
        self.delay.pause(self.config.delay()).await;

        // email before password, so the two failures stay distinguishable
        let record = match CredentialRecord::load(self.kv.as_ref()) {
            Some(record) if record.email == email => record,
            _ => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::UnknownEmail);
            }
        };

        let ok = verify_password(password, &record.password_hash)?;
        if !ok {
            warn!(email = %email, "login invalid password");
            return Err(AuthError::InvalidPassword);
        }

        self.delay.pause(self.config.settle()).await;
        let session = Session::issue(&record);
        session.save(self.kv.as_ref())?;
        info!(email = %session.email, session_id = %session.id, "user logged in");
        Ok(session)
    }

    /// Idempotent; a failing store is logged, never surfaced.
    #[instrument(skip(self))]
    pub fn end_session(&self) {
        match Session::clear(self.kv.as_ref()) {
            Ok(()) => info!("session ended"),
            Err(e) => error!(error = %e, "clearing session failed"),
        }
    }

    /// Days left before the username may change again; 0 when allowed.
    pub fn days_until_username_change(&self) -> i64 {
        let Some(last) = load_last_username_change(self.kv.as_ref()) else {
            return 0;
        };
        let cooldown = self.config.username_cooldown();
        let elapsed = self.clock.now() - last;
        if elapsed >= cooldown {
            return 0;
        }
        let remaining = (cooldown - elapsed).as_seconds_f64() / 86_400.0;
        (remaining.ceil() as i64).clamp(0, self.config.username_cooldown_days)
    }

    /// Both slots present and agreeing on the email.
    fn signed_in(&self) -> Result<(CredentialRecord, Session), AuthError> {
        let session = self.current_session().ok_or(AuthError::NotAuthenticated)?;
        let record = CredentialRecord::load(self.kv.as_ref()).ok_or(AuthError::NotAuthenticated)?;
        if record.email != session.email {
            warn!(
                session_email = %session.email,
                record_email = %record.email,
                "session does not belong to the stored account"
            );
            return Err(AuthError::NotAuthenticated);
        }
        Ok((record, session))
    }

    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::Validation("All fields are required."));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(
                "Password must be at least 6 characters.",
            ));
        }

        let _gate = self.gate.lock().await;
        let (mut record, session) = self.signed_in()?;
        self.delay.pause(self.config.profile_delay()).await;

        let ok = verify_password(current_password, &record.password_hash)?;
        if !ok {
            warn!(email = %session.email, "current password is incorrect");
            return Err(AuthError::InvalidPassword);
        }

        record.password_hash = hash_password(new_password)?;
        record.save(self.kv.as_ref())?;
        info!(email = %session.email, "password updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn change_username(&self, new_username: &str) -> Result<Session, AuthError> {
        if new_username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required."));
        }

        let _gate = self.gate.lock().await;
        let remaining_days = self.days_until_username_change();
        if remaining_days > 0 {
            warn!(remaining_days, "username change rate limited");
            return Err(AuthError::RateLimited { remaining_days });
        }
        if !is_valid_username(new_username) {
            return Err(AuthError::Validation(
                "Username can only contain letters, numbers, and underscores.",
            ));
        }

        let (mut record, mut session) = self.signed_in()?;
        self.delay.pause(self.config.profile_delay()).await;

        record.username = new_username.to_owned();
        session.username = new_username.to_owned();
        record.save(self.kv.as_ref())?;
        session.save(self.kv.as_ref())?;
        save_last_username_change(self.kv.as_ref(), self.clock.now())?;
        info!(email = %session.email, username = %session.username, "username updated");
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn change_display_name(&self, new_name: &str) -> Result<Session, AuthError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AuthError::Validation("Display name is required."));
        }

        let _gate = self.gate.lock().await;
        let (mut record, mut session) = self.signed_in()?;
        self.delay.pause(self.config.profile_delay()).await;

        record.display_name = new_name.to_owned();
        session.display_name = new_name.to_owned();
        record.save(self.kv.as_ref())?;
        session.save(self.kv.as_ref())?;
        info!(email = %session.email, "display name updated");
        Ok(session)
    }
}
