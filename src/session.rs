//! Session lifecycle management for the Rain or Shine client
//!
//! The [`SessionManager`] is the single owner of the authenticated-user
//! snapshot. Embedding applications read it and dispatch operations; every
//! mutation of the snapshot happens here, after the backend has confirmed
//! the corresponding write. The OAuth round trip spans two page loads, so
//! the connect flow and session restoration are deliberately independent:
//! [`SessionManager::login`] hands back a consent URL to navigate to, and a
//! later [`SessionManager::restore_session`] picks up whatever session the
//! backend established in the meantime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use rain_or_shine_auth::{AuthClient, AuthError, User};
use rain_or_shine_preferences::{PreferenceUpdate, PreferencesClient, PreferencesError};

use crate::error::{Error, Result};

/// The client's current belief about authentication.
///
/// Exactly one variant holds at any time; readers never observe a partially
/// applied transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    /// No session; the connect flow may be started
    #[default]
    Unauthenticated,
    /// Silent restoration is in flight
    Pending,
    /// A confirmed backend session with its user snapshot
    Authenticated(User),
}

/// Revocation confirmation state machine.
///
/// `Idle -> ConfirmPending -> Revoking -> Revoked`; a failed revoke drops
/// back to `ConfirmPending` with the error recorded so the user can retry
/// or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationState {
    #[default]
    Idle,
    ConfirmPending,
    Revoking,
    Revoked,
}

/// Partial user patch merged into the snapshot after a confirmed write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub location: Option<String>,
    pub weather_enabled: Option<bool>,
}

impl UserUpdate {
    /// A patch that only flips the weather preference
    pub fn weather_enabled(value: bool) -> Self {
        Self {
            weather_enabled: Some(value),
            ..Self::default()
        }
    }

    fn apply(&self, user: &mut User) {
        if let Some(display_name) = &self.display_name {
            user.display_name = Some(display_name.clone());
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(profile_image_url) = &self.profile_image_url {
            user.profile_image_url = Some(profile_image_url.clone());
        }
        if let Some(location) = &self.location {
            user.location = Some(location.clone());
        }
        if let Some(weather_enabled) = self.weather_enabled {
            user.weather_enabled = weather_enabled;
        }
    }
}

/// Owner of the session store and the three flows built on it.
///
/// All methods take `&self`; the manager is meant to be shared (one instance
/// per application lifetime) between whatever views consume it.
pub struct SessionManager {
    auth: Arc<AuthClient>,
    preferences: Arc<PreferencesClient>,
    session: RwLock<SessionState>,
    last_error: RwLock<Option<Error>>,
    revocation: RwLock<RevocationState>,
    connecting: AtomicBool,
    preference_write: AtomicBool,
    redirect_uri: Option<String>,
}

impl SessionManager {
    /// Create a new session manager over the given service clients
    pub fn new(
        auth: Arc<AuthClient>,
        preferences: Arc<PreferencesClient>,
        redirect_uri: Option<String>,
    ) -> Self {
        Self {
            auth,
            preferences,
            session: RwLock::new(SessionState::Unauthenticated),
            last_error: RwLock::new(None),
            revocation: RwLock::new(RevocationState::Idle),
            connecting: AtomicBool::new(false),
            preference_write: AtomicBool::new(false),
            redirect_uri,
        }
    }

    // ----- Session Store -----

    /// Non-blocking read of the latest user snapshot
    pub fn current_user(&self) -> Option<User> {
        match &*self.session.read().unwrap() {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// Clone of the full session state
    pub fn state(&self) -> SessionState {
        self.session.read().unwrap().clone()
    }

    /// The last surfaced error, if any
    pub fn last_error(&self) -> Option<Error> {
        self.last_error.read().unwrap().clone()
    }

    /// The last surfaced error as its user-visible message
    pub fn error_message(&self) -> Option<String> {
        self.last_error().map(|e| e.to_string())
    }

    /// Ask the backend who we are and materialize the result.
    ///
    /// Called once at startup and again after returning from the provider's
    /// consent screen. A clean "no session" answer (401 or
    /// `authenticated: false`) is not an error; only transport failures
    /// record one. Either way the store never stays `Pending`.
    pub async fn restore_session(&self) -> Result<Option<User>> {
        self.set_error(None);
        *self.session.write().unwrap() = SessionState::Pending;

        match self.auth.session().await {
            Ok(Some(user)) => {
                debug!("session restored for user {}", user.id);
                *self.session.write().unwrap() = SessionState::Authenticated(user.clone());
                Ok(Some(user))
            }
            Ok(None) => {
                debug!("no backend session");
                *self.session.write().unwrap() = SessionState::Unauthenticated;
                Ok(None)
            }
            Err(err) => {
                let error = restore_error(err);
                *self.session.write().unwrap() = SessionState::Unauthenticated;
                self.set_error(Some(error.clone()));
                Err(error)
            }
        }
    }

    /// Merge confirmed fields into the snapshot.
    ///
    /// Returns whether the patch applied. Silently refuses unless a session
    /// is held, which is also what discards a preference write that resolves
    /// after revocation cleared the store.
    pub fn replace_user(&self, update: UserUpdate) -> bool {
        let mut session = self.session.write().unwrap();
        match &mut *session {
            SessionState::Authenticated(user) => {
                update.apply(user);
                true
            }
            _ => false,
        }
    }

    /// Force the logged-out state; idempotent
    pub fn clear(&self) {
        *self.session.write().unwrap() = SessionState::Unauthenticated;
    }

    // ----- Connect Flow -----

    /// Start the OAuth connect flow.
    ///
    /// Fetches the provider consent URL from the backend and returns it for
    /// the embedder to navigate to. Control leaves the application at that
    /// point; no in-memory continuation survives the redirect. Returns
    /// `Ok(None)` when a dispatch is already in flight, without issuing a
    /// second request.
    pub async fn login(&self) -> Result<Option<String>> {
        if self
            .connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }

        self.set_error(None);

        let result = self.auth.authorize_url(self.redirect_uri.as_deref()).await;
        self.connecting.store(false, Ordering::SeqCst);

        match result {
            Ok(url) => Ok(Some(url)),
            Err(err) => {
                let error = connect_error(err);
                self.set_error(Some(error.clone()));
                Err(error)
            }
        }
    }

    /// Whether a connect dispatch is in flight (drives UI debounce)
    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    /// Sign out: best-effort backend logout, then drop the local session.
    ///
    /// A failed logout call is logged and otherwise ignored; the local
    /// session is cleared regardless.
    pub async fn logout(&self) {
        if let Err(err) = self.auth.sign_out().await {
            warn!("sign-out request failed, clearing local session anyway: {}", err);
        }
        self.clear();
    }

    // ----- Preference Sync -----

    /// Toggle the weather-enrichment preference, write-after-confirm.
    ///
    /// Negates the current value and asks the Preferences API to persist it;
    /// the snapshot is only updated once the backend acknowledges, so the
    /// visible value never drifts from confirmed state. Returns
    /// `Ok(Some(new_value))` on a confirmed write and `Ok(None)` when the
    /// call was a no-op: no session, a write already in flight (rejected,
    /// not queued), or a confirmation that arrived after the session was
    /// cleared.
    pub async fn toggle_weather_enabled(&self) -> Result<Option<bool>> {
        if self
            .preference_write
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }

        let target = match &*self.session.read().unwrap() {
            SessionState::Authenticated(user) => !user.weather_enabled,
            _ => {
                self.preference_write.store(false, Ordering::SeqCst);
                return Ok(None);
            }
        };

        self.set_error(None);

        let result = self
            .preferences
            .update(&PreferenceUpdate::weather_enabled(target))
            .await;

        let outcome = match result {
            Ok(()) => {
                if self.replace_user(UserUpdate::weather_enabled(target)) {
                    Ok(Some(target))
                } else {
                    debug!("discarding preference write confirmed after session was cleared");
                    Ok(None)
                }
            }
            Err(err) => {
                let error = update_error(err);
                self.set_error(Some(error.clone()));
                Err(error)
            }
        };

        self.preference_write.store(false, Ordering::SeqCst);
        outcome
    }

    /// Whether a preference write is in flight (drives toggle disabling)
    pub fn is_updating_preferences(&self) -> bool {
        self.preference_write.load(Ordering::SeqCst)
    }

    // ----- Revocation Flow -----

    /// Ask for revocation; moves `Idle -> ConfirmPending`, no backend call.
    ///
    /// There is nothing to revoke without a session, so this is a no-op
    /// unless one is held.
    pub fn request_revoke(&self) {
        if self.current_user().is_none() {
            return;
        }
        let mut state = self.revocation.write().unwrap();
        if *state == RevocationState::Idle {
            *state = RevocationState::ConfirmPending;
        }
    }

    /// Back out of a pending confirmation; clears any pending error
    pub fn cancel_revoke(&self) {
        let mut state = self.revocation.write().unwrap();
        if *state == RevocationState::ConfirmPending {
            *state = RevocationState::Idle;
            drop(state);
            self.set_error(None);
        }
    }

    /// Execute a confirmed revocation.
    ///
    /// Only acts from `ConfirmPending`; every other state makes this a
    /// no-op, which is what prevents double submission while `Revoking`. On
    /// success the store is cleared and the flow ends in the terminal
    /// `Revoked` state; the embedder should navigate to the unauthenticated
    /// landing view, and re-entering `Authenticated` requires a fresh
    /// connect flow. On failure the flow returns to `ConfirmPending` with the error
    /// recorded; a dispatched revoke is never re-issued automatically.
    pub async fn confirm_revoke(&self) -> Result<()> {
        {
            let mut state = self.revocation.write().unwrap();
            if *state != RevocationState::ConfirmPending {
                return Ok(());
            }
            *state = RevocationState::Revoking;
        }

        self.set_error(None);

        match self.auth.revoke().await {
            Ok(()) => {
                debug!("grant revoked, clearing session");
                *self.revocation.write().unwrap() = RevocationState::Revoked;
                self.clear();
                self.set_error(None);
                Ok(())
            }
            Err(err) => {
                let error = revoke_error(err);
                *self.revocation.write().unwrap() = RevocationState::ConfirmPending;
                self.set_error(Some(error.clone()));
                Err(error)
            }
        }
    }

    /// Current revocation flow state
    pub fn revocation_state(&self) -> RevocationState {
        *self.revocation.read().unwrap()
    }

    /// Whether the revoke call is in flight (drives dialog disabling)
    pub fn is_revoking(&self) -> bool {
        self.revocation_state() == RevocationState::Revoking
    }

    fn set_error(&self, error: Option<Error>) {
        *self.last_error.write().unwrap() = error;
    }

    #[cfg(test)]
    fn seed_user(&self, user: User) {
        *self.session.write().unwrap() = SessionState::Authenticated(user);
    }
}

fn restore_error(err: AuthError) -> Error {
    match err {
        AuthError::ApiError(message) => Error::restore_failed(message),
        other => {
            warn!("session restore failed: {}", other);
            Error::restore_failed("Could not restore your session")
        }
    }
}

fn connect_error(err: AuthError) -> Error {
    match err {
        AuthError::ApiError(message) => Error::auth_init(message),
        other => {
            warn!("authorization URL fetch failed: {}", other);
            Error::auth_init("Failed to connect to Strava")
        }
    }
}

fn update_error(err: PreferencesError) -> Error {
    match err {
        PreferencesError::ApiError(message) => Error::update_failed(message),
        other => {
            warn!("preference write failed: {}", other);
            Error::update_failed("Failed to update preferences")
        }
    }
}

fn revoke_error(err: AuthError) -> Error {
    match err {
        AuthError::ApiError(message) => Error::revoke_failed(message),
        other => {
            warn!("revoke call failed: {}", other);
            Error::revoke_failed("Failed to revoke access")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn manager() -> SessionManager {
        let http_client = reqwest::Client::new();
        SessionManager::new(
            Arc::new(AuthClient::new("http://127.0.0.1:9", http_client.clone())),
            Arc::new(PreferencesClient::new("http://127.0.0.1:9", http_client)),
            None,
        )
    }

    fn user(weather_enabled: bool) -> User {
        User {
            id: "12345".to_string(),
            display_name: Some("Jane Doe".to_string()),
            first_name: Some("Jane".to_string()),
            profile_image_url: None,
            location: Some("San Francisco, CA".to_string()),
            weather_enabled,
            member_since: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            last_updated: Utc.with_ymd_and_hms(2025, 6, 15, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_current_user_starts_empty() {
        let manager = manager();
        assert!(manager.current_user().is_none());
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_replace_user_merges_only_set_fields() {
        let manager = manager();
        manager.seed_user(user(false));

        let applied = manager.replace_user(UserUpdate {
            location: Some("Portland, OR".to_string()),
            weather_enabled: Some(true),
            ..UserUpdate::default()
        });

        assert!(applied);
        let snapshot = manager.current_user().unwrap();
        assert_eq!(snapshot.location.as_deref(), Some("Portland, OR"));
        assert!(snapshot.weather_enabled);
        // untouched fields survive the merge
        assert_eq!(snapshot.display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(snapshot.id, "12345");
    }

    #[test]
    fn test_replace_user_refuses_without_session() {
        let manager = manager();

        let applied = manager.replace_user(UserUpdate::weather_enabled(true));

        assert!(!applied);
        assert!(manager.current_user().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let manager = manager();
        manager.seed_user(user(true));

        manager.clear();
        manager.clear();

        assert!(manager.current_user().is_none());
    }

    #[test]
    fn test_request_revoke_only_from_idle() {
        let manager = manager();
        manager.seed_user(user(true));

        manager.request_revoke();
        assert_eq!(manager.revocation_state(), RevocationState::ConfirmPending);

        // repeated requests do not regress the machine
        manager.request_revoke();
        assert_eq!(manager.revocation_state(), RevocationState::ConfirmPending);
    }

    #[test]
    fn test_request_revoke_requires_a_session() {
        let manager = manager();

        manager.request_revoke();

        assert_eq!(manager.revocation_state(), RevocationState::Idle);
    }

    #[test]
    fn test_cancel_revoke_returns_to_idle_and_clears_error() {
        let manager = manager();
        manager.seed_user(user(true));
        manager.set_error(Some(Error::revoke_failed("provider unreachable")));

        manager.request_revoke();
        manager.cancel_revoke();

        assert_eq!(manager.revocation_state(), RevocationState::Idle);
        assert!(manager.last_error().is_none());
    }

    #[test]
    fn test_cancel_revoke_without_confirmation_is_noop() {
        let manager = manager();
        manager.set_error(Some(Error::update_failed("Failed to update preferences")));

        manager.cancel_revoke();

        assert_eq!(manager.revocation_state(), RevocationState::Idle);
        // unrelated errors stay put
        assert!(manager.last_error().is_some());
    }

    #[test]
    fn test_error_message_is_display_text() {
        let manager = manager();
        manager.set_error(Some(Error::update_failed("preferences store unavailable")));

        assert_eq!(
            manager.error_message().as_deref(),
            Some("preferences store unavailable")
        );
    }
}
