//! Rain or Shine client library for Rust
//!
//! A Rust client for the Rain or Shine backend: connect a Strava account
//! via OAuth, keep an authenticated-user snapshot, toggle the background
//! weather-enrichment preference, and revoke the account. Weather lookup
//! and activity annotation happen entirely server-side; this crate only
//! talks to the backend's Auth and Preferences APIs.

pub mod config;
pub mod error;
pub mod session;

use std::sync::Arc;

use reqwest::Client;

use crate::config::{ClientConfig, ClientOptions};
use crate::error::Result;
pub use crate::error::Error;
pub use crate::session::{RevocationState, SessionManager, SessionState, UserUpdate};
pub use rain_or_shine_auth::{AuthClient, AuthError, User};
pub use rain_or_shine_preferences::{PreferenceUpdate, PreferencesClient, PreferencesError};

/// The main entry point for the Rain or Shine client
pub struct RainOrShine {
    /// Validated backend connection settings
    config: ClientConfig,
    /// HTTP client shared by the service clients; carries the session cookie
    http_client: Client,
    /// Auth API client
    auth: Arc<AuthClient>,
    /// Preferences API client
    preferences: Arc<PreferencesClient>,
    /// The session lifecycle manager consumed by every view
    session: SessionManager,
}

impl RainOrShine {
    /// Create a new client with default options
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rain_or_shine_client::RainOrShine;
    ///
    /// # fn main() -> Result<(), rain_or_shine_client::Error> {
    /// let client = RainOrShine::new("https://rainorshine.example.com")?;
    /// let session = client.session();
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        Self::new_with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rain_or_shine_client::config::ClientOptions;
    /// use rain_or_shine_client::RainOrShine;
    ///
    /// # fn main() -> Result<(), rain_or_shine_client::Error> {
    /// let options = ClientOptions::default()
    ///     .with_redirect_uri("https://app.example.com/dashboard");
    /// let client = RainOrShine::new_with_options("https://rainorshine.example.com", options)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new_with_options(base_url: &str, options: ClientOptions) -> Result<Self> {
        let config = ClientConfig::new(base_url)?;

        // The backend session lives in a cookie; the shared client's cookie
        // store stands in for the browser's.
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        let base = config.base();
        let auth = Arc::new(AuthClient::new(&base, http_client.clone()));
        let preferences = Arc::new(PreferencesClient::new(&base, http_client.clone()));
        let session = SessionManager::new(
            auth.clone(),
            preferences.clone(),
            options.redirect_uri.clone(),
        );

        Ok(Self {
            config,
            http_client,
            auth,
            preferences,
            session,
        })
    }

    /// Create a new client from the `RAIN_OR_SHINE_API_URL` environment
    /// variable
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Self::new(&config.base())
    }

    /// The session lifecycle manager
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The Auth API client
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// The Preferences API client
    pub fn preferences(&self) -> &PreferencesClient {
        &self.preferences
    }

    /// The backend base URL this client talks to
    pub fn base_url(&self) -> String {
        self.config.base()
    }

    /// The underlying HTTP client (cookie-carrying)
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::session::{RevocationState, SessionState};
    pub use crate::RainOrShine;
}
