//! Authentication session and header issuing.
//!
//! [`SessionStore`] holds the signed-in user and their bearer token, mirrors both into a
//! [`KeyValueStore`] under `auth_token` / `auth_user`, and hands out `Authorization` headers.
//! It is passed explicitly to every remote report operation through the [`AuthProvider`]
//! trait; nothing reads the session from ambient state.
//!
//! # Examples
//!
//! ```no_run
//! use croview::{
//!   api::ApiClient,
//!   session::{AuthProvider, Credentials, SessionStore},
//!   storage::FileStore,
//!   Config,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let api = ApiClient::from_config(&config)?;
//! let mut session = SessionStore::restore(FileStore::shared(&config.storage_path));
//!
//! let user = session.login(&api, &Credentials::new("ada@example.com", "hunter2")).await?;
//! println!("Signed in as {}", user.email);
//! assert!(session.auth_headers().contains_key("authorization"));
//! # Ok(())
//! # }
//! ```

use reqwest::header::{HeaderValue, AUTHORIZATION};

use super::*;
use crate::api::ApiClient;

/// Capability the report store needs from a session.
///
/// Implementations must derive headers from the current state on every call.
pub trait AuthProvider {
  /// Whether a session is present.
  fn is_authenticated(&self) -> bool;

  /// Headers to attach to an authenticated request; empty without a session.
  fn auth_headers(&self) -> HeaderMap;

  /// Counter that changes whenever the session changes.
  fn epoch(&self) -> u64 { 0 }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Administrator
  Admin,
  /// Regular account
  User,
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  /// Account id
  pub id:         String,
  /// Login email
  pub email:      String,
  /// Given name
  pub first_name: String,
  /// Family name
  pub last_name:  String,
  /// Account role
  pub role:       Role,
}

/// Login request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
  /// Login email
  pub email:    String,
  /// Plain-text password, sent over the wire once
  pub password: String,
}

impl Credentials {
  /// Bundles an email and password.
  pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
    Self { email: email.into(), password: password.into() }
  }
}

/// Registration request body.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  /// Login email
  pub email:      String,
  /// Plain-text password
  pub password:   String,
  /// Given name
  pub first_name: String,
  /// Family name
  pub last_name:  String,
}

/// Successful login or registration response.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
  /// Bearer token
  pub token: String,
  /// The account the token belongs to
  pub user:  User,
}

/// An established session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
  /// Bearer token
  pub token: String,
  /// The signed-in account
  pub user:  User,
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session").field("token", &"<redacted>").field("user", &self.user).finish()
  }
}

/// Holds the current session and keeps the durable copy in step with it.
#[derive(Debug)]
pub struct SessionStore {
  /// Durable mirror of the session
  storage: SharedStore,
  /// Current session, if signed in
  session: Option<Session>,
  /// Bumped on every login, registration, and logout
  epoch:   u64,
}

impl SessionStore {
  /// Restores whatever session `storage` holds.
  ///
  /// Both keys must be present and the stored user must parse. A user that fails to parse
  /// clears both keys. An unreadable store yields a signed-out session.
  pub fn restore(storage: SharedStore) -> Self {
    let token = storage.get(AUTH_TOKEN_KEY);
    let user = storage.get(AUTH_USER_KEY);

    let session = match (token, user) {
      (Ok(Some(token)), Ok(Some(user))) => match serde_json::from_str::<User>(&user) {
        Ok(user) => Some(Session { token, user }),
        Err(e) => {
          warn!("Failed to parse stored user data, clearing session: {e}");
          clear_keys(storage.as_ref());
          None
        },
      },
      (Err(e), _) | (_, Err(e)) => {
        warn!("Session storage unavailable: {e}");
        None
      },
      _ => None,
    };

    if let Some(session) = &session {
      debug!("Restored session for {}", session.user.email);
    }
    Self { storage, session, epoch: 0 }
  }

  /// The signed-in account.
  pub fn user(&self) -> Option<&User> { self.session.as_ref().map(|s| &s.user) }

  /// The current session.
  pub fn session(&self) -> Option<&Session> { self.session.as_ref() }

  /// Signs in with `credentials`.
  ///
  /// # Errors
  ///
  /// - The service's `message`, or "Login failed", on a rejected login
  /// - "Network error occurred" when the service could not be reached
  pub async fn login(&mut self, api: &ApiClient, credentials: &Credentials) -> Result<&User> {
    let response = api.login(credentials).await.map_err(network_fallback)?;
    Ok(self.establish(response))
  }

  /// Creates an account and signs in as it.
  ///
  /// # Errors
  ///
  /// - The service's `message`, or "Registration failed", on a rejected registration
  /// - "Network error occurred" when the service could not be reached
  pub async fn register(&mut self, api: &ApiClient, registration: &Registration) -> Result<&User> {
    let response = api.register(registration).await.map_err(network_fallback)?;
    Ok(self.establish(response))
  }

  /// Signs out, forgetting the durable copy too.
  pub fn logout(&mut self) {
    clear_keys(self.storage.as_ref());
    if let Some(session) = self.session.take() {
      debug!("Signed out {}", session.user.email);
    }
    self.epoch += 1;
  }

  /// Adopts a fresh token and user, persisting both.
  ///
  /// Persistence failures leave the session usable for the rest of the process.
  fn establish(&mut self, AuthResponse { token, user }: AuthResponse) -> &User {
    if let Err(e) = self.storage.set(AUTH_TOKEN_KEY, &token) {
      warn!("Failed to persist session token: {e}");
    }
    match serde_json::to_string(&user) {
      Ok(serialized) =>
        if let Err(e) = self.storage.set(AUTH_USER_KEY, &serialized) {
          warn!("Failed to persist session user: {e}");
        },
      Err(e) => warn!("Failed to serialize session user: {e}"),
    }
    debug!("Signed in as {}", user.email);
    self.epoch += 1;
    &self.session.insert(Session { token, user }).user
  }
}

impl AuthProvider for SessionStore {
  fn is_authenticated(&self) -> bool { self.session.is_some() }

  fn auth_headers(&self) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(session) = &self.session {
      match HeaderValue::from_str(&format!("Bearer {}", session.token)) {
        Ok(value) => {
          headers.insert(AUTHORIZATION, value);
        },
        Err(e) => warn!("Session token cannot be sent as a header: {e}"),
      }
    }
    headers
  }

  fn epoch(&self) -> u64 { self.epoch }
}

/// Removes both session keys, logging failures.
fn clear_keys(storage: &dyn KeyValueStore) {
  for key in [AUTH_TOKEN_KEY, AUTH_USER_KEY] {
    if let Err(e) = storage.remove(key) {
      warn!("Failed to clear {key}: {e}");
    }
  }
}

/// Replaces transport failures with the generic network message.
fn network_fallback(error: CroError) -> CroError {
  match error {
    CroError::Network(e) => {
      warn!("Authentication request failed: {e}");
      CroError::Api("Network error occurred".to_string())
    },
    other => other,
  }
}
