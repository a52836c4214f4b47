//! Durable key-value storage.
//!
//! The session and the simulated report cache persist small string values under fixed keys
//! (`auth_token`, `auth_user`, `cro-reports`). [`KeyValueStore`] is the seam those components
//! are written against, so they can run against a directory on disk ([`FileStore`]), purely in
//! memory ([`MemoryStore`]), or with no backend at all ([`UnavailableStore`]).
//!
//! # Examples
//!
//! ```
//! use croview::storage::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::default();
//! store.set("auth_token", "abc").unwrap();
//! assert_eq!(store.get("auth_token").unwrap().as_deref(), Some("abc"));
//! store.remove("auth_token").unwrap();
//! assert_eq!(store.get("auth_token").unwrap(), None);
//! ```

use std::{
  collections::HashMap,
  fs,
  io::ErrorKind,
  sync::{Mutex, PoisonError},
};

use super::*;

/// Storage key holding the session token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
/// Storage key holding the serialized session user.
pub const AUTH_USER_KEY: &str = "auth_user";
/// Storage key holding the serialized simulated report collection.
pub const REPORTS_KEY: &str = "cro-reports";

/// A string-to-string store that outlives the process.
///
/// Implementations report failures through [`Result`]; callers decide whether a failure is
/// worth surfacing. Writes replace the whole value.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
  /// Reads the value under `key`, `None` when absent.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Overwrites the value under `key`.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Deletes the value under `key`. Removing an absent key is not an error.
  fn remove(&self, key: &str) -> Result<()>;
}

/// Reference-counted handle to a store shared between components.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Stores each key as a file inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
  /// Directory holding one file per key
  root: PathBuf,
}

impl FileStore {
  /// Creates a store rooted at `root`. The directory is created on first write.
  pub fn new(root: impl AsRef<Path>) -> Self { Self { root: root.as_ref().to_path_buf() } }

  /// Creates a store rooted at `root` behind a [`SharedStore`] handle.
  pub fn shared(root: impl AsRef<Path>) -> SharedStore { Arc::new(Self::new(root)) }

  /// Returns the default storage directory.
  ///
  /// - On Unix: `~/.local/share/croview`
  /// - On macOS: `~/Library/Application Support/croview`
  /// - On Windows: `%APPDATA%\croview`
  /// - Fallback: `./croview` in the current directory
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("croview")
  }

  /// The directory this store writes to.
  pub fn root(&self) -> &Path { &self.root }

  /// Resolves the file backing `key`, rejecting keys that could escape the root.
  fn path_for(&self, key: &str) -> Result<PathBuf> {
    let valid = !key.is_empty()
      && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
      && !key.starts_with('.');
    if !valid {
      return Err(CroError::Config(format!("Invalid storage key: {key:?}")));
    }
    Ok(self.root.join(key))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let path = self.path_for(key)?;
    match fs::read_to_string(&path) {
      Ok(value) => Ok(Some(value)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let path = self.path_for(key)?;
    fs::create_dir_all(&self.root)?;
    // Write next to the target and rename so readers never see a partial value.
    let staging = self.root.join(format!(".{key}.tmp"));
    fs::write(&staging, value)?;
    fs::rename(&staging, &path)?;
    trace!("Wrote {} bytes to {}", value.len(), path.display());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let path = self.path_for(key)?;
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

/// Keeps values in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
  /// Stored values by key
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  /// Creates an empty store behind a [`SharedStore`] handle.
  pub fn shared() -> SharedStore { Arc::new(Self::default()) }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
    Ok(())
  }
}

/// A store with no backend. Every operation fails.
///
/// Used when no persistence is available; components built on top degrade to in-memory state.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl UnavailableStore {
  /// Creates the store behind a [`SharedStore`] handle.
  pub fn shared() -> SharedStore { Arc::new(Self) }

  /// The error every operation returns.
  fn unavailable() -> CroError { CroError::Config("No persistent storage available".to_string()) }
}

impl KeyValueStore for UnavailableStore {
  fn get(&self, _key: &str) -> Result<Option<String>> { Err(Self::unavailable()) }

  fn set(&self, _key: &str, _value: &str) -> Result<()> { Err(Self::unavailable()) }

  fn remove(&self, _key: &str) -> Result<()> { Err(Self::unavailable()) }
}
