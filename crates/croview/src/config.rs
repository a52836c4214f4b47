//! Persistent configuration.
//!
//! The configuration lives in a TOML file (by default `config.toml` under the platform config
//! directory) and names the service endpoints, the simulation tick interval, and where local
//! state and downloads go.
//!
//! ```toml
//! api_url          = "http://localhost:3000"
//! auth_url         = "http://localhost:3001"
//! oauth_url        = "http://localhost:8080/auth/google"
//! tick_interval_ms = 800
//! storage_path     = "/home/ada/.local/share/croview"
//! download_path    = "/home/ada/Downloads"
//! ```
//!
//! The report endpoints and the auth endpoints have historically lived on different ports;
//! both are kept as separate settings so either can be pointed anywhere.

use std::{fs, time::Duration};

use super::*;

/// Name of the configuration file inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Settings shared by the library and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Base URL of the report endpoints (`/api/cro/...`)
  pub api_url:          Url,
  /// Base URL of the auth endpoints (`/api/auth/...`)
  pub auth_url:         Url,
  /// Where a browser is sent to start Google sign-in
  pub oauth_url:        Url,
  /// Period of the simulated progress ticker
  pub tick_interval_ms: u64,
  /// Directory backing the key-value store
  pub storage_path:     PathBuf,
  /// Directory downloaded PDFs are written to
  pub download_path:    PathBuf,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_url:          default_url("http://localhost:3000"),
      auth_url:         default_url("http://localhost:3001"),
      oauth_url:        default_url("http://localhost:8080/auth/google"),
      tick_interval_ms: 800,
      storage_path:     FileStore::default_path(),
      download_path:    dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
    }
  }
}

/// Parses one of the built-in default URLs.
fn default_url(raw: &str) -> Url {
  // The literals above are all valid absolute URLs.
  Url::parse(raw).unwrap_or_else(|_| unreachable!("built-in URL {raw} is valid"))
}

impl Config {
  /// Returns the default path of the configuration file.
  ///
  /// - On Unix: `~/.config/croview/config.toml`
  /// - On macOS: `~/Library/Application Support/croview/config.toml`
  /// - On Windows: `%APPDATA%\croview\config.toml`
  pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
      .map(|dir| dir.join("croview").join(CONFIG_FILE))
      .ok_or_else(|| CroError::Config("Could not determine a configuration directory".into()))
  }

  /// Reads the configuration at `path`. Missing keys take their default values.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let config: Self = toml::from_str(&content)?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
  }

  /// Reads the configuration at `path`, or the defaults if no file exists there.
  pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if path.exists() {
      Self::load(path)
    } else {
      debug!("No configuration at {}, using defaults", path.display());
      Ok(Self::default())
    }
  }

  /// Writes the configuration to `path`, creating parent directories.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(self)?)?;
    Ok(())
  }

  /// Sets the report endpoint base URL.
  pub fn with_api_url(mut self, url: Url) -> Self {
    self.api_url = url;
    self
  }

  /// Sets the auth endpoint base URL.
  pub fn with_auth_url(mut self, url: Url) -> Self {
    self.auth_url = url;
    self
  }

  /// Sets the simulated ticker period.
  pub fn with_tick_interval(mut self, interval: Duration) -> Self {
    self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    self
  }

  /// Sets the key-value storage directory.
  pub fn with_storage_path(mut self, path: &Path) -> Self {
    self.storage_path = path.to_path_buf();
    self
  }

  /// Sets the PDF download directory.
  pub fn with_download_path(mut self, path: &Path) -> Self {
    self.download_path = path.to_path_buf();
    self
  }

  /// The simulated ticker period. Zero is raised to one millisecond.
  pub fn tick_interval(&self) -> Duration { Duration::from_millis(self.tick_interval_ms.max(1)) }
}
