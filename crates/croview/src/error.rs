//! Error types for the croview library.
//!
//! Every failure a caller can observe is collapsed into [`CroError`], whose `Display`
//! implementation is a single display-ready message. Callers (the CLI, or any other front end)
//! are expected to show that message as-is; no structured error codes are preserved beyond the
//! variant itself.
//!
//! The failure classes are:
//! - Validation errors, raised locally before any remote call
//! - Authentication errors, raised when an operation needs a session and none exists
//! - Network and service errors, carrying the server-provided message when there is one
//! - Local I/O and (de)serialization errors
//!
//! Corrupted cache data is never an error; it is discarded during load.
//!
//! # Examples
//!
//! ```
//! use croview::{error::CroError, format::validate_submission};
//!
//! match validate_submission("   ") {
//!   Err(CroError::EmptyUrl) => println!("nothing entered"),
//!   Err(e) => println!("{e}"),
//!   Ok(url) => println!("submitting {url}"),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`croview`](crate) crate.
pub type Result<T> = core::result::Result<T, CroError>;

/// Errors that can occur when working with analysis reports.
#[derive(Error, Debug)]
pub enum CroError {
  /// The submitted URL was empty after trimming.
  #[error("Please enter a website URL")]
  EmptyUrl,

  /// The submitted text does not parse as an absolute URL.
  ///
  /// The string parameter holds the rejected input for debugging.
  #[error("Please enter a valid URL (e.g., https://example.com)")]
  InvalidUrl(String),

  /// An operation that needs a session was attempted without one.
  ///
  /// The message names the operation, e.g. "User must be authenticated to create analysis".
  #[error("{0}")]
  Unauthenticated(&'static str),

  /// The remote service answered with a non-success status.
  ///
  /// Holds the server-provided message when the body carried one, otherwise a generic message
  /// naming the operation and the HTTP status text.
  #[error("{0}")]
  Api(String),

  /// The remote service refused access to a report owned by someone else.
  #[error("Access denied")]
  AccessDenied,

  /// A simulated report was submitted after its store was shut down.
  #[error("Report generation has been stopped")]
  ShutDown,

  /// A network request failed before a response was received.
  ///
  /// This can occur when:
  /// - The service is unreachable
  /// - TLS negotiation fails
  /// - The response body could not be decoded
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// An authorization header could not be built from the stored token.
  #[error("Stored session token is not a valid header value")]
  InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// JSON (de)serialization failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A configuration could not be written out.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// A configured URL could not be parsed or joined.
  #[error(transparent)]
  Url(#[from] url::ParseError),

  /// Generic configuration problem.
  #[error("{0}")]
  Config(String),
}
