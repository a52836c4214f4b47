//! Error types for the croview command line.

use thiserror::Error;

use super::*;

/// Error type alias used throughout the CLI.
pub type Result<T> = core::result::Result<T, CroviewdError>;

/// Errors that end a CLI command.
#[derive(Error, Debug)]
pub enum CroviewdError {
  /// A library operation failed. Its message is already display-ready.
  #[error(transparent)]
  Croview(#[from] CroError),

  /// Reading from the terminal failed.
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),

  /// Local file or terminal I/O failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// A value that has to be prompted for was missing while prompts were disabled.
  #[error("{0} is required when prompts are disabled")]
  MissingInput(&'static str),

  /// The command needs a signed-in session.
  #[error("Not signed in. Run `croview login` first")]
  NotSignedIn,

  /// The requested report does not exist.
  #[error("Report {0} not found")]
  NotFound(String),
}
