//! URL validation and duration formatting.
//!
//! Submissions are gated on [`validate_submission`] before any state change or remote call.

use super::*;

/// Whether `candidate` parses as a well-formed absolute URL.
///
/// # Examples
///
/// ```
/// use croview::format::is_valid_url;
///
/// assert!(is_valid_url("https://example.com"));
/// assert!(!is_valid_url("not a url"));
/// assert!(!is_valid_url(""));
/// ```
pub fn is_valid_url(candidate: &str) -> bool { Url::parse(candidate).is_ok() }

/// Trims and validates a submitted website URL, returning the trimmed text.
///
/// # Errors
///
/// - [`CroError::EmptyUrl`] when nothing but whitespace was entered
/// - [`CroError::InvalidUrl`] when the text is not an absolute URL
pub fn validate_submission(input: &str) -> Result<&str> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(CroError::EmptyUrl);
  }
  match Url::parse(trimmed) {
    Ok(_) => Ok(trimmed),
    Err(e) => {
      debug!("Rejected submission {trimmed:?}: {e}");
      Err(CroError::InvalidUrl(trimmed.to_string()))
    },
  }
}

/// Renders a duration in whole seconds as `"{m}m {s}s"`, or `"{s}s"` under a minute.
///
/// ```
/// use croview::format::format_duration;
///
/// assert_eq!(format_duration(45), "45s");
/// assert_eq!(format_duration(125), "2m 5s");
/// ```
pub fn format_duration(seconds: u64) -> String {
  let mins = seconds / 60;
  let secs = seconds % 60;
  if mins > 0 {
    format!("{mins}m {secs}s")
  } else {
    format!("{secs}s")
  }
}
