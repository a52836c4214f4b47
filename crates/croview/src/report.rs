//! Report shapes and the status taxonomy.
//!
//! Reports come in two shapes. A [`SimulatedReport`] is synthesized on the client and driven
//! to completion by a fake progress ticker; a [`RemoteReport`] is the authoritative record
//! returned by the analysis service. The two are unified under the [`Report`] union, which is
//! tagged with an explicit `source` discriminator when serialized:
//!
//! ```
//! use chrono::Utc;
//! use croview::report::{Report, SimulatedReport};
//!
//! let report = Report::from(SimulatedReport::new("1", "https://example.com", Utc::now()));
//! let json = serde_json::to_value(&report).unwrap();
//! assert_eq!(json["source"], "local-simulated");
//! ```
//!
//! Both shapes share one [`ReportStatus`] enum. Simulated reports only ever use `generating`,
//! `completed`, and `failed`; remote reports use `pending`, `processing`, `completed`, and
//! `failed`. Any other status string coming from the service deserializes to
//! [`ReportStatus::Unknown`] rather than failing the whole response.

use super::*;

/// Lifecycle state of a report.
///
/// Transitions only move forward. See [`ReportStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
  /// Simulated report whose progress is still advancing
  Generating,
  /// Remote report queued for analysis
  Pending,
  /// Remote report being analyzed
  Processing,
  /// Analysis finished successfully
  Completed,
  /// Analysis failed
  Failed,
  /// Status string not recognized by this client
  #[serde(other)]
  Unknown,
}

/// Display color token for a status.
///
/// The dashboard renders these as Tailwind background classes; the CLI maps them onto terminal
/// colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
  /// In progress
  Blue,
  /// Finished successfully
  Green,
  /// Finished with an error
  Red,
  /// Neutral default
  Gray,
}

impl StatusColor {
  /// The dashboard's CSS class for this color.
  pub fn css_class(&self) -> &'static str {
    match self {
      Self::Blue => "bg-blue-500",
      Self::Green => "bg-green-500",
      Self::Red => "bg-red-500",
      Self::Gray => "bg-gray-500",
    }
  }
}

impl ReportStatus {
  /// Whether the status is `completed` or `failed`.
  pub fn is_terminal(&self) -> bool { matches!(self, Self::Completed | Self::Failed) }

  /// Whether a simulated report may carry this status.
  pub fn is_simulated(&self) -> bool {
    matches!(self, Self::Generating | Self::Completed | Self::Failed)
  }

  /// Whether moving from `self` to `next` respects the one-directional lifecycle.
  ///
  /// Staying in the same state is always allowed. Terminal states never change. The remote
  /// lifecycle allows `pending` to jump straight to a terminal state since the service may
  /// never report `processing`.
  pub fn can_transition_to(&self, next: ReportStatus) -> bool {
    use ReportStatus::*;
    if *self == next {
      return true;
    }
    match self {
      Generating => matches!(next, Completed | Failed),
      Pending => matches!(next, Processing | Completed | Failed),
      Processing => matches!(next, Completed | Failed),
      Completed | Failed => false,
      Unknown => true,
    }
  }

  /// Color token used to render this status.
  pub fn color(&self) -> StatusColor {
    match self {
      Self::Generating | Self::Processing => StatusColor::Blue,
      Self::Completed => StatusColor::Green,
      Self::Failed => StatusColor::Red,
      Self::Pending | Self::Unknown => StatusColor::Gray,
    }
  }

  /// Human readable label.
  pub fn text(&self) -> &'static str {
    match self {
      Self::Generating => "Generating",
      Self::Pending => "Pending",
      Self::Processing => "Processing",
      Self::Completed => "Completed",
      Self::Failed => "Failed",
      Self::Unknown => "Unknown",
    }
  }
}

impl Display for ReportStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.text()) }
}

/// A report produced entirely on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedReport {
  /// Unique id derived from the creation timestamp
  pub id:             String,
  /// The analyzed website
  pub url:            String,
  /// Current lifecycle state
  pub status:         ReportStatus,
  /// Progress percentage in `[0, 100]`
  pub progress:       f64,
  /// When the report was submitted
  pub start_time:     DateTime<Utc>,
  /// When the report reached `completed`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completed_time: Option<DateTime<Utc>>,
  /// Whole seconds between start and completion
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration:       Option<u64>,
  /// Failure message
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:          Option<String>,
}

impl SimulatedReport {
  /// A freshly submitted report: `generating` at zero progress.
  pub fn new(id: impl Into<String>, url: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      id:             id.into(),
      url:            url.into(),
      status:         ReportStatus::Generating,
      progress:       0.0,
      start_time:     now,
      completed_time: None,
      duration:       None,
      error:          None,
    }
  }

  /// Whether the ticker should still be advancing this report.
  pub fn is_in_flight(&self) -> bool { self.status == ReportStatus::Generating }
}

/// Page statistics gathered by the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportMetadata {
  /// Words on the analyzed page
  pub word_count:      u64,
  /// Tokens spent on the analysis
  pub analysis_tokens: u64,
  /// Page size in bytes
  pub page_size:       u64,
  /// Page load time as measured by the service
  #[serde(skip_serializing_if = "Option::is_none")]
  pub load_time:       Option<f64>,
  /// Server-side path of the captured screenshot
  #[serde(skip_serializing_if = "Option::is_none")]
  pub screenshot_path: Option<String>,
}

/// The authoritative record returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReport {
  /// Server-assigned id
  pub id:            String,
  /// Owner of the report
  #[serde(default, deserialize_with = "null_as_default")]
  pub user_id:       String,
  /// The analyzed website
  pub url:           String,
  /// Title of the analyzed page, once known
  #[serde(default)]
  pub page_title:    Option<String>,
  /// Analysis body, possibly HTML
  #[serde(default, deserialize_with = "null_as_default")]
  pub analysis:      String,
  /// Server-side path of the rendered PDF
  #[serde(default)]
  pub pdf_path:      Option<String>,
  /// Page statistics
  #[serde(default, deserialize_with = "null_as_default")]
  pub metadata:      ReportMetadata,
  /// Current lifecycle state
  pub status:        ReportStatus,
  /// Failure message
  #[serde(default)]
  pub error_message: Option<String>,
  /// Creation timestamp
  pub created_at:    DateTime<Utc>,
  /// Last modification timestamp
  pub updated_at:    DateTime<Utc>,
}

/// Reads `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> core::result::Result<T, D::Error>
where
  D: serde::Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RemoteReport {
  /// Whether the service is still working on this report.
  pub fn is_processing(&self) -> bool {
    matches!(self.status, ReportStatus::Pending | ReportStatus::Processing)
  }
}

/// Either kind of report, tagged by where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum Report {
  /// Produced by the client-side simulation
  #[serde(rename = "local-simulated")]
  Simulated(SimulatedReport),
  /// Returned by the analysis service
  #[serde(rename = "remote")]
  Remote(RemoteReport),
}

impl Report {
  /// The report id.
  pub fn id(&self) -> &str {
    match self {
      Self::Simulated(r) => &r.id,
      Self::Remote(r) => &r.id,
    }
  }

  /// The analyzed URL.
  pub fn url(&self) -> &str {
    match self {
      Self::Simulated(r) => &r.url,
      Self::Remote(r) => &r.url,
    }
  }

  /// Current status.
  pub fn status(&self) -> ReportStatus {
    match self {
      Self::Simulated(r) => r.status,
      Self::Remote(r) => r.status,
    }
  }

  /// When the report was submitted.
  pub fn started_at(&self) -> DateTime<Utc> {
    match self {
      Self::Simulated(r) => r.start_time,
      Self::Remote(r) => r.created_at,
    }
  }

  /// Progress percentage, only tracked for simulated reports.
  pub fn progress(&self) -> Option<f64> {
    match self {
      Self::Simulated(r) => Some(r.progress),
      Self::Remote(_) => None,
    }
  }

  /// Failure message, if any.
  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Simulated(r) => r.error.as_deref(),
      Self::Remote(r) => r.error_message.as_deref(),
    }
  }
}

impl From<SimulatedReport> for Report {
  fn from(report: SimulatedReport) -> Self { Self::Simulated(report) }
}

impl From<RemoteReport> for Report {
  fn from(report: RemoteReport) -> Self { Self::Remote(report) }
}
