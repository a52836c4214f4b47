//! Local mirror of the simulated report collection.
//!
//! [`ReportCache`] persists the simulated collection under the `cro-reports` key of a
//! [`KeyValueStore`]. The cache is never authoritative and never fails its caller:
//!
//! - a missing key, an unreadable store, or text that is not a JSON array all load as an empty
//!   collection;
//! - each stored record is validated on its own, and records with missing or ill-typed fields,
//!   unparseable timestamps, or a status a simulated report cannot carry are dropped;
//! - save failures are logged and swallowed.
//!
//! Remote reports are never written here; the analysis service is their only authority.

use serde_json::Value;

use super::*;

/// Reads and writes the simulated report collection.
#[derive(Debug, Clone)]
pub struct ReportCache {
  /// Backing store
  store: SharedStore,
  /// Key the collection lives under
  key:   String,
}

impl ReportCache {
  /// Creates a cache over `store` using the default `cro-reports` key.
  pub fn new(store: SharedStore) -> Self { Self { store, key: REPORTS_KEY.to_string() } }

  /// Overrides the storage key.
  pub fn with_key(mut self, key: impl Into<String>) -> Self {
    self.key = key.into();
    self
  }

  /// Loads the stored collection, dropping anything that does not validate.
  pub fn load(&self) -> Vec<SimulatedReport> {
    let raw = match self.store.get(&self.key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return Vec::new(),
      Err(e) => {
        warn!("Report cache unavailable, starting empty: {e}");
        return Vec::new();
      },
    };

    let records = match serde_json::from_str::<Value>(&raw) {
      Ok(Value::Array(records)) => records,
      Ok(_) => {
        warn!("Report cache does not hold a list, discarding it");
        return Vec::new();
      },
      Err(e) => {
        warn!("Report cache is corrupted, discarding it: {e}");
        return Vec::new();
      },
    };

    let total = records.len();
    let reports: Vec<SimulatedReport> = records.into_iter().filter_map(validate_record).collect();
    if reports.len() < total {
      debug!("Dropped {} invalid cached report(s)", total - reports.len());
    }
    trace!("Loaded {} cached report(s)", reports.len());
    reports
  }

  /// Overwrites the stored collection with `reports`.
  pub fn save(&self, reports: &[SimulatedReport]) {
    let serialized = match serde_json::to_string(reports) {
      Ok(serialized) => serialized,
      Err(e) => {
        warn!("Failed to serialize report cache: {e}");
        return;
      },
    };
    if let Err(e) = self.store.set(&self.key, &serialized) {
      warn!("Failed to persist report cache: {e}");
    }
  }
}

/// Turns one stored record back into a report, or `None` if it does not validate.
fn validate_record(record: Value) -> Option<SimulatedReport> {
  let mut report = match serde_json::from_value::<SimulatedReport>(record) {
    Ok(report) => report,
    Err(e) => {
      debug!("Dropping cached report: {e}");
      return None;
    },
  };
  if !report.status.is_simulated() {
    debug!("Dropping cached report {} with status {:?}", report.id, report.status);
    return None;
  }
  if !report.progress.is_finite() {
    debug!("Dropping cached report {} with non-finite progress", report.id);
    return None;
  }
  report.progress = report.progress.clamp(0.0, 100.0);
  Some(report)
}
