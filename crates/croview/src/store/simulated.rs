//! Client-side simulation of report generation.
//!
//! Each submitted report starts `generating` at zero progress. A dedicated ticker task wakes
//! every tick interval (800 ms by default) and moves the report forward:
//!
//! - progress grows by an increment in `[0, 15)` drawn from the store's [`ProgressSource`];
//! - once progress reaches 100 the report is `completed`, its completion time and whole-second
//!   duration are recorded, and the ticker ends;
//! - if the ticker finds the report in any other state (for instance marked failed from the
//!   outside) or finds it gone, it ends without touching anything.
//!
//! Every ticker hangs off the store's [`CancellationToken`], so [`SimulatedStore::shutdown`]
//! or dropping the store stops all of them. Every mutation is written through to the
//! [`ReportCache`].
//!
//! # Examples
//!
//! ```no_run
//! use croview::{storage::MemoryStore, store::SimulatedStore};
//!
//! # async fn example() -> croview::error::Result<()> {
//! let store = SimulatedStore::new(MemoryStore::shared());
//! let report = store.submit("https://example.com")?;
//!
//! while store.get(&report.id).is_some_and(|r| r.is_in_flight()) {
//!   tokio::time::sleep(std::time::Duration::from_millis(200)).await;
//! }
//! store.shutdown();
//! # Ok(())
//! # }
//! ```

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use rand::Rng;
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

use super::*;

/// Upper bound (exclusive) of a random progress increment.
pub const MAX_INCREMENT: f64 = 15.0;

/// Default ticker period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(800);

/// Supplies the progress gained on each tick.
pub trait ProgressSource: Send + Sync {
  /// Progress to add on the next tick. Negative or non-finite values count as zero.
  fn next_increment(&self) -> f64;
}

/// Uniformly random increments in `[0, 15)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomProgress;

impl ProgressSource for RandomProgress {
  fn next_increment(&self) -> f64 { rand::thread_rng().gen_range(0.0..MAX_INCREMENT) }
}

/// The same increment on every tick.
#[derive(Debug, Clone, Copy)]
pub struct FixedProgress(pub f64);

impl ProgressSource for FixedProgress {
  fn next_increment(&self) -> f64 { self.0 }
}

/// Outcome of applying one tick to a report.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
  /// Still generating, with more progress
  Advanced(SimulatedReport),
  /// Reached 100 and is now completed
  Completed(SimulatedReport),
  /// Not generating; the ticker must stop and leave the report untouched
  Halted,
}

/// Applies one tick with the given `increment` at time `now`.
pub fn advance(report: &SimulatedReport, increment: f64, now: DateTime<Utc>) -> Tick {
  if !report.is_in_flight() {
    return Tick::Halted;
  }

  let increment = if increment.is_finite() { increment.max(0.0) } else { 0.0 };
  let progress = (report.progress + increment).min(100.0);

  if progress >= 100.0 {
    let elapsed = (now - report.start_time).num_seconds().max(0);
    Tick::Completed(SimulatedReport {
      status: ReportStatus::Completed,
      progress: 100.0,
      completed_time: Some(now),
      duration: Some(elapsed.unsigned_abs()),
      ..report.clone()
    })
  } else {
    Tick::Advanced(SimulatedReport { progress, ..report.clone() })
  }
}

/// A partial update to a simulated report. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPatch {
  /// New status
  pub status:         Option<ReportStatus>,
  /// New progress, clamped to `[0, 100]`
  pub progress:       Option<f64>,
  /// Completion time
  pub completed_time: Option<DateTime<Utc>>,
  /// Duration in whole seconds
  pub duration:       Option<u64>,
  /// Failure message
  pub error:          Option<String>,
}

impl ReportPatch {
  /// Sets the status.
  pub fn status(mut self, status: ReportStatus) -> Self {
    self.status = Some(status);
    self
  }

  /// Sets the progress.
  pub fn progress(mut self, progress: f64) -> Self {
    self.progress = Some(progress);
    self
  }

  /// Sets the failure message.
  pub fn error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }

  /// Applies the patch on top of `report`.
  fn apply(self, report: &SimulatedReport) -> SimulatedReport {
    let mut next = report.clone();
    if let Some(status) = self.status {
      next.status = status;
    }
    if let Some(progress) = self.progress {
      next.progress = progress;
    }
    if self.completed_time.is_some() {
      next.completed_time = self.completed_time;
    }
    if self.duration.is_some() {
      next.duration = self.duration;
    }
    if self.error.is_some() {
      next.error = self.error;
    }
    next
  }
}

/// State shared between the store handle and its tickers.
struct Inner {
  /// The collection, most-recent-first
  reports:  Mutex<Vec<SimulatedReport>>,
  /// Durable mirror of `reports`
  cache:    ReportCache,
  /// Live ticker per in-flight report id
  tickers:  Mutex<HashMap<String, JoinHandle<()>>>,
  /// Where tick increments come from
  progress: Arc<dyn ProgressSource>,
  /// Ticker period
  interval: Duration,
  /// Parent of every ticker's token
  shutdown: CancellationToken,
  /// Last id handed out, in epoch milliseconds
  last_id:  Mutex<i64>,
  /// Runtime instant the store was opened at
  opened:   Instant,
  /// Wall-clock time matching `opened`
  epoch:    DateTime<Utc>,
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
  /// Current time on the runtime clock, so paused test time moves it too.
  fn now(&self) -> DateTime<Utc> {
    let elapsed = chrono::Duration::from_std(self.opened.elapsed())
      .unwrap_or_else(|_| chrono::Duration::zero());
    self.epoch + elapsed
  }

  /// Runs one tick for `id`. Returns whether the ticker should keep going.
  fn tick(&self, id: &str) -> bool {
    let increment = self.progress.next_increment();
    let mut reports = lock(&self.reports);
    let Some(slot) = reports.iter_mut().find(|r| r.id == id) else {
      trace!("Report {id} is gone, stopping its ticker");
      return false;
    };

    let keep_going = match advance(slot, increment, self.now()) {
      Tick::Advanced(next) => {
        trace!("Report {id} at {:.1}%", next.progress);
        *slot = next;
        true
      },
      Tick::Completed(next) => {
        debug!("Report {id} completed in {}s", next.duration.unwrap_or_default());
        *slot = next;
        false
      },
      Tick::Halted => {
        trace!("Report {id} is {}, stopping its ticker", slot.status);
        return false;
      },
    };
    self.cache.save(&reports);
    keep_going
  }

  /// Hands out a unique, increasing id based on the current time.
  fn next_id(&self) -> String {
    let mut last = lock(&self.last_id);
    let id = Utc::now().timestamp_millis().max(*last + 1);
    *last = id;
    id.to_string()
  }
}

/// Ticker body for one report.
async fn run_ticker(inner: Arc<Inner>, id: String, token: CancellationToken) {
  let mut interval = tokio::time::interval_at(Instant::now() + inner.interval, inner.interval);
  loop {
    tokio::select! {
      () = token.cancelled() => {
        trace!("Ticker for {id} cancelled");
        break;
      },
      _ = interval.tick() => {
        if !inner.tick(&id) {
          break;
        }
      },
    }
  }
  lock(&inner.tickers).remove(&id);
}

/// Report store that simulates generation on the client.
///
/// Dropping the store cancels every ticker.
pub struct SimulatedStore {
  /// Shared with the tickers
  inner: Arc<Inner>,
}

impl std::fmt::Debug for SimulatedStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SimulatedStore")
      .field("reports", &lock(&self.inner.reports).len())
      .field("interval", &self.inner.interval)
      .finish()
  }
}

impl SimulatedStore {
  /// Opens a store over `storage` with random increments and the default tick interval.
  ///
  /// The cached collection is loaded immediately. Reports that were still generating are not
  /// resumed until [`Self::resume`] is called.
  pub fn new(storage: SharedStore) -> Self {
    Self::with_settings(storage, DEFAULT_TICK_INTERVAL, RandomProgress)
  }

  /// Opens a store using the tick interval from `config`.
  pub fn from_config(config: &Config, storage: SharedStore) -> Self {
    Self::with_settings(storage, config.tick_interval(), RandomProgress)
  }

  /// Opens a store with an explicit tick interval and progress source.
  pub fn with_settings(
    storage: SharedStore,
    interval: Duration,
    progress: impl ProgressSource + 'static,
  ) -> Self {
    let cache = ReportCache::new(storage);
    let reports = cache.load();
    let last_id = reports.iter().filter_map(|r| r.id.parse::<i64>().ok()).max().unwrap_or(0);
    debug!("Simulated store opened with {} cached report(s)", reports.len());
    Self {
      inner: Arc::new(Inner {
        reports: Mutex::new(reports),
        cache,
        tickers: Mutex::new(HashMap::new()),
        progress: Arc::new(progress),
        interval,
        shutdown: CancellationToken::new(),
        last_id: Mutex::new(last_id),
        opened: Instant::now(),
        epoch: Utc::now(),
      }),
    }
  }

  /// Validates `url`, adds a fresh `generating` report for it, and starts its ticker.
  ///
  /// # Errors
  ///
  /// - [`CroError::EmptyUrl`] / [`CroError::InvalidUrl`] for a bad submission
  /// - [`CroError::ShutDown`] after [`Self::shutdown`]
  /// - [`CroError::Config`] when called outside a Tokio runtime
  pub fn submit(&self, url: &str) -> Result<SimulatedReport> {
    let url = format::validate_submission(url)?;
    if self.is_shut_down() {
      warn!("Refusing to submit {url} to a shut down store");
      return Err(CroError::ShutDown);
    }
    let runtime = tokio::runtime::Handle::try_current()
      .map_err(|_| CroError::Config("Simulated reports need a Tokio runtime".to_string()))?;

    let report = SimulatedReport::new(self.inner.next_id(), url, self.inner.now());
    if !self.add_report(report.clone()) {
      return Err(CroError::Config(format!("Report id {} is already taken", report.id)));
    }
    self.spawn_ticker(&runtime, &report.id);
    Ok(report)
  }

  /// Prepends `report` to the collection.
  ///
  /// Returns `false`, leaving the collection unchanged, if the id is already taken.
  pub fn add_report(&self, report: SimulatedReport) -> bool {
    let mut reports = lock(&self.inner.reports);
    if reports.iter().any(|r| r.id == report.id) {
      warn!("Ignoring report with duplicate id {}", report.id);
      return false;
    }
    reports.insert(0, report);
    self.inner.cache.save(&reports);
    true
  }

  /// Applies `patch` to the report with `id`.
  ///
  /// Returns whether a report was updated. Unknown ids and patches that would break the
  /// lifecycle are no-ops.
  pub fn update_report(&self, id: &str, patch: ReportPatch) -> bool {
    self.update_report_with(id, |report| patch.apply(report))
  }

  /// Replaces the report with `id` by a function of its previous value.
  ///
  /// The id is preserved and progress is clamped to `[0, 100]`. Returns whether a report was
  /// updated; unknown ids and updates that would break the lifecycle are no-ops.
  pub fn update_report_with(
    &self,
    id: &str,
    update: impl FnOnce(&SimulatedReport) -> SimulatedReport,
  ) -> bool {
    let mut reports = lock(&self.inner.reports);
    let Some(slot) = reports.iter_mut().find(|r| r.id == id) else {
      return false;
    };

    let mut next = update(&*slot);
    if !next.status.is_simulated() || !slot.status.can_transition_to(next.status) {
      warn!("Rejected update of report {id}: {} -> {}", slot.status, next.status);
      return false;
    }
    next.id = slot.id.clone();
    next.progress = if next.progress.is_finite() { next.progress.clamp(0.0, 100.0) } else { 0.0 };
    *slot = next;

    self.inner.cache.save(&reports);
    true
  }

  /// Marks an in-flight report failed. Its ticker stops on its next tick.
  pub fn mark_failed(&self, id: &str, message: impl Into<String>) -> bool {
    self.update_report(id, ReportPatch::default().status(ReportStatus::Failed).error(message))
  }

  /// Snapshot of the collection, most-recent-first.
  pub fn reports(&self) -> Vec<SimulatedReport> { lock(&self.inner.reports).clone() }

  /// The report with `id`.
  pub fn get(&self, id: &str) -> Option<SimulatedReport> {
    lock(&self.inner.reports).iter().find(|r| r.id == id).cloned()
  }

  /// Reports still generating.
  pub fn in_flight(&self) -> Vec<SimulatedReport> {
    lock(&self.inner.reports).iter().filter(|r| r.is_in_flight()).cloned().collect()
  }

  /// Number of tickers currently running.
  pub fn active_tickers(&self) -> usize {
    lock(&self.inner.tickers).values().filter(|handle| !handle.is_finished()).count()
  }

  /// Starts tickers for generating reports that have none, such as ones restored from the
  /// cache. Returns how many were started.
  pub fn resume(&self) -> Result<usize> {
    let runtime = tokio::runtime::Handle::try_current()
      .map_err(|_| CroError::Config("Simulated reports need a Tokio runtime".to_string()))?;
    let mut started = 0;
    for report in self.in_flight() {
      if self.spawn_ticker(&runtime, &report.id) {
        started += 1;
      }
    }
    debug!("Resumed {started} ticker(s)");
    Ok(started)
  }

  /// Cancels every ticker. Reports keep their last state.
  pub fn shutdown(&self) {
    self.inner.shutdown.cancel();
    for (id, handle) in lock(&self.inner.tickers).drain() {
      trace!("Aborting ticker for {id}");
      handle.abort();
    }
  }

  /// Whether [`Self::shutdown`] has run.
  pub fn is_shut_down(&self) -> bool { self.inner.shutdown.is_cancelled() }

  /// Starts a ticker for `id` unless one is already running or the store is shut down.
  fn spawn_ticker(&self, runtime: &tokio::runtime::Handle, id: &str) -> bool {
    if self.inner.shutdown.is_cancelled() {
      return false;
    }
    let mut tickers = lock(&self.inner.tickers);
    if tickers.get(id).is_some_and(|handle| !handle.is_finished()) {
      return false;
    }
    let token = self.inner.shutdown.child_token();
    let handle = runtime.spawn(run_ticker(Arc::clone(&self.inner), id.to_string(), token));
    tickers.insert(id.to_string(), handle);
    true
  }
}

impl Drop for SimulatedStore {
  fn drop(&mut self) { self.shutdown(); }
}
