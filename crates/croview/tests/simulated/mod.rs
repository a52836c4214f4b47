use super::*;

const INTERVAL: Duration = Duration::from_millis(800);

fn fixed_store(storage: SharedStore) -> SimulatedStore {
  SimulatedStore::with_settings(storage, INTERVAL, FixedProgress(10.0))
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_report_runs_to_completion() -> TestResult {
  let store = fixed_store(MemoryStore::shared());
  let report = store.submit("https://example.com")?;
  assert_eq!(report.status, ReportStatus::Generating);
  assert_eq!(report.progress, 0.0);
  assert_eq!(store.active_tickers(), 1);

  ticks(INTERVAL, 9).await;
  let halfway = store.get(&report.id).unwrap();
  assert_eq!(halfway.status, ReportStatus::Generating);
  assert_eq!(halfway.progress, 90.0);

  ticks(INTERVAL, 1).await;
  let done = store.get(&report.id).unwrap();
  assert_eq!(done.status, ReportStatus::Completed);
  assert_eq!(done.progress, 100.0);
  assert_eq!(done.duration, Some(8));
  assert_eq!((done.completed_time.unwrap() - done.start_time).num_seconds(), 8);
  assert_eq!(store.active_tickers(), 0);
  assert!(store.in_flight().is_empty());
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_submit_rejects_bad_urls() {
  let store = fixed_store(MemoryStore::shared());
  assert!(matches!(store.submit(""), Err(CroError::EmptyUrl)));
  assert!(matches!(store.submit("example"), Err(CroError::InvalidUrl(_))));
  assert!(store.reports().is_empty());
  assert_eq!(store.active_tickers(), 0);
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_newest_report_first() -> TestResult {
  let store = fixed_store(MemoryStore::shared());
  let a = store.submit("https://a.example.com")?;
  let b = store.submit("https://b.example.com")?;
  assert_ne!(a.id, b.id);

  let ids: Vec<String> = store.reports().into_iter().map(|r| r.id).collect();
  assert_eq!(ids, [b.id, a.id]);
  assert_eq!(store.active_tickers(), 2);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_failed_report_stops_ticking() -> TestResult {
  let store = fixed_store(MemoryStore::shared());
  let report = store.submit("https://example.com")?;

  ticks(INTERVAL, 3).await;
  assert!(store.mark_failed(&report.id, "Simulated failure"));

  ticks(INTERVAL, 20).await;
  let failed = store.get(&report.id).unwrap();
  assert_eq!(failed.status, ReportStatus::Failed);
  assert_eq!(failed.progress, 30.0);
  assert_eq!(failed.error.as_deref(), Some("Simulated failure"));
  assert_eq!(store.active_tickers(), 0);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_terminal_states_stick() -> TestResult {
  let store = fixed_store(MemoryStore::shared());
  let report = store.submit("https://example.com")?;
  ticks(INTERVAL, 10).await;

  assert!(!store.update_report(&report.id, ReportPatch::default().status(ReportStatus::Generating)));
  assert!(!store.mark_failed(&report.id, "too late"));
  assert_eq!(store.get(&report.id).unwrap().status, ReportStatus::Completed);

  // Progress changes that keep the status are still allowed.
  assert!(store.update_report(&report.id, ReportPatch::default().progress(250.0)));
  assert_eq!(store.get(&report.id).unwrap().progress, 100.0);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_update_unknown_report_is_noop() {
  let store = fixed_store(MemoryStore::shared());
  assert!(!store.update_report("missing", ReportPatch::default().progress(50.0)));
  assert!(!store.mark_failed("missing", "nope"));
  assert!(store.reports().is_empty());
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_update_rejects_remote_only_statuses() -> TestResult {
  let store = fixed_store(MemoryStore::shared());
  let report = store.submit("https://example.com")?;
  assert!(!store.update_report(&report.id, ReportPatch::default().status(ReportStatus::Processing)));
  assert_eq!(store.get(&report.id).unwrap().status, ReportStatus::Generating);

  // The id survives an update that tries to change it.
  assert!(store.update_report_with(&report.id, |r| SimulatedReport {
    id: "other".into(),
    progress: 5.0,
    ..r.clone()
  }));
  assert!(store.get("other").is_none());
  assert_eq!(store.get(&report.id).unwrap().progress, 5.0);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic() -> TestResult {
  let store = SimulatedStore::with_settings(MemoryStore::shared(), INTERVAL, RandomProgress);
  let report = store.submit("https://example.com")?;

  let mut last = 0.0;
  for _ in 0..1_000 {
    ticks(INTERVAL, 1).await;
    let current = store.get(&report.id).unwrap();
    assert!(current.progress >= last, "progress went from {last} to {}", current.progress);
    assert!(current.progress <= 100.0);
    last = current.progress;
    if current.status == ReportStatus::Completed {
      break;
    }
  }
  assert_eq!(last, 100.0);

  ticks(INTERVAL, 5).await;
  assert_eq!(store.get(&report.id).unwrap().status, ReportStatus::Completed);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_every_change_is_written_through() -> TestResult {
  let storage = MemoryStore::shared();
  let cache = ReportCache::new(storage.clone());
  let store = fixed_store(storage);

  let report = store.submit("https://example.com")?;
  assert_eq!(cache.load(), store.reports());

  ticks(INTERVAL, 4).await;
  let cached = cache.load();
  assert_eq!(cached[0].id, report.id);
  assert_eq!(cached[0].progress, 40.0);

  ticks(INTERVAL, 6).await;
  assert_eq!(cache.load()[0].status, ReportStatus::Completed);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_every_ticker() -> TestResult {
  let storage = MemoryStore::shared();
  let store = fixed_store(storage.clone());
  let report = store.submit("https://example.com")?;
  store.submit("https://other.example.com")?;

  ticks(INTERVAL, 2).await;
  store.shutdown();
  assert!(store.is_shut_down());
  assert_eq!(store.active_tickers(), 0);

  ticks(INTERVAL, 10).await;
  let frozen = store.get(&report.id).unwrap();
  assert_eq!(frozen.status, ReportStatus::Generating);
  assert_eq!(frozen.progress, 20.0);

  // Nothing new starts once shut down.
  assert_eq!(store.resume()?, 0);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_submit_after_shutdown_is_refused() {
  let storage = MemoryStore::shared();
  let cache = ReportCache::new(storage.clone());
  let store = fixed_store(storage);
  store.shutdown();

  assert!(matches!(store.submit("https://example.com"), Err(CroError::ShutDown)));
  assert!(store.reports().is_empty());
  assert!(cache.load().is_empty());
  assert_eq!(store.active_tickers(), 0);

  // Validation still comes first.
  assert!(matches!(store.submit(" "), Err(CroError::EmptyUrl)));
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_drop_stops_tickers() -> TestResult {
  let storage = MemoryStore::shared();
  let cache = ReportCache::new(storage.clone());
  let store = fixed_store(storage);
  store.submit("https://example.com")?;

  ticks(INTERVAL, 3).await;
  drop(store);

  ticks(INTERVAL, 10).await;
  let cached = cache.load();
  assert_eq!(cached[0].status, ReportStatus::Generating);
  assert_eq!(cached[0].progress, 30.0);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_resume_cached_reports() -> TestResult {
  let storage = MemoryStore::shared();
  let cache = ReportCache::new(storage.clone());
  let start = chrono::Utc::now();
  let mut done = SimulatedReport::new("1", "https://done.example.com", start);
  done.status = ReportStatus::Completed;
  done.progress = 100.0;
  let mut halfway = SimulatedReport::new("2", "https://halfway.example.com", start);
  halfway.progress = 50.0;
  cache.save(&[halfway, done]);

  let store = fixed_store(storage);
  assert_eq!(store.reports().len(), 2);
  assert_eq!(store.active_tickers(), 0);

  assert_eq!(store.resume()?, 1);
  assert_eq!(store.resume()?, 0);

  ticks(INTERVAL, 5).await;
  assert_eq!(store.get("2").unwrap().status, ReportStatus::Completed);
  assert_eq!(store.get("1").unwrap().status, ReportStatus::Completed);

  // Fresh ids never collide with cached ones.
  let fresh = store.submit("https://new.example.com")?;
  assert!(fresh.id.parse::<i64>()? > 2);
  Ok(())
}

#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_file_backed_store_survives_restart() -> TestResult {
  let dir = tempdir()?;
  let id = {
    let store = fixed_store(croview::storage::FileStore::shared(dir.path()));
    let report = store.submit("https://example.com")?;
    ticks(INTERVAL, 10).await;
    report.id
  };

  let reopened = fixed_store(croview::storage::FileStore::shared(dir.path()));
  let report = reopened.get(&id).unwrap();
  assert_eq!(report.status, ReportStatus::Completed);
  assert_eq!(report.url, "https://example.com");
  Ok(())
}
