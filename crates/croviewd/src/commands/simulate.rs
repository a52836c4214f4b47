//! Module for running the offline simulation.

use std::time::Duration;

use croview::store::SimulatedStore;

use super::*;

/// How often the progress display refreshes.
const REDRAW_INTERVAL: Duration = Duration::from_millis(200);

/// Function for the [`Commands::Simulate`] in the CLI.
///
/// Submits every URL, resumes anything left generating by an earlier run, and renders progress
/// until every report is finished or Ctrl-C is pressed. Either way the store is shut down, which
/// stops every ticker; unfinished reports stay `generating` in the cache for the next run.
pub async fn simulate(context: &Context, urls: &[String]) -> Result<()> {
  let terminal = &context.terminal;
  let store = SimulatedStore::from_config(&context.config, context.storage.clone());

  let resumed = store.resume()?;
  if resumed > 0 {
    terminal.reply(ResponseContent::Info(&format!("Resumed {resumed} unfinished report(s)")))?;
  }
  for url in urls {
    let report = store.submit(url)?;
    debug!("Submitted {} as {}", report.url, report.id);
  }

  let interactive = terminal.is_interactive();
  let mut drawn = 0;
  let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
  let interrupted = loop {
    tokio::select! {
      signal = tokio::signal::ctrl_c() => {
        signal?;
        break true;
      },
      _ = redraw.tick() => {
        if interactive {
          let reports = watched(&store);
          drawn = terminal.redraw(&reports, drawn)?;
        }
        if store.in_flight().is_empty() {
          break false;
        }
      },
    }
  };
  store.shutdown();

  if interactive {
    terminal.redraw(&[], drawn)?;
  }
  terminal.reply(ResponseContent::Reports(&watched(&store)))?;
  if interrupted {
    terminal.reply(ResponseContent::Warning(
      "Interrupted. Unfinished reports continue on the next `croview simulate`",
    ))?;
  }
  Ok(())
}

/// The reports this run is showing, newest first.
fn watched(store: &SimulatedStore) -> Vec<Report> {
  store.reports().into_iter().map(Report::from).collect()
}
