use croview::{cache::ReportCache, store::RemoteStore};

use super::*;

/// Function for the [`Commands::List`] in the CLI.
pub async fn list(context: &Context, local: bool) -> Result<()> {
  let reports: Vec<Report> = if local {
    ReportCache::new(context.storage.clone()).load().into_iter().map(Report::from).collect()
  } else {
    let session = require_session(context)?;
    let mut store = RemoteStore::new(context.api()?);
    store.fetch_reports(&session).await?;
    store.reports().iter().cloned().map(Report::from).collect()
  };
  debug!("Listing {} report(s)", reports.len());
  context.terminal.reply(ResponseContent::Reports(&reports))
}
