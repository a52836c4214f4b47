use croview::store::RemoteStore;

use super::*;

/// Function for the [`Commands::Analyze`] in the CLI.
///
/// The URL is checked before the session so a typo is reported even when signed out.
pub async fn analyze(context: &Context, url: &str) -> Result<()> {
  let url = croview::format::validate_submission(url)?;
  let session = require_session(context)?;
  let terminal = &context.terminal;

  let mut store = RemoteStore::new(context.api()?);
  terminal.reply(ResponseContent::Working(&format!("Requesting an analysis of {url}")))?;
  let created = store.create_analysis(&session, url).await?;
  terminal.reply(ResponseContent::Success(&format!(
    "Analysis {} is {}",
    style(&created.id).yellow(),
    created.status.text().to_lowercase()
  )))?;

  if let Some(error) = store.error() {
    terminal.reply(ResponseContent::Warning(&format!("Could not refresh the list: {error}")))?;
    return Ok(());
  }
  let reports: Vec<Report> = store.reports().iter().cloned().map(Report::from).collect();
  terminal.reply(ResponseContent::Reports(&reports))
}
