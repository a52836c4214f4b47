use croview::{cache::ReportCache, store::RemoteStore};

use super::*;

/// Function for the [`Commands::Get`] in the CLI.
///
/// Looks in the local simulation cache first, then asks the service.
pub async fn get(context: &Context, id: &str) -> Result<()> {
  let cached = ReportCache::new(context.storage.clone()).load().into_iter().find(|r| r.id == id);
  let report = match cached {
    Some(report) => Report::from(report),
    None => {
      let session = require_session(context)?;
      let store = RemoteStore::new(context.api()?);
      match store.get_report_by_id(&session, id).await? {
        Some(report) => Report::from(report),
        None => return Err(CroviewdError::NotFound(id.to_string())),
      }
    },
  };
  context.terminal.reply(ResponseContent::Report(&report))
}
