//! Module for saving a report's PDF.

use croview::store::{pdf_filename, RemoteStore};

use super::*;

/// Function for the [`Commands::Download`] in the CLI.
pub async fn download(context: &Context, id: &str, dir: Option<PathBuf>) -> Result<()> {
  let session = require_session(context)?;
  let terminal = &context.terminal;
  let dir = dir.unwrap_or_else(|| context.config.download_path.clone());

  let target = dir.join(pdf_filename(id));
  if target.exists()
    && !terminal.confirm(&format!(
      "{} already exists, download a fresh copy over it?",
      target.display()
    ))?
  {
    terminal.reply(ResponseContent::Info("Keeping the existing file"))?;
    return Ok(());
  }

  let store = RemoteStore::new(context.api()?);
  terminal.reply(ResponseContent::Working(&format!("Downloading report {id}")))?;
  let saved = store.download_pdf(&session, id, &dir).await?;
  terminal.reply(ResponseContent::Success(&format!("Saved to {}", saved.display())))
}
