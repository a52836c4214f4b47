//! Module for writing a fresh configuration.

use url::Url;

use super::*;

#[derive(Args, Clone)]
pub struct InitArgs {
  /// Base URL of the report endpoints
  #[arg(long)]
  pub api_url:      Option<Url>,
  /// Base URL of the auth endpoints
  #[arg(long)]
  pub auth_url:     Option<Url>,
  /// Directory for the session and the simulated report cache
  #[arg(long)]
  pub storage_path: Option<PathBuf>,
}

/// Function for the [`Commands::Init`] in the CLI.
pub fn init(context: &Context, args: InitArgs) -> Result<()> {
  let InitArgs { api_url, auth_url, storage_path } = args;
  let terminal = &context.terminal;
  let path = &context.config_path;

  if path.exists()
    && !terminal.confirm(&format!(
      "A configuration already exists at {}, do you want to overwrite it?",
      path.display()
    ))?
  {
    terminal.reply(ResponseContent::Info("Keeping the existing configuration"))?;
    return Ok(());
  }

  let mut config = Config::default();
  if let Some(url) = api_url {
    config = config.with_api_url(url);
  }
  if let Some(url) = auth_url {
    config = config.with_auth_url(url);
  }
  if let Some(dir) = storage_path {
    config = config.with_storage_path(&dir);
  }
  config.save(path)?;

  terminal.reply(ResponseContent::Success(&format!(
    "Created croview configuration\nConfig path: {}\nReports API: {}\nAuth API: {}\nStorage \
     path: {}",
    path.display(),
    config.api_url,
    config.auth_url,
    config.storage_path.display(),
  )))?;
  Ok(())
}
