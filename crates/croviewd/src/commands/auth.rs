//! Session commands: sign in, sign up, sign out, and inspect the current account.

use croview::session::{Credentials, Registration, User};

use super::*;

#[derive(Args, Clone)]
pub struct LoginArgs {
  /// Account email. Prompted for when omitted
  #[arg(long)]
  pub email:    Option<String>,
  /// Account password. Prompted for when omitted
  #[arg(long)]
  pub password: Option<String>,
}

#[derive(Args, Clone)]
pub struct RegisterArgs {
  /// Account email
  #[arg(long)]
  pub email:      Option<String>,
  /// Account password
  #[arg(long)]
  pub password:   Option<String>,
  /// Given name
  #[arg(long)]
  pub first_name: Option<String>,
  /// Family name
  #[arg(long)]
  pub last_name:  Option<String>,
}

/// Uses `value` or asks for it.
fn or_prompt(
  terminal: &Terminal,
  value: Option<String>,
  message: &str,
  field: &'static str,
) -> Result<String> {
  match value {
    Some(value) => Ok(value),
    None => terminal.prompt(message, field),
  }
}

/// Uses `value` or asks for it without echoing.
fn or_prompt_password(terminal: &Terminal, value: Option<String>) -> Result<String> {
  match value {
    Some(value) => Ok(value),
    None => terminal.prompt_password("Password"),
  }
}

/// `Ada Lovelace <ada@example.com>`
fn describe(user: &User) -> String {
  format!("{} {} <{}>", user.first_name, user.last_name, user.email)
}

/// Function for the [`Commands::Login`] in the CLI.
pub async fn login(context: &Context, args: LoginArgs) -> Result<()> {
  let terminal = &context.terminal;
  let email = or_prompt(terminal, args.email, "Email", "--email")?;
  let password = or_prompt_password(terminal, args.password)?;

  let api = context.api()?;
  let mut session = context.session();
  terminal.reply(ResponseContent::Working(&format!("Signing in as {email}")))?;
  let user = session.login(&api, &Credentials::new(email, password)).await?;
  terminal.reply(ResponseContent::Success(&format!("Signed in as {}", describe(user))))?;
  Ok(())
}

/// Function for the [`Commands::Register`] in the CLI.
pub async fn register(context: &Context, args: RegisterArgs) -> Result<()> {
  let terminal = &context.terminal;
  let registration = Registration {
    email:      or_prompt(terminal, args.email, "Email", "--email")?,
    password:   or_prompt_password(terminal, args.password)?,
    first_name: or_prompt(terminal, args.first_name, "First name", "--first-name")?,
    last_name:  or_prompt(terminal, args.last_name, "Last name", "--last-name")?,
  };

  let api = context.api()?;
  let mut session = context.session();
  let user = session.register(&api, &registration).await?;
  terminal.reply(ResponseContent::Success(&format!("Created and signed in as {}", describe(user))))?;
  Ok(())
}

/// Function for the [`Commands::Logout`] in the CLI.
pub fn logout(context: &Context) -> Result<()> {
  let mut session = context.session();
  let was_signed_in = session.is_authenticated();
  session.logout();
  if was_signed_in {
    context.terminal.reply(ResponseContent::Success("Signed out"))
  } else {
    context.terminal.reply(ResponseContent::Info("Nobody was signed in"))
  }
}

/// Function for the [`Commands::Whoami`] in the CLI.
pub fn whoami(context: &Context) -> Result<()> {
  let session = require_session(context)?;
  if let Some(user) = session.user() {
    context.terminal.reply(ResponseContent::Info(&format!(
      "{} ({:?})",
      describe(user),
      user.role
    )))?;
  }
  Ok(())
}

/// Function for the [`Commands::Oauth`] in the CLI.
pub fn oauth(context: &Context) -> Result<()> {
  let api = context.api()?;
  context.terminal.reply(ResponseContent::Info(&format!(
    "Open {} in a browser to sign in with Google",
    style(api.google_auth_url()).blue().underlined()
  )))
}
