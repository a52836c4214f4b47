use super::*;

pub mod analyze;
pub mod auth;
pub mod download;
pub mod get;
pub mod init;
pub mod list;
pub mod simulate;

pub use analyze::analyze;
pub use auth::{login, logout, oauth, register, whoami, LoginArgs, RegisterArgs};
pub use download::download;
pub use get::get;
pub use init::{init, InitArgs};
pub use list::list;
pub use simulate::simulate;

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write a default configuration file
  Init(InitArgs),

  /// Sign in to the analysis service
  Login(LoginArgs),

  /// Create an account and sign in to it
  Register(RegisterArgs),

  /// Forget the stored session
  Logout,

  /// Show the signed-in account
  Whoami,

  /// Print the URL that starts Google sign-in
  Oauth,

  /// Request an analysis of a website
  Analyze {
    /// Website to analyze, e.g. "https://example.com"
    url: String,
  },

  /// Simulate report generation locally, without the service
  Simulate {
    /// Websites to submit
    #[arg(required = true)]
    urls: Vec<String>,
  },

  /// List reports, newest first
  List {
    /// Show the locally simulated reports instead of the service's
    #[arg(long)]
    local: bool,
  },

  /// Show one report in detail
  Get {
    /// Report id
    id: String,
  },

  /// Save a finished report as a PDF
  Download {
    /// Report id
    id: String,

    /// Directory to save into. Defaults to the configured download directory
    #[arg(long)]
    dir: Option<PathBuf>,
  },
}

/// Restores the stored session, failing if nobody is signed in.
fn require_session(context: &Context) -> Result<SessionStore> {
  let session = context.session();
  if !session.is_authenticated() {
    return Err(CroviewdError::NotSignedIn);
  }
  Ok(session)
}
