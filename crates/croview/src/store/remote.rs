//! Report store backed by the remote analysis service.
//!
//! The service is the only authority. [`RemoteStore::create_analysis`] does not insert the new
//! record locally; it asks the service for the whole collection again. Two refreshes racing
//! each other resolve in whatever order their responses arrive, and the later one wins.
//!
//! Every operation takes the session explicitly and asks it for headers on each call.

use super::*;
use crate::{api::ApiClient, session::AuthProvider};

/// Message for creating an analysis without a session.
const CREATE_NEEDS_AUTH: &str = "User must be authenticated to create analysis";
/// Message for fetching one report without a session.
const FETCH_NEEDS_AUTH: &str = "User must be authenticated to fetch report";
/// Message for downloading a PDF without a session.
const DOWNLOAD_NEEDS_AUTH: &str = "User must be authenticated to download report";

/// Local view of the reports held by the analysis service.
#[derive(Debug)]
pub struct RemoteStore {
  /// Service client
  api:        ApiClient,
  /// Last collection received, in service order
  reports:    Vec<RemoteReport>,
  /// Whether a refresh is outstanding or none has completed yet
  is_loading: bool,
  /// Message of the last failed refresh
  error:      Option<String>,
  /// Session epoch seen by the last refresh
  seen_epoch: Option<u64>,
}

impl RemoteStore {
  /// Creates an empty store. It counts as loading until the first refresh.
  pub fn new(api: ApiClient) -> Self {
    Self { api, reports: Vec::new(), is_loading: true, error: None, seen_epoch: None }
  }

  /// The last collection received from the service.
  pub fn reports(&self) -> &[RemoteReport] { &self.reports }

  /// Whether the collection is still being loaded.
  pub fn is_loading(&self) -> bool { self.is_loading }

  /// Message of the last failed refresh, cleared when a refresh starts.
  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  /// The underlying service client.
  pub fn api(&self) -> &ApiClient { &self.api }

  /// Replaces the collection with the service's.
  ///
  /// Without a session the collection is emptied and no request is made; that is not an
  /// error. On failure the previous collection is kept and the message is recorded in
  /// [`Self::error`] as well as returned.
  pub async fn fetch_reports(&mut self, auth: &impl AuthProvider) -> Result<()> {
    self.seen_epoch = Some(auth.epoch());
    if !auth.is_authenticated() {
      trace!("No session, clearing reports");
      self.reports.clear();
      self.is_loading = false;
      return Ok(());
    }

    self.is_loading = true;
    self.error = None;
    let result = self.api.list_analyses(auth.auth_headers()).await;
    self.is_loading = false;

    match result {
      Ok(reports) => {
        debug!("Fetched {} report(s)", reports.len());
        self.reports = reports;
        Ok(())
      },
      Err(e) => {
        warn!("Error fetching reports: {e}");
        self.error = Some(e.to_string());
        Err(e)
      },
    }
  }

  /// Re-fetches if the session changed since the last refresh, or if there was none.
  ///
  /// Returns whether a refresh ran.
  pub async fn refresh_if_auth_changed(&mut self, auth: &impl AuthProvider) -> Result<bool> {
    if self.seen_epoch == Some(auth.epoch()) {
      return Ok(false);
    }
    self.fetch_reports(auth).await?;
    Ok(true)
  }

  /// Asks the service to analyze `url` and refreshes the collection.
  ///
  /// A failed refresh does not fail the creation; it is recorded in [`Self::error`]. There is
  /// no guard against concurrent submissions: calling this twice creates two analyses.
  ///
  /// # Errors
  ///
  /// - [`CroError::EmptyUrl`] / [`CroError::InvalidUrl`] before anything else
  /// - [`CroError::Unauthenticated`] without a session, before any request
  /// - [`CroError::Api`] with the service's message, or "Failed to create analysis"
  pub async fn create_analysis(
    &mut self,
    auth: &impl AuthProvider,
    url: &str,
  ) -> Result<RemoteReport> {
    let url = format::validate_submission(url)?;
    if !auth.is_authenticated() {
      return Err(CroError::Unauthenticated(CREATE_NEEDS_AUTH));
    }

    let created = match self.api.create_analysis(auth.auth_headers(), url).await {
      Ok(created) => created,
      Err(e) => {
        warn!("Error creating analysis: {e}");
        return Err(e);
      },
    };
    debug!("Created analysis {} for {url}", created.id);

    if let Err(e) = self.fetch_reports(auth).await {
      debug!("Refresh after creating {} failed: {e}", created.id);
    }
    Ok(created)
  }

  /// Fetches one report from the service. Does not touch the collection.
  ///
  /// # Errors
  ///
  /// - [`CroError::Unauthenticated`] without a session
  /// - [`CroError::AccessDenied`] when the report belongs to someone else
  /// - [`CroError::Api`] for other non-success responses
  pub async fn get_report_by_id(
    &self,
    auth: &impl AuthProvider,
    id: &str,
  ) -> Result<Option<RemoteReport>> {
    if !auth.is_authenticated() {
      return Err(CroError::Unauthenticated(FETCH_NEEDS_AUTH));
    }
    self.api.get_analysis(auth.auth_headers(), id).await.inspect_err(|e| {
      warn!("Error fetching report {id}: {e}");
    })
  }

  /// Saves the report's PDF into `dir` as `CRO_Report_{id}.pdf` and returns the file path.
  ///
  /// # Errors
  ///
  /// - [`CroError::Unauthenticated`] without a session
  /// - [`CroError::Api`] when the service refuses the download
  /// - [`CroError::Io`] when the file cannot be written
  pub async fn download_pdf(
    &self,
    auth: &impl AuthProvider,
    id: &str,
    dir: impl AsRef<Path>,
  ) -> Result<PathBuf> {
    if !auth.is_authenticated() {
      return Err(CroError::Unauthenticated(DOWNLOAD_NEEDS_AUTH));
    }
    let bytes = self.api.download_pdf(auth.auth_headers(), id).await.inspect_err(|e| {
      warn!("Error downloading PDF for {id}: {e}");
    })?;

    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(pdf_filename(id));
    tokio::fs::write(&path, &bytes).await?;
    debug!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(path)
  }
}

/// File name a report's PDF is saved under.
///
/// The id is percent-encoded, so distinct ids never share a file and path separators never
/// reach the file system.
///
/// ```
/// use croview::store::pdf_filename;
///
/// assert_eq!(pdf_filename("abc123"), "CRO_Report_abc123.pdf");
/// assert_eq!(pdf_filename("../x"), "CRO_Report_..%2Fx.pdf");
/// ```
pub fn pdf_filename(id: &str) -> String {
  format!("CRO_Report_{}.pdf", urlencoding::encode(id))
}
