//! HTTP client for the remote analysis service.
//!
//! [`ApiClient`] issues one request per call: no retries, no de-duplication, and no timeout
//! beyond reqwest's defaults. Authentication is not its concern; callers pass the headers the
//! session issued for that call. Non-success responses are turned into display-ready
//! [`CroError`] messages that follow the service's conventions:
//!
//! | Operation       | Endpoint                        | Failure message                           |
//! |-----------------|---------------------------------|-------------------------------------------|
//! | list            | `GET /api/cro/analyses`         | `Failed to fetch reports: {status}`       |
//! | create          | `POST /api/cro/analyze`         | body `error`, or `Failed to create analysis` |
//! | get             | `GET /api/cro/analysis/{id}`    | 404 → `None`, 403 → `Access denied`       |
//! | download        | `GET /api/cro/analysis/{id}/pdf`| `Failed to download PDF: {status}`        |
//! | login/register  | `POST /api/auth/{login,register}` | body `message`, or a generic message    |
//!
//! A success body that cannot be decoded fails as `{operation message}: unreadable response`.
//! Report fields the service leaves `null` fall back to their defaults.
//!
//! # Examples
//!
//! ```no_run
//! use croview::{api::ApiClient, Config};
//! use reqwest::header::HeaderMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::from_config(&Config::default())?;
//! let reports = api.list_analyses(HeaderMap::new()).await?;
//! println!("{} report(s)", reports.len());
//! # Ok(())
//! # }
//! ```

use crate::session::{AuthResponse, Credentials, Registration};

use super::*;

/// Body shape the service uses for error responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  /// Used by the report endpoints
  #[serde(default)]
  error:   Option<String>,
  /// Used by the auth endpoints
  #[serde(default)]
  message: Option<String>,
}

/// Request body for creating an analysis.
#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
  /// Website to analyze
  url: &'a str,
}

/// Typed access to the analysis and auth endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
  /// Shared connection pool
  http:      reqwest::Client,
  /// Base URL of the report endpoints
  api_url:   Url,
  /// Base URL of the auth endpoints
  auth_url:  Url,
  /// External Google sign-in entry point
  oauth_url: Url,
}

impl ApiClient {
  /// Creates a client. The OAuth entry point defaults to `/auth/google` on `auth_url`.
  pub fn new(api_url: Url, auth_url: Url) -> Result<Self> {
    let oauth_url = endpoint(&auth_url, &["auth", "google"])?;
    Ok(Self { http: reqwest::Client::new(), api_url, auth_url, oauth_url })
  }

  /// Creates a client for the endpoints named in `config`.
  pub fn from_config(config: &Config) -> Result<Self> {
    let client = Self::new(config.api_url.clone(), config.auth_url.clone())?;
    Ok(client.with_oauth_url(config.oauth_url.clone()))
  }

  /// Overrides the Google sign-in entry point.
  pub fn with_oauth_url(mut self, url: Url) -> Self {
    self.oauth_url = url;
    self
  }

  /// Where a browser should be sent to start Google sign-in.
  pub fn google_auth_url(&self) -> &Url { &self.oauth_url }

  /// Lists every report visible to the session, in the order the service returns them.
  pub async fn list_analyses(&self, headers: HeaderMap) -> Result<Vec<RemoteReport>> {
    let url = endpoint(&self.api_url, &["api", "cro", "analyses"])?;
    trace!("GET {url}");
    let response = self.http.get(url).headers(headers).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(CroError::Api(format!("Failed to fetch reports: {}", status_text(status))));
    }
    decode(response, "Failed to fetch reports").await
  }

  /// Asks the service to analyze `target`, returning the created record.
  pub async fn create_analysis(&self, headers: HeaderMap, target: &str) -> Result<RemoteReport> {
    let url = endpoint(&self.api_url, &["api", "cro", "analyze"])?;
    trace!("POST {url} for {target}");
    let response =
      self.http.post(url).headers(headers).json(&AnalyzeRequest { url: target }).send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = error_body(response).await;
      return Err(CroError::Api(body.error.unwrap_or_else(|| "Failed to create analysis".into())));
    }
    decode(response, "Failed to create analysis").await
  }

  /// Fetches one report. A 404 is `Ok(None)`.
  pub async fn get_analysis(&self, headers: HeaderMap, id: &str) -> Result<Option<RemoteReport>> {
    let url = endpoint(&self.api_url, &["api", "cro", "analysis", id])?;
    trace!("GET {url}");
    let response = self.http.get(url).headers(headers).send().await?;

    match response.status() {
      StatusCode::NOT_FOUND => {
        debug!("Report {id} not found");
        Ok(None)
      },
      StatusCode::FORBIDDEN => Err(CroError::AccessDenied),
      status if !status.is_success() =>
        Err(CroError::Api(format!("Failed to fetch report: {}", status_text(status)))),
      _ => decode(response, "Failed to fetch report").await.map(Some),
    }
  }

  /// Downloads the rendered PDF of a report.
  pub async fn download_pdf(&self, headers: HeaderMap, id: &str) -> Result<Vec<u8>> {
    let url = endpoint(&self.api_url, &["api", "cro", "analysis", id, "pdf"])?;
    trace!("GET {url}");
    let response = self.http.get(url).headers(headers).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(CroError::Api(format!("Failed to download PDF: {}", status_text(status))));
    }
    Ok(response.bytes().await?.to_vec())
  }

  /// Exchanges credentials for a session token.
  pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
    let url = endpoint(&self.auth_url, &["api", "auth", "login"])?;
    self.authenticate(url, credentials, "Login failed").await
  }

  /// Creates an account and returns its session token.
  pub async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
    let url = endpoint(&self.auth_url, &["api", "auth", "register"])?;
    self.authenticate(url, registration, "Registration failed").await
  }

  /// Shared body of [`Self::login`] and [`Self::register`].
  async fn authenticate<B: Serialize + ?Sized>(
    &self,
    url: Url,
    body: &B,
    fallback: &str,
  ) -> Result<AuthResponse> {
    trace!("POST {url}");
    let response = self.http.post(url).json(body).send().await?;

    if !response.status().is_success() {
      let body = error_body(response).await;
      return Err(CroError::Api(body.message.unwrap_or_else(|| fallback.to_string())));
    }
    Ok(response.json().await?)
  }
}

/// Appends path segments to `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|()| CroError::Config(format!("{base} cannot be used as a base URL")))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}

/// Decodes a success body. A body that does not parse fails with a message naming `action`.
async fn decode<T: serde::de::DeserializeOwned>(
  response: reqwest::Response,
  action: &str,
) -> Result<T> {
  response.json().await.map_err(|e| {
    debug!("{action}: {e}");
    CroError::Api(format!("{action}: unreadable response"))
  })
}

/// The reason phrase for `status`, or its number when it has none.
fn status_text(status: StatusCode) -> String {
  status.canonical_reason().map(str::to_string).unwrap_or_else(|| status.as_u16().to_string())
}

/// Reads an error body, tolerating bodies that are empty or not JSON.
async fn error_body(response: reqwest::Response) -> ErrorBody {
  match response.json::<ErrorBody>().await {
    Ok(body) => body,
    Err(e) => {
      debug!("Error response had no readable body: {e}");
      ErrorBody::default()
    },
  }
}
