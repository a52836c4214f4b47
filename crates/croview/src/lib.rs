//! Client library for requesting and tracking CRO website analysis reports.
//!
//! `croview` is the state layer behind a conversion-rate-optimization dashboard. A user submits
//! a website URL, an analysis is produced asynchronously by a remote service, and the user can
//! list, inspect, and download the finished reports. The library itself performs no analysis;
//! it keeps a local view of the reports in sync with wherever the truth lives.
//!
//! Two report stores are provided:
//!
//! - [`store::SimulatedStore`]: a client-only store that fakes analysis progress with a
//!   per-report ticker and mirrors its collection into a local cache. Useful as an offline mode
//!   and for instant optimistic feedback.
//! - [`store::RemoteStore`]: a store backed by the remote analysis service. The service is the
//!   only authority; the collection is replaced wholesale on every refresh.
//!
//! Both produce records that can be viewed through the tagged [`report::Report`] union.
//!
//! # Getting Started
//!
//! ```no_run
//! use croview::{
//!   api::ApiClient,
//!   prelude::*,
//!   session::{Credentials, SessionStore},
//!   storage::FileStore,
//!   store::RemoteStore,
//!   Config,
//! };
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::default();
//!   let storage = FileStore::shared(config.storage_path.clone());
//!   let api = ApiClient::from_config(&config)?;
//!
//!   let mut session = SessionStore::restore(storage);
//!   if !session.is_authenticated() {
//!     session.login(&api, &Credentials::new("ada@example.com", "hunter2")).await?;
//!   }
//!
//!   let mut reports = RemoteStore::new(api);
//!   reports.create_analysis(&session, "https://example.com").await?;
//!   for report in reports.reports() {
//!     println!("{} {}", report.url, report.status.text());
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`report`]: Report shapes and the status taxonomy
//! - [`format`]: URL validation and duration formatting
//! - [`storage`]: Durable key-value storage
//! - [`cache`]: Local mirror of the simulated report collection
//! - [`session`]: Authentication session and header issuing
//! - [`api`]: HTTP client for the remote analysis service
//! - [`store`]: Simulated and remote report stores
//! - [`config`]: Persistent configuration
//! - [`prelude`]: Common traits and types for ergonomic imports

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  fmt::Display,
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::{DateTime, Utc};
use reqwest::{header::HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use url::Url;
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod report;
pub mod session;
pub mod storage;
pub mod store;

pub use crate::config::Config;
use crate::{error::*, report::*, storage::*};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use croview::{prelude::*, storage::MemoryStore, store::SimulatedStore};
///
/// # async fn example() -> Result<()> {
/// let store = SimulatedStore::new(MemoryStore::shared());
/// store.submit("https://example.com")?;
/// # Ok(())
/// # }
/// ```
pub mod prelude {
  pub use crate::{
    error::{CroError, Result},
    session::AuthProvider,
    storage::KeyValueStore,
    store::ProgressSource,
  };
}
