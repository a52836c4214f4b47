//! Report stores: the in-memory source of truth a front end renders from.
//!
//! - [`SimulatedStore`] synthesizes reports locally and drives each one to completion with its
//!   own cancellable ticker task. The collection is mirrored into the [`ReportCache`].
//! - [`RemoteStore`] treats the analysis service as the only authority. Every mutation goes
//!   through the service and is followed by a full re-fetch; nothing is patched locally.
//!
//! Both keep their collection most-recent-first.

use super::*;
use crate::cache::ReportCache;

mod remote;
mod simulated;

pub use self::{remote::*, simulated::*};
