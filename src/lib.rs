pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod models;
pub mod page;
pub mod render;
pub mod transport;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use config::Config;
pub use controller::{RefreshOutcome, ReviewsController, ReviewsView};
pub use dom::{Document, DomView, NodeId};
pub use error::FetchError;
pub use models::*;
pub use page::{DebugReport, Page, PageEvent};
pub use transport::{EnvelopeSource, ReviewFetcher};

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
