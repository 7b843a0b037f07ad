//! Capture errors.

use super::state::{CaptureEvent, CaptureState};
use crate::registry::RegistryError;
use crate::storage::StorageError;
use crate::view::ViewError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a capture run. Every one of them clears the pending
/// capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The view kept updating past the convergence timeout
    #[error("view did not converge within {0:?}")]
    ConvergenceTimeout(Duration),

    #[error("view error: {0}")]
    View(#[from] ViewError),

    /// Thumbnail recorded in memory but not persisted
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid capture transition: {event:?} in state {state}")]
    InvalidTransition {
        state: CaptureState,
        event: CaptureEvent,
    },
}
