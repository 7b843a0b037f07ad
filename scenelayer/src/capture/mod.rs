//! Render readiness and thumbnail capture.
//!
//! When a custom renderer without a thumbnail is first rendered, the
//! [`CaptureCoordinator`] waits until the view shows the new overlay and has
//! stopped redrawing, lets one more paint cycle pass, then snapshots the
//! view and persists the result. Progress is an explicit [`CaptureState`]
//! advanced by [`CaptureEvent`]s.

mod coordinator;
mod error;
mod state;

pub use coordinator::{CaptureConfig, CaptureCoordinator};
pub use error::CaptureError;
pub use state::{CaptureEvent, CaptureState};
