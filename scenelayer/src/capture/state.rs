//! Capture state machine.
//!
//! # State Machine
//!
//! ```text
//! Idle --[Start]--> AwaitingLayerAttach
//! AwaitingLayerAttach --[LayerAttached]--> AwaitingRenderConvergence
//! AwaitingRenderConvergence --[Converged]--> SettleDelay
//! SettleDelay --[SettleElapsed]--> Capturing
//! Capturing --[Captured]--> Persisted
//! any non-terminal state --[Fault]--> Failed
//! Persisted | Failed --[Start]--> AwaitingLayerAttach
//! ```

use std::fmt;

/// Where a capture run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No capture running
    #[default]
    Idle,
    /// Waiting for the view to show the overlay
    AwaitingLayerAttach,
    /// Waiting for the view to stop updating
    AwaitingRenderConvergence,
    /// Waiting one more paint cycle after convergence
    SettleDelay,
    /// Snapshot and persist in progress
    Capturing,
    /// Thumbnail recorded and written
    Persisted,
    /// Run ended with an error
    Failed,
}

/// Inputs that drive [`CaptureState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    Start,
    LayerAttached,
    Converged,
    SettleElapsed,
    Captured,
    Fault,
}

impl CaptureState {
    /// Returns the next state, or `None` if `event` is not valid here.
    pub fn on_event(self, event: CaptureEvent) -> Option<CaptureState> {
        use CaptureEvent as E;
        use CaptureState as S;

        match (self, event) {
            (S::Idle | S::Persisted | S::Failed, E::Start) => Some(S::AwaitingLayerAttach),
            (S::AwaitingLayerAttach, E::LayerAttached) => Some(S::AwaitingRenderConvergence),
            (S::AwaitingRenderConvergence, E::Converged) => Some(S::SettleDelay),
            (S::SettleDelay, E::SettleElapsed) => Some(S::Capturing),
            (S::Capturing, E::Captured) => Some(S::Persisted),
            (state, E::Fault) if state.is_active() => Some(S::Failed),
            _ => None,
        }
    }

    /// True while a run is in progress.
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            CaptureState::Idle | CaptureState::Persisted | CaptureState::Failed
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CaptureState::Persisted | CaptureState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::AwaitingLayerAttach => "awaiting-layer-attach",
            CaptureState::AwaitingRenderConvergence => "awaiting-render-convergence",
            CaptureState::SettleDelay => "settle-delay",
            CaptureState::Capturing => "capturing",
            CaptureState::Persisted => "persisted",
            CaptureState::Failed => "failed",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [CaptureState; 7] = [
        CaptureState::Idle,
        CaptureState::AwaitingLayerAttach,
        CaptureState::AwaitingRenderConvergence,
        CaptureState::SettleDelay,
        CaptureState::Capturing,
        CaptureState::Persisted,
        CaptureState::Failed,
    ];

    #[test]
    fn test_happy_path() {
        let events = [
            CaptureEvent::Start,
            CaptureEvent::LayerAttached,
            CaptureEvent::Converged,
            CaptureEvent::SettleElapsed,
            CaptureEvent::Captured,
        ];
        let end = events
            .iter()
            .try_fold(CaptureState::Idle, |state, event| state.on_event(*event));
        assert_eq!(end, Some(CaptureState::Persisted));
    }

    #[test]
    fn test_fault_from_every_active_state() {
        for state in ALL_STATES {
            let next = state.on_event(CaptureEvent::Fault);
            if state.is_active() {
                assert_eq!(next, Some(CaptureState::Failed), "{}", state);
            } else {
                assert_eq!(next, None, "{}", state);
            }
        }
    }

    #[test]
    fn test_out_of_order_events_rejected() {
        assert_eq!(CaptureState::Idle.on_event(CaptureEvent::Captured), None);
        assert_eq!(
            CaptureState::AwaitingLayerAttach.on_event(CaptureEvent::Converged),
            None
        );
        assert_eq!(CaptureState::Capturing.on_event(CaptureEvent::Start), None);
    }

    #[test]
    fn test_restart_after_terminal() {
        assert_eq!(
            CaptureState::Failed.on_event(CaptureEvent::Start),
            Some(CaptureState::AwaitingLayerAttach)
        );
        assert_eq!(
            CaptureState::Persisted.on_event(CaptureEvent::Start),
            Some(CaptureState::AwaitingLayerAttach)
        );
    }
}
