//! Outbound application events.
//!
//! The [`DispenserService`](super::service::DispenserService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (serial log, test recorder).

use crate::error::{CommsError, SafetyFault};
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The valve opened at `at_ms`.
    ValveOpened { at_ms: u64 },

    /// The valve closed normally after `open_ms`.  A report is now owed.
    ValveClosed { at_ms: u64, open_ms: u64 },

    /// The owed report was handed to the telemetry sink.
    ReportPublished { open_ms: u64 },

    /// The telemetry sink refused the report.  It is not retried.
    ReportDropped { open_ms: u64, error: CommsError },

    /// The overrun interlock tripped.  Emitted once.
    OverrunFault(SafetyFault),
}
