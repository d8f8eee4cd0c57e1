//! Overrun guard: the max-open-time interlock.
//!
//! The guard runs **every pass before the FSM**.  It reads the dispenser
//! record and the current time and decides whether the valve has been open
//! too long.  The service reacts to a fault by forcing the FSM into
//! `Faulted`, whose `on_enter` closes the valve.
//!
//! ## Fault lifecycle
//!
//! 1. The valve opens; the FSM stamps `open_started_at_ms`.
//! 2. Each pass, the guard compares `now - open_started_at_ms` against the
//!    configured limit.  Equal to the limit is still fine; strictly
//!    greater trips the fault.
//! 3. Once tripped, the fault is latched inside the guard and reported on
//!    every later evaluation.  Nothing clears it short of a restart.

use crate::error::SafetyFault;
use crate::fsm::context::DispenserState;
use log::error;

/// Max-open-time supervisor.
pub struct OverrunGuard {
    limit_ms: u64,
    /// Latched fault, if the guard has ever tripped.
    latched: Option<SafetyFault>,
}

impl OverrunGuard {
    pub fn new(max_open_duration_ms: u32) -> Self {
        Self {
            limit_ms: u64::from(max_open_duration_ms),
            latched: None,
        }
    }

    /// Evaluate the interlock against the record at `now_ms`.
    ///
    /// Returns the latched fault, if any.  A fault is returned on every
    /// call from the first trip onward.
    pub fn evaluate(&mut self, state: &DispenserState, now_ms: u64) -> Option<SafetyFault> {
        if self.latched.is_some() {
            return self.latched;
        }

        let open_ms = state.open_for_ms(now_ms)?;
        if open_ms > self.limit_ms {
            let fault = SafetyFault::Overrun {
                open_ms,
                limit_ms: self.limit_ms,
            };
            error!("SAFETY FAULT SET: {fault}");
            self.latched = Some(fault);
        }
        self.latched
    }

    /// The latched fault, if any.
    pub fn fault(&self) -> Option<SafetyFault> {
        self.latched
    }

    /// True once the guard has tripped.
    pub fn is_latched(&self) -> bool {
        self.latched.is_some()
    }

    /// Configured limit in milliseconds.
    pub fn limit_ms(&self) -> u64 {
        self.limit_ms
    }
}
