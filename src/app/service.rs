//! Application service: the hexagonal core.
//!
//! [`DispenserService`] owns the FSM, the overrun guard, the indicator and
//! the shared context.  All I/O flows through port traits injected at call
//! sites, so the whole control loop runs under test on a virtual clock.
//!
//! ```text
//!     InputPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                   │     DispenserService      │
//!     ValvePort ◀── │  Guard · FSM · Indicator  │ ──▶ TelemetryPort
//!     StripPort ◀── └──────────────────────────┘ ◀── MaintenancePort
//! ```
//!
//! ## One control-loop pass ([`poll_once`](DispenserService::poll_once))
//!
//! 1. Faulted: render one alarm flash and stop.
//! 2. Service the network link.
//! 3. Publish the owed report, if any.  The flag clears either way.
//! 4. Sample inputs and step the machine.
//! 5. While the valve is held open, keep sampling and stepping every
//!    `hold_poll_ms`.  The network is not serviced meanwhile.
//! 6. Sleep `idle_poll_ms`.

use core::fmt::Write as _;

use heapless::String;
use log::{info, warn};

use crate::config::DispenserConfig;
use crate::drivers::indicator::Indicator;
use crate::error::{Error, SafetyFault};
use crate::fsm::context::{DispenserState, FsmContext, InputSnapshot};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::safety::OverrunGuard;

use super::events::AppEvent;
use super::ports::{
    ClockPort, EventSink, InputPort, MaintenancePort, StripPort, TelemetryPort, ValvePort,
};

/// Result of one [`DispenserService::poll_once`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Nothing was dispensed.
    Idle,
    /// A full open/close cycle completed; its report is owed.
    Dispensed { open_ms: u64 },
    /// The overrun fault is latched.  Only the alarm runs from here on.
    Halted,
}

// ───────────────────────────────────────────────────────────────
// DispenserService
// ───────────────────────────────────────────────────────────────

/// The dispenser control loop and the single owner of [`DispenserState`].
pub struct DispenserService {
    fsm: Fsm,
    ctx: FsmContext,
    guard: OverrunGuard,
    indicator: Indicator,
    pass_count: u64,
}

impl DispenserService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM.  Call [`start`](Self::start) next.
    pub fn new(config: DispenserConfig) -> Self {
        let guard = OverrunGuard::new(config.max_open_duration_ms);
        let indicator = Indicator::new(
            usize::from(config.strip_pixel_count),
            config.fade_steps,
            config.fade_peak,
        );
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Closed);

        Self {
            fsm,
            ctx,
            guard,
            indicator,
            pass_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Closed`: valve low, status LED off, strip dark.
    pub fn start(
        &mut self,
        hw: &mut (impl ValvePort + StripPort + ClockPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = hw.now_ms();
        self.fsm.start(&mut self.ctx);
        self.apply_actuators(hw);
        self.indicator.clear(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("DispenserService started in {:?}", self.fsm.current_state());
    }

    /// Run the control loop forever.
    ///
    /// Once the overrun fault latches, every iteration is one alarm flash
    /// and nothing else is serviced again.
    pub fn run(
        &mut self,
        hw: &mut (impl InputPort + ValvePort + StripPort + ClockPort),
        net: &mut (impl TelemetryPort + MaintenancePort),
        sink: &mut impl EventSink,
    ) -> ! {
        loop {
            self.poll_once(hw, net, sink);
        }
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// One iteration of the control loop.
    pub fn poll_once(
        &mut self,
        hw: &mut (impl InputPort + ValvePort + StripPort + ClockPort),
        net: &mut (impl TelemetryPort + MaintenancePort),
        sink: &mut impl EventSink,
    ) -> LoopOutcome {
        if self.is_faulted() {
            self.render_alarm_cycle(hw);
            return LoopOutcome::Halted;
        }

        net.service();
        self.publish_pending(net, sink);

        let inputs = self.sample_inputs(hw);
        let mut state = self.step(inputs, hw, sink);

        while state == StateId::Open {
            hw.delay_ms(self.ctx.config.hold_poll_ms);
            let inputs = self.sample_inputs(hw);
            state = self.step(inputs, hw, sink);
        }

        match state {
            StateId::Faulted => LoopOutcome::Halted,
            _ => {
                hw.delay_ms(self.ctx.config.idle_poll_ms);
                if self.ctx.state.report_pending {
                    LoopOutcome::Dispensed {
                        open_ms: self.ctx.state.pending_open_ms,
                    }
                } else {
                    LoopOutcome::Idle
                }
            }
        }
    }

    /// Feed one input sample through guard, FSM and actuators.
    ///
    /// The guard runs first: an overrun seen on the same pass as a release
    /// still faults.  Returns the state after the pass.
    pub fn step(
        &mut self,
        inputs: InputSnapshot,
        hw: &mut (impl ValvePort + StripPort + ClockPort),
        sink: &mut impl EventSink,
    ) -> StateId {
        self.pass_count += 1;
        let prev_state = self.fsm.current_state();

        // 1. Latest sample and time
        self.ctx.inputs = inputs;
        self.ctx.now_ms = hw.now_ms();

        // 2. Overrun guard
        if let Some(fault) = self.guard.evaluate(&self.ctx.state, self.ctx.now_ms) {
            if prev_state != StateId::Faulted {
                warn!("{}", Error::from(fault));
                self.fsm.force_transition(StateId::Faulted, &mut self.ctx);
                sink.emit(&AppEvent::OverrunFault(fault));
            }
        }

        // 3. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);

        // 4. Apply actuator commands, valve first
        self.apply_actuators(hw);

        // 5. Emit what changed
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
            match (prev_state, new_state) {
                (StateId::Closed, StateId::Open) => sink.emit(&AppEvent::ValveOpened {
                    at_ms: self.ctx.state.open_started_at_ms,
                }),
                (StateId::Open, StateId::Closed) => sink.emit(&AppEvent::ValveClosed {
                    at_ms: self.ctx.now_ms,
                    open_ms: self.ctx.state.pending_open_ms,
                }),
                _ => {}
            }
        }
        new_state
    }

    /// Read both inputs.  A raw presence hit is confirmed by a second read
    /// after `presence_debounce_ms`; the second read wins.
    pub fn sample_inputs(&mut self, hw: &mut (impl InputPort + ClockPort)) -> InputSnapshot {
        let trigger = hw.trigger_pressed();
        let presence = if hw.presence_raw() {
            let debounce = self.ctx.config.presence_debounce_ms;
            if debounce > 0 {
                hw.delay_ms(debounce);
            }
            hw.presence_raw()
        } else {
            false
        };
        InputSnapshot { presence, trigger }
    }

    /// Hand the owed report to the telemetry sink.  Fire-and-forget: the
    /// flag clears whether or not the publish succeeded.
    ///
    /// Returns `true` if a report was owed.
    pub fn publish_pending(
        &mut self,
        net: &mut impl TelemetryPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.ctx.state.report_pending {
            return false;
        }
        let open_ms = self.ctx.state.pending_open_ms;
        self.ctx.state.report_pending = false;

        // u64::MAX is 20 digits.
        let mut payload: String<20> = String::new();
        if write!(payload, "{open_ms}").is_err() {
            warn!("report payload does not fit, dropping {open_ms} ms");
            return true;
        }

        match net.publish(&self.ctx.config.report_topic, &payload) {
            Ok(()) => sink.emit(&AppEvent::ReportPublished { open_ms }),
            Err(error) => {
                warn!("report publish failed: {error}");
                sink.emit(&AppEvent::ReportDropped { open_ms, error });
            }
        }
        true
    }

    /// One flash of the overrun alarm.  The valve is held closed.
    pub fn render_alarm_cycle(&mut self, hw: &mut (impl ValvePort + StripPort + ClockPort)) {
        hw.set_valve(false);
        self.indicator.alarm_cycle(
            self.ctx.config.alarm_fade_step_delay_ms,
            self.ctx.config.alarm_pause_ms,
            hw,
        );
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Read-only view of the dispenser record.
    pub fn record(&self) -> &DispenserState {
        &self.ctx.state
    }

    pub fn is_faulted(&self) -> bool {
        self.ctx.state.fault_latched
    }

    /// The latched overrun fault, if any.
    pub fn fault(&self) -> Option<SafetyFault> {
        self.guard.fault()
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    pub fn config(&self) -> &DispenserConfig {
        &self.ctx.config
    }

    /// Total state machine passes since startup.
    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM actuator commands into port calls.
    fn apply_actuators(&mut self, hw: &mut (impl ValvePort + StripPort + ClockPort)) {
        let cmds = self.ctx.commands;

        // ── Valve + status LED ───────────────────────────────
        hw.set_valve(cmds.valve_open);
        hw.set_status_led(cmds.status_led_on);

        // ── Strip (blocking fade) ────────────────────────────
        if let Some(fade) = self.ctx.commands.fade.take() {
            self.indicator.fade_to(
                fade.color,
                fade.level,
                self.ctx.config.fade_step_delay_ms,
                hw,
            );
        }
    }
}
