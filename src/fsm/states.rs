//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers.  No closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  CLOSED ──[presence OR trigger]──▶ OPEN
//!    ▲                                │
//!    └──────[both released]───────────┘
//!
//!  OPEN ──[overrun, forced by guard]──▶ FAULTED  (terminal)
//! ```

use super::context::{ActuatorCommands, FadeRequest, FsmContext};
use super::{StateDescriptor, StateId};
use crate::drivers::fade::{IndicatorColor, LightLevel};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Closed
        StateDescriptor {
            id: StateId::Closed,
            name: "Closed",
            on_enter: Some(closed_enter),
            on_exit: None,
            on_update: closed_update,
            terminal: false,
        },
        // Index 1: Open
        StateDescriptor {
            id: StateId::Open,
            name: "Open",
            on_enter: Some(open_enter),
            on_exit: None,
            on_update: open_update,
            terminal: false,
        },
        // Index 2: Faulted
        StateDescriptor {
            id: StateId::Faulted,
            name: "Faulted",
            on_enter: Some(faulted_enter),
            on_exit: None,
            on_update: faulted_update,
            terminal: true,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSED state
// ═══════════════════════════════════════════════════════════════════════════

fn closed_enter(ctx: &mut FsmContext) {
    ctx.commands.valve_open = false;
    ctx.commands.status_led_on = false;

    // Entered from Open: the cycle is complete and owes one report.
    if let Some(open_ms) = ctx.state.open_for_ms(ctx.now_ms) {
        ctx.state.valve_open = false;
        ctx.state.report_pending = true;
        ctx.state.pending_open_ms = open_ms;
        info!("CLOSED: valve was open for {} ms", open_ms);
    }

    if ctx.state.light_on {
        ctx.commands.fade = Some(FadeRequest {
            color: IndicatorColor::Normal,
            level: LightLevel::Off,
        });
        ctx.state.light_on = false;
    }
}

fn closed_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.inputs.any() {
        return Some(StateId::Open);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPEN state: valve energised, overrun timer running
// ═══════════════════════════════════════════════════════════════════════════

fn open_enter(ctx: &mut FsmContext) {
    ctx.state.valve_open = true;
    ctx.state.open_started_at_ms = ctx.now_ms;
    ctx.commands.valve_open = true;
    ctx.commands.status_led_on = true;

    if !ctx.state.light_on {
        ctx.commands.fade = Some(FadeRequest {
            color: IndicatorColor::Normal,
            level: LightLevel::On,
        });
        ctx.state.light_on = true;
    }
    info!(
        "OPEN: valve opened at {} ms (presence={}, trigger={})",
        ctx.now_ms, ctx.inputs.presence, ctx.inputs.trigger
    );
}

fn open_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Staying open only re-reads the inputs.  The overrun check belongs to
    // the guard, which runs before this handler on every pass.
    if !ctx.inputs.any() {
        return Some(StateId::Closed);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULTED state: valve forced closed, alarm until restart
// ═══════════════════════════════════════════════════════════════════════════

fn faulted_enter(ctx: &mut FsmContext) {
    // Valve first.  No report is owed for an overrun cycle.
    ctx.commands = ActuatorCommands::all_off();
    ctx.state.valve_open = false;
    ctx.state.fault_latched = true;
    // The alarm animation takes over the strip from here on.
    ctx.state.light_on = false;
    warn!("FAULTED: valve forced closed, latched until restart");
}

fn faulted_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}
