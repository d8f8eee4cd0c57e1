//! Mock hardware for integration tests.
//!
//! A virtual clock that only moves when the code under test sleeps,
//! inputs scripted as functions of that clock, and a record of every
//! output write so tests can assert on the full command history.

use dispenser::app::events::AppEvent;
use dispenser::app::ports::{
    ClockPort, EventSink, InputPort, MaintenancePort, Rgb, StripPort, TelemetryPort, ValvePort,
};
use dispenser::error::CommsError;

pub type Script = Box<dyn Fn(u64) -> bool>;

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum OutputCall {
    Valve { at_ms: u64, open: bool },
    StatusLed { at_ms: u64, on: bool },
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub now_ms: u64,
    pub presence: Script,
    pub trigger: Script,
    pub calls: Vec<OutputCall>,
    pub frames: Vec<Vec<Rgb>>,
    pixel_count: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            now_ms: 0,
            presence: Box::new(|_| false),
            trigger: Box::new(|_| false),
            calls: Vec::new(),
            frames: Vec::new(),
            pixel_count,
        }
    }

    /// Presence asserted for `t` in `[from, until)`.
    pub fn with_presence(mut self, from: u64, until: u64) -> Self {
        self.presence = Box::new(move |t| (from..until).contains(&t));
        self
    }

    /// Switch held for `t` in `[from, until)`.
    pub fn with_trigger(mut self, from: u64, until: u64) -> Self {
        self.trigger = Box::new(move |t| (from..until).contains(&t));
        self
    }

    /// Level of the valve output after the last write.  Low before any write.
    pub fn valve_open(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                OutputCall::Valve { open, .. } => Some(*open),
                OutputCall::StatusLed { .. } => None,
            })
            .unwrap_or(false)
    }

    /// Times at which the valve output changed level.
    pub fn valve_edges(&self) -> Vec<(u64, bool)> {
        let mut level = false;
        let mut edges = Vec::new();
        for c in &self.calls {
            if let OutputCall::Valve { at_ms, open } = c {
                if *open != level {
                    edges.push((*at_ms, *open));
                    level = *open;
                }
            }
        }
        edges
    }

    pub fn last_frame(&self) -> Option<&[Rgb]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl InputPort for MockHardware {
    fn presence_raw(&mut self) -> bool {
        (self.presence)(self.now_ms)
    }

    fn trigger_pressed(&mut self) -> bool {
        (self.trigger)(self.now_ms)
    }
}

impl ValvePort for MockHardware {
    fn set_valve(&mut self, open: bool) {
        self.calls.push(OutputCall::Valve {
            at_ms: self.now_ms,
            open,
        });
    }

    fn set_status_led(&mut self, on: bool) {
        self.calls.push(OutputCall::StatusLed {
            at_ms: self.now_ms,
            on,
        });
    }
}

impl StripPort for MockHardware {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn write(&mut self, frame: &[Rgb]) {
        self.frames.push(frame.to_vec());
    }
}

impl ClockPort for MockHardware {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
    }
}

// ── RecordingNet ──────────────────────────────────────────────

pub struct RecordingNet {
    pub link_up: bool,
    pub published: Vec<(String, String)>,
    pub services: u32,
}

#[allow(dead_code)]
impl RecordingNet {
    pub fn new() -> Self {
        Self {
            link_up: true,
            published: Vec::new(),
            services: 0,
        }
    }

    pub fn payloads(&self) -> Vec<&str> {
        self.published.iter().map(|(_, p)| p.as_str()).collect()
    }
}

impl Default for RecordingNet {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPort for RecordingNet {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.link_up {
            return Err(CommsError::MqttDisconnected);
        }
        self.published.push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

impl MaintenancePort for RecordingNet {
    fn service(&mut self) {
        self.services += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
