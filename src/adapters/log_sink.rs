//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).  Closed cycles also log an
//! estimated volume from the configured flow rate; telemetry carries only
//! the duration.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    flow_gal_per_sec: f32,
}

impl LogEventSink {
    pub fn new(flow_gal_per_sec: f32) -> Self {
        Self { flow_gal_per_sec }
    }

    /// Estimated gallons dispensed in `open_ms`.
    pub fn gallons(&self, open_ms: u64) -> f32 {
        self.flow_gal_per_sec * open_ms as f32 / 1000.0
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ValveOpened { at_ms } => {
                info!("VALVE | open at {} ms", at_ms);
            }
            AppEvent::ValveClosed { at_ms, open_ms } => {
                info!(
                    "VALVE | closed at {} ms | open for {} ms | ~{:.4} gal",
                    at_ms,
                    open_ms,
                    self.gallons(*open_ms)
                );
            }
            AppEvent::ReportPublished { open_ms } => {
                info!("REPORT | published {} ms", open_ms);
            }
            AppEvent::ReportDropped { open_ms, error } => {
                warn!("REPORT | dropped {} ms: {}", open_ms, error);
            }
            AppEvent::OverrunFault(fault) => {
                error!("FAULT | {} | valve closed, restart required", fault);
            }
        }
    }
}
