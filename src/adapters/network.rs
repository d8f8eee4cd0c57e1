//! Network composite: WiFi link plus MQTT session.
//!
//! The control loop sees one object implementing [`MaintenancePort`]
//! (keep the link alive) and [`TelemetryPort`] (send a report).
//!
//! If the MQTT client could not be created at boot the adapter runs without
//! one and refuses every publish, so the dispenser keeps working offline.

use crate::adapters::mqtt::MqttTelemetry;
use crate::adapters::wifi::{ConnectivityPort, WifiAdapter};
use crate::app::ports::{MaintenancePort, TelemetryPort};
use crate::error::CommsError;

pub struct NetworkAdapter {
    wifi: WifiAdapter,
    mqtt: Option<MqttTelemetry>,
}

impl NetworkAdapter {
    pub fn new(wifi: WifiAdapter, mqtt: Option<MqttTelemetry>) -> Self {
        Self { wifi, mqtt }
    }

    pub fn wifi(&self) -> &WifiAdapter {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut WifiAdapter {
        &mut self.wifi
    }

    pub fn mqtt(&self) -> Option<&MqttTelemetry> {
        self.mqtt.as_ref()
    }
}

impl MaintenancePort for NetworkAdapter {
    fn service(&mut self) {
        self.wifi.poll();
    }
}

impl TelemetryPort for NetworkAdapter {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.wifi.is_connected() {
            return Err(CommsError::WifiDisconnected);
        }
        match self.mqtt.as_mut() {
            Some(mqtt) => mqtt.publish(topic, payload),
            None => Err(CommsError::MqttDisconnected),
        }
    }
}
