//! MQTT telemetry adapter.
//!
//! Implements [`TelemetryPort`] on top of `esp_idf_svc::mqtt::client`.
//! Reports are published fire-and-forget (QoS 0, not retained).  A
//! background `mqtt-rx` thread drains the connection and tracks the
//! broker session in an atomic flag; publishing while the session is
//! down is refused with [`CommsError::MqttDisconnected`].
//!
//! On host targets the adapter records every publish for inspection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::app::ports::TelemetryPort;
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
#[cfg(target_os = "espidf")]
use log::warn;

/// Longest payload the adapter will hand to the client.
pub const MAX_PAYLOAD_LEN: usize = 64;

pub struct MqttTelemetry {
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(not(target_os = "espidf"))]
    published: Vec<(String, String)>,
    connected: Arc<AtomicBool>,
}

impl MqttTelemetry {
    /// Connect to `mqtt://host:port` as `client_id` and start the receiver.
    #[cfg(target_os = "espidf")]
    pub fn connect(host: &str, port: u16, client_id: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(!host.is_empty(), "broker host is empty");
        let url = format!("mqtt://{host}:{port}");
        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };
        let (client, mut conn) = EspMqttClient::new(url.as_str(), &conf)?;
        info!("MQTT: client created for {} as '{}'", url, client_id);

        let connected = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&connected);
        std::thread::Builder::new()
            .name("mqtt-rx".into())
            .stack_size(6 * 1024)
            .spawn(move || {
                loop {
                    match conn.next() {
                        Ok(event) => match event.payload() {
                            EventPayload::Connected(_) => {
                                flag.store(true, Ordering::Relaxed);
                                info!("MQTT: connected");
                            }
                            EventPayload::Disconnected => {
                                flag.store(false, Ordering::Relaxed);
                                warn!("MQTT: disconnected");
                            }
                            _ => {}
                        },
                        Err(err) => {
                            flag.store(false, Ordering::Relaxed);
                            warn!("MQTT: receive loop ended: {err:?}");
                            break;
                        }
                    }
                }
            })?;

        Ok(Self { client, connected })
    }

    /// Simulation: a client that is already connected.
    #[cfg(not(target_os = "espidf"))]
    pub fn connect(host: &str, port: u16, client_id: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(!host.is_empty(), "broker host is empty");
        info!("MQTT(sim): mqtt://{}:{} as '{}'", host, port, client_id);
        Ok(Self {
            published: Vec::new(),
            connected: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Simulation: flip the broker session state.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_connected(&self, up: bool) {
        self.connected.store(up, Ordering::Relaxed);
    }

    /// Simulation: every `(topic, payload)` accepted so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        self.client
            .enqueue(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|e| {
                warn!("MQTT: enqueue failed: {e:?}");
                CommsError::MqttPublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        self.published.push((topic.into(), payload.into()));
        Ok(())
    }
}

impl TelemetryPort for MqttTelemetry {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CommsError::PayloadTooLong);
        }
        if !self.is_connected() {
            return Err(CommsError::MqttDisconnected);
        }
        self.platform_publish(topic, payload)?;
        debug!("MQTT: {} <- {}", topic, payload);
        Ok(())
    }
}
