//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements              | Connects to                 |
//! |-------------|-------------------------|-----------------------------|
//! | `hardware`  | InputPort, ValvePort    | ESP32 GPIO                  |
//! |             | StripPort, ClockPort    | RMT light strip, timer      |
//! | `log_sink`  | EventSink               | Serial log output           |
//! | `mqtt`      | TelemetryPort           | ESP-IDF MQTT client         |
//! | `network`   | TelemetryPort           | WiFi + MQTT composite       |
//! |             | MaintenancePort         |                             |
//! | `nvs`       | ConfigPort              | NVS / in-memory store       |
//! | `time`      | ClockPort               | ESP32 system timer          |
//! | `wifi`      | ConnectivityPort        | ESP-IDF WiFi STA            |

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod network;
pub mod nvs;
pub mod ota;
pub mod time;
pub mod wifi;
