//! Water Dispenser Firmware: main entry point
//!
//! Hexagonal architecture around a blocking control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter   Esp32Time  │
//! │  (Input+Valve+Strip)    (EventSink)    (Config)     (Clock)    │
//! │  NetworkAdapter = WifiAdapter + MqttTelemetry                  │
//! │  (Telemetry+Maintenance)                                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          DispenserService (pure logic)                 │    │
//! │  │  FSM · Overrun guard · Indicator                       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::prelude::Peripherals;
use esp_idf_hal::rmt::{TxRmtDriver, config::TransmitConfig};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use dispenser::adapters::device_id;
use dispenser::adapters::hardware::HardwareAdapter;
use dispenser::adapters::log_sink::LogEventSink;
use dispenser::adapters::mqtt::MqttTelemetry;
use dispenser::adapters::network::NetworkAdapter;
use dispenser::adapters::nvs::NvsAdapter;
use dispenser::adapters::ota;
use dispenser::adapters::time::Esp32TimeAdapter;
use dispenser::adapters::wifi::{ConnectivityPort, WifiAdapter};
use dispenser::app::service::DispenserService;
use dispenser::config::{self, DispenserConfig};
use dispenser::drivers::light_strip::LightStrip;
use dispenser::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Water Dispenser v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    ota::check_rollback();

    // ── 2. Config from NVS (or defaults) ──────────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => config::load_or_default(&nvs),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            DispenserConfig::default()
        }
    };
    let dev_id = device_id::resolve(config.device_id.as_str());
    info!("Device ID: {}", dev_id);

    // ── 3. Hardware ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: each GPIO number in `pins` is claimed exactly once here and
    // none of them is handed out through `peripherals.pins`.
    let valve_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::VALVE_GPIO) })?;
    let led_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::STATUS_LED_GPIO) })?;
    let mut presence_pin = PinDriver::input(unsafe { AnyIOPin::new(pins::PRESENCE_GPIO) })?;
    presence_pin.set_pull(Pull::Up)?;
    let mut switch_pin = PinDriver::input(unsafe { AnyIOPin::new(pins::SWITCH_GPIO) })?;
    switch_pin.set_pull(Pull::Down)?;

    let rmt_config = TransmitConfig::new().clock_divider(1);
    let tx = TxRmtDriver::new(
        peripherals.rmt.channel0,
        // SAFETY: see above.
        unsafe { AnyOutputPin::new(pins::STRIP_DATA_GPIO) },
        &rmt_config,
    )?;
    let strip = LightStrip::new(
        tx,
        usize::from(config.strip_pixel_count),
        config.strip_brightness,
    );

    let mut hw = HardwareAdapter::new(
        Esp32TimeAdapter::new(),
        valve_pin,
        led_pin,
        presence_pin,
        switch_pin,
        strip,
    )
    .map_err(dispenser::error::Error::from)?;

    let mut log_sink = LogEventSink::new(config.flow_gal_per_sec);
    let mut service = DispenserService::new(config.clone());
    service.start(&mut hw, &mut log_sink);

    // ── 4. Network ────────────────────────────────────────────
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_part = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs_part))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sys_loop)?);

    match wifi.set_credentials(config.wifi_ssid.as_str(), config.wifi_password.as_str()) {
        Ok(()) => {
            // A failed first attempt is retried with backoff from the loop.
            if let Err(e) = wifi.connect() {
                warn!("WiFi: initial connect failed ({}), dispensing offline", e);
            }
        }
        Err(e) => warn!("WiFi: {}, reports will be dropped", e),
    }

    let mqtt = match MqttTelemetry::connect(
        config.broker_host.as_str(),
        config.broker_port,
        dev_id.as_str(),
    ) {
        Ok(mqtt) => Some(mqtt),
        Err(e) => {
            warn!("MQTT: client init failed ({:#}), reports will be dropped", e);
            None
        }
    };
    let mut net = NetworkAdapter::new(wifi, mqtt);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    service.run(&mut hw, &mut net, &mut log_sink)
}
