//! Tallymaster Firmware — Main Entry Point
//!
//! Hexagonal architecture around a fixed-period poll cycle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter<I2C>    OutputAdapter         LogEventSink    │
//! │  (BusTransport+Clock)    (LED/Display/Record)  (EventSink)     │
//! │                                │                               │
//! │                          RecordWorker ──▶ CsvFileLogger        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MasterService (pure logic)                  │    │
//! │  │  PollScheduler · aggregate · Diagnostics               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  CycleTimer (skip-don't-queue) · Watchdog                      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the host the bus is a `SimulatedI2c` populated with one random
//! slave per configured address.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Result, bail};
use log::{error, info, warn};

use tallymaster::adapters::csv_log::CsvFileLogger;
use tallymaster::adapters::display::ConsoleDisplay;
use tallymaster::adapters::hardware::HardwareAdapter;
use tallymaster::adapters::log_sink::LogEventSink;
use tallymaster::adapters::outputs::OutputAdapter;
use tallymaster::adapters::record_worker::RecordWorker;
use tallymaster::adapters::time::UptimeClock;
use tallymaster::app::service::MasterService;
use tallymaster::config::MasterConfig;
use tallymaster::cycle_timer::CycleTimer;
use tallymaster::diagnostics;
use tallymaster::drivers::status_led::StatusLed;
use tallymaster::drivers::{hw_init, watchdog};
use tallymaster::error::Error;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Bootstrap ──────────────────────────────────────────
    let boot = boot()?;
    let config = boot.config;

    info!("╔══════════════════════════════════════╗");
    info!("║  Tallymaster v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    diagnostics::install_panic_handler();

    // ── 2. Validate config (the only fatal failure) ───────────
    let mut service = match MasterService::new(config.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!("Configuration rejected: {}", e);
            return Err(Error::from(e).into());
        }
    };
    info!(
        "Config: slaves={:02X?} bus={}Hz timeout={}ms retries={} interval={}ms",
        config.slave_addresses.as_slice(),
        config.bus_speed.hz(),
        config.i2c_timeout_ms,
        config.max_retries,
        config.cycle_interval_ms
    );

    // ── 3. Peripherals ────────────────────────────────────────
    let mut watchdog = watchdog::Watchdog::new(watchdog::timeout_for(&config));
    let mut hw = HardwareAdapter::new(boot.bus, config.i2c_timeout_ms);

    // ── 4. Status sinks ───────────────────────────────────────
    let led = boot.led;
    let display = config.enable_display.then(ConsoleDisplay::stdout);
    let recorder = if config.enable_logging {
        let logger = CsvFileLogger::new(config.log_path.as_str(), &config.addresses());
        match RecordWorker::spawn(logger) {
            Ok(worker) => {
                info!("Recording cycles to {}", config.log_path);
                Some(worker)
            }
            Err(e) => {
                warn!("Recorder thread failed to start ({}), logging disabled", e);
                None
            }
        }
    } else {
        None
    };
    let mut outputs = OutputAdapter::new(led, display, recorder);
    let mut log_sink = LogEventSink::new();

    // ── 5. Cycle loop ─────────────────────────────────────────
    let uptime = UptimeClock::new();
    let mut timer = CycleTimer::new(config.cycle_interval_ms);
    service.start(&mut outputs, &mut log_sink);

    loop {
        if boot
            .max_cycles
            .is_some_and(|limit| service.cycle_count() >= limit)
        {
            break;
        }

        timer.begin(uptime.uptime_ms());
        service.run_cycle(&mut hw, &mut outputs, &mut log_sink, uptime.uptime_ms());
        let timing = timer.finish(uptime.uptime_ms());
        service.record_timing(timing, &mut log_sink);

        watchdog.feed();

        if timing.wait_ms > 0 {
            std::thread::sleep(Duration::from_millis(timing.wait_ms));
        }
    }

    // ── 6. Shutdown (bounded runs only) ───────────────────────
    if let Some(recorder) = outputs.recorder_mut() {
        recorder.shutdown();
    }
    let stats = service.stats();
    info!(
        "Done: {} cycle(s), {} overrun(s), {} sink failure(s)",
        stats.cycles,
        stats.overruns,
        service.sink_failures()
    );
    Ok(())
}

// ── Boot (per target) ─────────────────────────────────────────

struct Boot<I> {
    config: MasterConfig,
    bus: I,
    /// `None` when disabled or when bring-up failed.
    led: Option<StatusLed>,
    /// Keeps the card mounted for the life of the firmware.
    #[cfg(target_os = "espidf")]
    _sd_card: Option<hw_init::SdCard>,
    /// Stop after this many cycles; `None` runs forever.
    max_cycles: Option<u64>,
}

/// Run a bring-up step only when its sink is enabled; a failure is
/// logged once and leaves the sink off.
fn optional<T, E: core::fmt::Display>(
    enabled: bool,
    what: &str,
    init: impl FnOnce() -> core::result::Result<T, E>,
) -> Option<T> {
    if !enabled {
        return None;
    }
    match init() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("{} unavailable ({}), continuing without it", what, e);
            None
        }
    }
}

#[cfg(target_os = "espidf")]
fn boot() -> Result<Boot<esp_idf_hal::i2c::I2cDriver<'static>>> {
    use esp_idf_hal::gpio::AnyIOPin;
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_hal::units::Hertz;
    use tallymaster::pins;

    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let config = MasterConfig::default();
    let peripherals = Peripherals::take()?;

    let i2c_config = I2cConfig::new()
        .baudrate(Hertz(config.bus_speed.hz()))
        .timeout(Duration::from_millis(u64::from(config.i2c_timeout_ms)).into());
    // SAFETY: the I²C GPIOs are not claimed by any other driver.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
        )
    };
    let bus = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config)?;

    let led = optional(config.enable_rgb_led, "Status LED", || {
        hw_init::init_status_led(peripherals.rmt.channel0)
    });
    let sd_card = optional(config.enable_logging, "SD card", || {
        hw_init::mount_sd_card(peripherals.spi2)
    });

    Ok(Boot {
        config,
        bus,
        led,
        _sd_card: sd_card,
        max_cycles: None,
    })
}

#[cfg(not(target_os = "espidf"))]
#[derive(clap::Parser)]
#[command(author, version, about = "Tallymaster host simulation")]
struct SimArgs {
    /// Stop after this many cycles (runs forever when omitted)
    #[arg(long)]
    cycles: Option<u64>,
    /// Seed for the simulated slaves
    #[arg(long, default_value_t = 0x7A11)]
    seed: u64,
    /// JSON configuration file; missing fields take their defaults
    #[arg(long, env = "TALLYMASTER_CONFIG")]
    config: Option<std::path::PathBuf>,
    /// Reads out of a thousand that a simulated slave NACKs
    #[arg(long, default_value_t = 20)]
    nack_per_mille: u16,
}

#[cfg(not(target_os = "espidf"))]
fn boot() -> Result<Boot<tallymaster::adapters::sim_bus::SimulatedI2c>> {
    use anyhow::Context;
    use clap::Parser;
    use tallymaster::adapters::sim_bus::{SimulatedI2c, SlaveBehaviour};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = SimArgs::parse();

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            match MasterConfig::from_json(&json) {
                Ok(c) => {
                    info!("Config loaded from {}", path.display());
                    c
                }
                Err(e) => {
                    error!("Config {} rejected: {}", path.display(), e);
                    bail!("invalid configuration file {}: {e}", path.display());
                }
            }
        }
        None => MasterConfig::default(),
    };

    let mut bus = SimulatedI2c::new(args.seed).with_host_rtc();
    for &address in &config.slave_addresses {
        bus.set_behaviour(
            address,
            SlaveBehaviour::Random {
                samples: config.samples_per_slave,
                nack_per_mille: args.nack_per_mille,
            },
        );
    }
    info!(
        "Simulated bus: {} slave(s), seed={:#x}, nack={}‰",
        config.slave_addresses.len(),
        args.seed,
        args.nack_per_mille
    );

    let led = optional(config.enable_rgb_led, "Status LED", hw_init::init_status_led);

    Ok(Boot {
        config,
        bus,
        led,
        max_cycles: args.cycles,
    })
}
