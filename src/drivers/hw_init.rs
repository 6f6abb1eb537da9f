//! One-shot hardware peripheral initialization.
//!
//! Brings up the WS2812 status LED on an RMT channel and mounts the SD
//! card (SPI + FAT) under `SD_MOUNT_POINT`.  Called once from boot
//! before the first cycle.  The I²C bus is owned by `esp_idf_hal` and set
//! up separately.
//!
//! Pins come from [`crate::pins`] by number; the matching typed pins of
//! `Peripherals` are never handed out elsewhere.

#[cfg(target_os = "espidf")]
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin};
#[cfg(target_os = "espidf")]
use esp_idf_hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_hal::rmt::{RmtChannel, TxRmtDriver, config::TransmitConfig};
#[cfg(target_os = "espidf")]
use esp_idf_hal::sd::{SdCardConfiguration, SdCardDriver, spi::SdSpiHostDriver};
#[cfg(target_os = "espidf")]
use esp_idf_hal::spi::{Dma, SpiAnyPins, SpiDriver, SpiDriverConfig};
#[cfg(target_os = "espidf")]
use esp_idf_svc::fs::fatfs::Fatfs;
#[cfg(target_os = "espidf")]
use esp_idf_svc::io::vfs::MountedFatfs;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::drivers::status_led::Ws2812;
use crate::drivers::status_led::StatusLed;
#[cfg(target_os = "espidf")]
use crate::pins;

/// VFS prefix of the SD card; the default log path lives under it.
#[cfg(target_os = "espidf")]
pub const SD_MOUNT_POINT: &str = "/sdcard";

/// Open files allowed on the card at once.
#[cfg(target_os = "espidf")]
const SD_MAX_OPEN_FILES: usize = 4;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.  Codes are `esp_err_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    RmtFailed(i32),
    SdBusFailed(i32),
    SdMountFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RmtFailed(rc) => write!(f, "RMT status LED setup failed (rc={})", rc),
            Self::SdBusFailed(rc) => write!(f, "SD SPI bus setup failed (rc={})", rc),
            Self::SdMountFailed(rc) => write!(f, "SD card mount failed (rc={})", rc),
        }
    }
}

// ── Status LED ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_status_led(
    channel: impl Peripheral<P = impl RmtChannel> + 'static,
) -> Result<StatusLed, HwInitError> {
    // SAFETY: STATUS_LED_GPIO is not claimed by any other driver.
    let pin = unsafe { AnyOutputPin::new(pins::STATUS_LED_GPIO) };
    let config = TransmitConfig::new().clock_divider(1);
    let tx = TxRmtDriver::new(channel, pin, &config)
        .map_err(|e| HwInitError::RmtFailed(e.code()))?;
    let strip = Ws2812::new(tx).map_err(|e| HwInitError::RmtFailed(e.code()))?;
    info!("hw_init: WS2812 on GPIO{}", pins::STATUS_LED_GPIO);
    Ok(StatusLed::new(strip))
}

#[cfg(not(target_os = "espidf"))]
pub fn init_status_led() -> Result<StatusLed, HwInitError> {
    log::info!("hw_init(sim): status LED is in-memory");
    Ok(StatusLed::new())
}

// ── SD card ───────────────────────────────────────────────────

/// Mounted card; unmounts on drop.
#[cfg(target_os = "espidf")]
pub type SdCard = MountedFatfs<Fatfs<SdCardDriver<SdSpiHostDriver<'static, SpiDriver<'static>>>>>;

#[cfg(target_os = "espidf")]
pub fn mount_sd_card(
    spi: impl Peripheral<P = impl SpiAnyPins> + 'static,
) -> Result<SdCard, HwInitError> {
    // SAFETY: the SD GPIOs are not claimed by any other driver.
    let (sclk, mosi, miso, cs) = unsafe {
        (
            AnyOutputPin::new(pins::SD_SCLK_GPIO),
            AnyOutputPin::new(pins::SD_MOSI_GPIO),
            AnyInputPin::new(pins::SD_MISO_GPIO),
            AnyOutputPin::new(pins::SD_CS_GPIO),
        )
    };
    let bus_err = |e: esp_idf_svc::sys::EspError| HwInitError::SdBusFailed(e.code());
    let mount_err = |e: esp_idf_svc::sys::EspError| HwInitError::SdMountFailed(e.code());

    let driver = SpiDriver::new(
        spi,
        sclk,
        mosi,
        Some(miso),
        &SpiDriverConfig::default().dma(Dma::Auto(4096)),
    )
    .map_err(bus_err)?;
    let host = SdSpiHostDriver::new(
        driver,
        Some(cs),
        AnyIOPin::none(),
        AnyIOPin::none(),
        AnyIOPin::none(),
        None,
    )
    .map_err(bus_err)?;

    let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new()).map_err(mount_err)?;
    let fatfs = Fatfs::new_sdcard(0, card).map_err(mount_err)?;
    let mounted =
        MountedFatfs::mount(fatfs, SD_MOUNT_POINT, SD_MAX_OPEN_FILES).map_err(mount_err)?;

    info!("hw_init: SD card mounted at {}", SD_MOUNT_POINT);
    Ok(mounted)
}
