//! GPIO / peripheral pin assignments for the tally master board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// I²C bus (slaves, OLED at 0x3C/0x3D, DS3231 at 0x68)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

/// Standard-mode bus clock.
pub const I2C_STANDARD_HZ: u32 = 100_000;
/// Fast-mode bus clock.
pub const I2C_FAST_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Status LED (one WS2812B, driven by RMT)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 48;

// ---------------------------------------------------------------------------
// SD card (SPI), mounted at boot by hw_init
// ---------------------------------------------------------------------------

pub const SD_CS_GPIO: i32 = 7;
pub const SD_MOSI_GPIO: i32 = 6;
pub const SD_MISO_GPIO: i32 = 5;
pub const SD_SCLK_GPIO: i32 = 4;
