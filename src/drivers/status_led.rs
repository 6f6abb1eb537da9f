//! WS2812B status LED driver.
//!
//! A single addressable LED on one RMT channel.  Each colour is a 24-bit
//! frame, GRB order, most significant bit first.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: shifts the frame out through `TxRmtDriver`.
//! On host/test: tracks state in-memory only.

#[cfg(target_os = "espidf")]
use esp_idf_hal::rmt::{FixedLengthSignal, PinState, Pulse, TxRmtDriver};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// Colour as `(r, g, b)` levels.
pub type Rgb = (u8, u8, u8);

/// Bits per LED frame.
pub const FRAME_BITS: usize = 24;

/// The 24-bit word a WS2812 expects: green, red, blue.
pub fn grb_word((r, g, b): Rgb) -> u32 {
    (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b)
}

/// Frame bits in wire order.
pub fn frame_bits(rgb: Rgb) -> [bool; FRAME_BITS] {
    let word = grb_word(rgb);
    core::array::from_fn(|i| word & (1 << (FRAME_BITS - 1 - i)) != 0)
}

// ── RMT backend ───────────────────────────────────────────────

/// One WS2812 on an RMT transmit channel.
#[cfg(target_os = "espidf")]
pub struct Ws2812 {
    tx: TxRmtDriver<'static>,
    /// High/low pulse pairs for a `0` and a `1` bit.
    symbols: [(Pulse, Pulse); 2],
}

#[cfg(target_os = "espidf")]
impl Ws2812 {
    pub fn new(tx: TxRmtDriver<'static>) -> Result<Self, EspError> {
        use core::time::Duration;

        let hz = tx.counter_clock()?;
        let pulse = |state, ns| Pulse::new_with_duration(hz, state, &Duration::from_nanos(ns));
        let zero = (pulse(PinState::High, 350)?, pulse(PinState::Low, 800)?);
        let one = (pulse(PinState::High, 700)?, pulse(PinState::Low, 600)?);
        Ok(Self {
            tx,
            symbols: [zero, one],
        })
    }

    fn write(&mut self, rgb: Rgb) -> Result<(), EspError> {
        let mut signal = FixedLengthSignal::<FRAME_BITS>::new();
        for (i, bit) in frame_bits(rgb).into_iter().enumerate() {
            signal.set(i, &self.symbols[usize::from(bit)])?;
        }
        self.tx.start_blocking(&signal)
    }
}

// ── Status LED ────────────────────────────────────────────────

pub struct StatusLed {
    #[cfg(target_os = "espidf")]
    strip: Ws2812,
    current: Rgb,
    writes: u32,
}

#[cfg(not(target_os = "espidf"))]
impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLed {
    #[cfg(target_os = "espidf")]
    pub fn new(strip: Ws2812) -> Self {
        Self {
            strip,
            current: (0, 0, 0),
            writes: 0,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            current: (0, 0, 0),
            writes: 0,
        }
    }

    /// Set the colour.  Unchanged colours skip the transmission; a failed
    /// transmission leaves the previous colour recorded so the next call
    /// tries again.
    pub fn set_colour(&mut self, rgb: Rgb) {
        if rgb == self.current && self.writes > 0 {
            return;
        }
        #[cfg(target_os = "espidf")]
        if let Err(e) = self.strip.write(rgb) {
            log::debug!("status LED: RMT write failed: {}", e);
            return;
        }
        self.current = rgb;
        self.writes = self.writes.wrapping_add(1);
    }

    pub fn off(&mut self) {
        self.set_colour((0, 0, 0));
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }

    /// Number of colour changes pushed to the hardware.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}
