//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MasterService (domain)
//! ```
//!
//! Driven adapters (bus, clock, indicator, display, recorder, event sinks)
//! implement these traits.  The [`MasterService`](super::service::MasterService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! The bus is an explicitly owned handle: whoever holds `&mut impl
//! BusTransport` is the only party that can start a transaction.

use crate::clock::Timestamp;
use crate::drivers::indicator::IndicatorState;
use crate::error::{SinkError, TransportError};
use crate::slaves::SlaveAddress;
use crate::slaves::aggregate::CycleSnapshot;
use crate::slaves::record::PACKET_SIZE;

// ───────────────────────────────────────────────────────────────
// Bus transport (driven adapter: domain ↔ I²C master)
// ───────────────────────────────────────────────────────────────

/// One read transaction against one slave.
///
/// Implementations must return within the configured timeout even when
/// the slave never answers, must not retry internally, and must leave the
/// bus usable for an immediate retry after any error.
pub trait BusTransport {
    fn request(&mut self, address: SlaveAddress) -> Result<[u8; PACKET_SIZE], TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Clock (driven adapter: RTC → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.  `None` means unavailable; the caller falls back to
/// an uptime placeholder and the cycle carries on.
pub trait ClockPort {
    fn now(&mut self) -> Option<Timestamp>;
}

// ───────────────────────────────────────────────────────────────
// Status sinks (driven adapters: domain → operator)
// ───────────────────────────────────────────────────────────────

/// Colour-coded LED.
pub trait IndicatorPort {
    fn show(&mut self, state: IndicatorState) -> Result<(), SinkError>;
}

/// Human-readable snapshot rendering.  Best-effort.
pub trait DisplayPort {
    fn render(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError>;
}

/// Persistent, append-only per-cycle record.  Best-effort and must not
/// block the cycle for longer than it takes to hand the record off.
pub trait RecordPort {
    fn record(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
