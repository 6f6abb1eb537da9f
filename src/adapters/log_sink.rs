//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (ESP-IDF logger on the device, `env_logger` on the
//! host).  Each event is one tagged line, greppable by its prefix.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { emitted: 0 }
    }

    /// Events logged so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::Started {
                slaves,
                interval_ms,
            } => {
                info!("START | slaves={} interval={}ms", slaves, interval_ms);
            }
            AppEvent::CycleCompleted(c) => {
                info!(
                    "CYCLE | #{} | {} | {} {}/{} | F={} C={} N={} | verdict={}",
                    c.cycle,
                    c.timestamp,
                    c.status,
                    c.ok,
                    c.configured,
                    c.totals.favor,
                    c.totals.contra,
                    c.totals.neutral,
                    c.verdict,
                );
            }
            AppEvent::StatusChanged { from, to } => {
                info!("STATUS | {} -> {}", from, to);
            }
            AppEvent::SlaveLost { address, outcome } => {
                warn!("SLAVE | {} lost ({})", address, outcome);
            }
            AppEvent::SlaveRecovered {
                address,
                after_failures,
            } => {
                info!(
                    "SLAVE | {} recovered after {} failed cycle(s)",
                    address, after_failures
                );
            }
            AppEvent::CycleOverrun {
                elapsed_ms,
                interval_ms,
            } => {
                warn!(
                    "OVERRUN | cycle took {}ms > {}ms interval, next starts now",
                    elapsed_ms, interval_ms
                );
            }
            AppEvent::SinkFailed { sink, error } => {
                warn!("SINK | {}: {}", sink.as_str(), error);
            }
            AppEvent::Stats(s) => {
                info!(
                    "STATS | cycles={} ok={} partial={} failed={} empty={} | overruns={} worst={}ms | \
                     attempts={} failures={} worst_slave={} | heap={}",
                    s.cycles,
                    s.all_ok,
                    s.partial_failure,
                    s.all_failed,
                    s.no_slaves,
                    s.overruns,
                    s.worst_cycle_ms,
                    s.total_attempts,
                    s.total_failures,
                    s.worst_slave
                        .map_or_else(|| "-".to_string(), |a| a.to_string()),
                    s.heap_free
                        .map_or_else(|| "-".to_string(), |h| h.to_string()),
                );
            }
        }
    }
}
