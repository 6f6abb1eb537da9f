//! Application service — the hexagonal core.
//!
//! [`MasterService`] owns the poll scheduler, the link diagnostics and the
//! last snapshot.  It exposes one operation per cycle; all I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  BusTransport ──▶ ┌──────────────────────────┐ ──▶ IndicatorPort
//!     ClockPort ──▶ │      MasterService       │ ──▶ DisplayPort
//!                   │ poll · aggregate · diag  │ ──▶ RecordPort
//!                   └──────────────────────────┘ ──▶ EventSink
//! ```

use log::{info, warn};

use crate::clock::Timestamp;
use crate::config::MasterConfig;
use crate::cycle_timer::CycleTiming;
use crate::diagnostics::{Diagnostics, LinkChange, StatsSummary};
use crate::drivers::indicator::IndicatorState;
use crate::error::{ConfigError, SinkError};
use crate::slaves::aggregate::{CycleSnapshot, OverallStatus, aggregate};
use crate::slaves::poller::PollScheduler;

use super::events::{AppEvent, CycleSummary, SinkKind};
use super::ports::{BusTransport, ClockPort, DisplayPort, EventSink, IndicatorPort, RecordPort};

// ───────────────────────────────────────────────────────────────
// MasterService
// ───────────────────────────────────────────────────────────────

/// The cycle driver: poll → aggregate → fan-out.
pub struct MasterService {
    config: MasterConfig,
    poller: PollScheduler,
    diagnostics: Diagnostics,
    status: OverallStatus,
    cycle: u64,
    last: Option<CycleSnapshot>,
    sink_failures: u64,
}

impl MasterService {
    /// Construct the service, validating the configuration first.
    ///
    /// This is the only fallible step of the master's life: once a
    /// service exists, cycles cannot fail.
    pub fn new(config: MasterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let addresses = config.addresses();
        let poller = PollScheduler::new(&addresses, config.max_retries);
        let diagnostics = Diagnostics::new(&addresses);
        Ok(Self {
            config,
            poller,
            diagnostics,
            status: OverallStatus::Idle,
            cycle: 0,
            last: None,
            sink_failures: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Show the idle colour and announce the configuration.
    pub fn start(&mut self, indicator: &mut impl IndicatorPort, events: &mut impl EventSink) {
        let result = indicator.show(IndicatorState::Idle);
        self.deliver(SinkKind::Indicator, result, events);

        if self.config.slave_addresses.is_empty() {
            warn!("No slaves configured; cycles will report no_slaves");
        }
        if self.config.may_overrun() {
            warn!(
                "Worst-case cycle {}ms exceeds interval {}ms; cycles may overrun",
                self.config.worst_case_cycle_ms(),
                self.config.cycle_interval_ms
            );
        }
        events.emit(&AppEvent::Started {
            slaves: self.config.slave_addresses.len(),
            interval_ms: self.config.cycle_interval_ms,
        });
        info!(
            "MasterService started: {} slave(s), {}ms interval",
            self.config.slave_addresses.len(),
            self.config.cycle_interval_ms
        );
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full cycle and return its snapshot.
    ///
    /// The `hw` parameter satisfies **both** [`BusTransport`] and
    /// [`ClockPort`] because the RTC lives on the same bus; one owned
    /// handle serves both.  Likewise `sinks` carries all three status
    /// outputs.  Each sink is invoked independently: one failing never
    /// suppresses the others, and none can fail the cycle.
    pub fn run_cycle(
        &mut self,
        hw: &mut (impl BusTransport + ClockPort),
        sinks: &mut (impl IndicatorPort + DisplayPort + RecordPort),
        events: &mut impl EventSink,
        uptime_ms: u64,
    ) -> &CycleSnapshot {
        self.cycle += 1;

        // 1. Indicate activity
        let result = sinks.show(IndicatorState::Reading);
        self.deliver(SinkKind::Indicator, result, events);

        // 2. Timestamp (degrades to uptime, never fails)
        let wall = if self.config.enable_rtc { hw.now() } else { None };
        let timestamp = wall.unwrap_or(Timestamp::Uptime { millis: uptime_ms });

        // 3. Poll every slave
        let results = self.poller.poll_cycle(hw);

        // 4. Aggregate
        let snapshot = aggregate(self.cycle, timestamp, &results);

        // 5. Link transitions
        for change in self.diagnostics.record_cycle(&snapshot) {
            let event = match change {
                LinkChange::Lost { address, outcome } => AppEvent::SlaveLost { address, outcome },
                LinkChange::Recovered {
                    address,
                    after_failures,
                } => AppEvent::SlaveRecovered {
                    address,
                    after_failures,
                },
            };
            events.emit(&event);
        }

        // 6. Fan-out, isolated per sink
        let result = sinks.show(IndicatorState::for_status(snapshot.status));
        self.deliver(SinkKind::Indicator, result, events);
        let result = sinks.render(&snapshot);
        self.deliver(SinkKind::Display, result, events);
        let result = sinks.record(&snapshot);
        self.deliver(SinkKind::Recorder, result, events);

        // 7. Status bookkeeping
        if snapshot.status != self.status {
            events.emit(&AppEvent::StatusChanged {
                from: self.status,
                to: snapshot.status,
            });
            self.status = snapshot.status;
        }
        events.emit(&AppEvent::CycleCompleted(CycleSummary {
            cycle: snapshot.cycle,
            timestamp: snapshot.timestamp,
            status: snapshot.status,
            ok: snapshot.ok_count(),
            configured: snapshot.results.len(),
            totals: snapshot.totals,
            verdict: snapshot.totals.verdict(),
        }));

        let every = u64::from(self.config.stats_every_cycles);
        if every > 0 && self.cycle % every == 0 {
            events.emit(&AppEvent::Stats(self.diagnostics.summary()));
        }

        self.last.insert(snapshot)
    }

    /// Feed the timing of the cycle that just finished back into the
    /// diagnostics, reporting an overrun if there was one.
    pub fn record_timing(&mut self, timing: CycleTiming, events: &mut impl EventSink) {
        self.diagnostics.record_timing(timing.elapsed_ms, timing.overran);
        if timing.overran {
            events.emit(&AppEvent::CycleOverrun {
                elapsed_ms: timing.elapsed_ms,
                interval_ms: u64::from(self.config.cycle_interval_ms),
            });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// `Idle` until the first cycle completes, then the latest status.
    pub fn status(&self) -> OverallStatus {
        self.status
    }

    pub fn last_snapshot(&self) -> Option<&CycleSnapshot> {
        self.last.as_ref()
    }

    /// Cycles run since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle
    }

    pub fn stats(&self) -> StatsSummary {
        self.diagnostics.summary()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Sink errors reported since startup (disabled sinks excluded).
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures
    }

    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn deliver(
        &mut self,
        sink: SinkKind,
        result: Result<(), SinkError>,
        events: &mut impl EventSink,
    ) {
        match result {
            Ok(()) | Err(SinkError::Disabled) => {}
            Err(error) => {
                self.sink_failures += 1;
                events.emit(&AppEvent::SinkFailed { sink, error });
            }
        }
    }
}
