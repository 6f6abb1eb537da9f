//! Integration tests for the MasterService → poll → aggregate → sinks pipeline.
//!
//! These run on the host (x86_64) against the scripted bus and recording
//! sinks in `mock_hw`, and cover the four reference bus scenarios plus
//! sink isolation, indicator sequencing and link events.

use crate::mock_hw::{EventLog, MockBus, MockSinks, SinkCall, ok};

use tallymaster::app::events::{AppEvent, SinkKind};
use tallymaster::app::service::MasterService;
use tallymaster::clock::{DateTime, Timestamp};
use tallymaster::config::MasterConfig;
use tallymaster::cycle_timer::CycleTiming;
use tallymaster::drivers::indicator::IndicatorState;
use tallymaster::error::{SinkError, TransportError};
use tallymaster::slaves::aggregate::{OverallStatus, Totals};
use tallymaster::slaves::record::Tally;
use tallymaster::slaves::{SlaveAddress, SlaveOutcome};

const ADDRS: [u8; 4] = [0x10, 0x11, 0x12, 0x13];

fn config_with(addresses: &[u8]) -> MasterConfig {
    let mut config = MasterConfig::default();
    config.slave_addresses = addresses.iter().copied().collect();
    config
}

fn make_service(addresses: &[u8]) -> (MasterService, MockBus, MockSinks, EventLog) {
    let svc = MasterService::new(config_with(addresses)).unwrap();
    (svc, MockBus::new(), MockSinks::new(), EventLog::new())
}

fn totals(favor: u32, contra: u32, neutral: u32) -> Totals {
    Totals {
        favor,
        contra,
        neutral,
    }
}

// ── Reference scenarios ───────────────────────────────────────

#[test]
fn scenario_a_all_slaves_answer() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&ADDRS);
    bus.always(0x10, ok(10, 2, 1))
        .always(0x11, ok(5, 5, 5))
        .always(0x12, ok(0, 0, 20))
        .always(0x13, ok(7, 3, 3));

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();

    assert_eq!(snap.totals, totals(22, 10, 29));
    assert_eq!(snap.status, OverallStatus::AllOk);
    assert_eq!(snap.results.len(), 4);
    assert!(snap.results.iter().all(|r| r.attempts == 1));
    assert_eq!(bus.requests, ADDRS.to_vec());
}

#[test]
fn scenario_b_one_slave_times_out() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&ADDRS);
    bus.always(0x10, ok(10, 2, 1))
        .always(0x11, Err(TransportError::Timeout))
        .always(0x12, ok(5, 5, 5))
        .always(0x13, ok(7, 3, 3));

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();

    assert_eq!(
        snap.results[1].outcome,
        SlaveOutcome::RetriesExhausted(TransportError::Timeout)
    );
    assert_eq!(snap.results[1].attempts, 3);
    assert_eq!(bus.requests_to(0x11), 3);
    assert_eq!(snap.totals, totals(22, 10, 9));
    assert_eq!(snap.status, OverallStatus::PartialFailure);
}

#[test]
fn scenario_c_every_slave_fails() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&ADDRS);
    for a in ADDRS {
        bus.always(a, Err(TransportError::NotAcknowledged));
    }

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();

    assert_eq!(snap.totals, Totals::default());
    assert_eq!(snap.status, OverallStatus::AllFailed);
    assert_eq!(bus.requests.len(), 4 * 3);
    assert_eq!(sinks.shown().last(), Some(&IndicatorState::Error));
}

#[test]
fn scenario_d_no_slaves_configured() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[]);

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();

    assert!(snap.results.is_empty());
    assert_eq!(snap.totals, Totals::default());
    assert_eq!(snap.status, OverallStatus::NoSlaves);
    assert!(bus.requests.is_empty());
    // Sinks still see the degenerate cycle.
    assert_eq!(sinks.recorded(), vec![1]);
    assert_eq!(sinks.shown().last(), Some(&IndicatorState::Idle));
}

// ── Retry policy ──────────────────────────────────────────────

#[test]
fn retry_stops_at_first_success() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[0x10]);
    bus.script(
        0x10,
        [
            Err(TransportError::NotAcknowledged),
            Err(TransportError::BusError),
            ok(1, 1, 1),
        ],
    );

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();

    assert_eq!(snap.results[0].outcome, SlaveOutcome::Ok(Tally::new(1, 1, 1)));
    assert_eq!(snap.results[0].attempts, 3);
    assert_eq!(bus.requests_to(0x10), 3);
}

#[test]
fn single_attempt_reports_error_directly() {
    let mut config = config_with(&[0x10, 0x11]);
    config.max_retries = 1;
    let mut svc = MasterService::new(config).unwrap();
    let (mut bus, mut sinks, mut events) = (MockBus::new(), MockSinks::new(), EventLog::new());
    bus.always(0x10, Err(TransportError::Timeout))
        .always(0x11, Err(TransportError::BusError));

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();

    assert_eq!(snap.results[0].outcome, SlaveOutcome::TimedOut);
    assert_eq!(
        snap.results[1].outcome,
        SlaveOutcome::TransportError(TransportError::BusError)
    );
    assert_eq!(bus.requests.len(), 2);
}

#[test]
fn retry_budget_resets_every_cycle() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[0x10]);
    bus.always(0x10, Err(TransportError::NotAcknowledged));

    for _ in 0..3 {
        svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);
    }
    assert_eq!(bus.requests_to(0x10), 9);
    assert_eq!(svc.diagnostics().slave(SlaveAddress(0x10)).unwrap().attempts, 9);
}

// ── Indicator sequencing & sink fan-out ───────────────────────

#[test]
fn start_shows_idle_and_announces() {
    let (mut svc, _bus, mut sinks, mut events) = make_service(&ADDRS);
    svc.start(&mut sinks, &mut events);

    assert_eq!(sinks.shown(), vec![IndicatorState::Idle]);
    assert_eq!(
        events.events,
        vec![AppEvent::Started {
            slaves: 4,
            interval_ms: 1500
        }]
    );
}

#[test]
fn reading_colour_precedes_status_colour() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[0x10]);
    bus.always(0x10, ok(1, 2, 3));

    svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);

    assert_eq!(
        sinks.calls,
        vec![
            SinkCall::Show(IndicatorState::Reading),
            SinkCall::Show(IndicatorState::Success),
            SinkCall::Render(1),
            SinkCall::Record(1),
        ]
    );
}

#[test]
fn failing_sinks_do_not_suppress_each_other() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[0x10]);
    bus.always(0x10, ok(1, 2, 3));
    sinks.indicator_error = Some(SinkError::DeviceAbsent);
    sinks.display_error = Some(SinkError::DeviceAbsent);
    sinks.record_error = Some(SinkError::WriteFailed);

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();

    // Polling unaffected; every sink still invoked.
    assert_eq!(snap.status, OverallStatus::AllOk);
    assert_eq!(sinks.calls.len(), 4);
    assert_eq!(
        events.count(|e| matches!(e, AppEvent::SinkFailed { .. })),
        4
    );
    assert!(events.events.contains(&AppEvent::SinkFailed {
        sink: SinkKind::Recorder,
        error: SinkError::WriteFailed
    }));
    assert_eq!(svc.sink_failures(), 4);
}

#[test]
fn disabled_sinks_are_silent() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[0x10]);
    bus.always(0x10, ok(1, 2, 3));
    sinks.display_error = Some(SinkError::Disabled);
    sinks.record_error = Some(SinkError::Disabled);

    svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);

    assert_eq!(events.count(|e| matches!(e, AppEvent::SinkFailed { .. })), 0);
    assert_eq!(svc.sink_failures(), 0);
}

#[test]
fn all_sinks_see_the_same_snapshot() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&ADDRS);
    bus.always(0x10, ok(10, 2, 1))
        .always(0x11, ok(5, 5, 5))
        .always(0x12, ok(0, 0, 20))
        .always(0x13, ok(7, 3, 3));

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 0).clone();
    assert_eq!(sinks.rendered, vec![snap.clone()]);
    assert_eq!(svc.last_snapshot(), Some(&snap));
}

// ── Timestamps ────────────────────────────────────────────────

#[test]
fn rtc_time_used_when_available() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[]);
    let wall = Timestamp::Wall(DateTime::from_unix(1_735_689_600));
    bus.clock = Some(wall);

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 42).clone();
    assert_eq!(snap.timestamp, wall);
}

#[test]
fn uptime_fallback_without_rtc() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[]);
    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 4_500).clone();
    assert_eq!(snap.timestamp, Timestamp::Uptime { millis: 4_500 });
}

#[test]
fn disabled_rtc_is_never_read() {
    let mut config = config_with(&[]);
    config.enable_rtc = false;
    let mut svc = MasterService::new(config).unwrap();
    let (mut bus, mut sinks, mut events) = (MockBus::new(), MockSinks::new(), EventLog::new());
    bus.clock = Some(Timestamp::Wall(DateTime::from_unix(0)));

    let snap = svc.run_cycle(&mut bus, &mut sinks, &mut events, 7).clone();
    assert_eq!(bus.clock_reads, 0);
    assert_eq!(snap.timestamp, Timestamp::Uptime { millis: 7 });
}

// ── Events ────────────────────────────────────────────────────

#[test]
fn status_change_emitted_only_on_transition() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[0x10]);
    bus.always(0x10, ok(1, 0, 0));
    svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);
    svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);
    bus.always(0x10, Err(TransportError::NotAcknowledged));
    svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);

    let changes: Vec<_> = events
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StatusChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (OverallStatus::Idle, OverallStatus::AllOk),
            (OverallStatus::AllOk, OverallStatus::AllFailed),
        ]
    );
    assert_eq!(svc.status(), OverallStatus::AllFailed);
}

#[test]
fn slave_lost_and_recovered_once_each() {
    let (mut svc, mut bus, mut sinks, mut events) = make_service(&[0x10]);
    bus.script(
        0x10,
        [ok(1, 1, 1)]
            .into_iter()
            .chain(std::iter::repeat(Err(TransportError::NotAcknowledged)).take(6))
            .chain([ok(2, 2, 2)]),
    );

    for _ in 0..4 {
        svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);
    }

    let lost = events.count(|e| matches!(e, AppEvent::SlaveLost { .. }));
    assert_eq!(lost, 1);
    assert!(events.events.contains(&AppEvent::SlaveRecovered {
        address: SlaveAddress(0x10),
        after_failures: 2
    }));
}

#[test]
fn completed_event_every_cycle_and_stats_on_cadence() {
    let mut config = config_with(&[0x10]);
    config.stats_every_cycles = 2;
    let mut svc = MasterService::new(config).unwrap();
    let (mut bus, mut sinks, mut events) = (MockBus::new(), MockSinks::new(), EventLog::new());
    bus.always(0x10, ok(3, 1, 0));

    for _ in 0..5 {
        svc.run_cycle(&mut bus, &mut sinks, &mut events, 0);
    }

    assert_eq!(
        events.count(|e| matches!(e, AppEvent::CycleCompleted(_))),
        5
    );
    assert_eq!(events.count(|e| matches!(e, AppEvent::Stats(_))), 2);
    assert_eq!(svc.stats().all_ok, 5);
    assert_eq!(svc.cycle_count(), 5);
}

#[test]
fn overrun_reported_through_events_and_stats() {
    let (mut svc, _bus, _sinks, mut events) = make_service(&[0x10]);
    svc.record_timing(
        CycleTiming {
            elapsed_ms: 2_000,
            wait_ms: 0,
            overran: true,
        },
        &mut events,
    );
    svc.record_timing(
        CycleTiming {
            elapsed_ms: 300,
            wait_ms: 1_200,
            overran: false,
        },
        &mut events,
    );

    assert_eq!(
        events.events,
        vec![AppEvent::CycleOverrun {
            elapsed_ms: 2_000,
            interval_ms: 1_500
        }]
    );
    let stats = svc.stats();
    assert_eq!(stats.overruns, 1);
    assert_eq!(stats.worst_cycle_ms, 2_000);
}
