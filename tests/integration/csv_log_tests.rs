//! CSV recorder wired behind the service.

use crate::mock_hw::{EventLog, MockBus, ok};

use tallymaster::adapters::csv_log::{CsvFileLogger, csv_header, read_lines};
use tallymaster::adapters::display::ConsoleDisplay;
use tallymaster::adapters::outputs::OutputAdapter;
use tallymaster::app::events::{AppEvent, SinkKind};
use tallymaster::app::service::MasterService;
use tallymaster::config::MasterConfig;
use tallymaster::error::{SinkError, TransportError};
use tallymaster::slaves::aggregate::OverallStatus;

type Outputs = OutputAdapter<ConsoleDisplay<Vec<u8>>, CsvFileLogger>;

fn service(addresses: &[u8]) -> MasterService {
    let mut config = MasterConfig::default();
    config.slave_addresses = addresses.iter().copied().collect();
    MasterService::new(config).unwrap()
}

#[test]
fn one_row_per_cycle_with_fixed_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("datalog.csv");
    let mut svc = service(&[0x10, 0x11, 0x12]);
    let logger = CsvFileLogger::new(&path, &svc.config().addresses());
    let mut outputs: Outputs = OutputAdapter::new(None, None, Some(logger));
    let mut bus = MockBus::new();
    let mut events = EventLog::new();

    bus.always(0x10, ok(3, 0, 0))
        .always(0x11, ok(0, 3, 0))
        .always(0x12, ok(0, 0, 3));
    svc.run_cycle(&mut bus, &mut outputs, &mut events, 0);

    bus.always(0x11, Err(TransportError::Timeout));
    svc.run_cycle(&mut bus, &mut outputs, &mut events, 1500);

    let lines = read_lines(&path).unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], csv_header(&svc.config().addresses()));

    let columns = lines[0].split(',').count();
    assert!(lines.iter().all(|l| l.split(',').count() == columns));

    assert_eq!(
        lines[1],
        "1,uptime+0.000s,all_ok,tie,3,3,3,3,0,0,ok,0,3,0,ok,0,0,3,ok"
    );
    assert_eq!(
        lines[2],
        "2,uptime+1.500s,partial_failure,tie,3,0,3,3,0,0,ok,,,,retries_exhausted(timeout),0,0,3,ok"
    );
}

#[test]
fn unavailable_storage_does_not_stop_polling() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unmounted").join("datalog.csv");
    let mut svc = service(&[0x10]);
    let logger = CsvFileLogger::new(&path, &svc.config().addresses());
    let mut outputs: Outputs = OutputAdapter::new(None, None, Some(logger));
    let mut bus = MockBus::new();
    let mut events = EventLog::new();
    bus.always(0x10, ok(1, 2, 3));

    for _ in 0..3 {
        let snap = svc.run_cycle(&mut bus, &mut outputs, &mut events, 0);
        assert_eq!(snap.status, OverallStatus::AllOk);
    }

    assert_eq!(bus.requests.len(), 3);
    assert_eq!(
        events.count(|e| *e
            == AppEvent::SinkFailed {
                sink: SinkKind::Recorder,
                error: SinkError::DeviceAbsent
            }),
        3
    );
    assert_eq!(outputs.recorder().unwrap().rows(), 0);
}

#[test]
fn storage_appearing_later_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let card = dir.path().join("sdcard");
    let path = card.join("datalog.csv");
    let mut svc = service(&[0x10]);
    let logger = CsvFileLogger::new(&path, &svc.config().addresses());
    let mut outputs: Outputs = OutputAdapter::new(None, None, Some(logger));
    let mut bus = MockBus::new();
    let mut events = EventLog::new();
    bus.always(0x10, ok(1, 2, 3));

    svc.run_cycle(&mut bus, &mut outputs, &mut events, 0);
    std::fs::create_dir(&card).unwrap();
    svc.run_cycle(&mut bus, &mut outputs, &mut events, 0);

    let lines = read_lines(&path).unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("2,"));
}

#[test]
fn reboot_with_more_slaves_starts_a_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("datalog.csv");
    let mut bus = MockBus::new();
    let mut events = EventLog::new();
    bus.always(0x10, ok(1, 1, 1))
        .always(0x11, ok(1, 1, 1))
        .always(0x12, ok(1, 1, 1))
        .always(0x13, ok(1, 1, 1));

    let mut first_boot = service(&[0x10, 0x11]);
    let logger = CsvFileLogger::new(&path, &first_boot.config().addresses());
    let mut outputs: Outputs = OutputAdapter::new(None, None, Some(logger));
    first_boot.run_cycle(&mut bus, &mut outputs, &mut events, 0);

    let mut second_boot = service(&[0x10, 0x11, 0x12, 0x13]);
    let logger = CsvFileLogger::new(&path, &second_boot.config().addresses());
    let mut outputs: Outputs = OutputAdapter::new(None, None, Some(logger));
    second_boot.run_cycle(&mut bus, &mut outputs, &mut events, 0);

    for file in [path.clone(), dir.path().join("datalog-1.csv")] {
        let lines = read_lines(&file).unwrap();
        assert_eq!(lines.len(), 2, "{}", file.display());
        let columns = lines[0].split(',').count();
        assert_eq!(lines[1].split(',').count(), columns, "{}", file.display());
    }
    assert_eq!(
        outputs.recorder().unwrap().path(),
        dir.path().join("datalog-1.csv")
    );
    assert_eq!(events.count(|e| matches!(e, AppEvent::SinkFailed { .. })), 0);
}
