//! Mock adapters for integration tests.
//!
//! Records every bus transaction and sink call so tests can assert on the
//! full history without touching a real I²C master.

use std::collections::{HashMap, VecDeque};

use tallymaster::app::events::AppEvent;
use tallymaster::app::ports::{
    BusTransport, ClockPort, DisplayPort, EventSink, IndicatorPort, RecordPort,
};
use tallymaster::clock::Timestamp;
use tallymaster::drivers::indicator::IndicatorState;
use tallymaster::error::{SinkError, TransportError};
use tallymaster::slaves::SlaveAddress;
use tallymaster::slaves::aggregate::CycleSnapshot;
use tallymaster::slaves::record::{PACKET_SIZE, Tally};

pub type Reply = Result<[u8; PACKET_SIZE], TransportError>;

pub fn ok(favor: u16, contra: u16, neutral: u16) -> Reply {
    Ok(Tally::new(favor, contra, neutral).to_bytes())
}

// ── MockBus ───────────────────────────────────────────────────

/// Bus + clock.  Each address replays its script; once the script runs
/// dry the last reply repeats.  Unscripted addresses NACK.
pub struct MockBus {
    scripts: HashMap<u8, VecDeque<Reply>>,
    last: HashMap<u8, Reply>,
    pub requests: Vec<u8>,
    pub clock: Option<Timestamp>,
    pub clock_reads: u32,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            last: HashMap::new(),
            requests: Vec::new(),
            clock: None,
            clock_reads: 0,
        }
    }

    /// Queue replies for `address`.
    pub fn script(&mut self, address: u8, replies: impl IntoIterator<Item = Reply>) -> &mut Self {
        self.scripts.entry(address).or_default().extend(replies);
        self
    }

    /// Same reply forever.
    pub fn always(&mut self, address: u8, reply: Reply) -> &mut Self {
        self.scripts.remove(&address);
        self.last.insert(address, reply);
        self
    }

    pub fn requests_to(&self, address: u8) -> usize {
        self.requests.iter().filter(|&&a| a == address).count()
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusTransport for MockBus {
    fn request(&mut self, address: SlaveAddress) -> Reply {
        let a = address.raw();
        self.requests.push(a);
        if let Some(reply) = self.scripts.get_mut(&a).and_then(VecDeque::pop_front) {
            self.last.insert(a, reply);
            return reply;
        }
        self.last
            .get(&a)
            .copied()
            .unwrap_or(Err(TransportError::NotAcknowledged))
    }
}

impl ClockPort for MockBus {
    fn now(&mut self) -> Option<Timestamp> {
        self.clock_reads += 1;
        self.clock
    }
}

// ── MockSinks ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Show(IndicatorState),
    Render(u64),
    Record(u64),
}

/// Indicator + display + recorder, each with an optional forced failure.
pub struct MockSinks {
    pub calls: Vec<SinkCall>,
    pub rendered: Vec<CycleSnapshot>,
    pub indicator_error: Option<SinkError>,
    pub display_error: Option<SinkError>,
    pub record_error: Option<SinkError>,
}

#[allow(dead_code)]
impl MockSinks {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            rendered: Vec::new(),
            indicator_error: None,
            display_error: None,
            record_error: None,
        }
    }

    pub fn shown(&self) -> Vec<IndicatorState> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Show(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn recorded(&self) -> Vec<u64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Record(n) => Some(*n),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockSinks {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorPort for MockSinks {
    fn show(&mut self, state: IndicatorState) -> Result<(), SinkError> {
        self.calls.push(SinkCall::Show(state));
        self.indicator_error.map_or(Ok(()), Err)
    }
}

impl DisplayPort for MockSinks {
    fn render(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError> {
        self.calls.push(SinkCall::Render(snapshot.cycle));
        self.rendered.push(snapshot.clone());
        self.display_error.map_or(Ok(()), Err)
    }
}

impl RecordPort for MockSinks {
    fn record(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError> {
        self.calls.push(SinkCall::Record(snapshot.cycle));
        self.record_error.map_or(Ok(()), Err)
    }
}

// ── EventLog ──────────────────────────────────────────────────

pub struct EventLog {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
