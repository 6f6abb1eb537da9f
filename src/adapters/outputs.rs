//! Output adapter — bridges the status sinks to the domain port traits.
//!
//! Holds whichever outputs are enabled in configuration.  A sink that is
//! switched off answers [`SinkError::Disabled`], which the service treats
//! as a silent no-op.

use log::debug;

use crate::app::ports::{DisplayPort, IndicatorPort, RecordPort};
use crate::drivers::indicator::IndicatorState;
use crate::drivers::status_led::StatusLed;
use crate::error::SinkError;
use crate::slaves::aggregate::CycleSnapshot;

/// Concrete adapter owning the indicator LED, display and recorder.
pub struct OutputAdapter<D, R> {
    led: Option<StatusLed>,
    display: Option<D>,
    recorder: Option<R>,
    indicator_state: IndicatorState,
}

impl<D: DisplayPort, R: RecordPort> OutputAdapter<D, R> {
    pub fn new(led: Option<StatusLed>, display: Option<D>, recorder: Option<R>) -> Self {
        debug!(
            "Outputs: led={} display={} recorder={}",
            led.is_some(),
            display.is_some(),
            recorder.is_some()
        );
        Self {
            led,
            display,
            recorder,
            indicator_state: IndicatorState::Off,
        }
    }

    /// Last state shown on the indicator (tracked even without an LED).
    pub fn indicator_state(&self) -> IndicatorState {
        self.indicator_state
    }

    pub fn led(&self) -> Option<&StatusLed> {
        self.led.as_ref()
    }

    pub fn display(&self) -> Option<&D> {
        self.display.as_ref()
    }

    pub fn recorder(&self) -> Option<&R> {
        self.recorder.as_ref()
    }

    pub fn recorder_mut(&mut self) -> Option<&mut R> {
        self.recorder.as_mut()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<D, R> IndicatorPort for OutputAdapter<D, R> {
    fn show(&mut self, state: IndicatorState) -> Result<(), SinkError> {
        self.indicator_state = state;
        let led = self.led.as_mut().ok_or(SinkError::Disabled)?;
        led.set_colour(state.rgb());
        Ok(())
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<D: DisplayPort, R> DisplayPort for OutputAdapter<D, R> {
    fn render(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError> {
        self.display
            .as_mut()
            .ok_or(SinkError::Disabled)?
            .render(snapshot)
    }
}

// ── RecordPort implementation ─────────────────────────────────

impl<D, R: RecordPort> RecordPort for OutputAdapter<D, R> {
    fn record(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError> {
        self.recorder
            .as_mut()
            .ok_or(SinkError::Disabled)?
            .record(snapshot)
    }
}
