//! Text display sink.
//!
//! [`render_frame`] turns a snapshot into a fixed-layout text frame: a
//! header with the timestamp, one line per slave in configuration order,
//! then totals and the verdict.  [`ConsoleDisplay`] writes frames to any
//! `io::Write` (stdout by default, which is the UART console on the
//! device).
//!
//! ```text
//! ┌ cycle 7 · 2025-01-01 12:00:03
//! │ 0x10  F  100  C   40  N   30
//! │ 0x11  retries_exhausted(nack)
//! │ sum   F  100  C   40  N   30
//! │ pct   F   58% C   23% N   17%
//! └ favor · partial_failure (1/2 ok)
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};

use log::debug;

use crate::app::ports::DisplayPort;
use crate::error::SinkError;
use crate::slaves::aggregate::CycleSnapshot;

/// Render one snapshot as a multi-line text frame (trailing newline).
pub fn render_frame(snapshot: &CycleSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "┌ cycle {} · {}", snapshot.cycle, snapshot.timestamp);

    for r in &snapshot.results {
        match r.outcome.tally() {
            Some(t) => {
                let _ = writeln!(
                    out,
                    "│ {}  F {:>4}  C {:>4}  N {:>4}",
                    r.address, t.favor, t.contra, t.neutral
                );
            }
            None => {
                let _ = writeln!(out, "│ {}  {}", r.address, r.outcome);
            }
        }
    }

    let t = &snapshot.totals;
    let (pf, pc, pn) = t.percentages();
    let _ = writeln!(
        out,
        "│ sum   F {:>4}  C {:>4}  N {:>4}",
        t.favor, t.contra, t.neutral
    );
    let _ = writeln!(out, "│ pct   F {pf:>4}% C {pc:>4}% N {pn:>4}%");
    let _ = writeln!(
        out,
        "└ {} · {} ({}/{} ok)",
        t.verdict(),
        snapshot.status,
        snapshot.ok_count(),
        snapshot.results.len()
    );
    out
}

/// Console-backed [`DisplayPort`].
pub struct ConsoleDisplay<W> {
    out: Option<W>,
    frames: u64,
}

impl ConsoleDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Some(out),
            frames: 0,
        }
    }

    /// A display that was not detected at boot; every render reports
    /// [`SinkError::DeviceAbsent`].
    pub fn absent() -> Self {
        Self {
            out: None,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn writer(&self) -> Option<&W> {
        self.out.as_ref()
    }
}

impl<W: Write> DisplayPort for ConsoleDisplay<W> {
    fn render(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError> {
        let out = self.out.as_mut().ok_or(SinkError::DeviceAbsent)?;
        let frame = render_frame(snapshot);
        out.write_all(frame.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| {
                debug!("Display write failed: {}", e);
                SinkError::WriteFailed
            })?;
        self.frames += 1;
        Ok(())
    }
}
