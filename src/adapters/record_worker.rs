//! Background record writer.
//!
//! Storage writes can stall for hundreds of milliseconds (SD card wear
//! levelling, FAT allocation), far longer than a cycle can afford.  The
//! [`RecordWorker`] moves them onto their own thread: the cycle driver
//! hands each snapshot to a bounded embassy-sync channel with `try_send`
//! and returns immediately, and the writer thread drains it into the
//! wrapped [`RecordPort`].
//!
//! ```text
//!  MasterService ──try_send──▶ [ Channel<_, RecordMsg, 8> ] ──receive──▶ recorder thread ──▶ CsvFileLogger
//! ```
//!
//! When the queue is full the snapshot is dropped and
//! [`SinkError::QueueFull`] is returned; the cycle never waits on storage.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::RecordPort;
use crate::config::RECORD_QUEUE_DEPTH;
use crate::drivers::task_pin::{Core, spawn_on_core};
use crate::error::SinkError;
use crate::slaves::aggregate::CycleSnapshot;

/// Recorder thread priority (below the cycle loop).
const RECORDER_PRIORITY: u8 = 3;
/// Recorder thread stack, in KiB.  FAT writes through VFS need headroom.
const RECORDER_STACK_KB: usize = 8;

/// Messages consumed by the writer thread.
#[derive(Debug)]
pub enum RecordMsg {
    Snapshot(CycleSnapshot),
    Shutdown,
}

type RecordChannel = Channel<CriticalSectionRawMutex, RecordMsg, RECORD_QUEUE_DEPTH>;

#[derive(Default)]
struct WriterCounters {
    written: AtomicU64,
    failed: AtomicU64,
}

/// [`RecordPort`] that forwards to another `RecordPort` on a background thread.
pub struct RecordWorker {
    channel: Arc<RecordChannel>,
    counters: Arc<WriterCounters>,
    dropped: u64,
    handle: Option<JoinHandle<()>>,
}

impl RecordWorker {
    /// Spawn the writer thread around `inner`.
    pub fn spawn<R>(inner: R) -> io::Result<Self>
    where
        R: RecordPort + Send + 'static,
    {
        let channel: Arc<RecordChannel> = Arc::new(Channel::new());
        let counters = Arc::new(WriterCounters::default());

        let handle = {
            let channel = Arc::clone(&channel);
            let counters = Arc::clone(&counters);
            spawn_on_core(
                Core::Pro,
                RECORDER_PRIORITY,
                RECORDER_STACK_KB,
                "recorder\0",
                move || writer_loop(&channel, &counters, inner),
            )?
        };

        Ok(Self {
            channel,
            counters,
            dropped: 0,
            handle: Some(handle),
        })
    }

    /// Snapshots written by the inner recorder.
    pub fn written(&self) -> u64 {
        self.counters.written.load(Ordering::Relaxed)
    }

    /// Snapshots the inner recorder rejected.
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Snapshots dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drain the queue, stop the thread and wait for it.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        futures_lite::future::block_on(self.channel.send(RecordMsg::Shutdown));
        if handle.join().is_err() {
            warn!("Recorder thread panicked");
        }
        info!(
            "Recorder stopped: written={} failed={} dropped={}",
            self.written(),
            self.failed(),
            self.dropped
        );
    }
}

impl RecordPort for RecordWorker {
    fn record(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError> {
        if self.handle.is_none() {
            return Err(SinkError::DeviceAbsent);
        }
        match self.channel.try_send(RecordMsg::Snapshot(snapshot.clone())) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.dropped += 1;
                Err(SinkError::QueueFull)
            }
        }
    }
}

impl Drop for RecordWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn writer_loop(channel: &RecordChannel, counters: &WriterCounters, mut inner: impl RecordPort) {
    loop {
        match futures_lite::future::block_on(channel.receive()) {
            RecordMsg::Snapshot(snapshot) => match inner.record(&snapshot) {
                Ok(()) => {
                    counters.written.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Recorder: cycle {} not written: {}", snapshot.cycle, e);
                }
            },
            RecordMsg::Shutdown => break,
        }
    }
}
