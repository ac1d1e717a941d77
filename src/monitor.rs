//! Monitoring loop.
//!
//! Each cycle runs the three scanners in a fixed order (sockets, memory,
//! processes) and renders the snapshot. A failed scanner aborts only the
//! current cycle; collections gathered before the failure are dropped and
//! nothing is written. The loop then waits for the next interval.
//!
//! Cancellation is observed only at the top of a cycle and during the
//! interval sleep. Scans are synchronous and never interrupted.

use std::io::{self, Write};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::collectors::{scan_memory, scan_processes, scan_sockets, ScanError};
use crate::config::{MonitorSettings, ScanSettings};
use crate::report::write_report;
use crate::snapshot::{MemoryRegion, ProcessRecord, Snapshot, SnapshotSummary, SocketRecord};

/// Provider of the three snapshot collections.
pub trait SnapshotSource {
    fn sockets(&mut self) -> Result<Vec<SocketRecord>, ScanError>;
    fn memory(&mut self) -> Result<Vec<MemoryRegion>, ScanError>;
    fn processes(&mut self) -> Result<Vec<ProcessRecord>, ScanError>;
}

/// Reads snapshots from a process-information filesystem.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    settings: ScanSettings,
}

impl ProcfsSource {
    pub fn new(settings: ScanSettings) -> Self {
        Self { settings }
    }
}

impl SnapshotSource for ProcfsSource {
    fn sockets(&mut self) -> Result<Vec<SocketRecord>, ScanError> {
        scan_sockets(&self.settings)
    }

    fn memory(&mut self) -> Result<Vec<MemoryRegion>, ScanError> {
        scan_memory(&self.settings)
    }

    fn processes(&mut self) -> Result<Vec<ProcessRecord>, ScanError> {
        scan_processes(&self.settings)
    }
}

/// Creates a linked trigger/receiver pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Fires the cancellation request. Owned by the signal task.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Read side of the cancellation request, checked by the loop.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the trigger fires. Never resolves if the trigger is
    /// dropped without firing.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Why a cycle produced no report.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("socket scan failed: {0}")]
    Sockets(#[source] ScanError),

    #[error("memory scan failed: {0}")]
    Memory(#[source] ScanError),

    #[error("process scan failed: {0}")]
    Processes(#[source] ScanError),

    #[error("failed to write report: {0}")]
    Output(#[source] io::Error),
}

/// Cycle counts returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub cycles_ok: u64,
    pub cycles_failed: u64,
}

impl LoopReport {
    pub fn total(&self) -> u64 {
        self.cycles_ok + self.cycles_failed
    }
}

pub struct Monitor<S, W> {
    settings: MonitorSettings,
    source: S,
    out: W,
}

impl<S: SnapshotSource, W: Write> Monitor<S, W> {
    pub fn new(settings: MonitorSettings, source: S, out: W) -> Self {
        Self {
            settings,
            source,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Scans once and writes the report. Nothing is written on failure.
    pub fn run_cycle(&mut self) -> Result<SnapshotSummary, CycleError> {
        let started = Instant::now();

        let sockets = self.source.sockets().map_err(CycleError::Sockets)?;
        debug!("Scanned {} sockets in {:?}", sockets.len(), started.elapsed());

        let memory = self.source.memory().map_err(CycleError::Memory)?;
        debug!("Scanned {} memory regions", memory.len());

        let processes = self.source.processes().map_err(CycleError::Processes)?;
        debug!("Scanned {} processes", processes.len());

        let snapshot = Snapshot {
            timestamp: Utc::now().timestamp(),
            sockets,
            memory,
            processes,
        };
        let summary = snapshot.summary();

        write_report(self.settings.format, &snapshot, &mut self.out).map_err(CycleError::Output)?;

        debug!(
            "Cycle done in {:.2}ms: {} established, {} listening, {} hung, {} leak suspects",
            started.elapsed().as_secs_f64() * 1000.0,
            summary.established,
            summary.listening,
            summary.hung,
            summary.leaking
        );
        Ok(summary)
    }

    /// Runs cycles until `shutdown` fires, or once when the interval is zero.
    pub async fn run(&mut self, shutdown: &mut Shutdown) -> LoopReport {
        let mut report = LoopReport::default();

        loop {
            if shutdown.is_triggered() {
                info!("Shutdown requested, stopping monitor");
                break;
            }

            match self.run_cycle() {
                Ok(_) => report.cycles_ok += 1,
                Err(e) => {
                    error!("Cycle skipped: {}", e);
                    report.cycles_failed += 1;
                }
            }

            if self.settings.single_pass() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = shutdown.wait() => {
                    debug!("Interval sleep interrupted by shutdown");
                }
            }
        }

        report
    }
}
