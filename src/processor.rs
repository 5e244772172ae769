//! Consumer side: rebuild a book from a line stream.
//!
//! Lines are decoded and applied one at a time. Malformed or inconsistent
//! lines are counted in the book's [`Stats`] and skipped; only I/O and render
//! failures stop ingestion.

use std::fmt;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use serde::Serialize;

use crate::config::ProcessorConfig;
use crate::error::Result;
use crate::render::SnapshotRenderer;
use crate::stats::Stats;
use crate::OrderBook;

/// Outcome of a processing run.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessSummary {
    /// Lines read
    pub lines: u64,
    /// Lines counted as anomalies
    pub rejected: u64,
    /// Snapshots handed to the renderer
    pub snapshots: u64,
    /// Set when the stop flag ended the run
    pub stopped: bool,
    pub stats: Stats,
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} line(s), {} rejected, {} snapshot(s){}",
            self.lines,
            self.rejected,
            self.snapshots,
            if self.stopped { " (stopped)" } else { "" }
        )?;
        write!(f, "{}", self.stats)
    }
}

/// Ingestion loop feeding an [`OrderBook`] and an optional renderer.
pub struct Processor {
    book: OrderBook,
    renderer: Option<SnapshotRenderer>,
    snapshot_interval: u64,
    depth: usize,
    limit: Option<u64>,
    stop: Arc<AtomicBool>,
    lines: u64,
    rejected: u64,
    snapshots: u64,
}

impl Processor {
    pub fn new(config: &ProcessorConfig, renderer: Option<SnapshotRenderer>) -> Self {
        Self {
            book: OrderBook::new(),
            renderer,
            snapshot_interval: config.snapshot_interval.max(1),
            depth: config.depth,
            limit: None,
            stop: Arc::new(AtomicBool::new(false)),
            lines: 0,
            rejected: 0,
            snapshots: 0,
        }
    }

    /// Stop after this many lines.
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Share a stop flag; once set, ingestion ends before the next line.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// The flag [`run`](Self::run) checks between lines.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Ingest one line, rendering a snapshot every `snapshot_interval`
    /// lines.
    pub fn process_line(&mut self, line: &str) -> Result<()> {
        self.lines += 1;
        if let Err(anomaly) = self.book.process_line(line) {
            debug!("line {}: {anomaly}", self.lines);
            self.rejected += 1;
        }
        if self.lines % self.snapshot_interval == 0 {
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        if let Some(renderer) = &self.renderer {
            renderer.send(self.book.snapshot(self.depth).with_sequence(self.lines))?;
            self.snapshots += 1;
        }
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.lines >= limit)
    }

    /// Read lines until end of input, the limit, or the stop flag.
    ///
    /// The flag is polled once per line, after the line has been read. A read
    /// that blocks (an idle stdin, say) is not interrupted, so a stop takes
    /// effect when the next line or end of input arrives.
    ///
    /// Bytes that are not UTF-8 are replaced, so such a line is counted as
    /// malformed instead of ending the run.
    pub fn run<R: BufRead>(mut self, input: R) -> Result<ProcessSummary> {
        let mut stopped = false;
        for raw in input.split(b'\n') {
            if self.stop.load(Ordering::Acquire) {
                info!("stop requested after {} line(s)", self.lines);
                stopped = true;
                break;
            }
            if self.limit_reached() {
                break;
            }
            let raw = raw?;
            self.process_line(&String::from_utf8_lossy(&raw))?;
        }
        self.finish(stopped)
    }

    /// Render the final book if the last lines were not yet shown, drain the
    /// renderer, and report.
    pub fn finish(mut self, stopped: bool) -> Result<ProcessSummary> {
        if self.lines % self.snapshot_interval != 0 {
            self.render()?;
        }
        if let Some(renderer) = self.renderer.take() {
            renderer.shutdown()?;
        }

        let summary = ProcessSummary {
            lines: self.lines,
            rejected: self.rejected,
            snapshots: self.snapshots,
            stopped,
            stats: self.book.stats().clone(),
        };
        info!(
            "processed {} line(s), {} rejected, {} snapshot(s)",
            summary.lines, summary.rejected, summary.snapshots
        );
        Ok(summary)
    }
}
