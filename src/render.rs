//! Snapshot rendering on a dedicated thread.
//!
//! Ingestion hands over owned [`BookSnapshot`]s through an unbounded channel
//! and never waits on output. The thread renders in FIFO order until it sees
//! [`RenderMessage::Shutdown`], so everything sent before shutdown is written.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, unbounded};
use log::{debug, error};

use crate::config::OutputFormat;
use crate::error::{Error, Result};
use crate::snapshot::BookSnapshot;

/// Messages understood by the render thread.
#[derive(Debug)]
pub enum RenderMessage {
    Snapshot(BookSnapshot),
    /// Stop after everything queued before it
    Shutdown,
}

/// Handle to the render thread.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) still
/// drains the queue and joins the thread.
pub struct SnapshotRenderer {
    tx: Sender<RenderMessage>,
    handle: Option<JoinHandle<io::Result<u64>>>,
}

impl SnapshotRenderer {
    /// Start the render thread writing to `out`.
    pub fn spawn<W>(out: W, format: OutputFormat) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = unbounded::<RenderMessage>();
        let handle = thread::Builder::new()
            .name("mdsim-render".into())
            .spawn(move || -> io::Result<u64> {
                let mut out = out;
                let mut rendered = 0u64;
                for msg in rx.iter() {
                    match msg {
                        RenderMessage::Snapshot(snapshot) => {
                            write_snapshot(&mut out, &snapshot, format)?;
                            rendered += 1;
                        }
                        RenderMessage::Shutdown => break,
                    }
                }
                out.flush()?;
                debug!("render thread done after {rendered} snapshot(s)");
                Ok(rendered)
            })?;

        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Queue a snapshot. Fails only if the render thread has stopped.
    pub fn send(&self, snapshot: BookSnapshot) -> Result<()> {
        self.tx
            .send(RenderMessage::Snapshot(snapshot))
            .map_err(|_| Error::Render("render thread is gone".into()))
    }

    /// Enqueue the shutdown sentinel and wait for the thread to drain.
    ///
    /// Returns the number of snapshots rendered.
    pub fn shutdown(mut self) -> Result<u64> {
        self.finish()
    }

    fn finish(&mut self) -> Result<u64> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        // The thread may already have exited on a write error
        let _ = self.tx.send(RenderMessage::Shutdown);
        match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Render("render thread panicked".into())),
        }
    }
}

impl Drop for SnapshotRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            error!("snapshot renderer: {e}");
        }
    }
}

fn write_snapshot<W: Write>(out: &mut W, snapshot: &BookSnapshot, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => write!(out, "{snapshot}"),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, snapshot)?;
            writeln!(out)
        }
    }
}
