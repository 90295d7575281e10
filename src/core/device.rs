//! Ownership of the single serial connection.
//!
//! A [`DeviceLink`] runs two dedicated threads around a blocking
//! `Read`/`Write` pair:
//!
//! - the reader frames incoming bytes and pushes [`Line`]s into a bounded
//!   channel handed out by [`DeviceLink::receive_lines`];
//! - the writer drains a bounded queue of framed commands, one at a time,
//!   so bytes of concurrent senders never interleave on the wire.
//!
//! Lifecycle: `Opening -> Open -> {Closed, Errored}`. There is no reconnect.

use crate::core::framing::{encode_line, Line, LineFramer};
use crate::domain::{
    config::{DeviceConfig, RelayTuning},
    error::{RelayError, RelayResult},
};
use crate::infrastructure::serial::open_port;
use serde::Serialize;
use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, trace, warn};

const READ_BUFFER_SIZE: usize = 1024;

/// Connection state of the device link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum LinkState {
    Opening,
    Open,
    Closed,
    Errored(String),
}

impl LinkState {
    pub fn is_open(&self) -> bool {
        matches!(self, LinkState::Open)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Opening => write!(f, "opening"),
            LinkState::Open => write!(f, "open"),
            LinkState::Closed => write!(f, "closed"),
            LinkState::Errored(reason) => write!(f, "errored: {}", reason),
        }
    }
}

struct WriteRequest {
    bytes: Vec<u8>,
    done: oneshot::Sender<RelayResult<()>>,
}

/// The one serial connection shared by every client
pub struct DeviceLink {
    name: String,
    state: Arc<watch::Sender<LinkState>>,
    writer: Option<mpsc::Sender<WriteRequest>>,
    lines: Mutex<Option<mpsc::Receiver<Line>>>,
    write_timeout: Duration,
}

impl DeviceLink {
    /// Open the configured serial port.
    ///
    /// Never fails: when the port cannot be opened the link is returned in
    /// the `Errored` state, sends fail fast and the line stream is empty.
    pub fn open(config: &DeviceConfig, tuning: &RelayTuning) -> Self {
        match open_port(config) {
            Ok((reader, writer)) => Self::from_io(&config.path, reader, writer, tuning),
            Err(e) => {
                error!("Serial port error: {}", e);
                warn!(
                    "Check that '{}' is the right port and that no other program is using it",
                    config.path
                );
                Self::unavailable(&config.path, e, tuning)
            }
        }
    }

    /// Build a link over an already opened byte stream
    pub fn from_io<R, W>(name: &str, reader: R, writer: W, tuning: &RelayTuning) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let state = Arc::new(watch::Sender::new(LinkState::Opening));
        let (line_tx, line_rx) = mpsc::channel(tuning.line_queue_capacity.max(1));
        let (write_tx, write_rx) = mpsc::channel(tuning.write_queue_capacity.max(1));

        let reader_state = Arc::clone(&state);
        let reader_name = name.to_string();
        let reader_spawned = thread::Builder::new()
            .name("device-reader".to_string())
            .spawn(move || read_loop(reader_name, reader, line_tx, reader_state));

        let writer_state = Arc::clone(&state);
        let writer_spawned = thread::Builder::new()
            .name("device-writer".to_string())
            .spawn(move || write_loop(writer, write_rx, writer_state));

        if let Err(e) = reader_spawned.and(writer_spawned) {
            let error = RelayError::DeviceOpen {
                path: name.to_string(),
                message: format!("Failed to spawn device thread: {}", e),
            };
            error!("{}", error);
            state.send_replace(LinkState::Errored(error.to_string()));
        } else {
            // The reader may already have hit end-of-stream on a short fake stream.
            state.send_if_modified(|current| {
                if *current == LinkState::Opening {
                    *current = LinkState::Open;
                    true
                } else {
                    false
                }
            });
            info!(device = %name, "Device link open");
        }

        Self {
            name: name.to_string(),
            state,
            writer: Some(write_tx),
            lines: Mutex::new(Some(line_rx)),
            write_timeout: tuning.write_timeout(),
        }
    }

    /// A link whose device could not be opened
    pub fn unavailable(name: &str, error: RelayError, tuning: &RelayTuning) -> Self {
        let (_, line_rx) = mpsc::channel(1);
        Self {
            name: name.to_string(),
            state: Arc::new(watch::Sender::new(LinkState::Errored(error.to_string()))),
            writer: None,
            lines: Mutex::new(Some(line_rx)),
            write_timeout: tuning.write_timeout(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LinkState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    /// Take the stream of lines framed from the device.
    ///
    /// The stream ends when the connection closes or fails. Only the first
    /// caller gets it.
    pub fn receive_lines(&self) -> Option<mpsc::Receiver<Line>> {
        self.lines.lock().ok()?.take()
    }

    /// Write one command to the device.
    ///
    /// Text that is empty after trimming writes nothing and succeeds. Waits at
    /// most the configured write timeout for the queue and the write itself.
    pub async fn send(&self, text: &str) -> RelayResult<()> {
        let Some(bytes) = encode_line(text) else {
            debug!("Ignoring empty command");
            return Ok(());
        };

        let current = self.state();
        if !current.is_open() {
            return Err(RelayError::DeviceNotOpen {
                state: current.to_string(),
            });
        }
        let writer = self.writer.as_ref().ok_or_else(|| RelayError::DeviceNotOpen {
            state: current.to_string(),
        })?;

        let (done_tx, done_rx) = oneshot::channel();
        let request = WriteRequest {
            bytes,
            done: done_tx,
        };

        let outcome = tokio::time::timeout(self.write_timeout, async {
            writer
                .send(request)
                .await
                .map_err(|_| RelayError::DeviceNotOpen {
                    state: self.state().to_string(),
                })?;
            done_rx.await.map_err(|_| RelayError::DeviceWrite {
                message: "Device writer stopped".to_string(),
            })?
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(device = %self.name, "Device write timed out after {:?}", self.write_timeout);
                Err(RelayError::Timeout)
            }
        }
    }

    /// Stop using the device; queued and future writes fail
    pub fn close(&self) {
        let changed = self.state.send_if_modified(|current| {
            if matches!(current, LinkState::Opening | LinkState::Open) {
                *current = LinkState::Closed;
                true
            } else {
                false
            }
        });
        if changed {
            info!(device = %self.name, "Device link closed");
        }
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        // Lets the reader thread exit at its next read timeout.
        self.close();
    }
}

fn read_loop<R: Read>(
    name: String,
    mut reader: R,
    lines: mpsc::Sender<Line>,
    state: Arc<watch::Sender<LinkState>>,
) {
    let mut framer = LineFramer::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        if *state.borrow() == LinkState::Closed {
            break;
        }

        match reader.read(&mut buffer) {
            Ok(0) => {
                info!(device = %name, "Device stream ended");
                if let Some(line) = framer.finish() {
                    let _ = lines.blocking_send(line);
                }
                state.send_if_modified(|current| {
                    if current.is_open() || *current == LinkState::Opening {
                        *current = LinkState::Closed;
                        true
                    } else {
                        false
                    }
                });
                break;
            }
            Ok(n) => {
                trace!(device = %name, bytes = n, raw = %hex::encode(&buffer[..n]), "Read chunk");
                for line in framer.push(&buffer[..n]) {
                    debug!("Device -> Relay: {}", line);
                    if lines.blocking_send(line).is_err() {
                        trace!("Line receiver dropped; discarding line");
                    }
                }
            }
            Err(ref e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                continue;
            }
            Err(e) => {
                let error = RelayError::DeviceRead {
                    message: e.to_string(),
                };
                error!(device = %name, "{}", error);
                state.send_replace(LinkState::Errored(error.to_string()));
                break;
            }
        }
    }
}

fn write_loop<W: Write>(
    mut writer: W,
    mut requests: mpsc::Receiver<WriteRequest>,
    state: Arc<watch::Sender<LinkState>>,
) {
    while let Some(request) = requests.blocking_recv() {
        let current = state.borrow().clone();
        let result = if current.is_open() {
            writer
                .write_all(&request.bytes)
                .and_then(|_| writer.flush())
                .map_err(|e| RelayError::DeviceWrite {
                    message: e.to_string(),
                })
        } else {
            Err(RelayError::DeviceNotOpen {
                state: current.to_string(),
            })
        };

        match &result {
            Ok(()) => debug!("Relay -> Device: {} bytes", request.bytes.len()),
            Err(e) => error!("Relay -> Device write failed: {}", e),
        }

        // The sender may have timed out and gone away.
        let _ = request.done.send(result);
    }
    debug!("Device writer stopped");
}
