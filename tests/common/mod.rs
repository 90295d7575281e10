// Shared fakes for integration tests
#![allow(dead_code)]

use serial_relay::core::{ClientRegistry, DeviceLink, Relay};
use serial_relay::domain::config::RelayTuning;
use serial_relay::RelayServer;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blocking reader fed chunk by chunk; end-of-stream once the sender is dropped
pub struct ChunkReader(std_mpsc::Receiver<Vec<u8>>);

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.0.recv() {
            Ok(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(_) => Ok(0),
        }
    }
}

/// Records everything written to the device; can fail on demand
#[derive(Clone, Default)]
pub struct RecordingWriter {
    written: Arc<Mutex<Vec<u8>>>,
    failures: Arc<AtomicUsize>,
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A fake microcontroller on the other end of a [`DeviceLink`]
pub struct FakeDevice {
    chunks: Option<std_mpsc::Sender<Vec<u8>>>,
    writer: RecordingWriter,
}

impl FakeDevice {
    pub fn link(tuning: &RelayTuning) -> (Self, DeviceLink) {
        let (chunk_tx, chunk_rx) = std_mpsc::channel();
        let writer = RecordingWriter::default();
        let link = DeviceLink::from_io("fake-mcu", ChunkReader(chunk_rx), writer.clone(), tuning);
        (
            Self {
                chunks: Some(chunk_tx),
                writer,
            },
            link,
        )
    }

    /// Emit raw bytes as if the device printed them
    pub fn emit(&self, bytes: &[u8]) {
        if let Some(chunks) = &self.chunks {
            chunks.send(bytes.to_vec()).unwrap();
        }
    }

    /// Simulate the device going away
    pub fn unplug(&mut self) {
        self.chunks = None;
    }

    /// Fail the next `count` writes
    pub fn fail_writes(&self, count: usize) {
        self.writer.failures.store(count, Ordering::SeqCst);
    }

    pub fn written(&self) -> Vec<u8> {
        self.writer.written.lock().unwrap().clone()
    }

    /// Wait until at least `len` bytes were written
    pub async fn wait_written(&self, len: usize) -> Vec<u8> {
        eventually(|| self.written().len() >= len).await;
        self.written()
    }
}

/// Relay wired to a fake device
pub fn fake_relay() -> (FakeDevice, Relay) {
    let tuning = RelayTuning::default();
    let (device, link) = FakeDevice::link(&tuning);
    let registry = ClientRegistry::new(tuning.client_queue_capacity);
    (device, Relay::new(Arc::new(link), Arc::new(registry)))
}

/// Started server on an ephemeral local port
pub async fn serve(relay: Relay) -> RelayServer {
    let mut server = RelayServer::bind("127.0.0.1:0", relay).await.unwrap();
    server.start().await.unwrap();
    server
}

/// Poll `check` until it holds, panicking after two seconds
pub async fn eventually<F: FnMut() -> bool>(mut check: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Wait until the registry holds exactly `count` clients
pub async fn wait_for_clients(relay: &Relay, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while relay.registry().len().await != count {
        assert!(
            tokio::time::Instant::now() < deadline,
            "expected {} clients",
            count
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
