//! Raw capture recording.
//!
//! Every datagram is appended byte-for-byte to the next free
//! `<prefix>/gdl90_cap.NNN`, so a capture replays through the receiver
//! exactly as it arrived on the wire.

use std::fs::{self, File};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tracing::{debug, info};

const CAPTURE_BASE_NAME: &str = "gdl90_cap";
const MAX_CAPTURE_FILES: u32 = 1000;

/// First `gdl90_cap.NNN` in `dir` that doesn't exist yet.
pub fn next_file_name(dir: &Path) -> io::Result<PathBuf> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory {} does not exist", dir.display()),
        ));
    }
    (0..MAX_CAPTURE_FILES)
        .map(|i| dir.join(format!("{CAPTURE_BASE_NAME}.{i:03}")))
        .find(|path| !path.exists())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{MAX_CAPTURE_FILES} capture files already in {}", dir.display()),
            )
        })
}

/// Appends datagrams to a capture file created on first write.
pub struct CaptureWriter {
    path: PathBuf,
    file: Option<File>,
    flush_every: Duration,
    last_flush: Instant,
    packets: u64,
    bytes: u64,
}

impl CaptureWriter {
    pub fn new(path: PathBuf, flush_every: Duration) -> Self {
        CaptureWriter {
            path,
            file: None,
            flush_every,
            last_flush: Instant::now(),
            packets: 0,
            bytes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_at(data, Instant::now())
    }

    fn write_at(&mut self, data: &[u8], now: Instant) -> io::Result<()> {
        let file = match self.file.take() {
            Some(f) => f,
            None => {
                let f = fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&self.path)?;
                info!(path = %self.path.display(), "created capture file");
                f
            }
        };
        let file = self.file.insert(file);
        file.write_all(data)?;
        self.packets += 1;
        self.bytes += data.len() as u64;

        if now.duration_since(self.last_flush) > self.flush_every {
            file.flush()?;
            file.sync_all()?;
            self.last_flush = now;
            debug!("disk flush");
        }
        Ok(())
    }

    /// Flush and sync whatever has been written.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(file) = &mut self.file {
            file.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Record datagrams from `socket` until interrupted, optionally
/// rebroadcasting each one.
pub async fn record(
    socket: UdpSocket,
    writer: &mut CaptureWriter,
    maxsize: usize,
    rebroadcast: Option<SocketAddr>,
) -> io::Result<()> {
    let out = match rebroadcast {
        Some(_) => {
            let s = UdpSocket::bind(("0.0.0.0", 0)).await?;
            s.set_broadcast(true)?;
            Some(s)
        }
        None => None,
    };

    let mut buf = vec![0u8; maxsize];
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (n, _src) = received?;
                if let (Some(out), Some(dest)) = (&out, rebroadcast) {
                    out.send_to(&buf[..n], dest).await?;
                }
                writer.write(&buf[..n])?;
            }
            _ = &mut ctrl_c => break,
        }
    }
    writer.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
