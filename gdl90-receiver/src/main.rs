//! gdl90-receiver: listen for GDL-90 datagrams (or read a capture file)
//! and print the decoded messages.

use std::io::{self, Write};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use clap::Parser;
use color_eyre::eyre::{bail, Error};
use tokio::io::AsyncReadExt;
use tokio::net::UdpSocket;
use tracing::{debug, info, Level};

use gdl90_core::config::{self, ReceiverSettings};
use gdl90_core::{Decoder, Registry, SessionConfig};

mod output;

use output::{OutputFormat, Renderer};

#[derive(Parser)]
#[command(name = "gdl90-receiver", version, about = "GDL-90 receiver and decoder")]
struct Cli {
    /// Receive port [default: from config, 43211]
    #[arg(short, long, env = "GDL90_PORT")]
    port: Option<u16>,

    /// Maximum packet size in bytes [default: from config, 9000]
    #[arg(short = 's', long)]
    maxsize: Option<usize>,

    /// Log a progress line after this many packets [default: from config, 100]
    #[arg(short, long)]
    reportcount: Option<u64>,

    /// Read from a capture file instead of the network
    #[arg(short, long)]
    inputfile: Option<PathBuf>,

    /// UTC starting date for the data, YYYY-MM-DD [default: today]
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Normal)]
    format: OutputFormat,

    /// Decode and print UAT payloads
    #[arg(long)]
    uat: bool,

    /// Listen on 255.255.255.255
    #[arg(long)]
    bcast: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let defaults = config::load_config()?.receiver;
    let settings = ReceiverSettings {
        port: cli.port.unwrap_or(defaults.port),
        maxsize: cli.maxsize.unwrap_or(defaults.maxsize),
        reportcount: cli.reportcount.unwrap_or(defaults.reportcount),
    };
    if settings.port == 0 {
        bail!("--port must be between 1 and 65535");
    }
    if settings.maxsize == 0 {
        bail!("--maxsize must be at least 1");
    }
    if settings.reportcount == 0 {
        bail!("--reportcount must be at least 1");
    }

    let session = SessionConfig {
        start_date: cli.date.unwrap_or_else(|| Utc::now().date_naive()),
        decode_uat: cli.uat,
        heartbeat_interval_secs: 1,
    };
    let mut receiver = Receiver::new(
        Decoder::new(Registry::standard(), session),
        Renderer::new(cli.format, cli.uat),
        settings.reportcount,
        io::stdout(),
    );

    match &cli.inputfile {
        Some(path) => receiver.run_file(path, settings.maxsize).await?,
        None => {
            let ip = if cli.bcast {
                Ipv4Addr::BROADCAST
            } else {
                Ipv4Addr::UNSPECIFIED
            };
            let addr = SocketAddr::from((ip, settings.port));
            receiver.run_udp(addr, settings.maxsize).await?;
        }
    }

    receiver.log_statistics();
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

/// Feeds packets to a decoding session and writes rendered lines.
struct Receiver<W: Write> {
    decoder: Decoder,
    renderer: Renderer,
    reportcount: u64,
    packets: u64,
    out: W,
}

impl<W: Write> Receiver<W> {
    fn new(decoder: Decoder, renderer: Renderer, reportcount: u64, out: W) -> Self {
        Receiver {
            decoder,
            renderer,
            reportcount,
            packets: 0,
            out,
        }
    }

    fn handle_packet(&mut self, data: &[u8], sender: &str) -> io::Result<()> {
        self.packets += 1;
        if self.packets % self.reportcount == 0 {
            info!(packets = self.packets, sender, "packets received");
        }

        // Discarded frames are logged by the decoder.
        for record in self.decoder.decode_stream(data).into_iter().flatten() {
            for line in self.renderer.render(&record) {
                writeln!(self.out, "{line}")?;
            }
        }
        self.out.flush()
    }

    async fn run_file(&mut self, path: &Path, maxsize: usize) -> io::Result<()> {
        let mut file = tokio::fs::File::open(path).await?;
        let sender = format!("file:{}", path.display());
        let mut buf = vec![0u8; maxsize];
        info!(path = %path.display(), "reading capture");

        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.handle_packet(&buf[..n], &sender)?;
        }
        Ok(())
    }

    async fn run_udp(&mut self, addr: SocketAddr, maxsize: usize) -> io::Result<()> {
        let socket = UdpSocket::bind(addr).await?;
        socket.set_broadcast(true)?;
        info!(%addr, "listening");

        let mut buf = vec![0u8; maxsize];
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                received = socket.recv_from(&mut buf) => {
                    let (n, src) = received?;
                    self.handle_packet(&buf[..n], &src.to_string())?;
                }
                _ = &mut ctrl_c => {
                    debug!("interrupted");
                    break;
                }
            }
        }
        Ok(())
    }

    fn log_statistics(&self) {
        let stats = self.decoder.stats();
        info!(
            packets = self.packets,
            frames = stats.frames,
            resyncs = stats.resyncs,
            clock = ?self.decoder.clock_state(),
            "statistics"
        );
        for (id, counts) in &stats.messages {
            info!(message_id = id, good = counts.good, bad = counts.bad, "message counts");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gdl90_core::hex_decode;

    fn receiver(format: OutputFormat) -> Receiver<Vec<u8>> {
        let session = SessionConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            decode_uat: false,
            heartbeat_interval_secs: 1,
        };
        Receiver::new(
            Decoder::new(Registry::standard(), session),
            Renderer::new(format, false),
            100,
            Vec::new(),
        )
    }

    fn output(r: &Receiver<Vec<u8>>) -> String {
        String::from_utf8(r.out.clone()).unwrap()
    }

    #[test]
    fn test_heartbeat_packet() {
        let mut r = receiver(OutputFormat::Normal);
        let packet = hex_decode("7E 00 81 41 DB D0 08 02 B3 8B 7E").unwrap();
        r.handle_packet(&packet, "test").unwrap();
        assert_eq!(output(&r), "MSG00: s1=81, s2=41, ts=d0db\n");
        assert_eq!(r.packets, 1);
    }

    #[test]
    fn test_frame_split_across_packets() {
        let mut r = receiver(OutputFormat::Normal);
        let packet = hex_decode("7E 00 81 41 DB D0 08 02 B3 8B 7E").unwrap();
        r.handle_packet(&packet[..5], "test").unwrap();
        assert_eq!(output(&r), "");
        r.handle_packet(&packet[5..], "test").unwrap();
        assert_eq!(output(&r), "MSG00: s1=81, s2=41, ts=d0db\n");
        assert_eq!(r.decoder.stats().frames, 1);
    }

    #[test]
    fn test_bad_checksum_prints_nothing() {
        let mut r = receiver(OutputFormat::Normal);
        let packet = hex_decode("7E 00 81 41 DB D0 08 02 B3 8C 7E").unwrap();
        r.handle_packet(&packet, "test").unwrap();
        assert_eq!(output(&r), "");
        assert_eq!(r.decoder.stats().messages[&0].bad, 1);
    }

    #[test]
    fn test_json_packet() {
        let mut r = receiver(OutputFormat::Json);
        let packet = hex_decode("7E 00 81 41 DB D0 08 02 B3 8B 7E").unwrap();
        r.handle_packet(&packet, "test").unwrap();
        let text = output(&r);
        let v: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(v["type"], "Heartbeat");
        assert_eq!(v["timestamp"], 0xD0DB);
    }

    #[tokio::test]
    async fn test_run_file_in_small_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdl90_cap.000");
        let mut data = hex_decode("7E 00 81 41 DB D0 08 02 B3 8B 7E").unwrap();
        data.extend(hex_decode("7E 00 81 41 DB D0 08 02 B3 8B 7E").unwrap());
        std::fs::write(&path, &data).unwrap();

        let mut r = receiver(OutputFormat::Normal);
        r.run_file(&path, 4).await.unwrap();
        assert_eq!(r.packets, 6);
        assert_eq!(output(&r).lines().count(), 2);
    }
}
