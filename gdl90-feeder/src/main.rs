//! gdl90-feeder: record, replay and simulate GDL-90 UDP streams.
//!
//! - `record`:   write every received datagram to `gdl90_cap.NNN`
//! - `send`:     replay a capture as fixed-size datagrams
//! - `simulate`: act like a Skyradar or Stratux unit flying a circle

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Error};
use tokio::net::{lookup_host, UdpSocket};
use tracing::{info, Level};

use gdl90_core::config;

mod capture;
mod send;
mod simulate;

use capture::CaptureWriter;
use simulate::{SimulationSettings, Simulator, Unit};

#[derive(Parser)]
#[command(
    name = "gdl90-feeder",
    version,
    about = "GDL-90 capture, replay and simulation"
)]
struct Cli {
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record raw datagrams to the next free gdl90_cap.NNN
    Record {
        /// Receive port [default: from config, 43211]
        #[arg(short, long)]
        port: Option<u16>,

        /// Maximum packet size [default: from config, 1500]
        #[arg(short = 's', long)]
        maxsize: Option<usize>,

        /// Seconds between capture file flushes [default: from config, 10]
        #[arg(long)]
        dataflush: Option<u64>,

        /// Directory for capture files [default: from config, .]
        #[arg(long)]
        logprefix: Option<PathBuf>,

        /// Also forward every datagram to this address
        #[arg(long)]
        rebroadcast: Option<SocketAddr>,

        /// Listen on 255.255.255.255
        #[arg(long)]
        bcast: bool,
    },

    /// Replay a capture file as UDP datagrams
    Send {
        /// Capture file; stdin when omitted
        file: Option<PathBuf>,

        /// Destination IP [default: from config, 255.255.255.255]
        #[arg(short, long, env = "SEND_ADDR")]
        dest: Option<String>,

        /// Destination port [default: from config, 43211]
        #[arg(short, long)]
        port: Option<u16>,

        /// Bytes per datagram [default: from config, 50]
        #[arg(short, long)]
        size: Option<usize>,

        /// Milliseconds between datagrams [default: from config, 10]
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Simulate a GDL-90 unit
    Simulate {
        /// Destination hosts
        #[arg(required = true)]
        hosts: Vec<String>,

        /// Unit personality
        #[arg(long, value_enum, default_value_t = Unit::Stratux)]
        unit: Unit,

        /// Destination port [default: the unit's client port]
        #[arg(short, long)]
        port: Option<u16>,

        /// Path center latitude
        #[arg(long, allow_hyphen_values = true, default_value_t = SimulationSettings::default().center_lat)]
        latitude: f64,

        /// Path center longitude
        #[arg(long, allow_hyphen_values = true, default_value_t = SimulationSettings::default().center_lon)]
        longitude: f64,

        /// Path radius in degrees
        #[arg(long, default_value_t = 0.25)]
        radius: f64,

        /// Start angle in degrees
        #[arg(long, default_value_t = 0.0)]
        angle: f64,

        /// Mean ownship altitude in feet
        #[arg(long, default_value_t = 3500)]
        altitude: i32,

        /// Ownship altitude swing in feet
        #[arg(long, default_value_t = 1500)]
        altitude_delta: i32,

        #[arg(long, default_value = "N12345")]
        callsign: String,

        /// Number of traffic targets
        #[arg(long, default_value_t = 12)]
        bandits: usize,

        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_config()?;

    match cli.command {
        Commands::Record {
            port,
            maxsize,
            dataflush,
            logprefix,
            rebroadcast,
            bcast,
        } => {
            let defaults = config.recorder;
            let port = check_port(port.unwrap_or(defaults.port))?;
            let maxsize = maxsize.unwrap_or(defaults.maxsize);
            let dataflush = dataflush.unwrap_or(defaults.dataflush);
            let logprefix = logprefix.unwrap_or_else(|| PathBuf::from(defaults.logprefix));
            cmd_record(port, maxsize, dataflush, logprefix, rebroadcast, bcast).await
        }
        Commands::Send {
            file,
            dest,
            port,
            size,
            delay,
        } => {
            let defaults = config.sender;
            let port = check_port(port.unwrap_or(defaults.port))?;
            let size = size.unwrap_or(defaults.size);
            if size == 0 {
                bail!("--size must be greater than 0");
            }
            let dest = dest.unwrap_or(defaults.dest);
            let delay = Duration::from_millis(delay.unwrap_or(defaults.delay_ms));
            cmd_send(file, &dest, port, size, delay).await
        }
        Commands::Simulate {
            hosts,
            unit,
            port,
            latitude,
            longitude,
            radius,
            angle,
            altitude,
            altitude_delta,
            callsign,
            bandits,
            seconds,
        } => {
            let port = check_port(port.unwrap_or(unit.client_port()))?;
            let settings = SimulationSettings {
                unit,
                center_lat: latitude,
                center_lon: longitude,
                radius,
                start_angle: angle,
                altitude_mean: altitude,
                altitude_delta,
                callsign,
                bandits,
            };
            cmd_simulate(settings, &hosts, port, seconds).await
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn check_port(port: u16) -> Result<u16, Error> {
    if port == 0 {
        bail!("--port must be between 1 and 65535");
    }
    Ok(port)
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, Error> {
    lookup_host((host, port))
        .await?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| eyre!("no IPv4 address for {host}"))
}

async fn cmd_record(
    port: u16,
    maxsize: usize,
    dataflush: u64,
    logprefix: PathBuf,
    rebroadcast: Option<SocketAddr>,
    bcast: bool,
) -> Result<(), Error> {
    let path = capture::next_file_name(&logprefix)?;
    info!(path = %path.display(), "capture file");

    let ip = if bcast {
        Ipv4Addr::BROADCAST
    } else {
        Ipv4Addr::UNSPECIFIED
    };
    let socket = UdpSocket::bind((ip, port)).await?;
    socket.set_broadcast(true)?;
    info!(addr = %socket.local_addr()?, ?rebroadcast, "listening");

    let mut writer = CaptureWriter::new(path, Duration::from_secs(dataflush));
    capture::record(socket, &mut writer, maxsize, rebroadcast).await?;

    println!(
        "Recorded {} packets and {} bytes to {}.",
        writer.packets(),
        writer.bytes(),
        writer.path().display()
    );
    Ok(())
}

async fn cmd_send(
    file: Option<PathBuf>,
    dest: &str,
    port: u16,
    size: usize,
    delay: Duration,
) -> Result<(), Error> {
    let dest = resolve(dest, port).await?;
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;
    info!(%dest, size, ?delay, "sending");

    let totals = match &file {
        Some(path) => {
            let f = tokio::fs::File::open(path).await?;
            send::send_capture(f, &socket, dest, size, delay).await?
        }
        None => send::send_capture(tokio::io::stdin(), &socket, dest, size, delay).await?,
    };

    println!("Sent {} packets and {} bytes.", totals.packets, totals.bytes);
    Ok(())
}

async fn cmd_simulate(
    settings: SimulationSettings,
    hosts: &[String],
    port: u16,
    seconds: Option<u64>,
) -> Result<(), Error> {
    let mut dests = Vec::with_capacity(hosts.len());
    for host in hosts {
        dests.push(resolve(host, port).await?);
    }
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;

    println!("Simulating {} UAT.", settings.unit.name());
    println!("Transmitting to:");
    for dest in &dests {
        println!("    {dest}");
    }

    let mut simulator = Simulator::new(settings, &mut rand::rng());
    let sent = simulate::run(&mut simulator, &socket, &dests, seconds).await?;
    info!(packets = sent, uptime = simulator.uptime(), "simulation stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
