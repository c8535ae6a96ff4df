//! Synthetic GDL-90 unit.
//!
//! Once per second the simulator emits a burst shaped like a real unit:
//! heartbeat, ownship report and geometric altitude on a circular path,
//! one traffic report per aircraft, then the vendor identification
//! message for the selected unit type.

use std::f64::consts::PI;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use clap::ValueEnum;
use rand::Rng;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use gdl90_core::{
    encode_record, ForeFlightId, GeometricAltitude, GpsTime, Heartbeat, Message, Registry,
    Result, StratuxHeartbeat, TrafficReport,
};

const RADIANS_TO_NM: f64 = 180.0 * 60.0 / PI;
/// Seconds per radian of the ownship altitude sine wave.
const ALTITUDE_PERIOD_DIV: f64 = 30.0;

const OWNSHIP_ANGULAR_VELOCITY: f64 = 0.667;
const BANDIT_ANGULAR_VELOCITY: f64 = -0.333;
const BANDIT_ALTITUDE: i32 = 4000;
const BANDIT_ALTITUDE_DELTA: i32 = 2000;
const BANDIT_PREFIX: &str = "BNDT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Unit {
    Skyradar,
    Stratux,
}

impl Unit {
    pub fn name(self) -> &'static str {
        match self {
            Unit::Skyradar => "Skyradar",
            Unit::Stratux => "Stratux",
        }
    }

    /// Port the unit's client applications listen on.
    pub fn client_port(self) -> u16 {
        match self {
            Unit::Skyradar => 43211,
            Unit::Stratux => 4000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub unit: Unit,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Path radius in degrees.
    pub radius: f64,
    pub start_angle: f64,
    pub altitude_mean: i32,
    pub altitude_delta: i32,
    pub callsign: String,
    pub bandits: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            unit: Unit::Stratux,
            center_lat: 30.4564472222222,
            center_lon: -98.2941888888889,
            radius: 0.25,
            start_angle: 0.0,
            altitude_mean: 3500,
            altitude_delta: 1500,
            callsign: "N12345".into(),
            bandits: 12,
        }
    }
}

/// Position and motion at one instant on the circular path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub hvel_kts: u16,
    pub vvel_fpm: i32,
    pub altitude_ft: i32,
    pub track_deg: f64,
}

/// Great-circle distance in nm between two nearby points (haversine).
pub fn distance_short(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let (lat0, lat1) = (lat0.to_radians(), lat1.to_radians());
    let (lon0, lon1) = (-lon0.to_radians(), -lon1.to_radians());
    let a = ((lat0 - lat1) / 2.0).sin().powi(2)
        + lat0.cos() * lat1.cos() * ((lon0 - lon1) / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * RADIANS_TO_NM
}

/// Where an aircraft on the circle is `simtime` seconds in.
///
/// Positive angular velocity flies the circle one way, negative the other;
/// speed and vertical rate come from the difference to the next second.
pub fn calculate_position(
    simtime: f64,
    start_angle: f64,
    angular_velocity: f64,
    center: (f64, f64),
    radius: f64,
    altitude_mean: i32,
    altitude_delta: i32,
) -> PathPoint {
    let at = |angle: f64| {
        let rad = angle.to_radians();
        (center.0 - radius * rad.sin(), center.1 + radius * rad.cos())
    };
    let altitude = |t: f64| {
        (altitude_mean as f64 + altitude_delta as f64 / 2.0 * (t / ALTITUDE_PERIOD_DIV).sin())
            as i32
    };

    let angle = (start_angle + angular_velocity * simtime).rem_euclid(360.0);
    let next_angle = (angle + angular_velocity).rem_euclid(360.0);
    let (lat, lon) = at(angle);
    let (next_lat, next_lon) = at(next_angle);

    let altitude_ft = altitude(simtime);
    let vvel_fpm = (altitude(simtime + 1.0) - altitude_ft) * 60;

    let track_deg = if angular_velocity < 0.0 {
        (360.0 - (-angle).rem_euclid(360.0).trunc()).rem_euclid(360.0)
    } else {
        (180.0 + angle).rem_euclid(360.0).trunc()
    };

    PathPoint {
        latitude: lat,
        longitude: lon,
        hvel_kts: (3600.0 * distance_short(lat, lon, next_lat, next_lon)) as u16,
        vvel_fpm,
        altitude_ft,
        track_deg,
    }
}

#[derive(Debug, Clone)]
struct Aircraft {
    callsign: String,
    address: u32,
    /// Constant altitude reported in the aircraft's traffic report.
    altitude_ft: i32,
    start_angle: f64,
    angular_velocity: f64,
    emitter_category: u8,
}

/// Builds one burst of frames per simulated second.
pub struct Simulator {
    settings: SimulationSettings,
    registry: Registry,
    ownship: Aircraft,
    bandits: Vec<Aircraft>,
    uptime: u64,
    packets: u64,
}

impl Simulator {
    pub fn new<R: Rng>(settings: SimulationSettings, rng: &mut R) -> Self {
        let start = calculate_position(
            0.0,
            settings.start_angle,
            OWNSHIP_ANGULAR_VELOCITY,
            (settings.center_lat, settings.center_lon),
            settings.radius,
            settings.altitude_mean,
            settings.altitude_delta,
        );
        let ownship = Aircraft {
            callsign: settings.callsign.clone(),
            address: rng.random_range(0..1 << 24),
            altitude_ft: start.altitude_ft,
            start_angle: settings.start_angle,
            angular_velocity: OWNSHIP_ANGULAR_VELOCITY,
            emitter_category: 1,
        };

        let spacing = 360.0 / settings.bandits.max(1) as f64;
        let low = BANDIT_ALTITUDE - BANDIT_ALTITUDE_DELTA / 2;
        let high = BANDIT_ALTITUDE + BANDIT_ALTITUDE_DELTA / 2;
        let bandits = (0..settings.bandits)
            .map(|n| Aircraft {
                callsign: format!("{BANDIT_PREFIX}{n}"),
                address: rng.random_range(0..1 << 24),
                altitude_ft: rng.random_range(low..=high),
                start_angle: settings.start_angle + 45.0 + spacing * n as f64,
                angular_velocity: BANDIT_ANGULAR_VELOCITY,
                // 1 light through 7 rotorcraft
                emitter_category: rng.random_range(1..=7),
            })
            .collect();

        Simulator {
            settings,
            registry: Registry::standard(),
            ownship,
            bandits,
            uptime: 0,
            packets: 0,
        }
    }

    pub fn uptime(&self) -> u64 {
        self.uptime
    }

    /// Frames for the next simulated second, stamped with `now`.
    pub fn burst(&mut self, now: DateTime<Utc>) -> Result<Vec<Vec<u8>>> {
        let simtime = self.uptime as f64;
        let mut messages = vec![Message::Heartbeat(Heartbeat {
            timestamp: now.num_seconds_from_midnight(),
            ..Heartbeat::default()
        })];

        if self.settings.unit == Unit::Stratux {
            messages.push(Message::StratuxHeartbeat(StratuxHeartbeat {
                ahrs_valid: false,
                gps_valid: true,
                protocol_version: 1,
            }));
        }

        let own = self.position(&self.ownship, simtime);
        messages.push(Message::OwnshipReport(self.report(
            &self.ownship,
            &own,
            own.altitude_ft,
            own.vvel_fpm,
        )));
        messages.push(Message::OwnshipGeometricAltitude(GeometricAltitude {
            altitude_ft: own.altitude_ft,
            vertical_warning: false,
            vertical_figure_of_merit_m: Some(10),
        }));

        // The unit hears its own transponder as traffic too.
        for ac in std::iter::once(&self.ownship).chain(&self.bandits) {
            let p = self.position(ac, simtime);
            messages.push(Message::TrafficReport(self.report(ac, &p, ac.altitude_ft, 0)));
        }

        match self.settings.unit {
            Unit::Skyradar => messages.push(Message::GpsTime(GpsTime {
                firmware_version: 0x2A,
                waas: Some(true),
                count: (self.packets + messages.len() as u64) as u32 & 0xFF_FFFF,
                hour: now.hour() as u8,
                minute: now.minute() as u8,
                hardware_version: 4,
            })),
            Unit::Stratux => messages.push(Message::ForeFlightId(ForeFlightId {
                version: 1,
                serial: Some("12345678".into()),
                name: self.settings.unit.name().into(),
                long_name: "gdl90-feeder".into(),
                capabilities: 1,
            })),
        }

        let frames = messages
            .iter()
            .map(|m| encode_record(&self.registry, m))
            .collect::<Result<Vec<_>>>()?;

        self.uptime += 1;
        self.packets += frames.len() as u64;
        if self.uptime % 10 == 0 {
            info!(
                uptime = self.uptime,
                lat = own.latitude,
                lon = own.longitude,
                altitude = own.altitude_ft,
                track = own.track_deg,
                "ownship"
            );
        }
        Ok(frames)
    }

    fn position(&self, ac: &Aircraft, simtime: f64) -> PathPoint {
        calculate_position(
            simtime,
            ac.start_angle,
            ac.angular_velocity,
            (self.settings.center_lat, self.settings.center_lon),
            self.settings.radius,
            self.settings.altitude_mean,
            self.settings.altitude_delta,
        )
    }

    fn report(&self, ac: &Aircraft, p: &PathPoint, altitude_ft: i32, vvel_fpm: i32) -> TrafficReport {
        TrafficReport {
            address: ac.address,
            latitude: p.latitude,
            longitude: p.longitude,
            altitude_ft: Some(altitude_ft),
            horizontal_velocity_kts: Some(p.hvel_kts),
            vertical_velocity_fpm: Some(vvel_fpm),
            track_deg: p.track_deg,
            emitter_category: ac.emitter_category,
            callsign: ac.callsign.clone(),
            ..TrafficReport::default()
        }
    }
}

/// Send one burst per second to every destination until interrupted or
/// `seconds` bursts have gone out.
pub async fn run(
    simulator: &mut Simulator,
    socket: &UdpSocket,
    dests: &[SocketAddr],
    seconds: Option<u64>,
) -> io::Result<u64> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut sent = 0u64;

    while seconds.map_or(true, |limit| simulator.uptime() < limit) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => break,
        }
        let frames = simulator
            .burst(Utc::now())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        for frame in &frames {
            for dest in dests {
                socket.send_to(frame, dest).await?;
                sent += 1;
            }
        }
        debug!(frames = frames.len(), "burst sent");
    }
    Ok(sent)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
