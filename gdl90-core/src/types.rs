//! Shared types, error enum, and decoded message records for gdl90-core.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// All errors produced by gdl90-core.
#[derive(Debug, Error)]
pub enum Gdl90Error {
    #[error("framing error: {reason} ({} bytes discarded)", discarded.len())]
    Framing {
        reason: &'static str,
        discarded: Vec<u8>,
    },
    #[error(
        "checksum mismatch on message 0x{message_id:02X}: expected 0x{expected:04X}, got 0x{actual:04X}"
    )]
    ChecksumMismatch {
        message_id: u8,
        expected: u16,
        actual: u16,
        raw: Vec<u8>,
    },
    #[error("payload too short for message 0x{message_id:02X}: need {expected} bytes, got {actual}")]
    PayloadTooShort {
        message_id: u8,
        expected: usize,
        actual: usize,
    },
    #[error("no encoder registered for message 0x{0:02X}")]
    NoEncoder(u8),
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Gdl90Error>;

impl Gdl90Error {
    /// True for errors that only discard one frame of a live stream.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Gdl90Error::Framing { .. }
                | Gdl90Error::ChecksumMismatch { .. }
                | Gdl90Error::PayloadTooShort { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Participant address helpers
// ---------------------------------------------------------------------------

/// 24-bit participant address (ICAO or self-assigned).
pub type Address = u32;

/// Format a participant address as 6-char uppercase hex.
pub fn address_to_string(address: Address) -> String {
    format!("{:06X}", address & 0xFF_FFFF)
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, whitespace between
/// byte pairs is ignored.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for chunk in digits.chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

pub(crate) fn serialize_hex<S: Serializer>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex_encode(data))
}

// ---------------------------------------------------------------------------
// Field enums
// ---------------------------------------------------------------------------

/// Address type nibble of ownship and traffic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressType {
    AdsbIcao,
    AdsbSelfAssigned,
    TisbIcao,
    TisbTrackFile,
    SurfaceVehicle,
    GroundStationBeacon,
    Reserved(u8),
}

impl AddressType {
    pub fn from_nibble(n: u8) -> Self {
        match n & 0x0F {
            0 => AddressType::AdsbIcao,
            1 => AddressType::AdsbSelfAssigned,
            2 => AddressType::TisbIcao,
            3 => AddressType::TisbTrackFile,
            4 => AddressType::SurfaceVehicle,
            5 => AddressType::GroundStationBeacon,
            other => AddressType::Reserved(other),
        }
    }

    pub fn to_nibble(self) -> u8 {
        match self {
            AddressType::AdsbIcao => 0,
            AddressType::AdsbSelfAssigned => 1,
            AddressType::TisbIcao => 2,
            AddressType::TisbTrackFile => 3,
            AddressType::SurfaceVehicle => 4,
            AddressType::GroundStationBeacon => 5,
            AddressType::Reserved(n) => n & 0x0F,
        }
    }
}

/// Meaning of the track/heading byte (misc bits 1-0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackType {
    NotValid,
    TrueTrack,
    MagneticHeading,
    TrueHeading,
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackType::NotValid => write!(f, "invalid"),
            TrackType::TrueTrack => write!(f, "true track"),
            TrackType::MagneticHeading => write!(f, "magnetic heading"),
            TrackType::TrueHeading => write!(f, "true heading"),
        }
    }
}

/// Miscellaneous indicator nibble of ownship and traffic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MiscIndicators {
    pub track_type: TrackType,
    /// Report is extrapolated rather than updated.
    pub extrapolated: bool,
    pub airborne: bool,
}

impl MiscIndicators {
    pub fn from_nibble(n: u8) -> Self {
        let track_type = match n & 0x03 {
            0 => TrackType::NotValid,
            1 => TrackType::TrueTrack,
            2 => TrackType::MagneticHeading,
            _ => TrackType::TrueHeading,
        };
        MiscIndicators {
            track_type,
            extrapolated: n & 0x04 != 0,
            airborne: n & 0x08 != 0,
        }
    }

    pub fn to_nibble(self) -> u8 {
        let tt = match self.track_type {
            TrackType::NotValid => 0,
            TrackType::TrueTrack => 1,
            TrackType::MagneticHeading => 2,
            TrackType::TrueHeading => 3,
        };
        tt | (self.extrapolated as u8) << 2 | (self.airborne as u8) << 3
    }
}

impl Default for MiscIndicators {
    /// Airborne with a valid true track.
    fn default() -> Self {
        MiscIndicators::from_nibble(0b1001)
    }
}

/// Emergency/priority code nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmergencyCode {
    None,
    General,
    Medical,
    MinimumFuel,
    NoCommunication,
    UnlawfulInterference,
    Downed,
    Reserved(u8),
}

impl EmergencyCode {
    pub fn from_nibble(n: u8) -> Self {
        match n & 0x0F {
            0 => EmergencyCode::None,
            1 => EmergencyCode::General,
            2 => EmergencyCode::Medical,
            3 => EmergencyCode::MinimumFuel,
            4 => EmergencyCode::NoCommunication,
            5 => EmergencyCode::UnlawfulInterference,
            6 => EmergencyCode::Downed,
            other => EmergencyCode::Reserved(other),
        }
    }

    pub fn to_nibble(self) -> u8 {
        match self {
            EmergencyCode::None => 0,
            EmergencyCode::General => 1,
            EmergencyCode::Medical => 2,
            EmergencyCode::MinimumFuel => 3,
            EmergencyCode::NoCommunication => 4,
            EmergencyCode::UnlawfulInterference => 5,
            EmergencyCode::Downed => 6,
            EmergencyCode::Reserved(n) => n & 0x0F,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoded message types
// ---------------------------------------------------------------------------

/// Message 0x00: Heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heartbeat {
    pub gps_position_valid: bool,
    pub maintenance_required: bool,
    pub ident: bool,
    /// Ownship anonymous address in use.
    pub address_type: bool,
    pub gps_battery_low: bool,
    pub ratcs: bool,
    pub uat_initialized: bool,
    pub csa_requested: bool,
    pub csa_not_available: bool,
    pub utc_ok: bool,
    /// Seconds since 0000Z, 17 bits.
    pub timestamp: u32,
    /// UAT uplinks received in the previous second (5 bits).
    pub uplink_count: u8,
    /// Basic and long reports received in the previous second (10 bits).
    pub basic_long_count: u16,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Heartbeat {
            gps_position_valid: true,
            maintenance_required: false,
            ident: false,
            address_type: false,
            gps_battery_low: false,
            ratcs: false,
            uat_initialized: true,
            csa_requested: false,
            csa_not_available: false,
            utc_ok: true,
            timestamp: 0,
            uplink_count: 0,
            basic_long_count: 0,
        }
    }
}

/// Message 0x07: UAT uplink as received by the unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UplinkData {
    /// Time of reception in 100 ns units past the UTC second.
    pub time_of_reception: Option<u32>,
    /// 432-byte UAT uplink payload (8-byte header + application data).
    #[serde(serialize_with = "serialize_hex")]
    pub payload: Vec<u8>,
}

/// Message 0x09: Height above terrain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeightAboveTerrain {
    pub height_ft: Option<i16>,
}

/// Messages 0x0A and 0x14: ownship and traffic reports share one layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficReport {
    pub traffic_alert: bool,
    pub address_type: AddressType,
    pub address: Address,
    pub latitude: f64,
    pub longitude: f64,
    /// Pressure altitude, `None` when the field holds 0xFFF.
    pub altitude_ft: Option<i32>,
    pub misc: MiscIndicators,
    pub nic: u8,
    pub nacp: u8,
    /// Horizontal velocity, `None` when the field holds 0xFFF.
    pub horizontal_velocity_kts: Option<u16>,
    /// Vertical velocity, `None` when the field holds 0x800 or an unused code.
    pub vertical_velocity_fpm: Option<i32>,
    /// Track or heading in degrees, 360/256 resolution.
    pub track_deg: f64,
    pub emitter_category: u8,
    pub callsign: String,
    pub emergency: EmergencyCode,
}

impl Default for TrafficReport {
    fn default() -> Self {
        TrafficReport {
            traffic_alert: false,
            address_type: AddressType::AdsbIcao,
            address: 0,
            latitude: 0.0,
            longitude: 0.0,
            altitude_ft: None,
            misc: MiscIndicators::default(),
            nic: 11,
            nacp: 11,
            horizontal_velocity_kts: None,
            vertical_velocity_fpm: None,
            track_deg: 0.0,
            emitter_category: 1,
            callsign: String::new(),
            emergency: EmergencyCode::None,
        }
    }
}

impl TrafficReport {
    /// A zero position together with a NIC of 0 means no valid position.
    pub fn has_position(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0 && self.nic == 0)
    }
}

/// Message 0x0B: Ownship geometric altitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometricAltitude {
    /// Geometric altitude, 5 ft resolution.
    pub altitude_ft: i32,
    pub vertical_warning: bool,
    /// Vertical figure of merit in meters, `None` when 0x7FFF.
    pub vertical_figure_of_merit_m: Option<u16>,
}

/// Messages 0x1E and 0x1F: UAT ADS-B report passed through by the unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UatReport {
    pub time_of_reception: Option<u32>,
    /// 18 bytes (basic) or 34 bytes (long).
    #[serde(serialize_with = "serialize_hex")]
    pub payload: Vec<u8>,
}

/// Message 0x65 from Skyradar units: GPS hour and minute, no seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsTime {
    pub firmware_version: u8,
    /// `Some(true)` for a WAAS/DGPS fix, `Some(false)` for a regular fix.
    pub waas: Option<bool>,
    /// Three-byte little-endian message counter.
    pub count: u32,
    pub hour: u8,
    pub minute: u8,
    pub hardware_version: u8,
}

/// Message 0x65 sub-id 0: ForeFlight device identification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeFlightId {
    pub version: u8,
    /// `None` when the serial field is all 0xFF.
    pub serial: Option<String>,
    pub name: String,
    pub long_name: String,
    pub capabilities: u32,
}

/// Message 0xCC: Stratux heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratuxHeartbeat {
    pub ahrs_valid: bool,
    pub gps_valid: bool,
    pub protocol_version: u8,
}

/// A message id with no registered decoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unrecognized {
    pub message_id: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub payload: Vec<u8>,
}

/// Union type for all decoded messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Message {
    Heartbeat(Heartbeat),
    Uplink(UplinkData),
    HeightAboveTerrain(HeightAboveTerrain),
    OwnshipReport(TrafficReport),
    OwnshipGeometricAltitude(GeometricAltitude),
    TrafficReport(TrafficReport),
    BasicReport(UatReport),
    LongReport(UatReport),
    GpsTime(GpsTime),
    ForeFlightId(ForeFlightId),
    StratuxHeartbeat(StratuxHeartbeat),
    Unrecognized(Unrecognized),
}

impl Message {
    /// Wire message id of this record.
    pub fn message_id(&self) -> u8 {
        match self {
            Message::Heartbeat(_) => MSG_HEARTBEAT,
            Message::Uplink(_) => MSG_UPLINK,
            Message::HeightAboveTerrain(_) => MSG_HEIGHT_ABOVE_TERRAIN,
            Message::OwnshipReport(_) => MSG_OWNSHIP_REPORT,
            Message::OwnshipGeometricAltitude(_) => MSG_OWNSHIP_GEOMETRIC_ALTITUDE,
            Message::TrafficReport(_) => MSG_TRAFFIC_REPORT,
            Message::BasicReport(_) => MSG_BASIC_REPORT,
            Message::LongReport(_) => MSG_LONG_REPORT,
            Message::GpsTime(_) | Message::ForeFlightId(_) => MSG_VENDOR_101,
            Message::StratuxHeartbeat(_) => MSG_STRATUX_HEARTBEAT,
            Message::Unrecognized(m) => m.message_id,
        }
    }
}

pub const MSG_HEARTBEAT: u8 = 0x00;
pub const MSG_UPLINK: u8 = 0x07;
pub const MSG_HEIGHT_ABOVE_TERRAIN: u8 = 0x09;
pub const MSG_OWNSHIP_REPORT: u8 = 0x0A;
pub const MSG_OWNSHIP_GEOMETRIC_ALTITUDE: u8 = 0x0B;
pub const MSG_TRAFFIC_REPORT: u8 = 0x14;
pub const MSG_BASIC_REPORT: u8 = 0x1E;
pub const MSG_LONG_REPORT: u8 = 0x1F;
pub const MSG_VENDOR_101: u8 = 0x65;
pub const MSG_STRATUX_HEARTBEAT: u8 = 0xCC;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
