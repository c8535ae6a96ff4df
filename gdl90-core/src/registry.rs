//! Message id lookup table and dispatch.
//!
//! The set of message kinds is closed: `MESSAGE_TABLE` lists every id the
//! crate understands with its minimum payload length and codec functions.
//! A `Registry` indexes a table for O(1) lookup and is passed explicitly to
//! each decode session, so independent streams never share mutable state.

use crate::decode;
use crate::encode;
use crate::types::*;

pub type DecodeFn = fn(&[u8]) -> Message;
pub type EncodeFn = fn(&Message) -> Result<Vec<u8>>;

#[derive(Debug)]
pub struct MessageKind {
    pub name: &'static str,
    /// Minimum payload length, excluding the message id byte.
    pub min_len: usize,
    pub decode: DecodeFn,
    pub encode: Option<EncodeFn>,
}

/// Known GDL-90 message kinds.
pub const MESSAGE_TABLE: &[(u8, MessageKind)] = &[
    (
        MSG_HEARTBEAT,
        MessageKind {
            name: "Heartbeat",
            min_len: decode::HEARTBEAT_LEN,
            decode: heartbeat_in,
            encode: Some(heartbeat_out),
        },
    ),
    (
        MSG_UPLINK,
        MessageKind {
            name: "Uplink data",
            min_len: decode::UPLINK_DATA_LEN,
            decode: uplink_in,
            encode: Some(uplink_out),
        },
    ),
    (
        MSG_HEIGHT_ABOVE_TERRAIN,
        MessageKind {
            name: "Height above terrain",
            min_len: decode::HEIGHT_ABOVE_TERRAIN_LEN,
            decode: height_above_terrain_in,
            encode: Some(height_above_terrain_out),
        },
    ),
    (
        MSG_OWNSHIP_REPORT,
        MessageKind {
            name: "Ownship report",
            min_len: decode::TRAFFIC_REPORT_LEN,
            decode: ownship_in,
            encode: Some(ownship_out),
        },
    ),
    (
        MSG_OWNSHIP_GEOMETRIC_ALTITUDE,
        MessageKind {
            name: "Ownship geometric altitude",
            min_len: decode::GEOMETRIC_ALTITUDE_LEN,
            decode: geometric_altitude_in,
            encode: Some(geometric_altitude_out),
        },
    ),
    (
        MSG_TRAFFIC_REPORT,
        MessageKind {
            name: "Traffic report",
            min_len: decode::TRAFFIC_REPORT_LEN,
            decode: traffic_in,
            encode: Some(traffic_out),
        },
    ),
    (
        MSG_BASIC_REPORT,
        MessageKind {
            name: "Basic UAT report",
            min_len: decode::BASIC_REPORT_LEN,
            decode: basic_report_in,
            encode: Some(basic_report_out),
        },
    ),
    (
        MSG_LONG_REPORT,
        MessageKind {
            name: "Long UAT report",
            min_len: decode::LONG_REPORT_LEN,
            decode: long_report_in,
            encode: Some(long_report_out),
        },
    ),
    (
        MSG_VENDOR_101,
        MessageKind {
            name: "Vendor GPS time / device ID",
            min_len: decode::GPS_TIME_LEN,
            decode: decode::decode_vendor_101,
            encode: Some(vendor_101_out),
        },
    ),
    (
        MSG_STRATUX_HEARTBEAT,
        MessageKind {
            name: "Stratux heartbeat",
            min_len: decode::STRATUX_HEARTBEAT_LEN,
            decode: stratux_heartbeat_in,
            encode: Some(stratux_heartbeat_out),
        },
    ),
];

/// Look up a message kind in the standard table.
pub fn message_kind(message_id: u8) -> Option<&'static MessageKind> {
    MESSAGE_TABLE
        .iter()
        .find(|(id, _)| *id == message_id)
        .map(|(_, kind)| kind)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable id -> codec mapping.
#[derive(Debug, Clone)]
pub struct Registry {
    kinds: [Option<&'static MessageKind>; 256],
}

impl Registry {
    /// Index an arbitrary table. Later entries win on duplicate ids.
    pub fn new(table: &'static [(u8, MessageKind)]) -> Self {
        let mut kinds = [None; 256];
        for (id, kind) in table {
            kinds[*id as usize] = Some(kind);
        }
        Registry { kinds }
    }

    /// Registry over every message kind this crate knows.
    pub fn standard() -> Self {
        Registry::new(MESSAGE_TABLE)
    }

    pub fn kind(&self, message_id: u8) -> Option<&'static MessageKind> {
        self.kinds[message_id as usize]
    }

    /// Human-readable name, `None` for unregistered ids.
    pub fn name(&self, message_id: u8) -> Option<&'static str> {
        self.kind(message_id).map(|k| k.name)
    }

    /// Decode a verified payload. Unregistered ids come back as
    /// `Message::Unrecognized`; short payloads are an error.
    pub fn decode(&self, message_id: u8, payload: &[u8]) -> Result<Message> {
        let Some(kind) = self.kind(message_id) else {
            return Ok(Message::Unrecognized(Unrecognized {
                message_id,
                payload: payload.to_vec(),
            }));
        };
        if payload.len() < kind.min_len {
            return Err(Gdl90Error::PayloadTooShort {
                message_id,
                expected: kind.min_len,
                actual: payload.len(),
            });
        }
        Ok((kind.decode)(payload))
    }

    /// Encode a record into its message id and payload bytes.
    pub fn encode(&self, message: &Message) -> Result<(u8, Vec<u8>)> {
        let message_id = message.message_id();
        if matches!(message, Message::Unrecognized(_)) {
            return Err(Gdl90Error::NoEncoder(message_id));
        }
        let encode = self
            .kind(message_id)
            .and_then(|k| k.encode)
            .ok_or(Gdl90Error::NoEncoder(message_id))?;
        Ok((message_id, encode(message)?))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::standard()
    }
}

// ---------------------------------------------------------------------------
// Table entries
// ---------------------------------------------------------------------------

fn heartbeat_in(p: &[u8]) -> Message {
    Message::Heartbeat(decode::decode_heartbeat(p))
}

fn uplink_in(p: &[u8]) -> Message {
    Message::Uplink(decode::decode_uplink(p))
}

fn height_above_terrain_in(p: &[u8]) -> Message {
    Message::HeightAboveTerrain(decode::decode_height_above_terrain(p))
}

fn ownship_in(p: &[u8]) -> Message {
    Message::OwnshipReport(decode::decode_traffic_report(p))
}

fn geometric_altitude_in(p: &[u8]) -> Message {
    Message::OwnshipGeometricAltitude(decode::decode_geometric_altitude(p))
}

fn traffic_in(p: &[u8]) -> Message {
    Message::TrafficReport(decode::decode_traffic_report(p))
}

fn basic_report_in(p: &[u8]) -> Message {
    Message::BasicReport(decode::decode_uat_report(p, decode::BASIC_REPORT_LEN))
}

fn long_report_in(p: &[u8]) -> Message {
    Message::LongReport(decode::decode_uat_report(p, decode::LONG_REPORT_LEN))
}

fn stratux_heartbeat_in(p: &[u8]) -> Message {
    Message::StratuxHeartbeat(decode::decode_stratux_heartbeat(p))
}

fn mismatch(message: &Message) -> Gdl90Error {
    Gdl90Error::NoEncoder(message.message_id())
}

fn heartbeat_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::Heartbeat(hb) => Ok(encode::encode_heartbeat(hb)),
        other => Err(mismatch(other)),
    }
}

fn uplink_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::Uplink(up) => encode::encode_uplink(up),
        other => Err(mismatch(other)),
    }
}

fn height_above_terrain_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::HeightAboveTerrain(h) => Ok(encode::encode_height_above_terrain(h)),
        other => Err(mismatch(other)),
    }
}

fn ownship_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::OwnshipReport(r) => encode::encode_traffic_report(r),
        other => Err(mismatch(other)),
    }
}

fn geometric_altitude_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::OwnshipGeometricAltitude(g) => Ok(encode::encode_geometric_altitude(g)),
        other => Err(mismatch(other)),
    }
}

fn traffic_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::TrafficReport(r) => encode::encode_traffic_report(r),
        other => Err(mismatch(other)),
    }
}

fn basic_report_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::BasicReport(r) => encode::encode_uat_report(r, crate::uat::ADSB_BASIC_LEN),
        other => Err(mismatch(other)),
    }
}

fn long_report_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::LongReport(r) => encode::encode_uat_report(r, crate::uat::ADSB_LONG_LEN),
        other => Err(mismatch(other)),
    }
}

fn vendor_101_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::GpsTime(t) => Ok(encode::encode_gps_time(t)),
        Message::ForeFlightId(id) => encode::encode_foreflight_id(id),
        other => Err(mismatch(other)),
    }
}

fn stratux_heartbeat_out(m: &Message) -> Result<Vec<u8>> {
    match m {
        Message::StratuxHeartbeat(hb) => Ok(encode::encode_stratux_heartbeat(hb)),
        other => Err(mismatch(other)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
