//! Build GDL-90 payloads and complete frames from typed records.
//!
//! Payload builders mirror the decoders in `decode`. Values outside a
//! field's range are clamped; `None` writes the field's "no data" code.

use crate::decode::{
    ALTITUDE_INVALID, HEIGHT_ABOVE_TERRAIN_INVALID, HORIZONTAL_VELOCITY_INVALID,
    TIME_OF_RECEPTION_INVALID, VERTICAL_VELOCITY_INVALID, VFOM_INVALID,
};
use crate::frame;
use crate::registry::Registry;
use crate::types::*;

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Convert a scaled value to its integer field code, truncating toward zero.
/// Values within rounding noise of an integer snap to it, so decoded values
/// re-encode to the same code.
fn quantize(scaled: f64) -> i64 {
    let nearest = scaled.round();
    if (scaled - nearest).abs() < 1e-6 {
        nearest as i64
    } else {
        scaled.trunc() as i64
    }
}

fn push_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes()[1..]);
}

fn push_u24_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// 24-bit two's complement angle, clamped to `limit` degrees.
pub fn encode_angle(degrees: f64, limit: f64) -> u32 {
    let clamped = degrees.clamp(-limit, limit);
    let raw = quantize(clamped * 8_388_608.0 / 180.0).clamp(-0x80_0000, 0x7F_FFFF);
    (raw as i32 as u32) & 0xFF_FFFF
}

/// 12-bit altitude code, clamped to 0..=0xFFE.
pub fn encode_altitude(altitude_ft: Option<i32>) -> u16 {
    match altitude_ft {
        None => ALTITUDE_INVALID,
        Some(ft) => ((ft + 1000) / 25).clamp(0, 0xFFE) as u16,
    }
}

pub fn encode_horizontal_velocity(kts: Option<u16>) -> u16 {
    match kts {
        None => HORIZONTAL_VELOCITY_INVALID,
        Some(v) => v.min(0xFFE),
    }
}

/// 12-bit signed vertical velocity in 64 fpm units. Rates past
/// +/-32576 fpm map to the 0x1FE / 0xE02 limit codes.
pub fn encode_vertical_velocity(fpm: Option<i32>) -> u16 {
    match fpm {
        None => VERTICAL_VELOCITY_INVALID,
        Some(v) if v > 32_576 => 0x1FE,
        Some(v) if v < -32_576 => 0xE02,
        Some(v) => ((v / 64) as u16) & 0xFFF,
    }
}

pub fn encode_track(degrees: f64) -> u8 {
    quantize(degrees * 256.0 / 360.0).rem_euclid(256) as u8
}

fn time_of_reception(tor: Option<u32>) -> u32 {
    tor.map_or(TIME_OF_RECEPTION_INVALID, |t| t & 0xFF_FFFF)
}

/// Space-padded fixed-width ASCII field. Longer text is truncated.
fn ascii_field(out: &mut Vec<u8>, text: &str, width: usize, field: &'static str) -> Result<()> {
    if !text.is_ascii() {
        return Err(Gdl90Error::InvalidField {
            field,
            reason: format!("{text:?} is not ASCII"),
        });
    }
    let mut bytes: Vec<u8> = text.bytes().take(width).collect();
    bytes.resize(width, b' ');
    out.extend_from_slice(&bytes);
    Ok(())
}

fn exact_len(payload: &[u8], len: usize, field: &'static str) -> Result<()> {
    if payload.len() != len {
        return Err(Gdl90Error::InvalidField {
            field,
            reason: format!("expected {len} bytes, got {}", payload.len()),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn encode_heartbeat(hb: &Heartbeat) -> Vec<u8> {
    let s1 = (hb.gps_position_valid as u8) << 7
        | (hb.maintenance_required as u8) << 6
        | (hb.ident as u8) << 5
        | (hb.address_type as u8) << 4
        | (hb.gps_battery_low as u8) << 3
        | (hb.ratcs as u8) << 2
        | hb.uat_initialized as u8;
    let s2 = (((hb.timestamp >> 16) & 0x01) as u8) << 7
        | (hb.csa_requested as u8) << 6
        | (hb.csa_not_available as u8) << 5
        | hb.utc_ok as u8;
    let ts = (hb.timestamp & 0xFFFF) as u16;
    let counts = ((hb.uplink_count & 0x1F) as u16) << 11 | (hb.basic_long_count & 0x3FF);

    let mut out = vec![s1, s2];
    out.extend_from_slice(&ts.to_le_bytes());
    out.extend_from_slice(&counts.to_be_bytes());
    out
}

pub fn encode_uplink(up: &UplinkData) -> Result<Vec<u8>> {
    exact_len(&up.payload, crate::uat::UPLINK_LEN, "uplink payload")?;
    let mut out = Vec::with_capacity(3 + up.payload.len());
    push_u24_le(&mut out, time_of_reception(up.time_of_reception));
    out.extend_from_slice(&up.payload);
    Ok(out)
}

pub fn encode_height_above_terrain(hat: &HeightAboveTerrain) -> Vec<u8> {
    let raw = hat
        .height_ft
        .map_or(HEIGHT_ABOVE_TERRAIN_INVALID, |h| h as u16);
    raw.to_be_bytes().to_vec()
}

/// Shared ownship / traffic report layout.
pub fn encode_traffic_report(r: &TrafficReport) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(27);
    out.push((r.traffic_alert as u8) << 4 | r.address_type.to_nibble());
    push_u24(&mut out, r.address & 0xFF_FFFF);
    push_u24(&mut out, encode_angle(r.latitude, 90.0));
    push_u24(&mut out, encode_angle(r.longitude, 180.0));

    let altitude = encode_altitude(r.altitude_ft);
    out.push((altitude >> 4) as u8);
    out.push(((altitude & 0x0F) as u8) << 4 | r.misc.to_nibble());
    out.push((r.nic & 0x0F) << 4 | (r.nacp & 0x0F));

    let hvel = encode_horizontal_velocity(r.horizontal_velocity_kts);
    let vvel = encode_vertical_velocity(r.vertical_velocity_fpm);
    out.push((hvel >> 4) as u8);
    out.push(((hvel & 0x0F) as u8) << 4 | (vvel >> 8) as u8);
    out.push((vvel & 0xFF) as u8);

    out.push(encode_track(r.track_deg));
    out.push(r.emitter_category);
    ascii_field(&mut out, &r.callsign, 8, "callsign")?;
    out.push(r.emergency.to_nibble() << 4);
    Ok(out)
}

pub fn encode_geometric_altitude(g: &GeometricAltitude) -> Vec<u8> {
    let altitude = (g.altitude_ft / 5).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
    let vfom = g
        .vertical_figure_of_merit_m
        .map_or(VFOM_INVALID, |m| m.min(VFOM_INVALID - 1));
    let mut out = altitude.to_be_bytes().to_vec();
    out.push((g.vertical_warning as u8) << 7 | (vfom >> 8) as u8);
    out.push((vfom & 0xFF) as u8);
    out
}

pub fn encode_uat_report(r: &UatReport, payload_len: usize) -> Result<Vec<u8>> {
    exact_len(&r.payload, payload_len, "UAT report payload")?;
    let mut out = Vec::with_capacity(3 + payload_len);
    push_u24_le(&mut out, time_of_reception(r.time_of_reception));
    out.extend_from_slice(&r.payload);
    Ok(out)
}

pub fn encode_gps_time(t: &GpsTime) -> Vec<u8> {
    let quality = match t.waas {
        None => b'0',
        Some(false) => b'1',
        Some(true) => b'2',
    };
    let mut out = vec![t.firmware_version, 0x00, quality];
    push_u24_le(&mut out, t.count & 0xFF_FFFF);
    out.extend_from_slice(&[t.hour, t.minute, 0x00, 0x00, t.hardware_version]);
    out
}

pub fn encode_foreflight_id(id: &ForeFlightId) -> Result<Vec<u8>> {
    let mut out = vec![0x00, id.version];
    match &id.serial {
        Some(serial) => ascii_field(&mut out, serial, 8, "serial")?,
        None => out.extend_from_slice(&[0xFF; 8]),
    }
    ascii_field(&mut out, &id.name, 8, "name")?;
    ascii_field(&mut out, &id.long_name, 16, "long name")?;
    out.extend_from_slice(&id.capabilities.to_be_bytes());
    Ok(out)
}

pub fn encode_stratux_heartbeat(hb: &StratuxHeartbeat) -> Vec<u8> {
    vec![(hb.protocol_version & 0x3F) << 2 | (hb.gps_valid as u8) << 1 | hb.ahrs_valid as u8]
}

// ---------------------------------------------------------------------------
// Frame builder
// ---------------------------------------------------------------------------

/// Encode a record into a complete flagged, stuffed frame.
pub fn encode_record(registry: &Registry, message: &Message) -> Result<Vec<u8>> {
    let (message_id, payload) = registry.encode(message)?;
    Ok(frame::frame(message_id, &payload))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
