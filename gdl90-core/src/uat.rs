//! Decode the UAT payloads carried inside GDL-90 messages.
//!
//! - Basic (0x1E) and long (0x1F) reports carry a UAT ADS-B payload:
//!   header, state vector, mode status (types 1 and 3) and auxiliary
//!   state vector (types 1, 2, 5, 6).
//! - Uplink data (0x07) carries a ground-station header followed by
//!   information frames. Type-0 frames hold FIS-B APDUs; text products
//!   are DLAC encoded.

use serde::Serialize;

use crate::types::{serialize_hex, Address, Gdl90Error, Result, MSG_BASIC_REPORT, MSG_UPLINK};

pub const ADSB_BASIC_LEN: usize = 18;
pub const ADSB_LONG_LEN: usize = 34;
pub const UPLINK_HEADER_LEN: usize = 8;
pub const UPLINK_DATA_LEN: usize = 424;
pub const UPLINK_LEN: usize = UPLINK_HEADER_LEN + UPLINK_DATA_LEN;

/// FIS-B products whose APDU payload is DLAC text.
pub const TEXT_PRODUCTS: [u16; 5] = [8, 11, 12, 13, 413];

const BASE40_ALPHABET: &[u8; 40] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ  ..";

// ---------------------------------------------------------------------------
// Decoded structures
// ---------------------------------------------------------------------------

/// UAT content attached to uplink, basic and long report messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum UatPayload {
    Adsb(AdsbPayload),
    Uplink(UplinkPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdsbPayload {
    pub header: AdsbHeader,
    pub state: Option<StateVector>,
    pub mode_status: Option<ModeStatus>,
    pub aux_state: Option<AuxStateVector>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdsbHeader {
    pub payload_type: u8,
    pub address_qualifier: u8,
    pub address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AltitudeSource {
    Barometric,
    Geometric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirGroundState {
    AirborneSubsonic,
    AirborneSupersonic,
    Ground,
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateVector {
    /// `None` when latitude, longitude and NIC are all zero.
    pub position: Option<(f64, f64)>,
    pub altitude_ft: Option<i32>,
    pub altitude_source: AltitudeSource,
    pub nic: u8,
    pub air_ground: AirGroundState,
    /// Airborne only. Positive is north.
    pub north_velocity_kts: Option<i32>,
    /// Airborne only. Positive is east.
    pub east_velocity_kts: Option<i32>,
    pub vertical_rate_fpm: Option<i32>,
    pub vertical_rate_source: Option<AltitudeSource>,
    /// Ground only.
    pub ground_speed_kts: Option<u16>,
    /// Ground only, 360/512 degree resolution.
    pub track_deg: Option<f64>,
    pub track_type: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeStatus {
    pub emitter_category: u8,
    pub callsign: String,
    /// True when `callsign` holds a flight id, false for a squawk.
    pub callsign_is_flight_id: bool,
    pub emergency: u8,
    pub uat_version: u8,
    pub sil: u8,
    pub nacp: u8,
    pub nacv: u8,
    pub nic_baro: bool,
    pub has_cdti: bool,
    pub has_acas: bool,
    pub ra_active: bool,
    pub ident_active: bool,
    pub atc_services: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuxStateVector {
    /// Altitude of the other type than the state vector's primary altitude.
    pub secondary_altitude_ft: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UplinkPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub position_valid: bool,
    pub utc_coupled: bool,
    pub app_data_valid: bool,
    pub slot_id: u8,
    pub tisb_site_id: u8,
    pub frames: Vec<InfoFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoFrame {
    pub frame_type: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
    /// Present for type-0 frames long enough to hold an APDU header.
    pub apdu: Option<Apdu>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Apdu {
    pub product_id: u16,
    pub hours: u8,
    pub minutes: u8,
    /// Decoded DLAC text for text products.
    pub text: Option<String>,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Shared field helpers
// ---------------------------------------------------------------------------

/// Scale 24-bit UAT angles to degrees, folding into +/-90 and +/-180.
fn uat_position(raw_lat: u32, raw_lon: u32) -> (f64, f64) {
    let mut lat = raw_lat as f64 * 360.0 / 16_777_216.0;
    if lat > 90.0 {
        lat -= 180.0;
    }
    let mut lon = raw_lon as f64 * 360.0 / 16_777_216.0;
    if lon > 180.0 {
        lon -= 360.0;
    }
    (lat, lon)
}

/// Raw lat/lon packed across 6 bytes (state vector and uplink header).
fn unpack_lat_lon(b: &[u8]) -> (u32, u32) {
    let raw_lat = (b[0] as u32) << 15 | (b[1] as u32) << 7 | (b[2] as u32) >> 1;
    let raw_lon =
        (b[2] as u32 & 0x01) << 23 | (b[3] as u32) << 15 | (b[4] as u32) << 7 | (b[5] as u32) >> 1;
    (raw_lat, raw_lon)
}

/// 12-bit UAT altitude: 0 is unavailable, otherwise 25 ft steps from -1000.
fn uat_altitude(raw: u32) -> Option<i32> {
    if raw == 0 {
        None
    } else {
        Some((raw as i32 - 1) * 25 - 1000)
    }
}

/// 11-bit signed-magnitude velocity with 0 meaning unavailable.
fn uat_velocity(raw: u32, supersonic: bool) -> Option<i32> {
    if raw & 0x3FF == 0 {
        return None;
    }
    let mut v = (raw & 0x3FF) as i32 - 1;
    if raw & 0x400 != 0 {
        v = -v;
    }
    if supersonic {
        v *= 4;
    }
    Some(v)
}

// ---------------------------------------------------------------------------
// ADS-B payload
// ---------------------------------------------------------------------------

/// Decode an 18- or 34-byte UAT ADS-B payload.
pub fn decode_adsb(payload: &[u8]) -> Result<AdsbPayload> {
    if payload.len() < ADSB_BASIC_LEN {
        return Err(Gdl90Error::PayloadTooShort {
            message_id: MSG_BASIC_REPORT,
            expected: ADSB_BASIC_LEN,
            actual: payload.len(),
        });
    }

    let header = AdsbHeader {
        payload_type: payload[0] >> 3,
        address_qualifier: payload[0] & 0x07,
        address: (payload[1] as u32) << 16 | (payload[2] as u32) << 8 | payload[3] as u32,
    };

    let state = (header.payload_type <= 10).then(|| decode_state_vector(payload));

    let long = payload.len() >= ADSB_LONG_LEN;
    let mode_status = (long && matches!(header.payload_type, 1 | 3))
        .then(|| decode_mode_status(payload));
    let aux_state = (long && matches!(header.payload_type, 1 | 2 | 5 | 6)).then(|| AuxStateVector {
        secondary_altitude_ft: uat_altitude((payload[29] as u32) << 4 | (payload[30] as u32) >> 4),
    });

    Ok(AdsbPayload {
        header,
        state,
        mode_status,
        aux_state,
    })
}

fn decode_state_vector(p: &[u8]) -> StateVector {
    let (raw_lat, raw_lon) = unpack_lat_lon(&p[4..10]);
    let nic = p[11] & 0x0F;
    let position = (nic != 0 || raw_lat != 0 || raw_lon != 0).then(|| uat_position(raw_lat, raw_lon));

    let altitude_source = if p[9] & 0x01 != 0 {
        AltitudeSource::Geometric
    } else {
        AltitudeSource::Barometric
    };
    let altitude_ft = uat_altitude((p[10] as u32) << 4 | (p[11] as u32) >> 4);

    let air_ground = match p[12] >> 6 {
        0 => AirGroundState::AirborneSubsonic,
        1 => AirGroundState::AirborneSupersonic,
        2 => AirGroundState::Ground,
        _ => AirGroundState::Reserved,
    };

    let mut sv = StateVector {
        position,
        altitude_ft,
        altitude_source,
        nic,
        air_ground,
        north_velocity_kts: None,
        east_velocity_kts: None,
        vertical_rate_fpm: None,
        vertical_rate_source: None,
        ground_speed_kts: None,
        track_deg: None,
        track_type: None,
    };

    // Both subfields share bit positions between airborne and ground states.
    let first = (p[12] as u32 & 0x1F) << 6 | (p[13] as u32) >> 2;
    let second = (p[13] as u32 & 0x03) << 9 | (p[14] as u32) << 1 | (p[15] as u32) >> 7;

    match air_ground {
        AirGroundState::AirborneSubsonic | AirGroundState::AirborneSupersonic => {
            let supersonic = air_ground == AirGroundState::AirborneSupersonic;
            sv.north_velocity_kts = uat_velocity(first, supersonic);
            sv.east_velocity_kts = uat_velocity(second, supersonic);

            let raw_vv = (p[15] as u32 & 0x7F) << 4 | (p[16] as u32) >> 4;
            if raw_vv & 0x1FF != 0 {
                let mut rate = ((raw_vv & 0x1FF) as i32 - 1) * 64;
                if raw_vv & 0x200 != 0 {
                    rate = -rate;
                }
                sv.vertical_rate_fpm = Some(rate);
                sv.vertical_rate_source = Some(if raw_vv & 0x400 != 0 {
                    AltitudeSource::Barometric
                } else {
                    AltitudeSource::Geometric
                });
            }
        }
        AirGroundState::Ground => {
            if first & 0x3FF != 0 {
                sv.ground_speed_kts = Some((first & 0x3FF) as u16 - 1);
            }
            sv.track_type = Some(((second & 0x600) >> 9) as u8);
            sv.track_deg = Some((second & 0x1FF) as f64 * 360.0 / 512.0);
        }
        AirGroundState::Reserved => {}
    }

    sv
}

fn base40_chars(value: u32, divisors: &[u32], out: &mut String) {
    for &d in divisors {
        out.push(BASE40_ALPHABET[((value / d) % 40) as usize] as char);
    }
}

fn decode_mode_status(p: &[u8]) -> ModeStatus {
    let v1 = (p[17] as u32) << 8 | p[18] as u32;
    let v2 = (p[19] as u32) << 8 | p[20] as u32;
    let v3 = (p[21] as u32) << 8 | p[22] as u32;

    let mut callsign = String::with_capacity(8);
    base40_chars(v1, &[40, 1], &mut callsign);
    base40_chars(v2, &[1600, 40, 1], &mut callsign);
    base40_chars(v3, &[1600, 40, 1], &mut callsign);

    ModeStatus {
        emitter_category: ((v1 / 1600) % 40) as u8,
        callsign: callsign.trim_end().to_string(),
        callsign_is_flight_id: p[26] & 0x02 != 0,
        emergency: p[23] >> 5,
        uat_version: (p[23] >> 2) & 0x07,
        sil: p[23] & 0x03,
        nacp: p[25] >> 4,
        nacv: (p[25] >> 1) & 0x07,
        nic_baro: p[25] & 0x01 != 0,
        has_cdti: p[26] & 0x80 != 0,
        has_acas: p[26] & 0x40 != 0,
        ra_active: p[26] & 0x20 != 0,
        ident_active: p[26] & 0x10 != 0,
        atc_services: p[26] & 0x08 != 0,
    }
}

// ---------------------------------------------------------------------------
// Uplink payload
// ---------------------------------------------------------------------------

/// Decode a 432-byte UAT uplink payload.
pub fn decode_uplink(payload: &[u8]) -> Result<UplinkPayload> {
    if payload.len() < UPLINK_LEN {
        return Err(Gdl90Error::PayloadTooShort {
            message_id: MSG_UPLINK,
            expected: UPLINK_LEN,
            actual: payload.len(),
        });
    }

    let (raw_lat, raw_lon) = unpack_lat_lon(&payload[0..6]);
    let (latitude, longitude) = uat_position(raw_lat, raw_lon);

    Ok(UplinkPayload {
        latitude,
        longitude,
        position_valid: payload[5] & 0x01 != 0,
        utc_coupled: payload[6] & 0x80 != 0,
        app_data_valid: payload[6] & 0x20 != 0,
        slot_id: payload[6] & 0x1F,
        tisb_site_id: payload[7] >> 4,
        frames: decode_info_frames(&payload[UPLINK_HEADER_LEN..UPLINK_LEN]),
    })
}

/// Split uplink application data into information frames.
///
/// Each frame starts with a 9-bit length and 4-bit type. Two zero header
/// bytes end the list; the rest of the data is padding. A zero-length frame
/// with a nonzero type is kept, and a frame running past the end is cut short.
pub fn decode_info_frames(data: &[u8]) -> Vec<InfoFrame> {
    let mut frames = Vec::new();
    let mut n = 0;
    while n + 2 <= data.len() {
        if data[n] == 0 && data[n + 1] == 0 {
            break;
        }
        let len = (data[n] as usize) << 1 | (data[n + 1] as usize) >> 7;
        let frame_type = data[n + 1] & 0x0F;
        let end = (n + 2 + len).min(data.len());
        let body = data[n + 2..end].to_vec();
        let apdu = if frame_type == 0 { decode_apdu(&body) } else { None };
        frames.push(InfoFrame {
            frame_type,
            data: body,
            apdu,
        });
        n += 2 + len;
    }
    frames
}

/// Decode a FIS-B APDU header (product id, hours, minutes).
pub fn decode_apdu(data: &[u8]) -> Option<Apdu> {
    if data.len() < 4 {
        return None;
    }
    let product_id = (data[0] as u16 & 0x1F) << 6 | (data[1] as u16) >> 2;
    let body = data[4..].to_vec();
    let text = TEXT_PRODUCTS
        .contains(&product_id)
        .then(|| dlac_to_string(&body));
    Some(Apdu {
        product_id,
        hours: (data[2] & 0x7C) >> 2,
        minutes: (data[2] & 0x03) << 4 | data[3] >> 4,
        text,
        data: body,
    })
}

// ---------------------------------------------------------------------------
// DLAC text
// ---------------------------------------------------------------------------

/// Map one 6-bit DLAC code. End-of-text, null and change-cipher map to
/// nothing.
fn dlac_char(code: u8) -> Option<char> {
    match code {
        1..=26 => Some((b'A' + code - 1) as char),
        28 => Some('\t'),
        29 => Some('\u{1E}'),
        30 => Some('\n'),
        32..=63 => Some((b' ' + code - 32) as char),
        _ => None,
    }
}

/// Unpack DLAC text: four 6-bit codes per three bytes, MSB first.
pub fn dlac_to_string(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4 / 3);
    let mut n = 0;
    let mut m = 0;
    while n < data.len() {
        let code = match m % 4 {
            0 => data[n] >> 2,
            1 => {
                if n + 1 >= data.len() {
                    break;
                }
                let c = (data[n] & 0x03) << 4 | data[n + 1] >> 4;
                n += 1;
                c
            }
            2 => {
                if n + 1 >= data.len() {
                    break;
                }
                let c = (data[n] & 0x0F) << 2 | data[n + 1] >> 6;
                n += 1;
                c
            }
            _ => {
                let c = data[n] & 0x3F;
                n += 1;
                c
            }
        };
        if let Some(ch) = dlac_char(code) {
            out.push(ch);
        }
        m += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hex_decode;

    // Type 0, address A1B2C3, 45N 90W, 5000 ft baro, NIC 8, airborne,
    // 100 kt north, 50 kt west, 640 fpm climb (baro).
    const BASIC_AIRBORNE: &str = "00 A1B2C3 400001800000 0F18 019619C0B0 00";

    fn bytes(hex: &str) -> Vec<u8> {
        hex_decode(hex).unwrap()
    }

    #[test]
    fn test_adsb_header_and_state() {
        let p = decode_adsb(&bytes(BASIC_AIRBORNE)).unwrap();
        assert_eq!(p.header.payload_type, 0);
        assert_eq!(p.header.address, 0xA1B2C3);

        let sv = p.state.unwrap();
        let (lat, lon) = sv.position.unwrap();
        assert!((lat - 45.0).abs() < 1e-9);
        assert!((lon + 90.0).abs() < 1e-9);
        assert_eq!(sv.altitude_ft, Some(5000));
        assert_eq!(sv.altitude_source, AltitudeSource::Barometric);
        assert_eq!(sv.nic, 8);
        assert_eq!(sv.air_ground, AirGroundState::AirborneSubsonic);
        assert_eq!(sv.north_velocity_kts, Some(100));
        assert_eq!(sv.east_velocity_kts, Some(-50));
        assert_eq!(sv.vertical_rate_fpm, Some(640));
        assert_eq!(sv.vertical_rate_source, Some(AltitudeSource::Barometric));
        assert!(p.mode_status.is_none());
        assert!(p.aux_state.is_none());
    }

    #[test]
    fn test_adsb_unavailable_fields() {
        let mut raw = vec![0u8; ADSB_BASIC_LEN];
        raw[1] = 0x12;
        let sv = decode_adsb(&raw).unwrap().state.unwrap();
        assert_eq!(sv.position, None);
        assert_eq!(sv.altitude_ft, None);
        assert_eq!(sv.north_velocity_kts, None);
        assert_eq!(sv.east_velocity_kts, None);
        assert_eq!(sv.vertical_rate_fpm, None);
    }

    #[test]
    fn test_adsb_supersonic_scales_velocity() {
        let mut raw = bytes(BASIC_AIRBORNE);
        raw[12] |= 0x40;
        let sv = decode_adsb(&raw).unwrap().state.unwrap();
        assert_eq!(sv.air_ground, AirGroundState::AirborneSupersonic);
        assert_eq!(sv.north_velocity_kts, Some(400));
        assert_eq!(sv.east_velocity_kts, Some(-200));
    }

    #[test]
    fn test_adsb_ground_state() {
        let mut raw = bytes(BASIC_AIRBORNE);
        // 15 kt ground speed, true track 90 degrees
        raw[12] = 0x80;
        raw[13] = 0x41;
        raw[14] = 0x40;
        raw[15] = 0x00;
        let sv = decode_adsb(&raw).unwrap().state.unwrap();
        assert_eq!(sv.air_ground, AirGroundState::Ground);
        assert_eq!(sv.ground_speed_kts, Some(15));
        assert_eq!(sv.track_deg, Some(90.0));
        assert_eq!(sv.track_type, Some(1));
        assert_eq!(sv.north_velocity_kts, None);
    }

    #[test]
    fn test_adsb_long_mode_status() {
        let mut raw = bytes(BASIC_AIRBORNE);
        raw[0] = 1 << 3;
        raw.truncate(17);
        raw.extend(bytes("09D9 0CFC 2504 0B 00 95 02 00 00 0F 90 000000"));
        assert_eq!(raw.len(), ADSB_LONG_LEN);

        let p = decode_adsb(&raw).unwrap();
        assert_eq!(p.header.payload_type, 1);
        let ms = p.mode_status.unwrap();
        assert_eq!(ms.emitter_category, 1);
        assert_eq!(ms.callsign, "N12345");
        assert!(ms.callsign_is_flight_id);
        assert_eq!(ms.uat_version, 2);
        assert_eq!(ms.sil, 3);
        assert_eq!(ms.nacp, 9);
        assert_eq!(ms.nacv, 2);
        assert!(ms.nic_baro);
        assert!(!ms.ident_active);
        assert!(!ms.atc_services);
        assert_eq!(p.aux_state.unwrap().secondary_altitude_ft, Some(5200));
    }

    #[test]
    fn test_mode_status_operational_flags() {
        let mut raw = bytes(BASIC_AIRBORNE);
        raw[0] = 1 << 3;
        raw.truncate(17);
        raw.extend(bytes("09D9 0CFC 2504 0B 00 95 1A 00 00 0F 90 000000"));

        let ms = decode_adsb(&raw).unwrap().mode_status.unwrap();
        assert!(ms.ident_active);
        assert!(ms.atc_services);
        assert!(!ms.ra_active);
        assert!(ms.callsign_is_flight_id);

        // Operational modes share the capability byte; the next byte is unrelated.
        raw[26] = 0x20;
        raw[27] = 0x60;
        let ms = decode_adsb(&raw).unwrap().mode_status.unwrap();
        assert!(ms.ra_active);
        assert!(!ms.ident_active);
        assert!(!ms.atc_services);
        assert!(!ms.callsign_is_flight_id);
    }

    #[test]
    fn test_adsb_too_short() {
        assert!(matches!(
            decode_adsb(&[0u8; 10]),
            Err(Gdl90Error::PayloadTooShort { actual: 10, .. })
        ));
    }

    fn sample_uplink() -> Vec<u8> {
        let mut raw = bytes("40 00 01 80 00 01 A5 30");
        // One text APDU: product 413 at 12:34 saying "HI!"
        raw.extend(bytes("03 80 06 74 32 20 20 98 40"));
        raw.resize(UPLINK_LEN, 0);
        raw
    }

    #[test]
    fn test_uplink_header() {
        let up = decode_uplink(&sample_uplink()).unwrap();
        assert!((up.latitude - 45.0).abs() < 1e-9);
        assert!((up.longitude + 90.0).abs() < 1e-9);
        assert!(up.position_valid);
        assert!(up.utc_coupled);
        assert!(up.app_data_valid);
        assert_eq!(up.slot_id, 5);
        assert_eq!(up.tisb_site_id, 3);
    }

    #[test]
    fn test_uplink_text_apdu() {
        let up = decode_uplink(&sample_uplink()).unwrap();
        assert_eq!(up.frames.len(), 1);
        let frame = &up.frames[0];
        assert_eq!(frame.frame_type, 0);
        assert_eq!(frame.data.len(), 7);
        let apdu = frame.apdu.as_ref().unwrap();
        assert_eq!(apdu.product_id, 413);
        assert_eq!(apdu.hours, 12);
        assert_eq!(apdu.minutes, 34);
        assert_eq!(apdu.text.as_deref(), Some("HI!"));
    }

    #[test]
    fn test_info_frames_overrun_cut_short() {
        // Claims 100 bytes with only 3 available.
        let frames = decode_info_frames(&[0x32, 0x00, 1, 2, 3]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn test_info_frames_zero_length_with_type() {
        // Empty type-15 frame, then a 2-byte type-1 frame, then padding.
        let data = [0x00, 0x0F, 0x01, 0x01, 0xAB, 0xCD, 0x00, 0x00, 0x55];
        let frames = decode_info_frames(&data);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].frame_type, 15);
        assert!(frames[0].data.is_empty());
        assert_eq!(frames[1].frame_type, 1);
        assert_eq!(frames[1].data, vec![0xAB, 0xCD]);
        assert!(frames[1].apdu.is_none());
    }

    #[test]
    fn test_non_text_product_has_no_text() {
        // Product 63 (NEXRAD regional)
        let apdu = decode_apdu(&[0x00, 0xFC, 0x00, 0x00, 0xAA]).unwrap();
        assert_eq!(apdu.product_id, 63);
        assert_eq!(apdu.text, None);
        assert!(decode_apdu(&[0x00, 0x01]).is_none());
    }

    #[test]
    fn test_dlac_control_codes() {
        // T, newline, space, '9'
        let codes: [u8; 4] = [20, 30, 32, 57];
        let packed = [
            codes[0] << 2 | codes[1] >> 4,
            (codes[1] & 0x0F) << 4 | codes[2] >> 2,
            (codes[2] & 0x03) << 6 | codes[3],
        ];
        assert_eq!(dlac_to_string(&packed), "T\n 9");
    }

    #[test]
    fn test_dlac_partial_group() {
        // A single byte only yields the first code.
        assert_eq!(dlac_to_string(&[1 << 2]), "A");
    }
}
