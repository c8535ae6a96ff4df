//! Decode GDL-90 message payloads into typed records.
//!
//! Every decoder takes the payload without the message id byte and assumes
//! the registry already checked the minimum length for that id.
//!
//! Handles:
//! - 0x00 Heartbeat: status flags, 17-bit timestamp, message counts
//! - 0x07 Uplink: time of reception + raw UAT uplink
//! - 0x09 Height above terrain
//! - 0x0A/0x14 Ownship and traffic reports (shared layout)
//! - 0x0B Ownship geometric altitude
//! - 0x1E/0x1F Basic and long UAT reports
//! - 0x65 Vendor: Skyradar GPS time or ForeFlight identification
//! - 0xCC Stratux heartbeat

use crate::types::*;

/// Degrees per least-significant bit of a 24-bit lat/lon field.
pub const LAT_LON_RESOLUTION: f64 = 180.0 / 8_388_608.0;

/// Degrees per least-significant bit of the track/heading byte.
pub const TRACK_RESOLUTION: f64 = 360.0 / 256.0;

pub const ALTITUDE_INVALID: u16 = 0xFFF;
pub const HORIZONTAL_VELOCITY_INVALID: u16 = 0xFFF;
pub const VERTICAL_VELOCITY_INVALID: u16 = 0x800;
pub const VFOM_INVALID: u16 = 0x7FFF;
pub const HEIGHT_ABOVE_TERRAIN_INVALID: u16 = 0x8000;
pub const TIME_OF_RECEPTION_INVALID: u32 = 0xFF_FFFF;

pub const HEARTBEAT_LEN: usize = 6;
pub const TRAFFIC_REPORT_LEN: usize = 27;
pub const GEOMETRIC_ALTITUDE_LEN: usize = 4;
pub const HEIGHT_ABOVE_TERRAIN_LEN: usize = 2;
pub const UPLINK_DATA_LEN: usize = 435;
pub const BASIC_REPORT_LEN: usize = 21;
pub const LONG_REPORT_LEN: usize = 37;
pub const GPS_TIME_LEN: usize = 11;
pub const FOREFLIGHT_ID_LEN: usize = 38;
pub const STRATUX_HEARTBEAT_LEN: usize = 1;

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Sign-extend a big-endian 24-bit two's complement value.
pub fn signed24(b: &[u8]) -> i32 {
    ((b[0] as i32) << 24 | (b[1] as i32) << 16 | (b[2] as i32) << 8) >> 8
}

/// Little-endian 24-bit unsigned value.
pub fn unsigned24_le(b: &[u8]) -> u32 {
    b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16
}

/// Latitude or longitude in degrees from a 24-bit field.
pub fn decode_angle(b: &[u8]) -> f64 {
    signed24(b) as f64 * 180.0 / 8_388_608.0
}

/// 12-bit altitude: 25 ft steps from -1000 ft, 0xFFF is unavailable.
pub fn decode_altitude(raw: u16) -> Option<i32> {
    if raw == ALTITUDE_INVALID {
        None
    } else {
        Some(raw as i32 * 25 - 1000)
    }
}

pub fn decode_horizontal_velocity(raw: u16) -> Option<u16> {
    if raw == HORIZONTAL_VELOCITY_INVALID {
        None
    } else {
        Some(raw)
    }
}

/// 12-bit signed vertical velocity in 64 fpm units.
///
/// 0x800 is the no-data code. All ones (0xFFF) is -64 fpm in two's
/// complement, a legal rate, and decodes as such. Codes 0x1FF-0x7FF and
/// 0x801-0xE01 are unused and also decode to `None`.
pub fn decode_vertical_velocity(raw: u16) -> Option<i32> {
    match raw {
        VERTICAL_VELOCITY_INVALID => None,
        0x1FF..=0x7FF | 0x801..=0xE01 => None,
        _ => {
            let signed = if raw & 0x800 != 0 {
                raw as i32 - 0x1000
            } else {
                raw as i32
            };
            Some(signed * 64)
        }
    }
}

fn time_of_reception(b: &[u8]) -> Option<u32> {
    let tor = unsigned24_le(b);
    (tor != TIME_OF_RECEPTION_INVALID).then_some(tor)
}

/// Fixed-width ASCII text with trailing spaces and NULs removed.
fn ascii_field(b: &[u8]) -> String {
    String::from_utf8_lossy(b)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

// ---------------------------------------------------------------------------
// Message decoders
// ---------------------------------------------------------------------------

/// Decode a heartbeat (0x00).
pub fn decode_heartbeat(p: &[u8]) -> Heartbeat {
    let s1 = p[0];
    let s2 = p[1];
    let timestamp = u16::from_le_bytes([p[2], p[3]]) as u32 | ((s2 & 0x80) as u32) << 9;

    Heartbeat {
        gps_position_valid: s1 & 0x80 != 0,
        maintenance_required: s1 & 0x40 != 0,
        ident: s1 & 0x20 != 0,
        address_type: s1 & 0x10 != 0,
        gps_battery_low: s1 & 0x08 != 0,
        ratcs: s1 & 0x04 != 0,
        uat_initialized: s1 & 0x01 != 0,
        csa_requested: s2 & 0x40 != 0,
        csa_not_available: s2 & 0x20 != 0,
        utc_ok: s2 & 0x01 != 0,
        timestamp,
        uplink_count: p[4] >> 3,
        basic_long_count: ((p[4] & 0x03) as u16) << 8 | p[5] as u16,
    }
}

/// Decode uplink data (0x07).
pub fn decode_uplink(p: &[u8]) -> UplinkData {
    UplinkData {
        time_of_reception: time_of_reception(&p[0..3]),
        payload: p[3..UPLINK_DATA_LEN].to_vec(),
    }
}

/// Decode height above terrain (0x09).
pub fn decode_height_above_terrain(p: &[u8]) -> HeightAboveTerrain {
    let raw = u16::from_be_bytes([p[0], p[1]]);
    HeightAboveTerrain {
        height_ft: (raw != HEIGHT_ABOVE_TERRAIN_INVALID).then_some(raw as i16),
    }
}

/// Decode the shared ownship (0x0A) / traffic (0x14) layout.
pub fn decode_traffic_report(p: &[u8]) -> TrafficReport {
    let altitude_raw = (p[10] as u16) << 4 | (p[11] >> 4) as u16;
    let hvel_raw = (p[13] as u16) << 4 | (p[14] >> 4) as u16;
    let vvel_raw = ((p[14] & 0x0F) as u16) << 8 | p[15] as u16;

    TrafficReport {
        traffic_alert: p[0] >> 4 != 0,
        address_type: AddressType::from_nibble(p[0]),
        address: (p[1] as u32) << 16 | (p[2] as u32) << 8 | p[3] as u32,
        latitude: decode_angle(&p[4..7]),
        longitude: decode_angle(&p[7..10]),
        altitude_ft: decode_altitude(altitude_raw),
        misc: MiscIndicators::from_nibble(p[11]),
        nic: p[12] >> 4,
        nacp: p[12] & 0x0F,
        horizontal_velocity_kts: decode_horizontal_velocity(hvel_raw),
        vertical_velocity_fpm: decode_vertical_velocity(vvel_raw),
        track_deg: p[16] as f64 * TRACK_RESOLUTION,
        emitter_category: p[17],
        callsign: ascii_field(&p[18..26]),
        emergency: EmergencyCode::from_nibble(p[26] >> 4),
    }
}

/// Decode ownship geometric altitude (0x0B).
pub fn decode_geometric_altitude(p: &[u8]) -> GeometricAltitude {
    let vfom = ((p[2] & 0x7F) as u16) << 8 | p[3] as u16;
    GeometricAltitude {
        altitude_ft: i16::from_be_bytes([p[0], p[1]]) as i32 * 5,
        vertical_warning: p[2] & 0x80 != 0,
        vertical_figure_of_merit_m: (vfom != VFOM_INVALID).then_some(vfom),
    }
}

/// Decode a basic (0x1E) or long (0x1F) UAT report.
pub fn decode_uat_report(p: &[u8], len: usize) -> UatReport {
    UatReport {
        time_of_reception: time_of_reception(&p[0..3]),
        payload: p[3..len].to_vec(),
    }
}

/// Decode vendor message 0x65.
///
/// Sub-id 0 with a full-length payload is a ForeFlight ID message. Otherwise
/// it is the Skyradar GPS time message when the hour and minute are in range.
/// Anything else (ForeFlight AHRS, for one) stays unrecognized.
pub fn decode_vendor_101(p: &[u8]) -> Message {
    if p[0] == 0 && p.len() >= FOREFLIGHT_ID_LEN {
        Message::ForeFlightId(decode_foreflight_id(p))
    } else if p[6] <= 23 && p[7] <= 59 {
        Message::GpsTime(decode_gps_time(p))
    } else {
        Message::Unrecognized(Unrecognized {
            message_id: MSG_VENDOR_101,
            payload: p.to_vec(),
        })
    }
}

pub fn decode_gps_time(p: &[u8]) -> GpsTime {
    GpsTime {
        firmware_version: p[0],
        waas: match p[2] {
            b'1' => Some(false),
            b'2' => Some(true),
            _ => None,
        },
        count: unsigned24_le(&p[3..6]),
        hour: p[6],
        minute: p[7],
        hardware_version: p[10],
    }
}

pub fn decode_foreflight_id(p: &[u8]) -> ForeFlightId {
    let serial = &p[2..10];
    ForeFlightId {
        version: p[1],
        serial: (!serial.iter().all(|&b| b == 0xFF)).then(|| ascii_field(serial)),
        name: ascii_field(&p[10..18]),
        long_name: ascii_field(&p[18..34]),
        capabilities: u32::from_be_bytes([p[34], p[35], p[36], p[37]]),
    }
}

/// Decode the Stratux heartbeat (0xCC).
pub fn decode_stratux_heartbeat(p: &[u8]) -> StratuxHeartbeat {
    StratuxHeartbeat {
        ahrs_valid: p[0] & 0x01 != 0,
        gps_valid: p[0] & 0x02 != 0,
        protocol_version: p[0] >> 2,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_vertical_velocity;

    fn payload(hex: &str) -> Vec<u8> {
        let mut bytes = hex_decode(hex).unwrap();
        bytes.remove(0);
        bytes
    }

    #[test]
    fn test_heartbeat_icd_example() {
        let hb = decode_heartbeat(&payload("00 81 41 DB D0 08 02"));
        assert!(hb.gps_position_valid);
        assert!(hb.uat_initialized);
        assert!(!hb.maintenance_required);
        assert!(!hb.gps_battery_low);
        assert!(hb.csa_requested);
        assert!(!hb.csa_not_available);
        assert!(hb.utc_ok);
        assert_eq!(hb.timestamp, 0xD0DB);
        assert_eq!(hb.uplink_count, 1);
        assert_eq!(hb.basic_long_count, 2);
    }

    #[test]
    fn test_heartbeat_timestamp_bit16() {
        let hb = decode_heartbeat(&payload("00 81 81 33 22 00 03"));
        assert_eq!(hb.timestamp, 0x12233);
        assert!(hb.utc_ok);
        assert_eq!(hb.basic_long_count, 3);
    }

    #[test]
    fn test_ownship_report() {
        let r = decode_traffic_report(&payload(
            "0A 01 BE EF 01 17 BE 76 B5 AA E5 03 5B 88 0E 10 00 5B 01 4E 31 32 33 4D 45 20 20 00",
        ));
        assert!(!r.traffic_alert);
        assert_eq!(r.address_type, AddressType::AdsbSelfAssigned);
        assert_eq!(r.address, 0xBEEF01);
        assert!((r.latitude - 33.39).abs() < 1e-4);
        assert!((r.longitude + 104.53).abs() < 1e-4);
        assert_eq!(r.altitude_ft, Some(325));
        assert!(r.misc.airborne);
        assert_eq!(r.misc.track_type, TrackType::TrueHeading);
        assert_eq!(r.nic, 8);
        assert_eq!(r.nacp, 8);
        assert_eq!(r.horizontal_velocity_kts, Some(225));
        assert_eq!(r.vertical_velocity_fpm, Some(0));
        assert_eq!(r.track_deg, 127.96875);
        assert_eq!(r.emitter_category, 1);
        assert_eq!(r.callsign, "N123ME");
        assert_eq!(r.emergency, EmergencyCode::None);
    }

    #[test]
    fn test_traffic_report() {
        let r = decode_traffic_report(&payload(
            "14 00 e1 f2 4f 15 b4 af b9 ee 43 0e c9 88 13 60 00 8b 01 42 4e 44 54 30 20 20 20 00",
        ));
        assert_eq!(r.address_type, AddressType::AdsbIcao);
        assert_eq!(r.address, 0xE1F24F);
        assert_eq!(r.latitude, 30.52377462387085);
        assert_eq!(r.longitude, -98.53493928909302);
        assert_eq!(r.altitude_ft, Some(4900));
        assert_eq!(r.misc.track_type, TrackType::TrueTrack);
        assert_eq!(r.horizontal_velocity_kts, Some(310));
        assert_eq!(r.track_deg, 195.46875);
        assert_eq!(r.callsign, "BNDT0");
    }

    #[test]
    fn test_altitude_sentinel() {
        assert_eq!(decode_altitude(0xFFF), None);
        assert_eq!(decode_altitude(0), Some(-1000));
        assert_eq!(decode_altitude(0xFFE), Some(101_350));

        let mut p = payload(
            "0A 01 BE EF 01 17 BE 76 B5 AA E5 03 5B 88 0E 10 00 5B 01 4E 31 32 33 4D 45 20 20 00",
        );
        p[10] = 0xFF;
        p[11] = 0xF0 | (p[11] & 0x0F);
        let r = decode_traffic_report(&p);
        assert_eq!(r.altitude_ft, None);
        assert!(r.misc.airborne);
    }

    #[test]
    fn test_vertical_velocity_sentinel_in_report() {
        let mut p = payload(
            "0A 01 BE EF 01 17 BE 76 B5 AA E5 03 5B 88 0E 10 00 5B 01 4E 31 32 33 4D 45 20 20 00",
        );
        p[14] = 0x18;
        p[15] = 0x00;
        let r = decode_traffic_report(&p);
        assert_eq!(r.vertical_velocity_fpm, None);
        assert_eq!(r.horizontal_velocity_kts, Some(225));
        assert_eq!(encode_vertical_velocity(None), 0x800);

        p[14] = 0x1F;
        p[15] = 0xFF;
        let r = decode_traffic_report(&p);
        assert_eq!(r.vertical_velocity_fpm, Some(-64));
        assert_eq!(encode_vertical_velocity(Some(-64)), 0xFFF);
    }

    #[test]
    fn test_horizontal_velocity_sentinel() {
        assert_eq!(decode_horizontal_velocity(0xFFF), None);
        assert_eq!(decode_horizontal_velocity(0), Some(0));
        assert_eq!(decode_horizontal_velocity(0xFFE), Some(0xFFE));
    }

    #[test]
    fn test_vertical_velocity_codes() {
        assert_eq!(decode_vertical_velocity(0x800), None);
        assert_eq!(decode_vertical_velocity(0x1FF), None);
        assert_eq!(decode_vertical_velocity(0x7FF), None);
        assert_eq!(decode_vertical_velocity(0x801), None);
        assert_eq!(decode_vertical_velocity(0xE01), None);
        assert_eq!(decode_vertical_velocity(0x000), Some(0));
        assert_eq!(decode_vertical_velocity(0x001), Some(64));
        assert_eq!(decode_vertical_velocity(0x1FE), Some(32_640));
        assert_eq!(decode_vertical_velocity(0xFFF), Some(-64));
        assert_eq!(decode_vertical_velocity(0xE02), Some(-32_640));
    }

    #[test]
    fn test_signed24() {
        assert_eq!(signed24(&[0x00, 0x00, 0x01]), 1);
        assert_eq!(signed24(&[0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(signed24(&[0x80, 0x00, 0x00]), -8_388_608);
        assert_eq!(signed24(&[0x7F, 0xFF, 0xFF]), 8_388_607);
    }

    #[test]
    fn test_geometric_altitude() {
        let g = decode_geometric_altitude(&[0x00, 0x69, 0x00, 0x32]);
        assert_eq!(g.altitude_ft, 525);
        assert!(!g.vertical_warning);
        assert_eq!(g.vertical_figure_of_merit_m, Some(50));

        let g = decode_geometric_altitude(&[0xFF, 0xFE, 0xFF, 0xFF]);
        assert_eq!(g.altitude_ft, -10);
        assert!(g.vertical_warning);
        assert_eq!(g.vertical_figure_of_merit_m, None);
    }

    #[test]
    fn test_height_above_terrain() {
        assert_eq!(decode_height_above_terrain(&[0x01, 0xF4]).height_ft, Some(500));
        assert_eq!(decode_height_above_terrain(&[0xFF, 0x9C]).height_ft, Some(-100));
        assert_eq!(decode_height_above_terrain(&[0x80, 0x00]).height_ft, None);
    }

    #[test]
    fn test_uat_report_time_of_reception() {
        let mut p = vec![0x10, 0x27, 0x00];
        p.extend([0xAB; 18]);
        let r = decode_uat_report(&p, BASIC_REPORT_LEN);
        assert_eq!(r.time_of_reception, Some(10_000));
        assert_eq!(r.payload.len(), 18);

        p[0..3].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
        assert_eq!(decode_uat_report(&p, BASIC_REPORT_LEN).time_of_reception, None);
    }

    #[test]
    fn test_gps_time() {
        let p = [0x2A, 0x00, b'2', 0x05, 0x01, 0x00, 12, 34, 0x00, 0x00, 0x04];
        match decode_vendor_101(&p) {
            Message::GpsTime(t) => {
                assert_eq!(t.firmware_version, 0x2A);
                assert_eq!(t.waas, Some(true));
                assert_eq!(t.count, 0x0105);
                assert_eq!(t.hour, 12);
                assert_eq!(t.minute, 34);
                assert_eq!(t.hardware_version, 4);
            }
            other => panic!("expected GPS time, got {other:?}"),
        }
    }

    #[test]
    fn test_vendor_101_out_of_range_time_unrecognized() {
        // ForeFlight AHRS: sub-id 1, heading 0x7FFF lands on hour/minute.
        let p = [0x01, 0x00, 0x10, 0xFF, 0xF0, 0x7F, 0xFF, 0x7F, 0xFF, 0xFF, 0xFF];
        match decode_vendor_101(&p) {
            Message::Unrecognized(u) => {
                assert_eq!(u.message_id, MSG_VENDOR_101);
                assert_eq!(u.payload, p.to_vec());
            }
            other => panic!("expected unrecognized, got {other:?}"),
        }

        let mut p = [0x2A, 0x00, b'1', 0x00, 0x00, 0x00, 23, 60, 0x00, 0x00, 0x01];
        assert!(matches!(decode_vendor_101(&p), Message::Unrecognized(_)));
        p[7] = 59;
        assert!(matches!(decode_vendor_101(&p), Message::GpsTime(_)));
    }

    #[test]
    fn test_foreflight_id() {
        let mut p = vec![0x00, 0x01];
        p.extend([0xFF; 8]);
        p.extend(b"Stratux ");
        p.extend(b"gdl90-encoder   ");
        p.extend(1u32.to_be_bytes());
        match decode_vendor_101(&p) {
            Message::ForeFlightId(id) => {
                assert_eq!(id.version, 1);
                assert_eq!(id.serial, None);
                assert_eq!(id.name, "Stratux");
                assert_eq!(id.long_name, "gdl90-encoder");
                assert_eq!(id.capabilities, 1);
            }
            other => panic!("expected ForeFlight ID, got {other:?}"),
        }
    }

    #[test]
    fn test_stratux_heartbeat() {
        let hb = decode_stratux_heartbeat(&[0x06]);
        assert!(hb.gps_valid);
        assert!(!hb.ahrs_valid);
        assert_eq!(hb.protocol_version, 1);
    }
}
