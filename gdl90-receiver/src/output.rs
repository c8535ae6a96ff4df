//! Text renderings of decoded records.
//!
//! - `normal`:     one `MSGnn:` line per message of interest
//! - `plotflight`: `HH:MM:SS lat lon hvel alt track` per ownship report
//! - `json`:       one JSON object per record

use clap::ValueEnum;
use tracing::warn;

use gdl90_core::encode::encode_heartbeat;
use gdl90_core::uat::UatPayload;
use gdl90_core::{Decoded, Message, TrafficReport};

/// Geometric altitude older than this many heartbeats is stale in plotflight.
const ALTITUDE_MAX_AGE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Normal,
    Plotflight,
    Json,
}

pub struct Renderer {
    format: OutputFormat,
    uat: bool,
    /// Last geometric altitude and heartbeats seen since.
    geo_altitude: Option<(i32, u32)>,
}

impl Renderer {
    pub fn new(format: OutputFormat, uat: bool) -> Self {
        Renderer {
            format,
            uat,
            geo_altitude: None,
        }
    }

    /// Render one record to zero or more output lines.
    pub fn render(&mut self, record: &Decoded) -> Vec<String> {
        match self.format {
            OutputFormat::Normal => self.render_normal(record),
            OutputFormat::Plotflight => self.render_plotflight(record).into_iter().collect(),
            OutputFormat::Json => match serde_json::to_string(record) {
                Ok(line) => vec![line],
                Err(e) => {
                    warn!(error = %e, "record not serialized");
                    Vec::new()
                }
            },
        }
    }

    fn render_normal(&self, record: &Decoded) -> Vec<String> {
        let mut lines = Vec::new();
        match &record.message {
            Message::Heartbeat(hb) => {
                let raw = encode_heartbeat(hb);
                lines.push(format!(
                    "MSG00: s1={:02x}, s2={:02x}, ts={:02x}",
                    raw[0], raw[1], hb.timestamp
                ));
            }
            Message::OwnshipReport(r) if !is_zero_position(r) => {
                lines.push(format!(
                    "MSG10: {:.7} {:.7} {} {} {}",
                    r.latitude,
                    r.longitude,
                    r.horizontal_velocity_kts.unwrap_or(0),
                    r.altitude_ft.unwrap_or(0),
                    r.track_deg as i32
                ));
            }
            Message::OwnshipGeometricAltitude(g) => {
                let metrics = (g.vertical_warning as u16) << 15
                    | g.vertical_figure_of_merit_m
                        .unwrap_or(gdl90_core::decode::VFOM_INVALID);
                lines.push(format!("MSG11: {} {:04x}h", g.altitude_ft, metrics));
            }
            Message::TrafficReport(r) if r.has_position() => {
                lines.push(format!(
                    "MSG20: {:.7} {:.7} {} {} {} {} {}",
                    r.latitude,
                    r.longitude,
                    r.horizontal_velocity_kts.unwrap_or(0),
                    r.vertical_velocity_fpm.unwrap_or(0),
                    r.altitude_ft.unwrap_or(0),
                    r.track_deg as i32,
                    if r.callsign.is_empty() { "-" } else { r.callsign.as_str() }
                ));
            }
            Message::GpsTime(t) => {
                let waas = match t.waas {
                    Some(true) => "true",
                    Some(false) => "false",
                    None => "unknown",
                };
                lines.push(format!(
                    "MSG101: {:02}:{:02} UTC (waas = {waas})",
                    t.hour, t.minute
                ));
            }
            Message::ForeFlightId(id) => {
                lines.push(format!(
                    "MSG101: {} ({}) serial={}",
                    id.name,
                    id.long_name,
                    id.serial.as_deref().unwrap_or("none")
                ));
            }
            Message::StratuxHeartbeat(hb) => {
                lines.push(format!(
                    "MSG204: ahrs={} gps={} v{}",
                    hb.ahrs_valid, hb.gps_valid, hb.protocol_version
                ));
            }
            _ => {}
        }

        if self.uat {
            lines.extend(uat_lines(record));
        }
        lines
    }

    fn render_plotflight(&mut self, record: &Decoded) -> Option<String> {
        match &record.message {
            Message::Heartbeat(_) => {
                if let Some((_, age)) = &mut self.geo_altitude {
                    *age = age.saturating_add(1);
                }
                None
            }
            Message::OwnshipGeometricAltitude(g) => {
                self.geo_altitude = Some((g.altitude_ft, 0));
                None
            }
            Message::OwnshipReport(r) if !is_zero_position(r) => {
                // No output until the clock has a vendor time.
                let time = record.timestamp?;
                let altitude = match self.geo_altitude {
                    Some((alt, age)) if age < ALTITUDE_MAX_AGE => alt,
                    _ => r.altitude_ft.unwrap_or(0),
                };
                Some(format!(
                    "{} {:.7} {:.7} {} {} {}",
                    time.format("%H:%M:%S"),
                    r.latitude,
                    r.longitude,
                    r.horizontal_velocity_kts.unwrap_or(0),
                    altitude,
                    r.track_deg as i32
                ))
            }
            _ => None,
        }
    }
}

fn is_zero_position(r: &TrafficReport) -> bool {
    r.latitude == 0.0 && r.longitude == 0.0
}

/// `APDU###: [text]` for uplinked text products, a position line for
/// UAT ADS-B reports.
fn uat_lines(record: &Decoded) -> Vec<String> {
    match &record.uat {
        Some(UatPayload::Uplink(up)) => up
            .frames
            .iter()
            .filter_map(|f| f.apdu.as_ref())
            .filter_map(|apdu| {
                let text = apdu.text.as_ref()?;
                Some(format!("APDU{:03}: [{}]", apdu.product_id, text.trim_end()))
            })
            .collect(),
        Some(UatPayload::Adsb(adsb)) => {
            let Some((lat, lon)) = adsb.state.as_ref().and_then(|s| s.position) else {
                return Vec::new();
            };
            let altitude = adsb.state.as_ref().and_then(|s| s.altitude_ft).unwrap_or(0);
            let callsign = adsb
                .mode_status
                .as_ref()
                .map(|m| m.callsign.as_str())
                .unwrap_or("");
            vec![format!(
                "UAT{}: {} {:.7} {:.7} {} {}",
                record.message.message_id(),
                gdl90_core::address_to_string(adsb.header.address),
                lat,
                lon,
                altitude,
                callsign
            )
            .trim_end()
            .to_string()]
        }
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gdl90_core::uat::{Apdu, InfoFrame, UplinkPayload};
    use gdl90_core::{GeometricAltitude, GpsTime, Heartbeat, StratuxHeartbeat, UplinkData};

    fn record(message: Message) -> Decoded {
        Decoded {
            message,
            timestamp: None,
            uat: None,
        }
    }

    fn timed(message: Message) -> Decoded {
        Decoded {
            message,
            timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 15, 12, 34, 56).unwrap()),
            uat: None,
        }
    }

    fn ownship() -> TrafficReport {
        TrafficReport {
            latitude: 45.0,
            longitude: -90.0,
            altitude_ft: Some(5000),
            horizontal_velocity_kts: Some(120),
            track_deg: 90.0,
            ..TrafficReport::default()
        }
    }

    fn geo_altitude(ft: i32) -> Message {
        Message::OwnshipGeometricAltitude(GeometricAltitude {
            altitude_ft: ft,
            vertical_warning: false,
            vertical_figure_of_merit_m: Some(10),
        })
    }

    #[test]
    fn test_heartbeat_line() {
        let hb = Heartbeat {
            csa_requested: true,
            timestamp: 0xD0DB,
            ..Heartbeat::default()
        };
        let mut r = Renderer::new(OutputFormat::Normal, false);
        let lines = r.render(&record(Message::Heartbeat(hb)));
        assert_eq!(lines, vec!["MSG00: s1=81, s2=41, ts=d0db"]);
    }

    #[test]
    fn test_ownship_line() {
        let mut r = Renderer::new(OutputFormat::Normal, false);
        let lines = r.render(&record(Message::OwnshipReport(ownship())));
        assert_eq!(lines, vec!["MSG10: 45.0000000 -90.0000000 120 5000 90"]);
    }

    #[test]
    fn test_zero_position_suppressed() {
        let mut r = Renderer::new(OutputFormat::Normal, false);
        let ownship = TrafficReport {
            nic: 8,
            ..TrafficReport::default()
        };
        assert!(r.render(&record(Message::OwnshipReport(ownship))).is_empty());
        let traffic = TrafficReport {
            nic: 0,
            ..TrafficReport::default()
        };
        assert!(r.render(&record(Message::TrafficReport(traffic))).is_empty());
    }

    #[test]
    fn test_traffic_blank_callsign() {
        let traffic = TrafficReport {
            latitude: 44.9,
            longitude: -122.75,
            nic: 8,
            ..TrafficReport::default()
        };
        let mut r = Renderer::new(OutputFormat::Normal, false);
        let lines = r.render(&record(Message::TrafficReport(traffic)));
        assert_eq!(lines, vec!["MSG20: 44.9000000 -122.7500000 0 0 0 0 -"]);
    }

    #[test]
    fn test_traffic_line() {
        let traffic = TrafficReport {
            latitude: 44.9,
            longitude: -122.75,
            altitude_ft: Some(3200),
            horizontal_velocity_kts: Some(95),
            vertical_velocity_fpm: Some(-640),
            track_deg: 271.5,
            callsign: "N825V".into(),
            ..TrafficReport::default()
        };
        let mut r = Renderer::new(OutputFormat::Normal, false);
        let lines = r.render(&record(Message::TrafficReport(traffic)));
        assert_eq!(
            lines,
            vec!["MSG20: 44.9000000 -122.7500000 95 -640 3200 271 N825V"]
        );
    }

    #[test]
    fn test_geometric_altitude_line() {
        let mut r = Renderer::new(OutputFormat::Normal, false);
        assert_eq!(r.render(&record(geo_altitude(5005))), vec!["MSG11: 5005 000ah"]);

        let warn = Message::OwnshipGeometricAltitude(GeometricAltitude {
            altitude_ft: -50,
            vertical_warning: true,
            vertical_figure_of_merit_m: None,
        });
        assert_eq!(r.render(&record(warn)), vec!["MSG11: -50 ffffh"]);
    }

    #[test]
    fn test_gps_time_line() {
        let t = GpsTime {
            firmware_version: 1,
            waas: Some(true),
            count: 0,
            hour: 9,
            minute: 5,
            hardware_version: 1,
        };
        let mut r = Renderer::new(OutputFormat::Normal, false);
        assert_eq!(
            r.render(&record(Message::GpsTime(t))),
            vec!["MSG101: 09:05 UTC (waas = true)"]
        );
    }

    #[test]
    fn test_stratux_heartbeat_line() {
        let hb = StratuxHeartbeat {
            ahrs_valid: false,
            gps_valid: true,
            protocol_version: 1,
        };
        let mut r = Renderer::new(OutputFormat::Normal, false);
        assert_eq!(
            r.render(&record(Message::StratuxHeartbeat(hb))),
            vec!["MSG204: ahrs=false gps=true v1"]
        );
    }

    #[test]
    fn test_plotflight_waits_for_time() {
        let mut r = Renderer::new(OutputFormat::Plotflight, false);
        assert!(r.render(&record(Message::OwnshipReport(ownship()))).is_empty());
        assert_eq!(
            r.render(&timed(Message::OwnshipReport(ownship()))),
            vec!["12:34:56 45.0000000 -90.0000000 120 5000 90"]
        );
    }

    #[test]
    fn test_plotflight_prefers_fresh_geometric_altitude() {
        let mut r = Renderer::new(OutputFormat::Plotflight, false);
        assert!(r.render(&timed(geo_altitude(5105))).is_empty());
        for _ in 0..4 {
            r.render(&timed(Message::Heartbeat(Heartbeat::default())));
        }
        let line = r.render(&timed(Message::OwnshipReport(ownship())));
        assert_eq!(line, vec!["12:34:56 45.0000000 -90.0000000 120 5105 90"]);

        r.render(&timed(Message::Heartbeat(Heartbeat::default())));
        let line = r.render(&timed(Message::OwnshipReport(ownship())));
        assert_eq!(line, vec!["12:34:56 45.0000000 -90.0000000 120 5000 90"]);
    }

    #[test]
    fn test_plotflight_ignores_other_messages() {
        let mut r = Renderer::new(OutputFormat::Plotflight, false);
        assert!(r.render(&timed(Message::Heartbeat(Heartbeat::default()))).is_empty());
        let traffic = Message::TrafficReport(ownship());
        assert!(r.render(&timed(traffic)).is_empty());
    }

    #[test]
    fn test_json_line() {
        let mut r = Renderer::new(OutputFormat::Json, false);
        let lines = r.render(&record(Message::Heartbeat(Heartbeat::default())));
        assert_eq!(lines.len(), 1);
        let v: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(v["type"], "Heartbeat");
        assert_eq!(v["utc_ok"], true);
        assert!(v["time"].is_null());
        assert_eq!(v["timestamp"], 0);
        assert!(v.get("uat").is_none());
    }

    #[test]
    fn test_apdu_text_lines() {
        let uplink = UplinkPayload {
            latitude: 0.0,
            longitude: 0.0,
            position_valid: false,
            utc_coupled: true,
            app_data_valid: true,
            slot_id: 0,
            tisb_site_id: 0,
            frames: vec![InfoFrame {
                frame_type: 0,
                data: Vec::new(),
                apdu: Some(Apdu {
                    product_id: 413,
                    hours: 12,
                    minutes: 34,
                    text: Some("METAR KPDX 151253Z\n".into()),
                    data: Vec::new(),
                }),
            }],
        };
        let decoded = Decoded {
            message: Message::Uplink(UplinkData {
                time_of_reception: None,
                payload: vec![0; 432],
            }),
            timestamp: None,
            uat: Some(UatPayload::Uplink(uplink)),
        };

        let mut quiet = Renderer::new(OutputFormat::Normal, false);
        assert!(quiet.render(&decoded).is_empty());

        let mut r = Renderer::new(OutputFormat::Normal, true);
        assert_eq!(r.render(&decoded), vec!["APDU413: [METAR KPDX 151253Z]"]);
    }
}
