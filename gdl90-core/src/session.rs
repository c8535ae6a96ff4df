//! One decoding session per byte stream.
//!
//! `Decoder` owns the stream-scoped state: the unframer's partial buffer,
//! the time estimator and the statistics. Sessions share nothing but the
//! immutable registry, so separate streams can be decoded on separate
//! threads.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::clock::{ClockState, TimeEstimator};
use crate::encode;
use crate::frame::{RawFrame, Unframer};
use crate::registry::Registry;
use crate::types::*;
use crate::uat::{self, UatPayload};

/// Per-session settings supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// UTC date the time estimator anchors vendor hour:minute to.
    pub start_date: NaiveDate,
    /// Decode UAT payloads of uplink, basic and long report messages.
    pub decode_uat: bool,
    /// Seconds one heartbeat advances the time estimate.
    pub heartbeat_interval_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            start_date: Utc::now().date_naive(),
            decode_uat: false,
            heartbeat_interval_secs: 1,
        }
    }
}

/// A decoded record with its estimated time of arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoded {
    #[serde(flatten)]
    pub message: Message,
    /// Serialized as `time`; heartbeats carry their own raw `timestamp`.
    #[serde(rename = "time")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uat: Option<UatPayload>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageCounts {
    pub good: u64,
    pub bad: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// Frames with a valid shape (good or bad checksum).
    pub frames: u64,
    /// Framing errors: garbage spans, bad escapes, short frames.
    pub resyncs: u64,
    /// Checksum results per message id.
    pub messages: BTreeMap<u8, MessageCounts>,
}

pub struct Decoder {
    registry: Registry,
    config: SessionConfig,
    unframer: Unframer,
    clock: TimeEstimator,
    stats: DecoderStats,
}

impl Decoder {
    pub fn new(registry: Registry, config: SessionConfig) -> Self {
        let clock = TimeEstimator::new(config.start_date, config.heartbeat_interval_secs);
        Decoder {
            registry,
            config,
            unframer: Unframer::new(),
            clock,
            stats: DecoderStats::default(),
        }
    }

    /// Decode every frame completed by `bytes`.
    ///
    /// Bad frames are returned as errors in stream order; decoding always
    /// continues with the next frame.
    pub fn decode_stream(&mut self, bytes: &[u8]) -> Vec<Result<Decoded>> {
        let frames: Vec<Result<RawFrame>> = self.unframer.feed(bytes).collect();
        frames
            .into_iter()
            .map(|frame| {
                let result = frame.and_then(|f| self.decode_frame(f));
                if let Err(e) = &result {
                    self.record_error(e);
                }
                result
            })
            .collect()
    }

    /// Verify and decode one unstuffed frame.
    pub fn decode_frame(&mut self, frame: RawFrame) -> Result<Decoded> {
        self.stats.frames += 1;
        let counts = self.stats.messages.entry(frame.message_id).or_default();
        let frame = match frame.verified() {
            Ok(f) => {
                counts.good += 1;
                f
            }
            Err(e) => {
                counts.bad += 1;
                return Err(e);
            }
        };

        let message = self.registry.decode(frame.message_id, &frame.payload)?;
        self.clock.observe(&message);

        let uat = if self.config.decode_uat {
            self.decode_uat(&message)
        } else {
            None
        };

        Ok(Decoded {
            message,
            timestamp: self.clock.timestamp(),
            uat,
        })
    }

    fn decode_uat(&self, message: &Message) -> Option<UatPayload> {
        let decoded = match message {
            Message::Uplink(up) => uat::decode_uplink(&up.payload).map(UatPayload::Uplink),
            Message::BasicReport(r) | Message::LongReport(r) => {
                uat::decode_adsb(&r.payload).map(UatPayload::Adsb)
            }
            _ => return None,
        };
        match decoded {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!(error = %e, "UAT payload not decoded");
                None
            }
        }
    }

    fn record_error(&mut self, error: &Gdl90Error) {
        match error {
            Gdl90Error::Framing { reason, discarded } => {
                self.stats.resyncs += 1;
                debug!(reason, bytes = %hex_encode(discarded), "discarded span");
            }
            Gdl90Error::ChecksumMismatch { message_id, raw, .. } => {
                debug!(message_id, frame = %hex_encode(raw), "bad checksum");
            }
            other => debug!(error = %other, "frame discarded"),
        }
    }

    /// Frame a record with this session's registry.
    pub fn encode_record(&self, message: &Message) -> Result<Vec<u8>> {
        encode::encode_record(&self.registry, message)
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn clock(&self) -> &TimeEstimator {
        &self.clock
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Bytes buffered while waiting for a closing flag.
    pub fn pending(&self) -> usize {
        self.unframer.pending()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
