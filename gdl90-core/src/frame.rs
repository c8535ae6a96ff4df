//! Split a raw byte stream into GDL-90 frames.
//!
//! Responsibilities:
//! - Locate 0x7E flag bytes and buffer partial frames across chunks
//! - Reverse byte-stuffing (0x7D escape, XOR 0x20)
//! - Package into `RawFrame` (message id, payload, FCS)
//! - Report garbage spans and malformed frames without stopping the stream
//! - Build flagged, stuffed frames for the encode direction

use crate::crc;
use crate::types::{Gdl90Error, Result};

pub const FLAG_BYTE: u8 = 0x7E;
pub const CONTROL_ESCAPE: u8 = 0x7D;
pub const ESCAPE_MASK: u8 = 0x20;

/// Longest unstuffed frame we accept: uplink id + 435 bytes + FCS, with room
/// for vendor extensions. Anything longer is a lost closing flag.
pub const MAX_FRAME_LEN: usize = 1024;

// ---------------------------------------------------------------------------
// Byte stuffing
// ---------------------------------------------------------------------------

/// Escape flag and control-escape bytes.
pub fn stuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 4);
    for &b in data {
        if b == FLAG_BYTE || b == CONTROL_ESCAPE {
            out.push(CONTROL_ESCAPE);
            out.push(b ^ ESCAPE_MASK);
        } else {
            out.push(b);
        }
    }
    out
}

/// Reverse `stuff`. Fails on a trailing escape byte or an escape followed
/// by something that is not an escaped reserved value.
pub fn unstuff(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let mut bytes = data.iter();
    while let Some(&b) = bytes.next() {
        if b != CONTROL_ESCAPE {
            out.push(b);
            continue;
        }
        let escaped = match bytes.next() {
            Some(&next) => next ^ ESCAPE_MASK,
            None => {
                return Err(Gdl90Error::Framing {
                    reason: "escape byte at end of frame",
                    discarded: data.to_vec(),
                })
            }
        };
        if escaped != FLAG_BYTE && escaped != CONTROL_ESCAPE {
            return Err(Gdl90Error::Framing {
                reason: "invalid escape sequence",
                discarded: data.to_vec(),
            });
        }
        out.push(escaped);
    }
    Ok(out)
}

/// Wrap `message_id || payload` in FCS, stuffing and flag bytes.
pub fn frame(message_id: u8, payload: &[u8]) -> Vec<u8> {
    let mut clear = Vec::with_capacity(payload.len() + 3);
    clear.push(message_id);
    clear.extend_from_slice(payload);
    let fcs = crc::checksum_bytes(&clear);
    clear.extend_from_slice(&fcs);

    let stuffed = stuff(&clear);
    let mut out = Vec::with_capacity(stuffed.len() + 2);
    out.push(FLAG_BYTE);
    out.extend_from_slice(&stuffed);
    out.push(FLAG_BYTE);
    out
}

// ---------------------------------------------------------------------------
// RawFrame
// ---------------------------------------------------------------------------

/// An unstuffed frame whose FCS has not been checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub message_id: u8,
    pub payload: Vec<u8>,
    /// FCS as transmitted.
    pub checksum: u16,
}

impl RawFrame {
    /// Split unstuffed frame bytes into id, payload and FCS.
    pub fn from_unstuffed(data: &[u8]) -> Option<RawFrame> {
        if data.len() < 3 {
            return None;
        }
        let fcs_at = data.len() - 2;
        Some(RawFrame {
            message_id: data[0],
            payload: data[1..fcs_at].to_vec(),
            checksum: u16::from_le_bytes([data[fcs_at], data[fcs_at + 1]]),
        })
    }

    /// `message_id || payload`, the bytes the FCS covers.
    pub fn covered_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 1);
        out.push(self.message_id);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Unstuffed wire bytes without flags, for diagnostics.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.covered_bytes();
        out.extend_from_slice(&self.checksum.to_le_bytes());
        out
    }

    /// FCS computed over id and payload.
    pub fn computed_checksum(&self) -> u16 {
        crc::checksum(&self.covered_bytes())
    }

    pub fn crc_ok(&self) -> bool {
        self.computed_checksum() == self.checksum
    }

    /// Verify the FCS, handing back the frame or a `ChecksumMismatch`.
    pub fn verified(self) -> Result<RawFrame> {
        let computed = self.computed_checksum();
        if computed == self.checksum {
            Ok(self)
        } else {
            Err(Gdl90Error::ChecksumMismatch {
                message_id: self.message_id,
                expected: computed,
                actual: self.checksum,
                raw: self.to_bytes(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Streaming unframer
// ---------------------------------------------------------------------------

/// Reassembles frames from arbitrarily split chunks of one byte stream.
///
/// A closing flag is kept as the opening flag of the next frame, so both
/// `7E a 7E 7E b 7E` and `7E a 7E b 7E` streams frame correctly.
#[derive(Debug, Default)]
pub struct Unframer {
    buffer: Vec<u8>,
}

impl Unframer {
    pub fn new() -> Self {
        Unframer { buffer: Vec::new() }
    }

    /// Append a chunk and iterate over every frame it completes.
    ///
    /// Bytes after the last complete frame stay buffered for the next call.
    pub fn feed<'a>(&'a mut self, chunk: &[u8]) -> Frames<'a> {
        self.buffer.extend_from_slice(chunk);
        Frames { unframer: self }
    }

    /// Bytes waiting for a closing flag.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn next_frame(&mut self) -> Option<Result<RawFrame>> {
        loop {
            let start = match self.buffer.iter().position(|&b| b == FLAG_BYTE) {
                Some(pos) => pos,
                None => {
                    if self.buffer.is_empty() {
                        return None;
                    }
                    // No flag anywhere: nothing in here can become a frame.
                    let discarded = std::mem::take(&mut self.buffer);
                    return Some(Err(Gdl90Error::Framing {
                        reason: "bytes outside of a frame",
                        discarded,
                    }));
                }
            };

            if start > 0 {
                let discarded: Vec<u8> = self.buffer.drain(..start).collect();
                return Some(Err(Gdl90Error::Framing {
                    reason: "bytes outside of a frame",
                    discarded,
                }));
            }

            let end = match self.buffer[1..].iter().position(|&b| b == FLAG_BYTE) {
                Some(pos) => pos + 1,
                None => {
                    if self.buffer.len() > 2 * MAX_FRAME_LEN {
                        // Closing flag lost; drop the opener and rescan.
                        let discarded = std::mem::take(&mut self.buffer);
                        return Some(Err(Gdl90Error::Framing {
                            reason: "frame exceeds maximum length",
                            discarded,
                        }));
                    }
                    return None;
                }
            };

            if end == 1 {
                // Back-to-back flags: end of one frame, start of the next.
                self.buffer.drain(..1);
                continue;
            }

            let stuffed: Vec<u8> = self.buffer[1..end].to_vec();
            self.buffer.drain(..end);

            let unstuffed = match unstuff(&stuffed) {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(e)),
            };

            return Some(RawFrame::from_unstuffed(&unstuffed).ok_or(Gdl90Error::Framing {
                reason: "frame too short",
                discarded: stuffed,
            }));
        }
    }
}

/// Lazy iterator over the frames completed by one `Unframer::feed` call.
pub struct Frames<'a> {
    unframer: &'a mut Unframer,
}

impl Iterator for Frames<'_> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.unframer.next_frame()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
