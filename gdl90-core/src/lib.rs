//! gdl90-core: GDL-90 framing, decoding and encoding.
//!
//! No sockets, no async. This crate is the shared core used by both
//! `gdl90-receiver` (decode and print) and `gdl90-feeder` (record, replay
//! and simulate).

pub mod clock;
pub mod config;
pub mod crc;
pub mod decode;
pub mod encode;
pub mod frame;
pub mod registry;
pub mod session;
pub mod types;
pub mod uat;

// Re-export commonly used types at crate root
pub use clock::{ClockState, TimeEstimator};
pub use encode::encode_record;
pub use frame::{RawFrame, Unframer};
pub use registry::Registry;
pub use session::{Decoded, Decoder, DecoderStats, MessageCounts, SessionConfig};
pub use types::*;
