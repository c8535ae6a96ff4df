//! CRC-16 frame check sequence for GDL-90 messages.
//!
//! CRC-CCITT polynomial: x^16 + x^12 + x^5 + 1
//! Generator: 0x1021, initial value 0, no reflection, no final XOR.
//!
//! The FCS covers the message id and payload. It is transmitted
//! least-significant byte first, before byte-stuffing is applied.

const GENERATOR: u16 = 0x1021;

// ---------------------------------------------------------------------------
// CRC lookup table (compile-time)
// ---------------------------------------------------------------------------

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ GENERATOR;
            } else {
                crc <<= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u16; 256] = build_crc_table();

// ---------------------------------------------------------------------------
// Core CRC functions
// ---------------------------------------------------------------------------

/// Compute the FCS over `message_id || payload`.
pub fn checksum(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc = CRC_TABLE[(crc >> 8) as usize] ^ (crc << 8) ^ byte as u16;
    }
    crc
}

/// True if `claimed` matches the FCS of `data`.
pub fn verify(data: &[u8], claimed: u16) -> bool {
    checksum(data) == claimed
}

/// FCS bytes in wire order (LSB first).
pub fn checksum_bytes(data: &[u8]) -> [u8; 2] {
    checksum(data).to_le_bytes()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
