//! Wire protocol: command frames and response decoding.
//!
//! Protocol overview:
//! - Commands are a one-byte opcode plus an opcode-specific payload,
//!   written to the profile's command OUT endpoint. Multi-byte fields are
//!   little-endian.
//! - Status and information replies come back on the data IN endpoint;
//!   spectrum packets on the spectrum IN endpoint.
//! - A spectrum packet is valid only at the profile's exact packet size
//!   with the fixed trailer byte `0x69` last; anything else is rejected
//!   without decoding.
//!
//! Everything in this module is a pure function over byte slices so the
//! decode logic can be tested without a device. The I/O sequencing lives
//! in [`crate::spectrometer`].

use serde::Serialize;

use crate::error::{Result, SpectroError};

/// Command opcodes.
pub mod opcode {
    /// Initialize the spectrometer. No payload, no reply.
    pub const INIT: u8 = 0x01;
    /// Set integration time. Payload: u32 LE microseconds. No reply.
    pub const SET_INTEGRATION_TIME: u8 = 0x02;
    /// Query one information field. Payload: 1-byte address.
    pub const QUERY_INFORMATION: u8 = 0x05;
    /// Request one spectrum packet. No payload.
    pub const REQUEST_SPECTRA: u8 = 0x09;
    /// Write a register. Payload: 1-byte register, u16 LE value. No reply.
    pub const WRITE_REG_INFO: u8 = 0x6A;
    /// Query the device status snapshot. No payload.
    pub const QUERY_STATUS: u8 = 0xFE;
}

/// Exact length of a status reply.
pub const STATUS_REPLY_LEN: usize = 16;

/// Maximum length of an information reply.
pub const INFO_REPLY_LEN: usize = 17;

/// Sentinel byte expected last in every valid spectrum packet.
pub const SPECTRUM_TRAILER: u8 = 0x69;

/// Pixels in one decoded spectrum.
pub const PIXELS_PER_SPECTRUM: usize = 2048;

/// Bytes of pixel payload at the front of a spectrum packet.
const SPECTRUM_PAYLOAD_LEN: usize = 2 * PIXELS_PER_SPECTRUM;

/// INIT command frame.
pub fn init_frame() -> [u8; 1] {
    [opcode::INIT]
}

/// SET_INTEGRATION_TIME command frame.
pub fn set_integration_time_frame(micros: u32) -> [u8; 5] {
    let [a, b, c, d] = micros.to_le_bytes();
    [opcode::SET_INTEGRATION_TIME, a, b, c, d]
}

/// QUERY_INFORMATION command frame.
pub fn query_information_frame(address: u8) -> [u8; 2] {
    [opcode::QUERY_INFORMATION, address]
}

/// REQUEST_SPECTRA command frame.
pub fn request_spectra_frame() -> [u8; 1] {
    [opcode::REQUEST_SPECTRA]
}

/// WRITE_REG_INFO command frame.
pub fn write_register_frame(register: u8, value: u16) -> [u8; 4] {
    let [lo, hi] = value.to_le_bytes();
    [opcode::WRITE_REG_INFO, register, lo, hi]
}

/// QUERY_STATUS command frame.
pub fn query_status_frame() -> [u8; 1] {
    [opcode::QUERY_STATUS]
}

/// Decoded device status reply.
///
/// Wire layout (16 bytes, little-endian): pixel count u16, integration
/// time u32, then one byte each for lamp, trigger mode, acquisition
/// status, packets per spectrum, power down, packets in endpoint; bytes
/// 12-13 are reserved and not exposed; USB speed at byte 14; byte 15
/// reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Number of pixels the detector reports.
    pub pixel_count: u16,
    /// Current integration time in microseconds.
    pub integration_time_us: u32,
    /// Lamp enable line state.
    pub lamp_enabled: u8,
    /// Trigger mode.
    pub trigger_mode: u8,
    /// Acquisition state.
    pub acquisition_status: u8,
    /// Packets that make up one spectrum.
    pub packets_in_spectrum: u8,
    /// Power-down flag.
    pub power_down: u8,
    /// Packets currently queued in the endpoint.
    pub packets_in_endpoint: u8,
    /// USB speed (0 = full, 128 = high).
    pub usb_speed: u8,
}

/// Decode a QUERY_STATUS reply.
///
/// Requires exactly [`STATUS_REPLY_LEN`] bytes; a short or overlong reply
/// is [`SpectroError::Malformed`], never a partial snapshot.
pub fn decode_status(reply: &[u8]) -> Result<StatusSnapshot> {
    if reply.len() != STATUS_REPLY_LEN {
        return Err(SpectroError::Malformed(format!(
            "status reply must be {STATUS_REPLY_LEN} bytes, got {}",
            reply.len()
        )));
    }

    Ok(StatusSnapshot {
        pixel_count: u16::from_le_bytes([reply[0], reply[1]]),
        integration_time_us: u32::from_le_bytes([reply[2], reply[3], reply[4], reply[5]]),
        lamp_enabled: reply[6],
        trigger_mode: reply[7],
        acquisition_status: reply[8],
        packets_in_spectrum: reply[9],
        power_down: reply[10],
        packets_in_endpoint: reply[11],
        usb_speed: reply[14],
    })
}

/// Decode a QUERY_INFORMATION reply for the given `address`.
///
/// The device echoes the opcode and `address % 0xFF` in the first two
/// bytes; a mismatch is [`SpectroError::ProtocolMismatch`]. The payload is
/// everything from offset 2 up to (excluding) the first zero byte. A
/// reply with no zero terminator is [`SpectroError::Malformed`].
pub fn decode_information(address: u8, reply: &[u8]) -> Result<Vec<u8>> {
    if reply.len() < 2 {
        return Err(SpectroError::Malformed(format!(
            "information reply shorter than its echo header ({} bytes)",
            reply.len()
        )));
    }
    if reply[0] != opcode::QUERY_INFORMATION || reply[1] != address % 0xFF {
        return Err(SpectroError::ProtocolMismatch {
            address,
            got_opcode: reply[0],
            got_echo: reply[1],
        });
    }

    let payload = &reply[2..];
    let terminator = payload
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| SpectroError::Malformed("information reply has no zero terminator".into()))?;

    Ok(payload[..terminator].to_vec())
}

/// Why a spectrum packet was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The read returned a different byte count than the profile's packet size.
    LengthMismatch {
        /// Bytes actually read.
        got: usize,
        /// The profile's packet size.
        expected: usize,
    },
    /// The final byte was not [`SPECTRUM_TRAILER`].
    BadTrailer {
        /// The byte found in the trailer position.
        byte: u8,
    },
}

/// Outcome of one spectrum acquisition.
///
/// Rejection is an ordinary value, not an error: transient rejects are
/// expected during continuous acquisition and the caller simply requests
/// again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// A validated spectrum of [`PIXELS_PER_SPECTRUM`] pixels.
    Spectrum(Vec<u16>),
    /// The packet failed validation and was not decoded.
    Rejected(RejectReason),
}

/// Validate and decode one raw spectrum packet.
///
/// `expected_len` is the profile's `spectrum_packet_size`. A valid packet
/// decodes to exactly [`PIXELS_PER_SPECTRUM`] little-endian u16 pixels
/// from the first 4096 bytes; bytes between the payload and the trailer
/// (present on large-packet models) are ignored.
pub fn decode_spectrum(packet: &[u8], expected_len: usize) -> Acquisition {
    // The packet must hold the full payload plus the trailer byte.
    if packet.len() != expected_len || expected_len <= SPECTRUM_PAYLOAD_LEN {
        return Acquisition::Rejected(RejectReason::LengthMismatch {
            got: packet.len(),
            expected: expected_len,
        });
    }
    let trailer = packet[packet.len() - 1];
    if trailer != SPECTRUM_TRAILER {
        return Acquisition::Rejected(RejectReason::BadTrailer { byte: trailer });
    }

    let mut pixels: Vec<u16> = packet[..SPECTRUM_PAYLOAD_LEN]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    // Pixel 1 is a dead reference pixel on this device family; the vendor
    // protocol mirrors pixel 0 over it after decode, for every model.
    pixels[1] = pixels[0];

    Acquisition::Spectrum(pixels)
}
