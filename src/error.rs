//! Error types for the spectrometer driver.
//!
//! Two layers, mirroring the wire protocol's split between transport and
//! protocol failures:
//!
//! - [`TransportError`] is what the USB layer reports. The protocol code
//!   never retries or reinterprets these; they are surfaced unchanged
//!   through [`SpectroError::Transport`].
//! - [`SpectroError`] is the driver-level taxonomy: unknown hardware,
//!   invalid arguments, and replies that fail validation.
//!
//! A rejected spectrum packet is deliberately *not* an error: transient
//! rejects are an expected outcome of continuous acquisition and are
//! returned as a value (see [`crate::protocol::Acquisition`]).

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type Result<T> = std::result::Result<T, SpectroError>;

/// Failure reported by the bulk-transfer layer.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transfer did not complete within the transport's timeout.
    #[error("transfer timed out")]
    Timeout,

    /// The endpoint stalled.
    #[error("endpoint stalled")]
    Stall,

    /// The device is gone.
    #[error("device disconnected")]
    Disconnected,

    /// Any other transfer failure, with the backend's message.
    #[error("transfer failed: {0}")]
    Io(String),
}

/// Driver-level error taxonomy.
#[derive(Error, Debug)]
pub enum SpectroError {
    /// The product ID is not in the device profile registry.
    #[error("no device profile for product id 0x{product_id:04X}")]
    UnknownProduct {
        /// USB product ID that failed the registry lookup.
        product_id: u16,
    },

    /// No supported spectrometer was found on the bus.
    #[error("no supported spectrometer found")]
    DeviceNotFound,

    /// Transport failure, propagated unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Integration time does not fit the wire format's 32-bit field.
    #[error("integration time of {0} us does not fit in 32 bits")]
    IntegrationTimeOutOfRange(u128),

    /// An information reply's echo bytes do not match the request.
    #[error(
        "information reply echo mismatch for address 0x{address:02X}: \
         got opcode 0x{got_opcode:02X}, echo 0x{got_echo:02X}"
    )]
    ProtocolMismatch {
        /// Address that was queried.
        address: u8,
        /// Opcode byte the device echoed back.
        got_opcode: u8,
        /// Address echo byte the device sent.
        got_echo: u8,
    },

    /// A reply is missing expected structure.
    #[error("malformed response: {0}")]
    Malformed(String),
}
