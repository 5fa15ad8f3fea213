//! Core utilities for the TETRA downlink receiver
//!
//! This crate provides the fundamental types shared by the PDU parsers and
//! the decoder pipeline: the bit-level buffer, TDMA time keeping, MAC
//! addressing and the logging setup.

/// Git version string, set at compile time
pub const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");
/// Receiver version followed by git version string, e.g., "0.1.0-aabbccdd"
pub const RX_VERSION: &str = const_format::formatcp!("{}-{}", env!("CARGO_PKG_VERSION"), GIT_VERSION);

pub mod address;
pub mod bitbuffer;
pub mod debug;
pub mod freqs;
pub mod pdu_parse_error;
pub mod phy_types;
pub mod tdma_time;

// Re-export commonly used items
pub use address::{AddressKind, MacAddress};
pub use bitbuffer::BitBuffer;
pub use freqs::FreqInfo;
pub use pdu_parse_error::PduParseErr;
pub use phy_types::*;
pub use tdma_time::TdmaTime;
