//! TETRA continuous-downlink decoder
//!
//! Consumes one demodulated hard-decision bit per call and produces typed
//! MAC events for higher layers: burst synchronization, channel decoding,
//! logical channel demux, MAC PDU dissection and defragmentation.
//! EN 300 392-2 v3.4.1, downlink only.

pub mod cell;
pub mod coding;
pub mod config;
pub mod decoder;
pub mod mac;
pub mod sinks;

pub use cell::CellContext;
pub use config::{LogLevel, RxConfig};
pub use decoder::TetraDecoder;
pub use mac::{Mac, MacState};
pub use sinks::{LlcSink, ReportSink, UPlaneSink, WiresharkSink};
