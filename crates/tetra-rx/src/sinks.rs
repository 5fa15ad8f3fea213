//! Upward delivery interfaces
//!
//! The decoder hands decoded units to higher layers through these narrow
//! capability traits, keeping LLC, U-plane and telemetry out of the crate.
//! All sinks are owned boxed by the MAC and invoked from the ingestion path
//! only.

use tetra_core::{BitBuffer, LogicalChannel, MacAddress, TdmaTime};

use crate::mac::MacState;

/// Receives TM-SDUs for the LLC.
pub trait LlcSink {
    fn deliver(&mut self, sdu: BitBuffer, channel: LogicalChannel, time: TdmaTime, address: &MacAddress);
}

/// Receives raw traffic blocks (TCH / TCH_S) for the U-plane. The block is
/// descrambled but otherwise untouched; `encryption_mode` is the mode
/// recorded for the slot's usage marker.
pub trait UPlaneSink {
    fn deliver(
        &mut self,
        block: BitBuffer,
        channel: LogicalChannel,
        time: TdmaTime,
        address: &MacAddress,
        state: &MacState,
        encryption_mode: u8,
    );
}

/// Receives every decoded MAC block for capture export. Optional, gated at
/// construction.
pub trait WiresharkSink {
    fn deliver(&mut self, channel: LogicalChannel, time: TdmaTime, pdu: &BitBuffer);
}

/// Receives named counters and values for telemetry.
pub trait ReportSink {
    fn add(&mut self, key: &'static str, value: u64);
    fn incr(&mut self, key: &'static str);
}

/// Sink that drops everything, for callers not interested in a layer.
pub struct NullSink;

impl LlcSink for NullSink {
    fn deliver(&mut self, _sdu: BitBuffer, _channel: LogicalChannel, _time: TdmaTime, _address: &MacAddress) {}
}

impl UPlaneSink for NullSink {
    fn deliver(
        &mut self,
        _block: BitBuffer,
        _channel: LogicalChannel,
        _time: TdmaTime,
        _address: &MacAddress,
        _state: &MacState,
        _encryption_mode: u8,
    ) {
    }
}

impl WiresharkSink for NullSink {
    fn deliver(&mut self, _channel: LogicalChannel, _time: TdmaTime, _pdu: &BitBuffer) {}
}

impl ReportSink for NullSink {
    fn add(&mut self, _key: &'static str, _value: u64) {}
    fn incr(&mut self, _key: &'static str) {}
}
