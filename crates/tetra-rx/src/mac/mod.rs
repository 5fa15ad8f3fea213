//! MAC layer: burst dissection (lower half) and PDU dissection (upper half)
//!
//! One `Mac` owns all receiver state below the LLC: TDMA time, cell
//! context, current address, downlink usage, the usage-marker encryption
//! map and the defragmenter. The lower half lives in `lower.rs`, the PDU
//! demultiplexer in `upper.rs`.

pub mod defrag;
pub mod fillbits;
mod lower;
mod upper;

pub use lower::FRAME_LEN;

use tetra_core::{LogicalChannel, MacAddress, TdmaTime};
use tetra_pdus::enums::downlink_usage::DownlinkUsage;

use crate::cell::CellContext;
use crate::mac::defrag::MacDefrag;
use crate::sinks::{LlcSink, ReportSink, UPlaneSink, WiresharkSink};

/// Slot state derived from the last ACCESS-ASSIGN
#[derive(Debug, Clone, Copy)]
pub struct MacState {
    pub logical_channel: LogicalChannel,
    pub downlink_usage: DownlinkUsage,
    /// 0..63, only meaningful while downlink_usage is traffic
    pub downlink_usage_marker: u8,
}

impl Default for MacState {
    fn default() -> Self {
        MacState {
            logical_channel: LogicalChannel::Aach,
            downlink_usage: DownlinkUsage::Unallocated,
            downlink_usage_marker: 0,
        }
    }
}

pub struct Mac {
    remove_fill_bits: bool,

    pub(crate) time: TdmaTime,
    pub(crate) cell: CellContext,
    pub(crate) state: MacState,
    /// Current address, set by the last address-carrying MAC header
    pub(crate) address: MacAddress,
    /// Encryption mode per usage marker, rewritten by usage marker
    /// assignments; consulted when handing traffic to the U-plane
    pub(crate) usage_marker_encryption: [u8; 64],
    /// Set by a MAC-RESOURCE with length 0b111110; lives for one NDB_SF burst
    pub(crate) second_slot_stolen: bool,
    pub(crate) defrag: MacDefrag,

    pub(crate) llc: Box<dyn LlcSink>,
    pub(crate) uplane: Box<dyn UPlaneSink>,
    pub(crate) report: Box<dyn ReportSink>,
    pub(crate) wireshark: Option<Box<dyn WiresharkSink>>,
}

impl Mac {
    pub fn new(
        remove_fill_bits: bool,
        llc: Box<dyn LlcSink>,
        uplane: Box<dyn UPlaneSink>,
        report: Box<dyn ReportSink>,
        wireshark: Option<Box<dyn WiresharkSink>>,
    ) -> Self {
        Mac {
            remove_fill_bits,
            time: TdmaTime::default(),
            cell: CellContext::new(),
            state: MacState::default(),
            address: MacAddress::default(),
            usage_marker_encryption: [0; 64],
            second_slot_stolen: false,
            defrag: MacDefrag::new(),
            llc,
            uplane,
            report,
            wireshark,
        }
    }

    /// Advance TDMA time by one slot, with wrap-up as required.
    /// Called once per processed burst, before the burst is dissected.
    pub fn increment_tn(&mut self) {
        self.time.increment();
    }

    pub fn time(&self) -> TdmaTime {
        self.time
    }

    pub fn cell(&self) -> &CellContext {
        &self.cell
    }

    pub fn mac_state(&self) -> &MacState {
        &self.state
    }

    pub fn defrag_is_idle(&self) -> bool {
        self.defrag.is_idle()
    }

    pub(crate) fn report_sync_lost(&mut self) {
        self.report.incr("sync-lost");
    }

    /// Decode the 6-bit MAC header length indication into octets, table
    /// 21.55. Y2 and Z2 are 1 for pi/4-DQPSK. Reserved values decode to 0,
    /// which doubles as the invalid marker; the stolen-second-slot and
    /// fragmentation values pass through unchanged.
    pub(crate) fn decode_length(val: u32) -> u32 {
        const Y2: u32 = 1;
        const Z2: u32 = 1;

        if val == 0b000000 || val == 0b111011 || val == 0b111100 {
            0 // reserved
        } else if val <= 0b010010 {
            val * Y2
        } else if val <= 0b111010 {
            18 * Y2 + (val - 18) * Z2
        } else if val == 0b111101 {
            0 // QAM only
        } else {
            // 0b111110 (second half slot stolen) and 0b111111 (frag start)
            val
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_length_table() {
        assert_eq!(Mac::decode_length(0b000000), 0);
        assert_eq!(Mac::decode_length(0b000010), 2);
        assert_eq!(Mac::decode_length(0b010010), 18);
        assert_eq!(Mac::decode_length(0b010011), 19);
        assert_eq!(Mac::decode_length(0b111010), 58);
        assert_eq!(Mac::decode_length(0b111011), 0);
        assert_eq!(Mac::decode_length(0b111100), 0);
        assert_eq!(Mac::decode_length(0b111101), 0);
        assert_eq!(Mac::decode_length(0b111110), 62);
        assert_eq!(Mac::decode_length(0b111111), 63);
    }
}
