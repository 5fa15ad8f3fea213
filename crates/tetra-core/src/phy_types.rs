//! PHY-layer types referenced across the decoder
//!
//! These originate from the PHY layer but are used by both MAC halves and
//! the sink interfaces, so they live in tetra-core.

/// Downlink burst types in continuous mode (Clause 9.4.4.1)
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BurstType {
    /// Synchronization Downlink Burst
    Sb,
    /// Normal Downlink Burst, one logical channel in the slot
    Ndb,
    /// Normal Downlink Burst with training sequence 2: two half slots,
    /// signalling possibly stolen from traffic
    NdbSf,
}

impl BurstType {
    pub fn name(self) -> &'static str {
        match self {
            BurstType::Sb => "SB",
            BurstType::Ndb => "NDB",
            BurstType::NdbSf => "NDB_SF",
        }
    }
}

/// Downlink logical channels handled by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalChannel {
    /// Access Assignment CHannel
    Aach,
    /// Broadcast Synchronization Channel
    Bsch,
    /// Broadcast Network Channel
    Bnch,
    /// Signalling Channel, full slot
    SchF,
    /// Signalling Channel, half slot downlink
    SchHd,
    /// STealing Channel, half slot
    Stch,
    /// Traffic Channel, full slot
    TchS,
    /// Traffic Channel, half slot
    Tch,
}

impl LogicalChannel {
    pub fn is_traffic(self) -> bool {
        matches!(self, LogicalChannel::TchS | LogicalChannel::Tch)
    }

    /// Channels whose blocks enter the MAC PDU demultiplexer
    pub fn is_signalling(self) -> bool {
        matches!(
            self,
            LogicalChannel::Bnch | LogicalChannel::SchF | LogicalChannel::SchHd | LogicalChannel::Stch
        )
    }
}
