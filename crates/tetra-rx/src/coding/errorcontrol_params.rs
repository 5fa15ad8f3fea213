use tetra_core::LogicalChannel;

/// Error control parameters of a downlink logical channel: block sizes per
/// coding stage (Clause 8.2) and the interleaver coefficient.
#[derive(Debug)]
pub struct ErrorControlParams {
    pub type345_bits: usize,
    pub type2_bits: usize,
    pub type1_bits: usize,
    pub interleave_a: usize,
    pub have_crc16: bool,
}

/// Parameters for the BSCH (Broadcast Synchronization Channel)
pub const BSCH_PARAMS: ErrorControlParams = ErrorControlParams {
    type345_bits: 120,
    type2_bits: 80,
    type1_bits: 60,
    interleave_a: 11,
    have_crc16: true,
};

/// Parameters for the SCH/HD half-slot signalling channel, also used by
/// STCH and BNCH
pub const SCH_HD_PARAMS: ErrorControlParams = ErrorControlParams {
    type345_bits: 216,
    type2_bits: 144,
    type1_bits: 124,
    interleave_a: 101,
    have_crc16: true,
};

/// Parameters for the SCH/F full-slot signalling channel
pub const SCH_F_PARAMS: ErrorControlParams = ErrorControlParams {
    type345_bits: 432,
    type2_bits: 288,
    type1_bits: 268,
    interleave_a: 103,
    have_crc16: true,
};

/// Parameters for the BBK broadcast block carrying the AACH
pub const AACH_PARAMS: ErrorControlParams = ErrorControlParams {
    type345_bits: 30,
    type2_bits: 30,
    type1_bits: 14,
    interleave_a: 0, // no interleaving
    have_crc16: false,
};

/// Gets error control parameters for a downlink logical channel.
pub fn get_params(lchan: LogicalChannel) -> &'static ErrorControlParams {
    match lchan {
        LogicalChannel::Bsch => &BSCH_PARAMS,
        LogicalChannel::SchHd | LogicalChannel::Stch | LogicalChannel::Bnch => &SCH_HD_PARAMS,
        LogicalChannel::SchF => &SCH_F_PARAMS,
        LogicalChannel::Aach => &AACH_PARAMS,

        // traffic blocks bypass the control-plane coding chains
        LogicalChannel::TchS | LogicalChannel::Tch => unreachable!("traffic has no CP error control"),
    }
}
