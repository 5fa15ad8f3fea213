//! Shared infrastructure for end-to-end decoder tests: downlink burst
//! construction through the encode direction of the coding chains, and
//! recording sinks for inspecting deliveries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tetra_core::{BitBuffer, LogicalChannel, MacAddress, TdmaTime};
use tetra_pdus::pdus::mac_sync::MacSync;
use tetra_pdus::pdus::mac_sysinfo::MacSysinfo;
use tetra_pdus::enums::sysinfo_opt_field_flag::SysinfoOptFieldFlag;

use tetra_rx::coding::{errorcontrol, scrambler};
use tetra_rx::decoder::train;
use tetra_rx::mac::MacState;
use tetra_rx::sinks::{LlcSink, ReportSink, UPlaneSink};
use tetra_rx::{RxConfig, TetraDecoder};

pub const FRAME_LEN: usize = 510;

// Burst construction (9.4.4.2), phase adjustment bits left zero ///////////

/// Synchronization downlink burst from type5 blocks:
/// 120-bit BKN1 (BSCH), 30-bit BBK, 216-bit BKN2.
pub fn build_sdb(blk1: &[u8], bbk: &[u8], blk2: &[u8]) -> [u8; FRAME_LEN] {
    assert!(blk1.len() == 120 && bbk.len() == 30 && blk2.len() == 216);
    let mut burst = [0u8; FRAME_LEN];

    burst[0..12].copy_from_slice(&train::SEQ_NORM3[10..]);
    burst[14..94].copy_from_slice(&train::FREQ_CORRECTION);
    burst[94..214].copy_from_slice(blk1);
    burst[214..252].copy_from_slice(&train::SEQ_SYNC);
    burst[252..282].copy_from_slice(bbk);
    burst[282..498].copy_from_slice(blk2);
    burst[500..510].copy_from_slice(&train::SEQ_NORM3[..10]);

    burst
}

/// Normal continuous downlink burst from type5 blocks: 432-bit slot block
/// and 30-bit BBK. Training sequence 1 marks one full-slot channel,
/// sequence 2 two half slots.
pub fn build_ndb(second_seq: bool, blk: &[u8], bbk: &[u8]) -> [u8; FRAME_LEN] {
    assert!(blk.len() == 432 && bbk.len() == 30);
    let mut burst = [0u8; FRAME_LEN];

    burst[0..12].copy_from_slice(&train::SEQ_NORM3[10..]);
    burst[14..230].copy_from_slice(&blk[..216]);
    burst[230..244].copy_from_slice(&bbk[..14]);
    if second_seq {
        burst[244..266].copy_from_slice(&train::SEQ_NORM2);
    } else {
        burst[244..266].copy_from_slice(&train::SEQ_NORM1);
    }
    burst[266..282].copy_from_slice(&bbk[14..]);
    burst[282..498].copy_from_slice(&blk[216..]);
    burst[500..510].copy_from_slice(&train::SEQ_NORM3[..10]);

    burst
}

// Block encoding helpers //////////////////////////////////////////////////

/// Zero-pad `content` into a type1 block of `block_len` bits
pub fn pack_block(mut content: BitBuffer, block_len: usize) -> BitBuffer {
    let len = content.get_len();
    assert!(len <= block_len, "content {} exceeds block {}", len, block_len);
    content.seek(0);
    let mut block = BitBuffer::new(block_len);
    block.copy_bits(&mut content, len);
    block.seek(0);
    block
}

fn type5_to_vec(type5: BitBuffer) -> Vec<u8> {
    type5.into_bitvec()
}

/// Encode a BSCH type1 block (60 bits) carrying SYNC + D-MLE-SYNC
pub fn encode_bsch(colour_code: u8, time: TdmaTime, mcc: u16, mnc: u16) -> Vec<u8> {
    let mut type1 = BitBuffer::new(60);
    let sync = MacSync {
        system_code: 0,
        colour_code,
        time,
        sharing_mode: 0,
        ts_reserved_frames: 0,
        u_plane_dtx: false,
        frame_18_ext: false,
    };
    sync.to_bitbuf(&mut type1);
    // D-MLE-SYNC: mcc, mnc, neighbour cell broadcast, cell load, late entry
    type1.write_bits(mcc as u64, 10);
    type1.write_bits(mnc as u64, 14);
    type1.write_bits(0, 5);
    type1.seek(0);

    type5_to_vec(errorcontrol::encode_cp(LogicalChannel::Bsch, type1, scrambler::SCRAMB_INIT))
}

/// Encode an AACH block from the raw 14 PDU bits
pub fn encode_aach(header: u8, field1: u8, field2: u8, scrambling_code: u32) -> Vec<u8> {
    let mut type1 = BitBuffer::new(14);
    type1.write_bits(header as u64, 2);
    type1.write_bits(field1 as u64, 6);
    type1.write_bits(field2 as u64, 6);
    type1.seek(0);

    type5_to_vec(errorcontrol::encode_aach(type1, scrambling_code))
}

/// Encode a half-slot signalling block (124 type1 bits)
pub fn encode_sch_hd(type1: BitBuffer, scrambling_code: u32) -> Vec<u8> {
    type5_to_vec(errorcontrol::encode_cp(LogicalChannel::SchHd, pack_block(type1, 124), scrambling_code))
}

/// Encode a full-slot signalling block (268 type1 bits)
pub fn encode_sch_f(type1: BitBuffer, scrambling_code: u32) -> Vec<u8> {
    type5_to_vec(errorcontrol::encode_cp(LogicalChannel::SchF, pack_block(type1, 268), scrambling_code))
}

/// SYSINFO on a half slot: 82-bit header plus 42-bit D-MLE-SYSINFO
pub fn sysinfo_type1(main_carrier: u16, freq_band: u8, freq_offset_index: u8) -> BitBuffer {
    let mut type1 = BitBuffer::new(124);
    let sysinfo = MacSysinfo {
        main_carrier,
        freq_band,
        freq_offset_index,
        duplex_spacing: 0,
        reverse_operation: false,
        num_of_csch: 0,
        ms_txpwr_max_cell: 4,
        rxlev_access_min: 2,
        access_parameter: 7,
        radio_dl_timeout: 3,
        cck_id: None,
        hyperframe_number: Some(1),
        option_field: SysinfoOptFieldFlag::ExtServicesBroadcast,
        option_bits: 0,
    };
    sysinfo.to_bitbuf(&mut type1);
    // D-MLE-SYSINFO: location area, subscriber class, service flags
    type1.write_bits(2, 14);
    type1.write_bits(0xFFFF, 16);
    type1.write_bits(0b100000000001, 12);
    type1.seek(0);
    type1
}

// Recording sinks /////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct LlcDelivery {
    pub bits: String,
    pub channel: LogicalChannel,
    pub time: TdmaTime,
    pub address: MacAddress,
}

#[derive(Clone, Default)]
pub struct RecordingLlc(pub Rc<RefCell<Vec<LlcDelivery>>>);

impl RecordingLlc {
    pub fn deliveries(&self) -> Vec<LlcDelivery> {
        self.0.borrow().clone()
    }
}

impl LlcSink for RecordingLlc {
    fn deliver(&mut self, sdu: BitBuffer, channel: LogicalChannel, time: TdmaTime, address: &MacAddress) {
        self.0.borrow_mut().push(LlcDelivery {
            bits: sdu.to_bitstr(),
            channel,
            time,
            address: *address,
        });
    }
}

#[derive(Debug, Clone)]
pub struct UPlaneDelivery {
    pub bits: String,
    pub channel: LogicalChannel,
    pub usage_marker: u8,
    pub encryption_mode: u8,
}

#[derive(Clone, Default)]
pub struct RecordingUPlane(pub Rc<RefCell<Vec<UPlaneDelivery>>>);

impl RecordingUPlane {
    pub fn deliveries(&self) -> Vec<UPlaneDelivery> {
        self.0.borrow().clone()
    }
}

impl UPlaneSink for RecordingUPlane {
    fn deliver(
        &mut self,
        block: BitBuffer,
        channel: LogicalChannel,
        _time: TdmaTime,
        _address: &MacAddress,
        state: &MacState,
        encryption_mode: u8,
    ) {
        self.0.borrow_mut().push(UPlaneDelivery {
            bits: block.to_bitstr(),
            channel,
            usage_marker: state.downlink_usage_marker,
            encryption_mode,
        });
    }
}

#[derive(Clone, Default)]
pub struct RecordingReport(pub Rc<RefCell<HashMap<&'static str, u64>>>);

impl RecordingReport {
    pub fn get(&self, key: &str) -> u64 {
        self.0.borrow().get(key).copied().unwrap_or(0)
    }
}

impl ReportSink for RecordingReport {
    fn add(&mut self, key: &'static str, value: u64) {
        self.0.borrow_mut().insert(key, value);
    }

    fn incr(&mut self, key: &'static str) {
        *self.0.borrow_mut().entry(key).or_insert(0) += 1;
    }
}

// Decoder setup ///////////////////////////////////////////////////////////

pub struct TestHarness {
    pub decoder: TetraDecoder,
    pub llc: RecordingLlc,
    pub uplane: RecordingUPlane,
    pub report: RecordingReport,
}

pub fn make_decoder() -> TestHarness {
    make_decoder_with_config(RxConfig::default())
}

pub fn make_decoder_with_config(config: RxConfig) -> TestHarness {
    let llc = RecordingLlc::default();
    let uplane = RecordingUPlane::default();
    let report = RecordingReport::default();

    let decoder = TetraDecoder::new(
        &config,
        Box::new(llc.clone()),
        Box::new(uplane.clone()),
        Box::new(report.clone()),
        None,
    );

    TestHarness { decoder, llc, uplane, report }
}

/// Feed a whole burst; returns whether a boundary was matched.
pub fn feed_burst(decoder: &mut TetraDecoder, burst: &[u8; FRAME_LEN]) -> bool {
    let mut found = false;
    for &bit in burst.iter() {
        found |= decoder.rx_symbol(bit);
    }
    found
}

/// Standard test cell: MCC 208, MNC 1, colour code 10, SYNC at 3/18/5
pub const TEST_MCC: u16 = 208;
pub const TEST_MNC: u16 = 1;
pub const TEST_COLOUR: u8 = 10;

pub fn test_scrambling_code() -> u32 {
    scrambler::tetra_scramb_get_init(TEST_MCC, TEST_MNC, TEST_COLOUR)
}

/// An SB burst whose BSCH announces the standard test cell and whose BKN2
/// carries a SYSINFO on SCH/HD.
pub fn sync_burst() -> [u8; FRAME_LEN] {
    let code = test_scrambling_code();
    let bkn1 = encode_bsch(TEST_COLOUR, TdmaTime { t: 3, f: 18, m: 5 }, TEST_MCC, TEST_MNC);
    let bbk = encode_aach(0, 0, 0, code);
    let bkn2 = encode_sch_hd(sysinfo_type1(2702, 4, 3), code);
    build_sdb(&bkn1, &bbk, &bkn2)
}

/// Bring a fresh decoder into sync on the standard test cell.
pub fn synchronize(harness: &mut TestHarness) {
    let found = feed_burst(&mut harness.decoder, &sync_burst());
    assert!(found, "sync burst not matched");
    assert!(harness.decoder.is_synchronized());
    assert_eq!(harness.decoder.mac().cell().scrambling_code(), test_scrambling_code());
}
