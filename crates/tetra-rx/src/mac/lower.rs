//! Lower MAC: burst dissection and channel decoding
//!
//! Maps the blocks of each burst onto logical channels (9.5.1) and runs
//! them through the clause-8 decode chains. The MAC is either in
//! "signalling and packet" mode or in circuit (traffic) mode; the AACH of
//! the slot decides, so on normal bursts it is processed first.

use tetra_core::{BitBuffer, BurstType, LogicalChannel};

use crate::coding::{errorcontrol, scrambler};
use crate::mac::Mac;

/// Burst length in bits for continuous downlink
pub const FRAME_LEN: usize = 510;

fn extract(frame: &[u8], start: usize, len: usize) -> BitBuffer {
    BitBuffer::from_bitarr(&frame[start..start + len])
}

impl Mac {
    /// Lower MAC entry point: dissect one aligned 510-bit burst.
    ///
    /// Downlink mapping:
    ///   AACH on every burst
    ///   BSCH on SB BKN1 (SB is only sent where the BSCH is scheduled)
    ///   BNCH on bkn2 when FN == 18 and (MN + TN) % 4 == 1
    ///   SCH/F, SCH/HD, STCH, TCH on the BKN blocks otherwise
    pub fn service_lower_mac(&mut self, frame: &[u8], burst_type: BurstType) {
        assert!(frame.len() == FRAME_LEN, "burst must be {} bits", FRAME_LEN);
        tracing::debug!("service_lower_mac: burst = {} at {}", burst_type.name(), self.time);

        // frame 18 is reserved for control signalling, broadcast scheduling
        // is decided against the time at burst entry
        let bnch_flag = self.time.is_mandatory_bnch();

        // stolen flag lifetime is one NDB_SF burst only
        self.second_slot_stolen = false;

        match burst_type {
            BurstType::Sb => self.rx_sb_burst(frame),
            BurstType::Ndb => self.rx_ndb_burst(frame),
            BurstType::NdbSf => self.rx_ndb_sf_burst(frame, bnch_flag),
        }
    }

    /// Synchronization burst: BKN1 carries the BSCH, processed immediately
    /// since it derives the scrambling code for the rest of the burst.
    fn rx_sb_burst(&mut self, frame: &[u8]) {
        // BKN1 block - BSCH, scrambled with the predefined code
        let bkn1 = extract(frame, 94, 120);
        let (bkn1, crc_ok) = errorcontrol::decode_cp(LogicalChannel::Bsch, bkn1, scrambler::SCRAMB_INIT);
        if crc_ok {
            self.service_upper_mac(bkn1, LogicalChannel::Bsch);
        }

        // BBK block - AACH
        let bbk = extract(frame, 252, 30);
        let bbk = errorcontrol::decode_aach(bbk, self.cell.scrambling_code());
        self.service_upper_mac(bbk, LogicalChannel::Aach);

        // BKN2 block - SCH/HD
        let bkn2 = extract(frame, 282, 216);
        let (bkn2, crc_ok) = errorcontrol::decode_cp(LogicalChannel::SchHd, bkn2, self.cell.scrambling_code());
        if crc_ok {
            self.service_upper_mac(bkn2, LogicalChannel::SchHd);
        }
    }

    /// Normal downlink burst: one logical channel in the whole slot.
    fn rx_ndb_burst(&mut self, frame: &[u8]) {
        // BBK is carried in two parts around the training sequence
        let mut bbk_bits = [0u8; 30];
        bbk_bits[..14].copy_from_slice(&frame[230..244]);
        bbk_bits[14..].copy_from_slice(&frame[266..282]);
        let bbk = errorcontrol::decode_aach(BitBuffer::from_bitarr(&bbk_bits), self.cell.scrambling_code());
        self.service_upper_mac(bbk, LogicalChannel::Aach);

        // BKN1 + BKN2 reconstructed into one 432-bit block
        let mut blk_bits = [0u8; 432];
        blk_bits[..216].copy_from_slice(&frame[14..230]);
        blk_bits[216..].copy_from_slice(&frame[282..498]);

        if self.state.downlink_usage.is_traffic() && self.time.f <= 17 {
            // circuit mode: the descrambled block goes straight to the
            // U-plane, speech/data decoding happens above us
            let mut block = BitBuffer::from_bitarr(&blk_bits);
            scrambler::tetra_scramb_bits(self.cell.scrambling_code(), &mut block);
            self.service_upper_mac(block, LogicalChannel::TchS);
        } else {
            let block = BitBuffer::from_bitarr(&blk_bits);
            let (block, crc_ok) = errorcontrol::decode_cp(LogicalChannel::SchF, block, self.cell.scrambling_code());
            if crc_ok {
                self.service_upper_mac(block, LogicalChannel::SchF);
            }
        }
    }

    /// Normal downlink burst with training sequence 2: two independent
    /// half-slot blocks, each possibly stolen from traffic.
    fn rx_ndb_sf_burst(&mut self, frame: &[u8], bnch_flag: bool) {
        // BBK block - AACH, as on a plain NDB
        let mut bbk_bits = [0u8; 30];
        bbk_bits[..14].copy_from_slice(&frame[230..244]);
        bbk_bits[14..].copy_from_slice(&frame[266..282]);
        let bbk = errorcontrol::decode_aach(BitBuffer::from_bitarr(&bbk_bits), self.cell.scrambling_code());
        self.service_upper_mac(bbk, LogicalChannel::Aach);

        // both half slots run the SCH/HD chain; validity is per block
        let bkn1 = extract(frame, 14, 216);
        let (bkn1, bkn1_valid) = errorcontrol::decode_cp(LogicalChannel::SchHd, bkn1, self.cell.scrambling_code());

        let bkn2 = extract(frame, 282, 216);
        let (bkn2, bkn2_valid) = errorcontrol::decode_cp(LogicalChannel::SchHd, bkn2, self.cell.scrambling_code());

        if self.state.downlink_usage.is_traffic() && self.time.f <= 17 {
            // first block is stolen for C- or U-plane signalling
            if bkn1_valid {
                self.service_upper_mac(bkn1, LogicalChannel::Stch);
            }

            // the second block is stolen only when announced by the
            // preceding MAC-RESOURCE; otherwise it stays traffic
            // (half-slot TCH is not carried upwards)
            if self.second_slot_stolen {
                if bkn2_valid {
                    self.service_upper_mac(bkn2, LogicalChannel::Stch);
                }
            }
        } else {
            // signalling mode (19.4.4)
            if bkn1_valid {
                self.service_upper_mac(bkn1, LogicalChannel::SchHd);
            }

            if bkn2_valid {
                if bnch_flag {
                    self.service_upper_mac(bkn2, LogicalChannel::Bnch);
                } else {
                    self.service_upper_mac(bkn2, LogicalChannel::SchHd);
                }
            }
        }
    }
}
