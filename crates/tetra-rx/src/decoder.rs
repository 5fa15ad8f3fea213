//! Burst synchronizer
//!
//! Feeds on one demodulated bit at a time, finds burst boundaries by
//! correlating against the training sequences, classifies the burst and
//! hands 510-bit frames to the lower MAC. While synchronized, up to 50
//! missed bursts are carried over the assumed slot boundary before the
//! search starts over.

use std::collections::VecDeque;

use tetra_core::BurstType;

use crate::config::RxConfig;
use crate::mac::{Mac, FRAME_LEN};
use crate::sinks::{LlcSink, ReportSink, UPlaneSink, WiresharkSink};

/// Training sequences of Clause 9.4.4.3, one bit per byte
pub mod train {
    /// 9.4.4.3.2 Normal Training Sequence 1, 22 n-bits
    pub const SEQ_NORM1: [u8; 22] = [1, 1, 0, 1, 0, 0, 0, 0, 1, 1, 1, 0, 1, 0, 0, 1, 1, 1, 0, 1, 0, 0];
    /// 9.4.4.3.2 Normal Training Sequence 2, 22 p-bits
    pub const SEQ_NORM2: [u8; 22] = [0, 1, 1, 1, 1, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 1, 1, 1, 0];
    /// 9.4.4.3.2 Normal Training Sequence 3, 22 q-bits. In continuous mode
    /// it straddles the slot boundary: q11..q22 open a burst, q1..q10
    /// close it.
    pub const SEQ_NORM3: [u8; 22] = [1, 0, 1, 1, 0, 1, 1, 1, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1];
    /// q11..q22 at the start of an aligned burst
    pub const NTS_3_BEGIN: [u8; 12] = [0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1];
    /// q1..q10 at the end of an aligned burst
    pub const NTS_3_END: [u8; 10] = [1, 0, 1, 1, 0, 1, 1, 1, 0, 0];
    /// 9.4.4.3.4 Synchronization training sequence, 38 y-bits
    pub const SEQ_SYNC: [u8; 38] = [
        1, 1, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1, 1, 0, 0, 1, 1, 1, 0, 1, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1, 1,
    ];
    /// 9.4.4.3.1 Frequency correction field of a synchronization burst
    pub const FREQ_CORRECTION: [u8; 80] = [
        1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1,
        1, 1, 1, 1,
    ];

    /// Offset of the y-bits within an aligned burst
    pub const SEQ_SYNC_OFFSET: usize = 214;
    /// Offset of the n- or p-bits within an aligned burst
    pub const SEQ_NORM_OFFSET: usize = 244;
    /// Offset of the closing q-bits within an aligned burst
    pub const NTS_3_END_OFFSET: usize = 500;
}

/// Tolerated missed bursts before synchronization is declared lost
const MAX_MISSED_BURSTS: i64 = 50;

/// Highest acceptable training sequence distance for burst classification
const MAX_TRAIN_SEQ_ERRORS: u32 = 5;

pub struct TetraDecoder {
    /// Sliding window over the last FRAME_LEN received bits
    frame: VecDeque<u8>,
    synchronized: bool,
    sync_bit_counter: i64,
    mac: Mac,
}

impl TetraDecoder {
    /// Builds the full receive pipeline. The Wireshark sink is dropped
    /// unless the configuration asks for capture output.
    pub fn new(
        config: &RxConfig,
        llc: Box<dyn LlcSink>,
        uplane: Box<dyn UPlaneSink>,
        report: Box<dyn ReportSink>,
        wireshark: Option<Box<dyn WiresharkSink>>,
    ) -> Self {
        config.setup_logging();

        let wireshark = if config.wireshark_output { wireshark } else { None };

        TetraDecoder {
            frame: VecDeque::with_capacity(FRAME_LEN),
            synchronized: false,
            sync_bit_counter: 0,
            mac: Mac::new(config.remove_fill_bits, llc, uplane, report, wireshark),
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    pub fn mac(&self) -> &Mac {
        &self.mac
    }

    /// Process one received symbol (a hard-decision bit). Returns true if a
    /// burst boundary was matched on this call.
    pub fn rx_symbol(&mut self, symbol: u8) -> bool {
        assert!(symbol <= 1, "rx_symbol: symbol must be 0 or 1");

        self.frame.push_back(symbol);
        if self.frame.len() < FRAME_LEN {
            return false;
        }

        let score_begin = self.pattern_score(&train::NTS_3_BEGIN, 0);
        let score_end = self.pattern_score(&train::NTS_3_END, train::NTS_3_END_OFFSET);

        let frame_found = score_begin == 0 && score_end < 2;
        if frame_found {
            // burst matched; tolerate MAX_MISSED_BURSTS before losing sync
            self.synchronized = true;
            self.sync_bit_counter = FRAME_LEN as i64 * MAX_MISSED_BURSTS;
        }

        let mut cleared = false;

        // a burst is processed on a training match, or on the assumed slot
        // boundary while still synchronized
        if frame_found || (self.synchronized && self.sync_bit_counter % FRAME_LEN as i64 == 0) {
            self.mac.increment_tn();
            self.process_frame();

            self.frame.clear();
            cleared = true;
        }

        if self.synchronized {
            self.sync_bit_counter -= 1;
            if self.sync_bit_counter <= 0 {
                tracing::warn!("synchronization lost");
                self.mac.report_sync_lost();
                self.synchronized = false;
                self.sync_bit_counter = 0;
            }
        }

        if !cleared {
            // slide the window by one symbol
            self.frame.pop_front();
        }

        frame_found
    }

    /// Classify the burst by its mid-slot training sequence and hand it to
    /// the lower MAC. An ambiguous burst (best score above the threshold)
    /// is dropped; TDMA time has already advanced for it.
    fn process_frame(&mut self) {
        let score_sync = self.pattern_score(&train::SEQ_SYNC, train::SEQ_SYNC_OFFSET);
        let score_normal1 = self.pattern_score(&train::SEQ_NORM1, train::SEQ_NORM_OFFSET);
        let score_normal2 = self.pattern_score(&train::SEQ_NORM2, train::SEQ_NORM_OFFSET);

        let mut score_min = score_sync;
        let mut burst_type = BurstType::Sb;

        if score_normal1 < score_min {
            score_min = score_normal1;
            burst_type = BurstType::Ndb;
        }
        if score_normal2 < score_min {
            score_min = score_normal2;
            burst_type = BurstType::NdbSf;
        }

        if score_min <= MAX_TRAIN_SEQ_ERRORS {
            let mut bits = [0u8; FRAME_LEN];
            for (slot, &bit) in bits.iter_mut().zip(self.frame.iter()) {
                *slot = bit;
            }
            self.mac.service_lower_mac(&bits, burst_type);
        } else {
            tracing::debug!("burst dropped, best training score {}", score_min);
        }
    }

    /// Hamming distance between the window at `position` and `pattern`
    fn pattern_score(&self, pattern: &[u8], position: usize) -> u32 {
        pattern
            .iter()
            .enumerate()
            .map(|(i, &p)| (p ^ self.frame[position + i]) as u32)
            .sum()
    }
}
