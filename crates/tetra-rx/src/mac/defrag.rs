use tetra_core::{BitBuffer, MacAddress, TdmaTime};

const DEFRAG_BUF_INITIAL_BITS: usize = 512;
const DEFRAG_BUF_MAX_BITS: usize = 4096;

/// MAC defragmenter reassembling one SDU across MAC-RESOURCE (fragmenting)
/// -> MAC-FRAG* -> MAC-END. A single reassembly is in flight at a time;
/// the total fragmented length is not known in advance.
///
/// All misuse (append while idle, SSI mismatch, overflow) is logged and
/// resets the state; nothing propagates.
pub struct MacDefrag {
    sdu: BitBuffer,
    /// Address at start time, carrying the encryption mode and usage
    /// marker that tag the reassembled SDU
    address: MacAddress,
    start_time: TdmaTime,
    fragment_count: u8,
    stopped: bool,
}

impl MacDefrag {
    pub fn new() -> Self {
        MacDefrag {
            sdu: BitBuffer::new_autoexpand(DEFRAG_BUF_INITIAL_BITS),
            address: MacAddress::default(),
            start_time: TdmaTime::default(),
            fragment_count: 0,
            stopped: true,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.stopped
    }

    pub fn address(&self) -> &MacAddress {
        &self.address
    }

    /// Start collecting. A reassembly still in progress is discarded and
    /// counts as a failure.
    pub fn start(&mut self, address: MacAddress, time: TdmaTime) {
        if self.sdu.get_len() > 0 {
            tracing::warn!(
                "defrag failed: discarding {} fragments ({} bits) for {}",
                self.fragment_count,
                self.sdu.get_len(),
                self.address
            );
        }

        self.address = address;
        self.start_time = time;
        self.fragment_count = 0;
        self.sdu = BitBuffer::new_autoexpand(DEFRAG_BUF_INITIAL_BITS);
        self.stopped = false;

        tracing::debug!("defrag start: {} at {}", self.address, self.start_time);
    }

    /// Append the remainder of `frag` (from its position to its end).
    /// Rejected while idle; an address mismatch resets the defragmenter.
    pub fn append(&mut self, frag: &mut BitBuffer, address: &MacAddress) {
        if self.stopped {
            tracing::warn!("defrag append while idle, fragment for {} dropped", address);
            return;
        }
        if address.ssi() != self.address.ssi() {
            tracing::warn!("defrag append: SSI mismatch, {} while collecting {}", address, self.address);
            self.stop();
            return;
        }

        let num_bits = frag.get_len_remaining();
        if self.sdu.get_len() + num_bits > DEFRAG_BUF_MAX_BITS {
            tracing::warn!("defrag append: buffer would exceed {} bits", DEFRAG_BUF_MAX_BITS);
            self.stop();
            return;
        }

        self.sdu.copy_bits(frag, num_bits);
        self.fragment_count += 1;

        tracing::debug!(
            "defrag append: {} fragment {} ({} bits, total {})",
            self.address, self.fragment_count, num_bits, self.sdu.get_len()
        );
    }

    /// Hand out the reassembled SDU together with the encryption mode and
    /// usage marker captured at start time. The caller invokes `stop()`
    /// afterwards.
    pub fn take_sdu(&mut self) -> Option<(BitBuffer, u8, u8)> {
        if self.stopped {
            tracing::warn!("defrag take_sdu while idle");
            return None;
        }

        let encryption_mode = self.address.encryption_mode;
        let usage_marker = self.address.usage_marker().unwrap_or(0);
        let mut sdu = std::mem::replace(&mut self.sdu, BitBuffer::new_autoexpand(DEFRAG_BUF_INITIAL_BITS));
        sdu.seek(0);

        Some((sdu, encryption_mode, usage_marker))
    }

    pub fn stop(&mut self) {
        self.stopped = true;
        self.fragment_count = 0;
        self.sdu = BitBuffer::new_autoexpand(DEFRAG_BUF_INITIAL_BITS);
    }
}

impl Default for MacDefrag {
    fn default() -> Self {
        Self::new()
    }
}
