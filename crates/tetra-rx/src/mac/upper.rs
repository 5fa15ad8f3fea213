//! Upper MAC: PDU demultiplex and dissection
//!
//! MAC PDU mapping on logical channels (23.2.2) and PDU dissociation
//! (23.4.3.3):
//!
//!   AACH             ACCESS-ASSIGN
//!   BSCH             SYNC
//!   BNCH on SCH/HD   SYSINFO
//!   SCH/F or SCH/HD  MAC-RESOURCE, MAC-FRAG, MAC-END, MAC-D-BLCK
//!   TCH_S, TCH       circuit mode traffic

use tetra_core::{AddressKind, BitBuffer, FreqInfo, LogicalChannel, MacAddress};
use tetra_pdus::enums::broadcast_type::BroadcastType;
use tetra_pdus::enums::downlink_usage::DownlinkUsage;
use tetra_pdus::enums::mac_pdu_type::MacPduType;
use tetra_pdus::pdus::access_assign::AccessAssign;
use tetra_pdus::pdus::access_define::AccessDefine;
use tetra_pdus::pdus::mac_d_blck::MacDBlck;
use tetra_pdus::pdus::mac_end::MacEnd;
use tetra_pdus::pdus::mac_frag::MacFrag;
use tetra_pdus::pdus::mac_resource::{self, MacResource};
use tetra_pdus::pdus::mac_sync::MacSync;
use tetra_pdus::pdus::mac_sysinfo::MacSysinfo;

use crate::mac::{fillbits, Mac};

/// A null PDU is 16 bits; anything shorter than this cannot hold another
/// meaningful MAC-RESOURCE, so dissociation stops below it.
const MIN_MAC_RESOURCE_SIZE: i64 = 40;

/// Upper bound on PDUs dissociated out of one block
const MAX_DISSOCIATED_PDUS: usize = 32;

impl Mac {
    /// Process one decoded block from the lower MAC.
    pub fn service_upper_mac(&mut self, block: BitBuffer, lchan: LogicalChannel) {
        tracing::debug!("service_upper_mac: {:?} ({} bits)", lchan, block.get_len());

        if let Some(wireshark) = &mut self.wireshark {
            wireshark.deliver(lchan, self.time, &block);
        }

        self.state.logical_channel = lchan;

        match lchan {
            LogicalChannel::Aach => {
                self.pdu_process_aach(block);
            }
            LogicalChannel::Bsch => {
                if let Some(sdu) = self.pdu_process_sync(block) {
                    let addr = self.address;
                    self.llc.deliver(sdu, lchan, self.time, &addr);
                }
            }
            LogicalChannel::TchS | LogicalChannel::Tch => {
                let marker = self.state.downlink_usage_marker;
                let encryption = self.usage_marker_encryption[marker as usize];
                tracing::info!(
                    "{:?}: {} dl_usage_marker={} encr={}",
                    lchan, self.time, marker, encryption
                );
                let addr = self.address;
                let state = self.state;
                self.uplane.deliver(block, lchan, self.time, &addr, &state, encryption);
            }
            LogicalChannel::Bnch | LogicalChannel::SchF | LogicalChannel::SchHd | LogicalChannel::Stch => {
                self.demux_signalling(block, lchan);
            }
        }
    }

    /// Signalling demultiplexer: dispatch by PDU type, then dissociate
    /// concatenated PDUs out of the same block while enough bits remain.
    fn demux_signalling(&mut self, block: BitBuffer, lchan: LogicalChannel) {
        let mut pdu = block;
        let mut pdu_count = 0;

        loop {
            pdu_count += 1;

            let Some(pdu_type_bits) = pdu.peek_bits(2) else {
                tracing::warn!("demux: block too short: {}", pdu.dump_bin());
                return;
            };
            let pdu_type = MacPduType::try_from(pdu_type_bits).unwrap(); // 2 bits always map

            let mut sdu: Option<BitBuffer> = None;
            let mut dissociate = false;
            let mut pdu_size: i64 = 0;

            match pdu_type {
                MacPduType::MacResource => {
                    let (s, fragmented, size) = self.pdu_process_resource(&pdu, lchan);
                    pdu_size = size;
                    if !fragmented {
                        // the fragmenting SDU is held by the defragmenter
                        // until MAC-END; everything else goes up now
                        sdu = s;
                        if size > 0 {
                            dissociate = true;
                        }
                    }
                }
                MacPduType::MacFragMacEnd => match pdu.peek_bits_startoffset(2, 1) {
                    Some(0) => self.pdu_process_mac_frag(&pdu),
                    Some(_) => sdu = self.pdu_process_mac_end(&pdu),
                    None => return,
                },
                MacPduType::Broadcast => {
                    let Some(bits) = pdu.peek_bits_startoffset(2, 2) else { return };
                    match BroadcastType::try_from(bits) {
                        Ok(BroadcastType::Sysinfo) => {
                            let (s, size) = self.pdu_process_sysinfo(&pdu);
                            sdu = s;
                            pdu_size = size;
                            dissociate = size > 0;
                        }
                        Ok(BroadcastType::AccessDefine) => {
                            pdu_size = self.pdu_process_access_define(&pdu);
                            dissociate = pdu_size > 0;
                        }
                        _ => {
                            tracing::debug!("demux: reserved broadcast type {}", bits);
                        }
                    }
                }
                MacPduType::MacDBlck => {
                    // 21.4.1: not sent on SCH/HD or STCH
                    if lchan != LogicalChannel::Stch && lchan != LogicalChannel::SchHd {
                        let (s, size) = self.pdu_process_d_block(&pdu);
                        sdu = s;
                        pdu_size = size;
                        dissociate = size > 0;
                    } else {
                        tracing::warn!("MAC error: {} supplementary block on {:?}", self.time, lchan);
                    }
                }
            }

            if let Some(s) = sdu {
                let addr = self.address;
                self.llc.deliver(s, lchan, self.time, &addr);
            }

            // not enough remaining bits to decode another PDU
            if (pdu.get_len() as i64 - pdu_size) < MIN_MAC_RESOURCE_SIZE {
                break;
            }
            if !dissociate || pdu_count >= MAX_DISSOCIATED_PDUS {
                break;
            }

            // shift the window past the consumed PDU and go again
            let new_start = pdu.get_raw_start() + pdu_size as usize;
            pdu.set_raw_pos(new_start);
            pdu.set_raw_start(new_start);
        }
    }

    /// ACCESS-ASSIGN (21.4.7, table 21.77): updates the slot's downlink
    /// usage. Frame 18 is reserved for control signalling (23.3.1.3).
    fn pdu_process_aach(&mut self, mut block: BitBuffer) {
        let pdu = match AccessAssign::from_bitbuf(&mut block) {
            Ok(pdu) => pdu,
            Err(e) => {
                tracing::warn!("failed parsing AccessAssign: {:?} {}", e, block.dump_bin());
                return;
            }
        };
        tracing::debug!("<- {}", pdu);

        self.state.downlink_usage_marker = 0;
        if self.time.f == 18 {
            self.state.downlink_usage = DownlinkUsage::CommonControl;
        } else {
            self.state.downlink_usage = pdu.dl_usage;
            if let DownlinkUsage::Traffic(marker) = pdu.dl_usage {
                self.state.downlink_usage_marker = marker;
            }
        }
    }

    /// SYNC (21.4.4.2, table 21.65): updates TDMA time and the cell
    /// identity, rederives the scrambling code and yields the 29-bit
    /// D-MLE-SYNC SDU.
    fn pdu_process_sync(&mut self, mut block: BitBuffer) -> Option<BitBuffer> {
        const MIN_SIZE: usize = 60;

        if block.get_len() < MIN_SIZE {
            self.report.add("invalid-pdu-size", block.get_len() as u64);
            self.report.add("pdu-minimum-size", MIN_SIZE as u64);
            return None;
        }

        let pdu = match MacSync::from_bitbuf(&mut block) {
            Ok(pdu) => pdu,
            Err(e) => {
                tracing::warn!("failed parsing MacSync: {:?} {}", e, block.dump_bin());
                return None;
            }
        };
        tracing::debug!("<- {}", pdu);

        // MCC and MNC belong to the MLE, but the scrambling code needs them
        // here; they lead the D-MLE-SYNC SDU
        let mcc = block.peek_bits_startoffset(31, 10).unwrap() as u16; // size checked above
        let mnc = block.peek_bits_startoffset(41, 14).unwrap() as u16;

        self.time = pdu.time;
        self.cell.update_scrambling_code(mcc, mnc, pdu.colour_code);
        self.report.incr("sync");

        if self.time.is_mandatory_bsch() {
            tracing::info!(
                "BSCH: {} colour_code={} MCC/MNC={}/{} freq={:.6} MHz",
                self.time,
                self.cell.colour_code(),
                self.cell.mcc(),
                self.cell.mnc(),
                self.cell.downlink_frequency() as f64 / 1e6
            );
        }

        // 29 bits of TM-SDU, from position 31 (clause 18)
        Some(BitBuffer::from_bitbuffer_pos(&block))
    }

    /// MAC-RESOURCE (21.4.3.1, table 21.55). Returns the extracted TM-SDU
    /// (None when absent or held back for defragmentation), whether the PDU
    /// starts a fragmented message, and the PDU size within the MAC block
    /// (-1 flags a null PDU).
    fn pdu_process_resource(&mut self, outer: &BitBuffer, lchan: LogicalChannel) -> (Option<BitBuffer>, bool, i64) {
        let mut pdu = BitBuffer::from_bitbuffer_pos(outer);

        // null PDU check first: all other fields are discarded (21.4.3.1)
        let Some(addr_type) = pdu.peek_bits_startoffset(13, 3) else {
            tracing::warn!("MAC-RESOURCE too short: {}", pdu.dump_bin());
            return (None, false, 0);
        };
        if addr_type == 0b000 {
            tracing::debug!("MAC-RESOURCE null PDU");
            self.report.incr("null-pdu");
            return (None, false, -1);
        }

        // fill bit indication sits before the fields that need it removed
        if pdu.peek_bits_startoffset(2, 1) == Some(1) && self.remove_fill_bits {
            fillbits::strip(&mut pdu);
        }

        let hdr = match MacResource::from_bitbuf(&mut pdu, self.time.f == 18) {
            Ok(hdr) => hdr,
            Err(e) => {
                tracing::warn!("failed parsing MacResource: {:?} {}", e, pdu.dump_bin());
                return (None, false, 0);
            }
        };
        tracing::debug!("<- {}", hdr);
        let pos = pdu.get_pos() as i64;

        let mut fragmented = false;
        if hdr.length_ind == mac_resource::LENGTH_IND_SECOND_SLOT_STOLEN {
            self.second_slot_stolen = true;
        } else if hdr.length_ind == mac_resource::LENGTH_IND_START_FRAG {
            fragmented = true;
            self.second_slot_stolen = false;
        }

        self.address = hdr.address;
        if let AddressKind::SsiUsageMarker { usage_marker, .. } = hdr.address.kind {
            // usage marker assignment carries the encryption mode for
            // subsequent traffic under this marker
            self.usage_marker_encryption[usage_marker as usize] = hdr.encryption_mode;
        }

        let decoded_octets = Mac::decode_length(hdr.length_ind as u32) as i64;

        // FIXME to check: the PDU size stays 0 when a fragmented packet
        // starts, so dissociation never runs behind a fragment
        let pdu_size = if fragmented { 0 } else { decoded_octets * 8 };

        let mut sdu_length = decoded_octets * 8 - pos;
        let remaining = pdu.get_len_remaining() as i64;
        if hdr.length_ind >= mac_resource::LENGTH_IND_SECOND_SLOT_STOLEN {
            // stolen second slot and fragmentation start both fill the slot
            sdu_length = remaining;
        } else if sdu_length > remaining {
            // observed on air: a length indication overshooting the block;
            // crop to what the slot actually carries
            tracing::warn!(
                "MAC-RESOURCE length {} exceeds block, truncating {} to {}",
                hdr.length_ind, sdu_length, remaining
            );
            sdu_length = remaining;
        }

        let mut sdu = None;
        if sdu_length > 0 {
            if fragmented {
                self.defrag.start(self.address, self.time);
                let addr = self.address;
                self.defrag.append(&mut pdu, &addr);
            } else {
                pdu.set_raw_end(pdu.get_raw_pos() + sdu_length as usize);
                sdu = Some(BitBuffer::from_bitbuffer_pos(&pdu));
            }
        }

        (sdu, fragmented, pdu_size)
    }

    /// MAC-FRAG (21.4.3.2): body appended to the running reassembly.
    fn pdu_process_mac_frag(&mut self, outer: &BitBuffer) {
        let mut pdu = BitBuffer::from_bitbuffer_pos(outer);

        // fill bit indication is the fourth header bit
        if pdu.peek_bits_startoffset(3, 1) == Some(1) && self.remove_fill_bits {
            fillbits::strip(&mut pdu);
        }

        if let Err(e) = MacFrag::from_bitbuf(&mut pdu) {
            tracing::warn!("failed parsing MacFrag: {:?} {}", e, pdu.dump_bin());
            return;
        }

        let addr = self.address;
        self.defrag.append(&mut pdu, &addr);
    }

    /// MAC-END (21.4.3.3): final fragment, closes the reassembly and
    /// returns the full SDU. A MAC-END with no reassembly in flight is a
    /// logged no-op.
    fn pdu_process_mac_end(&mut self, outer: &BitBuffer) -> Option<BitBuffer> {
        let mut pdu = BitBuffer::from_bitbuffer_pos(outer);

        if pdu.peek_bits_startoffset(3, 1) == Some(1) && self.remove_fill_bits {
            fillbits::strip(&mut pdu);
        }

        let hdr = match MacEnd::from_bitbuf(&mut pdu, self.time.f == 18) {
            Ok(hdr) => hdr,
            Err(e) => {
                tracing::warn!("failed parsing MacEnd: {:?} {}", e, pdu.dump_bin());
                return None;
            }
        };
        tracing::debug!("<- {}", hdr);

        let addr = self.address;
        self.defrag.append(&mut pdu, &addr);

        let Some((sdu, encryption_mode, usage_marker)) = self.defrag.take_sdu() else {
            tracing::warn!("MAC-END without reassembly in flight");
            self.defrag.stop();
            return None;
        };
        self.defrag.stop();

        // the final fragment's state wins for this marker
        self.usage_marker_encryption[usage_marker as usize] = encryption_mode;
        self.address.encryption_mode = encryption_mode;

        tracing::debug!("MAC-END: reassembled {} bits", sdu.get_len());
        Some(sdu)
    }

    /// SYSINFO (21.4.4.1, table 21.67): cell frequency configuration plus a
    /// 42-bit TM-SDU for the MLE. Returns the SDU and the PDU size.
    fn pdu_process_sysinfo(&mut self, outer: &BitBuffer) -> (Option<BitBuffer>, i64) {
        const MIN_SIZE: usize = 82;

        let mut pdu = BitBuffer::from_bitbuffer_pos(outer);
        if pdu.get_len() < MIN_SIZE + 42 {
            self.report.add("invalid-pdu-size", pdu.get_len() as u64);
            self.report.add("pdu-minimum-size", MIN_SIZE as u64);
            return (None, 0);
        }

        let hdr = match MacSysinfo::from_bitbuf(&mut pdu) {
            Ok(hdr) => hdr,
            Err(e) => {
                tracing::warn!("failed parsing MacSysinfo: {:?} {}", e, pdu.dump_bin());
                return (None, 0);
            }
        };
        tracing::debug!("<- {}", hdr);
        let pos = pdu.get_pos() as i64;

        match FreqInfo::from_sysinfo(hdr.freq_band, hdr.main_carrier, hdr.freq_offset_index) {
            Some(freq) => self.cell.set_downlink_frequency(freq.downlink_frequency()),
            None => tracing::warn!("SYSINFO with invalid frequency offset {}", hdr.freq_offset_index),
        }

        // 42 bits of TM-SDU (D-MLE-SYSINFO, clause 18)
        pdu.set_raw_end(pdu.get_raw_pos() + 42);
        let sdu = BitBuffer::from_bitbuffer_pos(&pdu);

        (Some(sdu), pos + 42)
    }

    /// ACCESS-DEFINE (21.4.4.3, table 21.74): no SDU, parsed to consume its
    /// exact length.
    fn pdu_process_access_define(&mut self, outer: &BitBuffer) -> i64 {
        let mut pdu = BitBuffer::from_bitbuffer_pos(outer);

        let hdr = match AccessDefine::from_bitbuf(&mut pdu) {
            Ok(hdr) => hdr,
            Err(e) => {
                tracing::warn!("failed parsing AccessDefine: {:?} {}", e, pdu.dump_bin());
                return 0;
            }
        };
        tracing::debug!("<- {}", hdr);

        pdu.get_pos() as i64
    }

    /// MAC-D-BLCK (21.4.3.4, table 21.61). Length is implicit: 268 bits
    /// (table 21.62).
    fn pdu_process_d_block(&mut self, outer: &BitBuffer) -> (Option<BitBuffer>, i64) {
        const MIN_SIZE: usize = 268;

        let mut pdu = BitBuffer::from_bitbuffer_pos(outer);
        if pdu.get_len() < MIN_SIZE {
            self.report.add("invalid-pdu-size", pdu.get_len() as u64);
            self.report.add("pdu-minimum-size", MIN_SIZE as u64);
            return (None, 0);
        }

        if pdu.peek_bits_startoffset(3, 1) == Some(1) && self.remove_fill_bits {
            fillbits::strip(&mut pdu);
        }

        let hdr = match MacDBlck::from_bitbuf(&mut pdu) {
            Ok(hdr) => hdr,
            Err(e) => {
                tracing::warn!("failed parsing MacDBlck: {:?} {}", e, pdu.dump_bin());
                return (None, 0);
            }
        };
        tracing::debug!("<- {}", hdr);
        tracing::info!("MAC-D-BLCK: {}", self.time);

        self.address = MacAddress::new(AddressKind::EventLabel(hdr.event_label), hdr.encryption_mode);

        let sdu = BitBuffer::from_bitbuffer_pos(&pdu);
        (Some(sdu), MIN_SIZE as i64)
    }
}
