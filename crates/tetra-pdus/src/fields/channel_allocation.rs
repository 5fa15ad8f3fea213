// Clause 21.5.2

use core::fmt;

use tetra_core::{BitBuffer, PduParseErr};

/// Extended carrier numbering, present when the flag after carrier_num is set
#[derive(Debug, Clone, Copy)]
pub struct ExtCarrierNumbering {
    // 4
    pub freq_band: u8,
    // 2
    pub freq_offset: u8,
    // 3
    pub duplex_spacing: u8,
    // 1
    pub reverse_operation: bool,
}

/// Augmented channel allocation (21.5.2b), present when up/downlink
/// assignment reads 0. The receiver consumes it for its exact length; only
/// the napping and conditional elements influence that length.
#[derive(Debug, Clone, Copy)]
pub struct AugmentedChanAlloc {
    // 2
    pub napping_status: u8,
    // 11 opt, present when napping_status == 1 (21.5.2c)
    pub napping_info: Option<u16>,
    // 16 opt
    pub cond_element_a: Option<u16>,
    // 16 opt
    pub cond_element_b: Option<u16>,
}

impl AugmentedChanAlloc {
    fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        // up/downlink assignment for the augmented allocation, bandwidth,
        // modulation mode, two QAM-only fields and the confirm/channel
        // status fields; nothing downstream consumes them
        buf.read_field(2, "aug_ul_dl_assigned")?;
        buf.read_field(3, "aug_bandwidth")?;
        buf.read_field(3, "aug_modulation_mode")?;
        buf.read_field(3, "aug_max_ul_qam")?;
        buf.read_field(3, "aug_reserved")?;
        buf.read_field(3, "aug_conf_chan_status")?;
        buf.read_field(4, "bs_link_imbalance")?;
        buf.read_field(5, "bs_tx_power_rel")?;

        let napping_status = buf.read_field(2, "napping_status")? as u8;
        let napping_info = if napping_status == 1 {
            Some(buf.read_field(11, "napping_info")? as u16)
        } else {
            None
        };
        buf.read_field(4, "aug_reserved2")?;

        let cond_element_a = if buf.read_field(1, "cond_a_flag")? == 1 {
            Some(buf.read_field(16, "cond_element_a")? as u16)
        } else {
            None
        };
        let cond_element_b = if buf.read_field(1, "cond_b_flag")? == 1 {
            Some(buf.read_field(16, "cond_element_b")? as u16)
        } else {
            None
        };
        buf.read_field(1, "further_augmentation_flag")?;

        Ok(AugmentedChanAlloc {
            napping_status,
            napping_info,
            cond_element_a,
            cond_element_b,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChanAllocElement {
    // 2
    pub alloc_type: u8,
    // 4-bit field, each bit represents a timeslot (TS1 to TS4)
    pub ts_assigned: [bool; 4],
    // 2 bits. 0 = Augmented, 1 = DL only, 2 = UL only, 3 = Both
    pub ul_dl_assigned: u8,
    // 1
    pub clch_permission: bool,
    // 1
    pub cell_change_flag: bool,
    // 12
    pub carrier_num: u16,
    // 10 opt
    pub ext_carrier: Option<ExtCarrierNumbering>,
    // 2
    pub mon_pattern: u8,
    // 2 opt, present when mon_pattern == 0 and the slot is in frame 18
    pub frame18_mon_pattern: Option<u8>,
    pub augmented: Option<AugmentedChanAlloc>,
}

impl ChanAllocElement {
    /// Parses a channel allocation element. The frame-18 monitoring pattern
    /// is conditional on the slot the element was received in, so the caller
    /// passes `in_frame18`.
    pub fn from_bitbuf(buf: &mut BitBuffer, in_frame18: bool) -> Result<Self, PduParseErr> {
        let alloc_type = buf.read_field(2, "alloc_type")? as u8;

        let bitmap = buf.read_field(4, "ts_assigned")? as u8;
        let ts_assigned = [
            (bitmap & 0b1000) != 0,
            (bitmap & 0b0100) != 0,
            (bitmap & 0b0010) != 0,
            (bitmap & 0b0001) != 0,
        ];

        let ul_dl_assigned = buf.read_field(2, "ul_dl_assigned")? as u8;
        let clch_permission = buf.read_field(1, "clch_permission")? != 0;
        let cell_change_flag = buf.read_field(1, "cell_change_flag")? != 0;
        let carrier_num = buf.read_field(12, "carrier_num")? as u16;

        let ext_carrier = if buf.read_field(1, "ext_carrier_num_flag")? == 1 {
            Some(ExtCarrierNumbering {
                freq_band: buf.read_field(4, "ext_freq_band")? as u8,
                freq_offset: buf.read_field(2, "ext_freq_offset")? as u8,
                duplex_spacing: buf.read_field(3, "ext_duplex_spacing")? as u8,
                reverse_operation: buf.read_field(1, "ext_reverse_operation")? != 0,
            })
        } else {
            None
        };

        let mon_pattern = buf.read_field(2, "mon_pattern")? as u8;
        let frame18_mon_pattern = if mon_pattern == 0 && in_frame18 {
            Some(buf.read_field(2, "frame18_mon_pattern")? as u8)
        } else {
            None
        };

        let augmented = if ul_dl_assigned == 0 {
            Some(AugmentedChanAlloc::from_bitbuf(buf)?)
        } else {
            None
        };

        Ok(ChanAllocElement {
            alloc_type,
            ts_assigned,
            ul_dl_assigned,
            clch_permission,
            cell_change_flag,
            carrier_num,
            ext_carrier,
            mon_pattern,
            frame18_mon_pattern,
            augmented,
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        assert!(self.augmented.is_none(), "serializing augmented allocation not supported");

        buf.write_bits(self.alloc_type as u64, 2);
        for &bit in &self.ts_assigned {
            buf.write_bits(bit as u64, 1);
        }
        buf.write_bits(self.ul_dl_assigned as u64, 2);
        buf.write_bits(self.clch_permission as u64, 1);
        buf.write_bits(self.cell_change_flag as u64, 1);
        buf.write_bits(self.carrier_num as u64, 12);

        if let Some(ext) = &self.ext_carrier {
            buf.write_bits(1, 1);
            buf.write_bits(ext.freq_band as u64, 4);
            buf.write_bits(ext.freq_offset as u64, 2);
            buf.write_bits(ext.duplex_spacing as u64, 3);
            buf.write_bits(ext.reverse_operation as u64, 1);
        } else {
            buf.write_bits(0, 1);
        }

        buf.write_bits(self.mon_pattern as u64, 2);
        if let Some(v) = self.frame18_mon_pattern {
            buf.write_bits(v as u64, 2);
        }
    }

    pub fn compute_len(&self) -> usize {
        // through the extended carrier numbering flag
        let mut len = 2 + 4 + 2 + 1 + 1 + 12 + 1;
        if self.ext_carrier.is_some() {
            len += 10;
        }
        len += 2;
        if self.frame18_mon_pattern.is_some() {
            len += 2;
        }
        assert!(self.augmented.is_none(), "augmented allocation length not supported");
        len
    }
}

impl fmt::Display for ChanAllocElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ChanAllocElement {{ alloc_type: {} ts_assigned: {:?} ul_dl_assigned: {} carrier_num: {} mon_pattern: {}",
            self.alloc_type, self.ts_assigned, self.ul_dl_assigned, self.carrier_num, self.mon_pattern,
        )?;
        if let Some(v) = self.frame18_mon_pattern {
            write!(f, " frame18_mon_pattern: {}", v)?;
        }
        write!(f, " }}")
    }
}
