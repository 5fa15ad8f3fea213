use core::fmt;

use tetra_core::{BitBuffer, PduParseErr};

use crate::fields::basic_slotgrant::BasicSlotgrant;
use crate::fields::channel_allocation::ChanAllocElement;

/// Clause 21.4.3.3 MAC-END (downlink), closes a fragmented message
#[derive(Debug, Clone)]
pub struct MacEnd {
    // 1
    pub fill_bits: bool,
    // 1
    pub pos_of_grant: u8,
    /// 6 bits, valid range 0b000010..=0b100010, everything else reserved
    pub length_ind: u8,
    // 8 opt
    pub slot_granting_element: Option<BasicSlotgrant>,
    pub chan_alloc_element: Option<ChanAllocElement>,
}

impl MacEnd {
    pub fn from_bitbuf(buf: &mut BitBuffer, in_frame18: bool) -> Result<Self, PduParseErr> {
        let mut s = MacEnd {
            fill_bits: false,
            pos_of_grant: 0,
            length_ind: 0,
            slot_granting_element: None,
            chan_alloc_element: None,
        };

        // required constant mac_pdu_type
        assert!(buf.read_field(2, "mac_pdu_type")? == 1);
        // required constant pdu_subtype
        assert!(buf.read_field(1, "pdu_subtype")? == 1);
        s.fill_bits = buf.read_field(1, "fill_bits")? != 0;
        s.pos_of_grant = buf.read_field(1, "pos_of_grant")? as u8;
        s.length_ind = buf.read_field(6, "length_ind")? as u8;

        if s.length_ind < 0b000010 || s.length_ind > 0b100010 {
            return Err(PduParseErr::InvalidValue { field: "length_ind", value: s.length_ind as u64 });
        }

        if buf.read_field(1, "slot_granting_flag")? == 1 {
            s.slot_granting_element = Some(BasicSlotgrant::from_bitbuf(buf)?);
        }

        if buf.read_field(1, "chan_alloc_flag")? == 1 {
            s.chan_alloc_element = Some(ChanAllocElement::from_bitbuf(buf, in_frame18)?);
        }

        Ok(s)
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(1, 2);
        buf.write_bits(1, 1);
        buf.write_bits(self.fill_bits as u64, 1);
        buf.write_bits(self.pos_of_grant as u64, 1);
        buf.write_bits(self.length_ind as u64, 6);

        if let Some(v) = &self.slot_granting_element {
            buf.write_bits(1, 1);
            v.to_bitbuf(buf);
        } else {
            buf.write_bits(0, 1);
        }

        if let Some(v) = &self.chan_alloc_element {
            buf.write_bits(1, 1);
            v.to_bitbuf(buf);
        } else {
            buf.write_bits(0, 1);
        }
    }
}

impl fmt::Display for MacEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacEnd {{ fill_bits: {} length_ind: {}", self.fill_bits, self.length_ind)?;
        if let Some(v) = &self.slot_granting_element {
            write!(f, " slot_granting: {}", v)?;
        }
        if let Some(v) = &self.chan_alloc_element {
            write!(f, " chan_alloc: {}", v)?;
        }
        write!(f, " }}")
    }
}
