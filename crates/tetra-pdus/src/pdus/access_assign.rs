use core::fmt;

use tetra_core::{BitBuffer, PduParseErr};

use crate::enums::downlink_usage::DownlinkUsage;

/// Uplink access rights field, access code + base frame length
#[derive(Debug, Clone, Copy)]
pub struct AccessField {
    // 2
    pub access_code: u8,
    // 4
    pub base_frame_len: u8,
}

impl AccessField {
    fn from_raw(field: u8) -> Self {
        AccessField {
            access_code: (field >> 4) & 0x3,
            base_frame_len: field & 0xF,
        }
    }
}

/// Clause 21.4.7.2 ACCESS-ASSIGN, carried on the AACH of every burst.
/// Fixed 14 bits: 2-bit header plus two 6-bit fields whose meaning the
/// header selects (table 21.77). Frame-18 interpretation is up to the MAC.
#[derive(Debug)]
pub struct AccessAssign {
    // 2
    pub header: u8,
    /// Downlink usage, from the header or from field1 as a usage marker
    pub dl_usage: DownlinkUsage,
    /// Access rights for UL subslot 1 (header 0)
    pub access_field1: Option<AccessField>,
    /// Access rights for UL subslot 2 (header 0)
    pub access_field2: Option<AccessField>,
    /// Access rights for both UL subslots (header 1 or 2)
    pub access_field: Option<AccessField>,
    /// Raw UL usage marker (header 3)
    pub ul_usage_marker: Option<u8>,
}

impl AccessAssign {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let header = buf.read_field(2, "header")? as u8;
        let field1 = buf.read_field(6, "field1")? as u8;
        let field2 = buf.read_field(6, "field2")? as u8;

        let mut s = AccessAssign {
            header,
            dl_usage: DownlinkUsage::CommonControl,
            access_field1: None,
            access_field2: None,
            access_field: None,
            ul_usage_marker: None,
        };

        match header {
            0b00 => {
                // DL common control, UL common access on both subslots
                s.access_field1 = Some(AccessField::from_raw(field1));
                s.access_field2 = Some(AccessField::from_raw(field2));
            }
            0b01 | 0b10 => {
                // DL given by field1 usage marker, single UL access field
                s.dl_usage = DownlinkUsage::from_usage_marker(field1);
                s.access_field = Some(AccessField::from_raw(field2));
            }
            0b11 => {
                // DL and UL both given by usage markers
                s.dl_usage = DownlinkUsage::from_usage_marker(field1);
                s.ul_usage_marker = Some(field2);
            }
            _ => unreachable!(),
        }

        Ok(s)
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.header as u64, 2);
        match self.header {
            0b00 => {
                let af1 = self.access_field1.as_ref().unwrap();
                let af2 = self.access_field2.as_ref().unwrap();
                buf.write_bits(af1.access_code as u64, 2);
                buf.write_bits(af1.base_frame_len as u64, 4);
                buf.write_bits(af2.access_code as u64, 2);
                buf.write_bits(af2.base_frame_len as u64, 4);
            }
            0b01 | 0b10 => {
                let af = self.access_field.as_ref().unwrap();
                buf.write_bits(self.dl_usage.to_usage_marker() as u64, 6);
                buf.write_bits(af.access_code as u64, 2);
                buf.write_bits(af.base_frame_len as u64, 4);
            }
            0b11 => {
                buf.write_bits(self.dl_usage.to_usage_marker() as u64, 6);
                buf.write_bits(self.ul_usage_marker.unwrap() as u64, 6);
            }
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for AccessAssign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AccessAssign {{ header: {} dl_usage: {} }}", self.header, self.dl_usage)
    }
}
