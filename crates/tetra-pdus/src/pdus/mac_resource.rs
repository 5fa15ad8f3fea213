use core::fmt;

use tetra_core::{AddressKind, BitBuffer, MacAddress, PduParseErr};

use crate::enums::mac_resource_addr_type::MacResourceAddrType;
use crate::fields::basic_slotgrant::BasicSlotgrant;
use crate::fields::channel_allocation::ChanAllocElement;

/// Length indication value signalling that the second half slot is stolen
pub const LENGTH_IND_SECOND_SLOT_STOLEN: u8 = 0b111110;
/// Length indication value starting a fragmented signalling message
pub const LENGTH_IND_START_FRAG: u8 = 0b111111;

/// Clause 21.4.3.1 MAC-RESOURCE (downlink)
#[derive(Debug, Clone)]
pub struct MacResource {
    /// 1 bit, set if the SDU is followed by fill bits for octet alignment.
    /// Carries no meaning in a null PDU
    pub fill_bits: bool,
    /// 1 bit, only relevant when a slot granting element is present.
    /// 0 -> grant on current channel, 1 -> grant on allocated channel
    pub pos_of_grant: u8,
    /// 2 bits. Upper bit = encryption enabled, lower bit = CCK parity
    pub encryption_mode: u8,
    /// 1 bit. If true, random access is acknowledged
    pub random_access_flag: bool,
    /// 6 bits, table 21.55. 0b111111 = fragmentation start,
    /// 0b111110 = second half slot stolen
    pub length_ind: u8,
    /// Parsed address; kind None for a null PDU
    pub address: MacAddress,
    /// 4 opt
    pub power_control_element: Option<u8>,
    /// 8 opt
    pub slot_granting_element: Option<BasicSlotgrant>,
    pub chan_alloc_element: Option<ChanAllocElement>,
}

impl MacResource {
    /// Parses a MAC-RESOURCE header, leaving the buffer position at the
    /// first TM-SDU bit. For a null PDU all fields after the address type
    /// are discarded, per 21.4.3.1.
    pub fn from_bitbuf(buf: &mut BitBuffer, in_frame18: bool) -> Result<Self, PduParseErr> {
        let mut s = MacResource {
            fill_bits: false,
            pos_of_grant: 0,
            encryption_mode: 0,
            random_access_flag: false,
            length_ind: 0,
            address: MacAddress::default(),
            power_control_element: None,
            slot_granting_element: None,
            chan_alloc_element: None,
        };

        // required constant mac_pdu_type
        assert!(buf.read_field(2, "mac_pdu_type")? == 0);
        s.fill_bits = buf.read_field(1, "fill_bits")? != 0;
        s.pos_of_grant = buf.read_field(1, "pos_of_grant")? as u8;
        s.encryption_mode = buf.read_field(2, "encryption_mode")? as u8;
        s.random_access_flag = buf.read_field(1, "random_access_flag")? != 0;
        s.length_ind = buf.read_field(6, "length_ind")? as u8;

        let bits = buf.read_field(3, "addr_type")?;
        let addr_type = MacResourceAddrType::try_from(bits).unwrap(); // 3 bits always map

        let kind = match addr_type {
            MacResourceAddrType::NullPdu => {
                // The other header fields carry no meaning in a null PDU;
                // reset them so stale values cannot leak into state updates
                s.fill_bits = false;
                s.pos_of_grant = 0;
                s.encryption_mode = 0;
                s.random_access_flag = false;
                AddressKind::None
            }
            MacResourceAddrType::Ssi => AddressKind::Ssi(buf.read_field(24, "ssi")? as u32),
            MacResourceAddrType::EventLabel => AddressKind::EventLabel(buf.read_field(10, "event_label")? as u16),
            MacResourceAddrType::Ussi => AddressKind::Ussi(buf.read_field(24, "ussi")? as u32),
            MacResourceAddrType::Smi => AddressKind::Smi(buf.read_field(24, "smi")? as u32),
            MacResourceAddrType::SsiAndEventLabel => AddressKind::SsiEventLabel {
                ssi: buf.read_field(24, "ssi")? as u32,
                event_label: buf.read_field(10, "event_label")? as u16,
            },
            MacResourceAddrType::SsiAndUsageMarker => AddressKind::SsiUsageMarker {
                ssi: buf.read_field(24, "ssi")? as u32,
                usage_marker: buf.read_field(6, "usage_marker")? as u8,
            },
            MacResourceAddrType::SmiAndEventLabel => AddressKind::SmiEventLabel {
                smi: buf.read_field(24, "smi")? as u32,
                event_label: buf.read_field(10, "event_label")? as u16,
            },
        };
        s.address = MacAddress::new(kind, s.encryption_mode);

        if addr_type == MacResourceAddrType::NullPdu {
            return Ok(s);
        }

        if buf.read_field(1, "power_control_flag")? == 1 {
            s.power_control_element = Some(buf.read_field(4, "power_control_element")? as u8);
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
        buf.write_bits(0, 2);
        buf.write_bits(self.fill_bits as u64, 1);
        buf.write_bits(self.pos_of_grant as u64, 1);
        buf.write_bits(self.encryption_mode as u64, 2);
        buf.write_bits(self.random_access_flag as u64, 1);
        buf.write_bits(self.length_ind as u64, 6);

        match self.address.kind {
            AddressKind::None => {
                buf.write_bits(MacResourceAddrType::NullPdu.into_raw(), 3);
                return;
            }
            AddressKind::Ssi(ssi) => {
                buf.write_bits(MacResourceAddrType::Ssi.into_raw(), 3);
                buf.write_bits(ssi as u64, 24);
            }
            AddressKind::EventLabel(label) => {
                buf.write_bits(MacResourceAddrType::EventLabel.into_raw(), 3);
                buf.write_bits(label as u64, 10);
            }
            AddressKind::Ussi(ssi) => {
                buf.write_bits(MacResourceAddrType::Ussi.into_raw(), 3);
                buf.write_bits(ssi as u64, 24);
            }
            AddressKind::Smi(smi) => {
                buf.write_bits(MacResourceAddrType::Smi.into_raw(), 3);
                buf.write_bits(smi as u64, 24);
            }
            AddressKind::SsiEventLabel { ssi, event_label } => {
                buf.write_bits(MacResourceAddrType::SsiAndEventLabel.into_raw(), 3);
                buf.write_bits(ssi as u64, 24);
                buf.write_bits(event_label as u64, 10);
            }
            AddressKind::SsiUsageMarker { ssi, usage_marker } => {
                buf.write_bits(MacResourceAddrType::SsiAndUsageMarker.into_raw(), 3);
                buf.write_bits(ssi as u64, 24);
                buf.write_bits(usage_marker as u64, 6);
            }
            AddressKind::SmiEventLabel { smi, event_label } => {
                buf.write_bits(MacResourceAddrType::SmiAndEventLabel.into_raw(), 3);
                buf.write_bits(smi as u64, 24);
                buf.write_bits(event_label as u64, 10);
            }
        }

        if let Some(v) = self.power_control_element {
            buf.write_bits(1, 1);
            buf.write_bits(v as u64, 4);
        } else {
            buf.write_bits(0, 1);
        }

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

    pub fn is_null_pdu(&self) -> bool {
        self.address.is_null()
    }
}

impl fmt::Display for MacResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MacResource {{ fill_bits: {}, encryption_mode: {}, length_ind: {}, addr: {}",
            self.fill_bits, self.encryption_mode, self.length_ind, self.address
        )?;
        if let Some(v) = self.power_control_element {
            write!(f, " power_control: {}", v)?;
        }
        if let Some(v) = &self.slot_granting_element {
            write!(f, " slot_granting: {}", v)?;
        }
        if let Some(v) = &self.chan_alloc_element {
            write!(f, " chan_alloc: {}", v)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_resource_with_chanalloc() {
        let bitstr = "00000000100111100000000000000000110011001111100010100101100010111111000011";
        let mut buffer = BitBuffer::from_bitstr(bitstr);
        let pdu = MacResource::from_bitbuf(&mut buffer, false).unwrap();

        assert!(buffer.get_len_remaining() == 0);
        assert_eq!(pdu.chan_alloc_element.as_ref().unwrap().carrier_num, 1528);

        let mut new = BitBuffer::new_autoexpand(buffer.get_len());
        pdu.to_bitbuf(&mut new);
        assert_eq!(new.to_bitstr(), bitstr);
    }

    #[test]
    fn test_mac_resource_ssi() {
        let mut out = BitBuffer::new_autoexpand(64);
        let pdu = MacResource {
            fill_bits: false,
            pos_of_grant: 0,
            encryption_mode: 0,
            random_access_flag: false,
            length_ind: 0b001000,
            address: MacAddress::new(AddressKind::Ssi(0x123456), 0),
            power_control_element: None,
            slot_granting_element: None,
            chan_alloc_element: None,
        };
        pdu.to_bitbuf(&mut out);
        // type 2 + flags 5 + length 6 + addr_type 3 + ssi 24 + three zero flags
        assert_eq!(out.get_pos(), 43);

        out.seek(0);
        let parsed = MacResource::from_bitbuf(&mut out, false).unwrap();
        assert_eq!(parsed.length_ind, 0b001000);
        assert_eq!(parsed.address.ssi(), Some(0x123456));
    }

    #[test]
    fn test_mac_resource_null_pdu() {
        // 16-bit null header: everything zero
        let mut buffer = BitBuffer::from_bitstr("0000000000000000");
        let pdu = MacResource::from_bitbuf(&mut buffer, false).unwrap();
        assert!(pdu.is_null_pdu());
        assert_eq!(buffer.get_pos(), 16);
    }

    #[test]
    fn test_mac_resource_usage_marker_assignment() {
        let mut out = BitBuffer::new_autoexpand(64);
        let pdu = MacResource {
            fill_bits: false,
            pos_of_grant: 0,
            encryption_mode: 2,
            random_access_flag: false,
            length_ind: 0b000111,
            address: MacAddress::new(AddressKind::SsiUsageMarker { ssi: 99, usage_marker: 17 }, 2),
            power_control_element: None,
            slot_granting_element: None,
            chan_alloc_element: None,
        };
        pdu.to_bitbuf(&mut out);

        out.seek(0);
        let parsed = MacResource::from_bitbuf(&mut out, false).unwrap();
        assert_eq!(parsed.address.usage_marker(), Some(17));
        assert_eq!(parsed.encryption_mode, 2);
    }
}
