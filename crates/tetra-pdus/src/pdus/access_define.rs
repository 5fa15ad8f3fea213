use core::fmt;

use tetra_core::{assert_warn, BitBuffer, PduParseErr};

/// Clause 21.4.4.3 ACCESS-DEFINE. Produces no SDU; the receiver parses it
/// to consume its exact length during PDU dissociation.
#[derive(Debug, Clone)]
pub struct AccessDefine {
    // 1
    pub common_or_assigned_control: bool,
    // 2
    pub access_code: u8,
    // 4
    pub imm: u8,
    // 4
    pub wt: u8,
    // 4
    pub nu: u8,
    // 1
    pub frame_len_factor: bool,
    // 4
    pub ts_pointer: u8,
    // 3
    pub min_pdu_prio: u8,
    // 2
    pub opt_field_flag: u8,
    // 16 opt
    pub subscriber_class: Option<u16>,
    // 24 opt
    pub gssi: Option<u32>,
}

impl AccessDefine {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        // required constant mac_pdu_type
        assert!(buf.read_field(2, "mac_pdu_type")? == 2);
        // required constant broadcast_type
        assert!(buf.read_field(2, "broadcast_type")? == 1);

        let common_or_assigned_control = buf.read_field(1, "common_or_assigned_control")? != 0;
        let access_code = buf.read_field(2, "access_code")? as u8;
        let imm = buf.read_field(4, "imm")? as u8;
        let wt = buf.read_field(4, "wt")? as u8;
        let nu = buf.read_field(4, "nu")? as u8;
        let frame_len_factor = buf.read_field(1, "frame_len_factor")? != 0;
        let ts_pointer = buf.read_field(4, "ts_pointer")? as u8;
        let min_pdu_prio = buf.read_field(3, "min_pdu_prio")? as u8;
        let opt_field_flag = buf.read_field(2, "opt_field_flag")? as u8;

        let mut subscriber_class = None;
        let mut gssi = None;
        if opt_field_flag == 0b01 {
            subscriber_class = Some(buf.read_field(16, "subscriber_class")? as u16);
        } else if opt_field_flag == 0b10 {
            gssi = Some(buf.read_field(24, "gssi")? as u32);
        }
        assert_warn!(buf.read_field(3, "filler")? == 4, "unexpected filler bits");

        Ok(AccessDefine {
            common_or_assigned_control,
            access_code,
            imm,
            wt,
            nu,
            frame_len_factor,
            ts_pointer,
            min_pdu_prio,
            opt_field_flag,
            subscriber_class,
            gssi,
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(2, 2);
        buf.write_bits(1, 2);
        buf.write_bits(self.common_or_assigned_control as u64, 1);
        buf.write_bits(self.access_code as u64, 2);
        buf.write_bits(self.imm as u64, 4);
        buf.write_bits(self.wt as u64, 4);
        buf.write_bits(self.nu as u64, 4);
        buf.write_bits(self.frame_len_factor as u64, 1);
        buf.write_bits(self.ts_pointer as u64, 4);
        buf.write_bits(self.min_pdu_prio as u64, 3);
        buf.write_bits(self.opt_field_flag as u64, 2);
        if let Some(v) = self.subscriber_class {
            buf.write_bits(v as u64, 16);
        }
        if let Some(v) = self.gssi {
            buf.write_bits(v as u64, 24);
        }
        buf.write_bits(4, 3);
    }
}

impl fmt::Display for AccessDefine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "AccessDefine {{ access_code: {} imm: {} wt: {} nu: {} opt_field_flag: {} }}",
            self.access_code, self.imm, self.wt, self.nu, self.opt_field_flag
        )
    }
}
