use core::fmt;

use tetra_core::{assert_warn, BitBuffer, PduParseErr};

use crate::enums::sysinfo_opt_field_flag::SysinfoOptFieldFlag;

/// Clause 21.4.4.1 SYSINFO, broadcast on the BNCH. The 82-bit header is
/// followed by the 42-bit D-MLE-SYSINFO SDU.
///
/// The 20-bit optional field is carried raw; nothing below the MLE consumes
/// its contents.
#[derive(Debug, Clone)]
pub struct MacSysinfo {
    // 12
    pub main_carrier: u16,
    // 4
    pub freq_band: u8,
    // 2
    pub freq_offset_index: u8,
    // 3
    pub duplex_spacing: u8,
    // 1
    pub reverse_operation: bool,
    // 2, number of common secondary control channels on the main carrier
    pub num_of_csch: u8,
    // 3
    pub ms_txpwr_max_cell: u8,
    // 4
    pub rxlev_access_min: u8,
    // 4
    pub access_parameter: u8,
    // 4
    pub radio_dl_timeout: u8,
    // 16 opt
    pub cck_id: Option<u16>,
    // 16 opt, present when cck_id is not
    pub hyperframe_number: Option<u16>,
    // 2
    pub option_field: SysinfoOptFieldFlag,
    // 20, interpretation depends on option_field
    pub option_bits: u32,
}

impl MacSysinfo {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        assert_warn!(buf.read_field(2, "pdu_type")? == 2, "not a broadcast PDU");
        assert_warn!(buf.read_field(2, "broadcast_type")? == 0, "not a SYSINFO PDU");

        let main_carrier = buf.read_field(12, "main_carrier")? as u16;
        let freq_band = buf.read_field(4, "freq_band")? as u8;
        let freq_offset_index = buf.read_field(2, "freq_offset")? as u8;
        let duplex_spacing = buf.read_field(3, "duplex_spacing")? as u8;
        let reverse_operation = buf.read_field(1, "reverse_operation")? != 0;
        let num_of_csch = buf.read_field(2, "num_of_csch")? as u8;
        let ms_txpwr_max_cell = buf.read_field(3, "ms_txpwr_max_cell")? as u8;
        let rxlev_access_min = buf.read_field(4, "rxlev_access_min")? as u8;
        let access_parameter = buf.read_field(4, "access_parameter")? as u8;
        let radio_dl_timeout = buf.read_field(4, "radio_dl_timeout")? as u8;

        let (cck_id, hyperframe_number) = if buf.read_field(1, "cck_flag")? == 1 {
            (Some(buf.read_field(16, "cck_id")? as u16), None)
        } else {
            (None, Some(buf.read_field(16, "hyperframe_number")? as u16))
        };

        let bits = buf.read_field(2, "option_field")?;
        let option_field = SysinfoOptFieldFlag::try_from(bits).unwrap(); // 2 bits always map
        let option_bits = buf.read_field(20, "option_bits")? as u32;

        Ok(MacSysinfo {
            main_carrier,
            freq_band,
            freq_offset_index,
            duplex_spacing,
            reverse_operation,
            num_of_csch,
            ms_txpwr_max_cell,
            rxlev_access_min,
            access_parameter,
            radio_dl_timeout,
            cck_id,
            hyperframe_number,
            option_field,
            option_bits,
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(2, 2); // broadcast
        buf.write_bits(0, 2); // SYSINFO

        buf.write_bits(self.main_carrier as u64, 12);
        buf.write_bits(self.freq_band as u64, 4);
        buf.write_bits(self.freq_offset_index as u64, 2);
        buf.write_bits(self.duplex_spacing as u64, 3);
        buf.write_bits(self.reverse_operation as u64, 1);
        buf.write_bits(self.num_of_csch as u64, 2);
        buf.write_bits(self.ms_txpwr_max_cell as u64, 3);
        buf.write_bits(self.rxlev_access_min as u64, 4);
        buf.write_bits(self.access_parameter as u64, 4);
        buf.write_bits(self.radio_dl_timeout as u64, 4);

        assert!(
            self.cck_id.is_some() ^ self.hyperframe_number.is_some(),
            "either cck_id or hyperframe_number must be set"
        );
        if let Some(cck_id) = self.cck_id {
            buf.write_bits(1, 1);
            buf.write_bits(cck_id as u64, 16);
        } else {
            buf.write_bits(0, 1);
            buf.write_bits(self.hyperframe_number.unwrap() as u64, 16);
        }

        buf.write_bits(self.option_field.into_raw(), 2);
        buf.write_bits(self.option_bits as u64, 20);
    }
}

impl fmt::Display for MacSysinfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MacSysinfo {{ main_carrier: {} freq_band: {} freq_offset: {} option_field: {} }}",
            self.main_carrier, self.freq_band, self.freq_offset_index, self.option_field
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysinfo_roundtrip() {
        let pdu = MacSysinfo {
            main_carrier: 2702,
            freq_band: 4,
            freq_offset_index: 3,
            duplex_spacing: 0,
            reverse_operation: false,
            num_of_csch: 0,
            ms_txpwr_max_cell: 4,
            rxlev_access_min: 2,
            access_parameter: 7,
            radio_dl_timeout: 3,
            cck_id: None,
            hyperframe_number: Some(42),
            option_field: SysinfoOptFieldFlag::ExtServicesBroadcast,
            option_bits: 0,
        };
        let mut buf = BitBuffer::new(82);
        pdu.to_bitbuf(&mut buf);
        assert_eq!(buf.get_pos(), 82);

        buf.seek(0);
        let parsed = MacSysinfo::from_bitbuf(&mut buf).unwrap();
        assert_eq!(parsed.main_carrier, 2702);
        assert_eq!(parsed.freq_band, 4);
        assert_eq!(parsed.hyperframe_number, Some(42));
        assert_eq!(buf.get_pos(), 82);
    }
}
