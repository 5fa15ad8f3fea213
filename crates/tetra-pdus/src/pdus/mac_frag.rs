use core::fmt;

use tetra_core::{BitBuffer, PduParseErr};

/// Clause 21.4.3.2 MAC-FRAG (downlink). Carries no address; the fragment
/// belongs to whatever reassembly the receiver has in flight.
#[derive(Debug, Clone)]
pub struct MacFrag {
    // 1
    pub fill_bits: bool,
}

impl MacFrag {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        // required constant mac_pdu_type
        assert!(buf.read_field(2, "mac_pdu_type")? == 1);
        // required constant pdu_subtype
        assert!(buf.read_field(1, "pdu_subtype")? == 0);
        let fill_bits = buf.read_field(1, "fill_bits")? != 0;

        Ok(MacFrag { fill_bits })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(1, 2);
        buf.write_bits(0, 1);
        buf.write_bits(self.fill_bits as u64, 1);
    }
}

impl fmt::Display for MacFrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacFrag {{ fill_bits: {} }}", self.fill_bits)
    }
}
