use core::fmt;

use tetra_core::{assert_warn, BitBuffer, PduParseErr, TdmaTime};

/// Clause 21.4.4.2 SYNC, carried on the BSCH. The 31-bit header is followed
/// by the 29-bit D-MLE-SYNC SDU (which leads with MCC and MNC).
#[derive(Debug, Clone)]
pub struct MacSync {
    // 4
    pub system_code: u8,
    // 6
    pub colour_code: u8,
    // 2 + 5 + 6
    pub time: TdmaTime,
    // 2
    pub sharing_mode: u8,
    // 3
    pub ts_reserved_frames: u8,
    // 1
    pub u_plane_dtx: bool,
    // 1
    pub frame_18_ext: bool,
}

impl MacSync {
    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let system_code = buf.read_field(4, "system_code")? as u8;
        let colour_code = buf.read_field(6, "colour_code")? as u8;
        let t = buf.read_field(2, "timeslot_number")? as u8 + 1;
        let f = buf.read_field(5, "frame_number")? as u8;
        let m = buf.read_field(6, "multiframe_number")? as u8;
        let sharing_mode = buf.read_field(2, "sharing_mode")? as u8;
        let ts_reserved_frames = buf.read_field(3, "ts_reserved_frames")? as u8;
        let u_plane_dtx = buf.read_field(1, "u_plane_dtx")? != 0;
        let frame_18_ext = buf.read_field(1, "frame_18_ext")? != 0;
        assert_warn!(buf.read_field(1, "reserved")? == 0, "reserved bit not zero");

        Ok(MacSync {
            system_code,
            colour_code,
            time: TdmaTime { t, f, m },
            sharing_mode,
            ts_reserved_frames,
            u_plane_dtx,
            frame_18_ext,
        })
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.system_code as u64, 4);
        buf.write_bits(self.colour_code as u64, 6);
        buf.write_bits(self.time.t as u64 - 1, 2);
        buf.write_bits(self.time.f as u64, 5);
        buf.write_bits(self.time.m as u64, 6);
        buf.write_bits(self.sharing_mode as u64, 2);
        buf.write_bits(self.ts_reserved_frames as u64, 3);
        buf.write_bits(self.u_plane_dtx as u64, 1);
        buf.write_bits(self.frame_18_ext as u64, 1);
        buf.write_bits(0, 1);
    }
}

impl fmt::Display for MacSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MacSync {{ system_code: {} colour_code: {} time: {:?} sharing_mode: {} }}",
            self.system_code, self.colour_code, self.time, self.sharing_mode
        )
    }
}
