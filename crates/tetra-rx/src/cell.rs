use crate::coding::scrambler;

/// Serving cell state recovered from SYNC and SYSINFO broadcasts.
///
/// The scrambling code is a pure function of (mcc, mnc, colour code) and is
/// recomputed whenever any of them changes through a SYNC decode.
#[derive(Debug, Clone, Copy)]
pub struct CellContext {
    downlink_frequency: i64,
    mcc: u16,
    mnc: u16,
    colour_code: u8,
    scrambling_code: u32,
}

impl CellContext {
    pub fn new() -> Self {
        CellContext {
            downlink_frequency: 0,
            mcc: 0,
            mnc: 0,
            colour_code: 0,
            // colour code 0 scrambles with the all-zero sequence
            scrambling_code: 0,
        }
    }

    pub fn downlink_frequency(&self) -> i64 {
        self.downlink_frequency
    }

    pub fn mcc(&self) -> u16 {
        self.mcc
    }

    pub fn mnc(&self) -> u16 {
        self.mnc
    }

    pub fn colour_code(&self) -> u8 {
        self.colour_code
    }

    pub fn scrambling_code(&self) -> u32 {
        self.scrambling_code
    }

    pub fn set_downlink_frequency(&mut self, freq_hz: i64) {
        if self.downlink_frequency != freq_hz {
            tracing::info!("cell downlink frequency: {:.6} MHz", freq_hz as f64 / 1e6);
        }
        self.downlink_frequency = freq_hz;
    }

    /// Store the network identity and rederive the scrambling code (8.2.5.2)
    pub fn update_scrambling_code(&mut self, mcc: u16, mnc: u16, colour_code: u8) {
        let code = scrambler::tetra_scramb_get_init(mcc, mnc, colour_code);
        if code != self.scrambling_code {
            tracing::info!(
                "cell identity: MCC/MNC = {}/{} colour code {} scrambling code 0x{:08x}",
                mcc, mnc, colour_code, code
            );
        }
        self.mcc = mcc;
        self.mnc = mnc;
        self.colour_code = colour_code;
        self.scrambling_code = code;
    }
}

impl Default for CellContext {
    fn default() -> Self {
        Self::new()
    }
}
