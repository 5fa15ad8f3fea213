use serde::Deserialize;

/// Downlink carrier frequency description, as broadcast in SYSINFO.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FreqInfo {
    /// Frequency band in 100 MHz increments
    pub band: u8,
    /// Carrier number, 0-4095, in 25 kHz steps
    pub carrier: u16,
    /// Frequency offset from the 25 kHz aligned carrier.
    /// In Hz: -6250, 0, 6250 or 12500
    pub freq_offset_hz: i32,
}

impl FreqInfo {
    /// Map the 2-bit SYSINFO offset index to an offset in Hz (21.4.4.1)
    pub fn freq_offset_id_to_hz(offset_index: u8) -> Option<i32> {
        match offset_index {
            0 => Some(0),
            1 => Some(6250),
            2 => Some(-6250),
            3 => Some(12500),
            _ => None,
        }
    }

    pub fn from_sysinfo(band: u8, carrier: u16, offset_index: u8) -> Option<Self> {
        Some(Self {
            band,
            carrier,
            freq_offset_hz: Self::freq_offset_id_to_hz(offset_index)?,
        })
    }

    /// Downlink frequency in Hz
    pub fn downlink_frequency(&self) -> i64 {
        self.band as i64 * 100_000_000 + self.carrier as i64 * 25_000 + self.freq_offset_hz as i64
    }
}
