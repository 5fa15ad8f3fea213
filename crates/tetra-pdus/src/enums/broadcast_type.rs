/// Clause 21.4.4.0 Table 21.64
/// Bits: 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BroadcastType {
    /// SYSINFO PDU (pi/4-DQPSK modulation)
    Sysinfo = 0,
    /// ACCESS-DEFINE PDU
    AccessDefine = 1,
    /// SYSINFO-DA
    SysinfoDa = 2,
}

impl std::convert::TryFrom<u64> for BroadcastType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(BroadcastType::Sysinfo),
            1 => Ok(BroadcastType::AccessDefine),
            2 => Ok(BroadcastType::SysinfoDa),
            _ => Err(()),
        }
    }
}

impl BroadcastType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u64
    }
}

impl From<BroadcastType> for u64 {
    fn from(e: BroadcastType) -> Self { e.into_raw() }
}
