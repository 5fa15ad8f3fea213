/// Clause 21.4.4.1: which 20-bit optional field a SYSINFO PDU carries
/// Bits: 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SysinfoOptFieldFlag {
    EvenMfDefForTsMode = 0,
    OddMfDefForTsMode = 1,
    DefaultDefForAccCodeA = 2,
    ExtServicesBroadcast = 3,
}

impl std::convert::TryFrom<u64> for SysinfoOptFieldFlag {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(SysinfoOptFieldFlag::EvenMfDefForTsMode),
            1 => Ok(SysinfoOptFieldFlag::OddMfDefForTsMode),
            2 => Ok(SysinfoOptFieldFlag::DefaultDefForAccCodeA),
            3 => Ok(SysinfoOptFieldFlag::ExtServicesBroadcast),
            _ => Err(()),
        }
    }
}

impl SysinfoOptFieldFlag {
    pub fn into_raw(self) -> u64 {
        self as u64
    }
}

impl core::fmt::Display for SysinfoOptFieldFlag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SysinfoOptFieldFlag::EvenMfDefForTsMode => write!(f, "EvenMfDefForTsMode"),
            SysinfoOptFieldFlag::OddMfDefForTsMode => write!(f, "OddMfDefForTsMode"),
            SysinfoOptFieldFlag::DefaultDefForAccCodeA => write!(f, "DefaultDefForAccCodeA"),
            SysinfoOptFieldFlag::ExtServicesBroadcast => write!(f, "ExtServicesBroadcast"),
        }
    }
}
