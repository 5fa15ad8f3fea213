/// Downlink usage for the current slot, derived from ACCESS-ASSIGN
/// (Clause 21.4.7.2, control channel usage per 23.3.1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlinkUsage {
    Unallocated,
    AssignedControl,
    CommonControl,
    Reserved,
    /// Circuit mode traffic, tagged with the downlink usage marker (4..63)
    Traffic(u8),
}

impl DownlinkUsage {
    /// Map a 6-bit downlink usage marker field onto a usage
    pub fn from_usage_marker(field: u8) -> Self {
        match field {
            0 => DownlinkUsage::Unallocated,
            1 => DownlinkUsage::AssignedControl,
            2 => DownlinkUsage::CommonControl,
            3 => DownlinkUsage::Reserved,
            _ => DownlinkUsage::Traffic(field),
        }
    }

    pub fn to_usage_marker(self) -> u8 {
        match self {
            DownlinkUsage::Unallocated => 0,
            DownlinkUsage::AssignedControl => 1,
            DownlinkUsage::CommonControl => 2,
            DownlinkUsage::Reserved => 3,
            DownlinkUsage::Traffic(marker) => marker,
        }
    }

    pub fn is_traffic(self) -> bool {
        matches!(self, DownlinkUsage::Traffic(_))
    }

    pub fn usage_marker(self) -> Option<u8> {
        if let DownlinkUsage::Traffic(marker) = self {
            Some(marker)
        } else {
            None
        }
    }
}

impl core::fmt::Display for DownlinkUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DownlinkUsage::Unallocated => write!(f, "Unallocated"),
            DownlinkUsage::AssignedControl => write!(f, "AssignedControl"),
            DownlinkUsage::CommonControl => write!(f, "CommonControl"),
            DownlinkUsage::Reserved => write!(f, "Reserved"),
            DownlinkUsage::Traffic(marker) => write!(f, "Traffic({})", marker),
        }
    }
}
