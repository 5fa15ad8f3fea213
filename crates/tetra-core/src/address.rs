use core::fmt;

/// Address carried by a downlink MAC header, one variant per 3-bit address
/// type of Clause 21.4.3.1 table 21.55. Combinations follow EN 300 392-1
/// clause 7: event labels and usage markers ride along with the identity
/// they are being assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Null PDU, no addressed party
    None,
    /// Short Subscriber Identity
    Ssi(u32),
    /// Event label previously assigned to an SSI
    EventLabel(u16),
    /// Un-exchanged Short Subscriber Identity
    Ussi(u32),
    /// Stack Management Identity
    Smi(u32),
    /// Event label assignment
    SsiEventLabel { ssi: u32, event_label: u16 },
    /// Usage marker assignment
    SsiUsageMarker { ssi: u32, usage_marker: u8 },
    /// Event label assignment for management traffic
    SmiEventLabel { smi: u32, event_label: u16 },
}

/// Current MAC address with the encryption mode it was received under.
/// Note that the identity may still be an ESI when encryption is active;
/// it is passed up the stack as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress {
    pub kind: AddressKind,
    /// 2 bits, see EN 300 392-7. Propagated as metadata only.
    pub encryption_mode: u8,
}

impl Default for MacAddress {
    fn default() -> Self {
        MacAddress { kind: AddressKind::None, encryption_mode: 0 }
    }
}

impl MacAddress {
    pub fn new(kind: AddressKind, encryption_mode: u8) -> Self {
        MacAddress { kind, encryption_mode }
    }

    /// Subscriber identity, if this address carries one (SSI, USSI or SMI)
    pub fn ssi(&self) -> Option<u32> {
        match self.kind {
            AddressKind::Ssi(ssi)
            | AddressKind::Ussi(ssi)
            | AddressKind::Smi(ssi)
            | AddressKind::SsiEventLabel { ssi, .. }
            | AddressKind::SsiUsageMarker { ssi, .. }
            | AddressKind::SmiEventLabel { smi: ssi, .. } => Some(ssi),
            AddressKind::None | AddressKind::EventLabel(_) => None,
        }
    }

    pub fn event_label(&self) -> Option<u16> {
        match self.kind {
            AddressKind::EventLabel(label)
            | AddressKind::SsiEventLabel { event_label: label, .. }
            | AddressKind::SmiEventLabel { event_label: label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn usage_marker(&self) -> Option<u8> {
        match self.kind {
            AddressKind::SsiUsageMarker { usage_marker, .. } => Some(usage_marker),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind == AddressKind::None
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AddressKind::None => write!(f, "NULL"),
            AddressKind::Ssi(ssi) => write!(f, "SSI:{}", ssi),
            AddressKind::EventLabel(l) => write!(f, "EL:{}", l),
            AddressKind::Ussi(ssi) => write!(f, "USSI:{}", ssi),
            AddressKind::Smi(smi) => write!(f, "SMI:{}", smi),
            AddressKind::SsiEventLabel { ssi, event_label } => write!(f, "SSI:{}+EL:{}", ssi, event_label),
            AddressKind::SsiUsageMarker { ssi, usage_marker } => write!(f, "SSI:{}+UM:{}", ssi, usage_marker),
            AddressKind::SmiEventLabel { smi, event_label } => write!(f, "SMI:{}+EL:{}", smi, event_label),
        }
    }
}
