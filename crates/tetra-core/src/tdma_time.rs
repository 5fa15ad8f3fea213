use core::fmt;

/// TDMA time triple, advanced once per received burst.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TdmaTime {
    /// Timeslot, from 1 to 4
    pub t: u8,
    /// Frame number, from 1 to 18
    pub f: u8,
    /// Multiframe number, from 1 to 60
    pub m: u8,
}

impl Default for TdmaTime {
    /// Returns the default TdmaTime of 1/1/1
    fn default() -> TdmaTime {
        TdmaTime { t: 1, f: 1, m: 1 }
    }
}

impl TdmaTime {
    pub fn is_valid(self) -> bool {
        self.t >= 1 && self.t <= 4 &&
        self.f >= 1 && self.f <= 18 &&
        self.m >= 1 && self.m <= 60
    }

    /// Advance by one timeslot, wrapping t into f, f into m, and m back to 1.
    pub fn increment(&mut self) {
        self.t += 1;
        if self.t > 4 {
            self.t = 1;
            self.f += 1;
        }
        if self.f > 18 {
            self.f = 1;
            self.m += 1;
        }
        if self.m > 60 {
            self.m = 1;
        }
    }

    /// Returns true if this DL timeslot carries a mandatory BNCH block
    /// (frame 18, (m + t) mod 4 == 1)
    pub fn is_mandatory_bnch(&self) -> bool {
        self.f == 18 && (self.m + self.t) % 4 == 1
    }

    /// Returns true if this DL timeslot carries a mandatory BSCH (SYNC) block
    /// (frame 18, (m + t) mod 4 == 3)
    pub fn is_mandatory_bsch(&self) -> bool {
        self.f == 18 && (self.m + self.t) % 4 == 3
    }
}

impl fmt::Display for TdmaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.m, self.f, self.t)
    }
}

impl fmt::Debug for TdmaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.m, self.f, self.t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_wraps() {
        let mut time = TdmaTime::default();

        // A full hyperperiod of 4 * 18 * 60 slots returns to the start
        for _ in 0..4 * 18 * 60 {
            time.increment();
            assert!(time.is_valid(), "invalid time {:?}", time);
        }
        assert_eq!(time, TdmaTime::default());
    }

    #[test]
    fn test_increment_order() {
        let mut time = TdmaTime { t: 4, f: 1, m: 1 };
        time.increment();
        assert_eq!(time, TdmaTime { t: 1, f: 2, m: 1 });

        let mut time = TdmaTime { t: 4, f: 18, m: 1 };
        time.increment();
        assert_eq!(time, TdmaTime { t: 1, f: 1, m: 2 });

        let mut time = TdmaTime { t: 4, f: 18, m: 60 };
        time.increment();
        assert_eq!(time, TdmaTime { t: 1, f: 1, m: 1 });
    }

    #[test]
    fn test_broadcast_scheduling() {
        assert!(TdmaTime { t: 4, f: 18, m: 1 }.is_mandatory_bnch());
        assert!(!TdmaTime { t: 4, f: 17, m: 1 }.is_mandatory_bnch());
        assert!(TdmaTime { t: 2, f: 18, m: 1 }.is_mandatory_bsch());
    }
}
