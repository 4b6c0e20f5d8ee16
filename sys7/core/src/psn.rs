//! Process serial numbers and four-character codes

use core::fmt;

/// Unique process identifier (high/low pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessSerialNumber {
    pub high: u32,
    pub low: u32,
}

impl ProcessSerialNumber {
    /// `kNoProcess`
    pub const NO_PROCESS: Self = Self::new(0, 0);
    /// `kSystemProcess`
    pub const SYSTEM: Self = Self::new(0, 1);
    /// `kCurrentProcess`
    pub const CURRENT: Self = Self::new(0, 2);
    /// First serial handed out to a created process.
    pub const FIRST_APPLICATION: u32 = 3;

    pub const fn new(high: u32, low: u32) -> Self {
        Self { high, low }
    }

    pub const fn as_u64(self) -> u64 {
        ((self.high as u64) << 32) | self.low as u64
    }

    pub const fn is_no_process(self) -> bool {
        self.high == 0 && self.low == 0
    }

    pub const fn is_current_process(self) -> bool {
        self.high == Self::CURRENT.high && self.low == Self::CURRENT.low
    }
}

impl fmt::Display for ProcessSerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "psn:{}.{}", self.high, self.low)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ProcessSerialNumber {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "psn:{}.{}", self.high, self.low);
    }
}

/// Four-character code (`OSType`), big-endian packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsType(pub u32);

impl OsType {
    /// `'APPL'`
    pub const APPLICATION: OsType = OsType::from_bytes(*b"APPL");
    /// `'MACS'`
    pub const SYSTEM_SIGNATURE: OsType = OsType::from_bytes(*b"MACS");
    /// `'INIT'`
    pub const SYSTEM_TYPE: OsType = OsType::from_bytes(*b"INIT");
    /// `'????'`
    pub const UNKNOWN: OsType = OsType::from_bytes(*b"????");

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        OsType(u32::from_be_bytes(bytes))
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for b in self.to_bytes() {
            let ch = if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' };
            write!(f, "{ch}")?;
        }
        f.write_str("'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_serials() {
        assert!(ProcessSerialNumber::NO_PROCESS.is_no_process());
        assert!(ProcessSerialNumber::CURRENT.is_current_process());
        assert_ne!(ProcessSerialNumber::SYSTEM, ProcessSerialNumber::CURRENT);
        assert_eq!(ProcessSerialNumber::new(1, 2).as_u64(), (1u64 << 32) | 2);
    }

    #[test]
    fn os_type_display() {
        assert_eq!(OsType::APPLICATION.to_string(), "'APPL'");
        assert_eq!(OsType::from_bytes([b'a', 0, b'c', b'd']).to_string(), "'a.cd'");
    }
}
