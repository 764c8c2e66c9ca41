//! Error correction levels.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The error correction level of a QR Code symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EccLevel {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    #[default]
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl EccLevel {
    /// All levels in toggle order.
    pub const ALL: [EccLevel; 4] = [
        EccLevel::Low,
        EccLevel::Medium,
        EccLevel::Quartile,
        EccLevel::High,
    ];

    /// The level after this one, wrapping from `High` back to `Low`.
    pub fn next(self) -> Self {
        use EccLevel::*;
        match self {
            Low => Medium,
            Medium => Quartile,
            Quartile => High,
            High => Low,
        }
    }

    pub fn letter(self) -> char {
        use EccLevel::*;
        match self {
            Low => 'L',
            Medium => 'M',
            Quartile => 'Q',
            High => 'H',
        }
    }
}

impl fmt::Display for EccLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for EccLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(EccLevel::Low),
            "m" | "medium" => Ok(EccLevel::Medium),
            "q" | "quartile" => Ok(EccLevel::Quartile),
            "h" | "high" => Ok(EccLevel::High),
            _ => Err(Error::InvalidEcc(s.to_string())),
        }
    }
}

impl From<EccLevel> for qrcode::EcLevel {
    fn from(level: EccLevel) -> Self {
        match level {
            EccLevel::Low => qrcode::EcLevel::L,
            EccLevel::Medium => qrcode::EcLevel::M,
            EccLevel::Quartile => qrcode::EcLevel::Q,
            EccLevel::High => qrcode::EcLevel::H,
        }
    }
}
