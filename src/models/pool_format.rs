use serde::{Deserialize, Serialize};
use std::fmt;

/// AMM pool generation a quote was priced against.
///
/// The discriminants are the version numbers the execution layer expects,
/// so the enum serializes as a bare integer (2, 3 or 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum PoolFormat {
    /// Constant-product, reserve-based pair pools.
    ConstantProduct = 2,
    /// Concentrated liquidity, fee-tiered, quoter-evaluated pools.
    Concentrated = 3,
    /// Concentrated liquidity with pluggable hooks, liquidity-gated.
    Hooked = 4,
}

impl PoolFormat {
    pub const ALL: [PoolFormat; 3] = [
        PoolFormat::ConstantProduct,
        PoolFormat::Concentrated,
        PoolFormat::Hooked,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn identifier(self) -> &'static str {
        match self {
            PoolFormat::ConstantProduct => "V2",
            PoolFormat::Concentrated => "V3",
            PoolFormat::Hooked => "V4",
        }
    }
}

impl From<PoolFormat> for u8 {
    fn from(format: PoolFormat) -> u8 {
        format.ordinal()
    }
}

impl TryFrom<u8> for PoolFormat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(PoolFormat::ConstantProduct),
            3 => Ok(PoolFormat::Concentrated),
            4 => Ok(PoolFormat::Hooked),
            other => Err(format!("unknown pool format version {}", other)),
        }
    }
}

impl fmt::Display for PoolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
