use core::fmt;
use core::str::FromStr;

use crate::error::UnsupportedLevel;

/// Supported Dilithium parameter sets.
///
/// The persisted form of a level is its tag (`"2"`, `"3"`, `"5"`). Parsing is
/// strict: anything else is an [`UnsupportedLevel`] error at the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SecurityLevel {
    /// Dilithium2 (NIST category 2).
    Level2,
    /// Dilithium3 (NIST category 3).
    Level3,
    /// Dilithium5 (NIST category 5).
    Level5,
}

impl SecurityLevel {
    /// Every supported level, weakest first.
    pub const ALL: [SecurityLevel; 3] = [Self::Level2, Self::Level3, Self::Level5];

    /// Stable tag used in persisted records and on the command line.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Level2 => "2",
            Self::Level3 => "3",
            Self::Level5 => "5",
        }
    }

    /// NIST post-quantum security category.
    pub const fn nist_category(self) -> u8 {
        match self {
            Self::Level2 => 2,
            Self::Level3 => 3,
            Self::Level5 => 5,
        }
    }

    /// Dimensions `(k, l)` of the public matrix A.
    pub const fn matrix_dims(self) -> (usize, usize) {
        match self {
            Self::Level2 => (4, 4),
            Self::Level3 => (6, 5),
            Self::Level5 => (8, 7),
        }
    }

    /// Parameter-set name, e.g. `Dilithium3`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Level2 => "Dilithium2",
            Self::Level3 => "Dilithium3",
            Self::Level5 => "Dilithium5",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SecurityLevel {
    type Err = UnsupportedLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2" => Ok(Self::Level2),
            "3" => Ok(Self::Level3),
            "5" => Ok(Self::Level5),
            other => Err(UnsupportedLevel(other.to_owned())),
        }
    }
}

/// Byte lengths of keys and signatures for one level on one backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeySizes {
    pub public_key: usize,
    pub secret_key: usize,
    pub signature: usize,
}
