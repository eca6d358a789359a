use core::fmt;

use serde::{Deserialize, Serialize};

/// A single allele value stored at one locus of one chromosome copy.
pub type Allele = u8;

/// Largest allele value representable in standard mode.
pub const MAX_ALLELE: u32 = Allele::MAX as u32;

/// How allele values are interpreted by a population.
///
/// `Standard` alleles take any value in `0..=MAX_ALLELE`. `Binary` alleles are
/// restricted to 0 and 1, and several mutation models collapse to simpler
/// behaviour in this mode (k-allele flips, stepwise sets to 0 or 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlleleMode {
    #[default]
    Standard,
    Binary,
}

impl AlleleMode {
    /// Largest allele value allowed in this mode.
    #[inline(always)]
    pub const fn max_allele(self) -> u32 {
        match self {
            Self::Standard => MAX_ALLELE,
            Self::Binary => 1,
        }
    }

    #[inline(always)]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Binary)
    }

    /// Check that `value` can be stored in this mode and convert it.
    ///
    /// Returns the offending value and the mode maximum on failure so callers
    /// can wrap it into their own error type.
    #[inline]
    pub fn to_allele(self, value: i64) -> Result<Allele, (i64, u32)> {
        if (0..=self.max_allele() as i64).contains(&value) {
            Ok(value as Allele)
        } else {
            Err((value, self.max_allele()))
        }
    }
}

impl fmt::Display for AlleleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Binary => write!(f, "binary"),
        }
    }
}
