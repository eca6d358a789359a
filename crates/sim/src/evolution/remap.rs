//! Translation of stored allele values before and after mutation.
//!
//! A mutation model may work in a different state space than the one stored
//! in the population (e.g. repeat counts stored as codes). The driver maps
//! the stored value in, mutates, and maps the result back out.

use super::callback::AlleleFn;
use crate::base::{Allele, AlleleMode};
use crate::errors::MutationError;

#[derive(Debug, Clone, Default)]
pub enum ValueMap {
    /// Identity.
    #[default]
    None,
    /// Lookup table indexed by allele. Values past the end of the table pass
    /// through unchanged.
    Table(Vec<Allele>),
    Function(AlleleFn),
}

impl ValueMap {
    /// Whether a mapping has been configured.
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Map one allele value.
    ///
    /// # Errors
    /// Returns `AlleleOutOfRange` if a function maps to a value that cannot be
    /// stored in `mode`, or a table holds such a value.
    pub fn map(&self, allele: Allele, mode: AlleleMode) -> Result<Allele, MutationError> {
        let mapped = match self {
            Self::None => return Ok(allele),
            Self::Table(table) => table
                .get(allele as usize)
                .map_or(i64::from(allele), |&v| i64::from(v)),
            Self::Function(f) => f.call(i64::from(allele))?,
        };
        mode.to_allele(mapped)
            .map_err(|(allele, max)| MutationError::AlleleOutOfRange { allele, max })
    }
}

impl From<Vec<Allele>> for ValueMap {
    fn from(table: Vec<Allele>) -> Self {
        Self::Table(table)
    }
}

impl From<AlleleFn> for ValueMap {
    fn from(f: AlleleFn) -> Self {
        Self::Function(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let m = ValueMap::None;
        assert!(!m.is_active());
        assert_eq!(m.map(7, AlleleMode::Standard), Ok(7));
    }

    #[test]
    fn test_table_lookup_and_passthrough() {
        let m = ValueMap::from(vec![3, 2, 1]);
        assert!(m.is_active());
        assert_eq!(m.map(0, AlleleMode::Standard), Ok(3));
        assert_eq!(m.map(2, AlleleMode::Standard), Ok(1));
        assert_eq!(m.map(10, AlleleMode::Standard), Ok(10));
    }

    #[test]
    fn test_table_value_out_of_binary_range() {
        let m = ValueMap::from(vec![1, 5]);
        assert_eq!(
            m.map(1, AlleleMode::Binary),
            Err(MutationError::AlleleOutOfRange { allele: 5, max: 1 })
        );
    }

    #[test]
    fn test_function_map() {
        let m = ValueMap::from(AlleleFn::new(|a| Ok(a * 2)));
        assert_eq!(m.map(4, AlleleMode::Standard), Ok(8));
        assert_eq!(
            m.map(200, AlleleMode::Standard),
            Err(MutationError::AlleleOutOfRange { allele: 400, max: 255 })
        );
    }
}
