//! Extraction of the alleles surrounding a mutated locus.

use super::remap::ValueMap;
use crate::errors::MutationError;
use crate::simulation::Population;

/// Value recorded for window positions that fall outside the chromosome.
pub const OUT_OF_CHROMOSOME: i64 = -1;

/// Fill `window` with the `half_width` alleles before and the `half_width`
/// alleles after `locus` on chromosome copy `copy` of individual `ind`.
///
/// The window never crosses a chromosome boundary: positions outside the
/// chromosome holding `locus` are recorded as [`OUT_OF_CHROMOSOME`]. Every
/// other entry goes through `map_in`.
pub fn fill_context(
    pop: &Population,
    ind: usize,
    copy: usize,
    locus: usize,
    half_width: usize,
    map_in: &ValueMap,
    window: &mut Vec<i64>,
) -> Result<(), MutationError> {
    window.clear();
    if half_width == 0 {
        return Ok(());
    }

    let structure = pop.structure();
    let chrom = structure.chrom_of(locus);
    let begin = structure.chrom_begin(chrom);
    let end = structure.chrom_end(chrom);
    let mode = pop.mode();
    let read = |l: usize| -> Result<i64, MutationError> {
        map_in.map(pop.allele(ind, copy, l), mode).map(i64::from)
    };

    window.reserve(2 * half_width);
    for dist in (1..=half_width).rev() {
        window.push(if locus >= begin + dist {
            read(locus - dist)?
        } else {
            OUT_OF_CHROMOSOME
        });
    }
    for dist in 1..=half_width {
        window.push(if locus + dist < end {
            read(locus + dist)?
        } else {
            OUT_OF_CHROMOSOME
        });
    }
    Ok(())
}
