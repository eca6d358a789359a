//! The stochastic mutation driver.
//!
//! A [`Mutator`] pairs a [`MutationModel`] with the loci it acts on and one
//! mutation rate per locus. Applying it to a population runs one Bernoulli
//! trial per (individual × chromosome copy) for each locus, using
//! [`BernoulliTrials`] so that only successful trials are visited, and hands
//! each success to the model.

use super::context::fill_context;
use super::mutation::{MutationModel, MutationSite};
use super::remap::ValueMap;
use super::trials::BernoulliTrials;
use crate::base::Allele;
use crate::errors::MutationError;
use crate::genome::AlleleCursor;
use crate::simulation::{Population, SubPopId};
use rand::Rng;
use tracing::{debug, trace};

/// A mutation operator driven by per-locus mutation rates.
///
/// Loci and rates are resolved against a population the first time the
/// mutator is applied, and again whenever the population size or its number
/// of loci changes.
///
/// # Example
/// ```
/// use allevo_sim::evolution::{KAlleleModel, MutationModel, Mutator};
/// use allevo_sim::prelude::*;
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256PlusPlus;
///
/// let structure = GenomeStructure::new(2, vec![5]).unwrap();
/// let mut pop = Population::new("pop", structure, vec![100], AlleleMode::Standard);
/// let mut mutator = Mutator::new(
///     MutationModel::RandomAllele(KAlleleModel::new(4).unwrap()),
///     vec![0.01],
/// )
/// .unwrap();
///
/// let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
/// let events = mutator.apply(&mut pop, &mut rng).unwrap();
/// assert_eq!(mutator.rates(), &[0.01; 5]);
/// assert!(events < 1000);
/// ```
#[derive(Debug, Clone)]
pub struct Mutator {
    model: MutationModel,
    /// Loci to mutate; empty means every locus.
    loci: Vec<usize>,
    /// Rates as configured, broadcast at initialization.
    rates: Vec<f64>,
    /// Target subpopulations; empty means every subpopulation.
    subpops: Vec<SubPopId>,
    map_in: ValueMap,
    map_out: ValueMap,
    context_half_width: usize,

    resolved_loci: Vec<usize>,
    resolved_rates: Vec<f64>,
    /// Rate per population locus, 0 for loci not covered.
    locus_rates: Vec<f64>,
    /// ploidy × population size at the last initialization.
    trial_size: usize,
    /// Loci per genotype copy at the last initialization.
    num_loci: usize,
    initialized: bool,
    trials: BernoulliTrials,
}

impl Mutator {
    /// Create a mutator acting on every locus of every subpopulation.
    ///
    /// If fewer rates than loci are given, the first rate applies to all loci.
    /// A matrix model imposes its own rate and ignores `rates`. A context
    /// model reads a window whose half width is implied by its patterns.
    ///
    /// # Errors
    /// Returns an error if no rate is given, a rate is outside [0, 1], or
    /// context patterns differ in length.
    pub fn new(model: MutationModel, rates: Vec<f64>) -> Result<Self, MutationError> {
        let rates = model.fixed_rates().unwrap_or(rates);
        if rates.is_empty() {
            return Err(MutationError::InvalidParameter(
                "at least one mutation rate is required".into(),
            ));
        }
        if let Some(&rate) = rates.iter().find(|r| !(0.0..=1.0).contains(*r)) {
            return Err(MutationError::InvalidMutationRate(rate));
        }

        let context_half_width = match &model {
            MutationModel::Context(m) => {
                m.check_window(m.half_width())?;
                m.half_width()
            }
            _ => 0,
        };

        Ok(Self {
            model,
            loci: Vec::new(),
            rates,
            subpops: Vec::new(),
            map_in: ValueMap::None,
            map_out: ValueMap::None,
            context_half_width,
            resolved_loci: Vec::new(),
            resolved_rates: Vec::new(),
            locus_rates: Vec::new(),
            trial_size: 0,
            num_loci: 0,
            initialized: false,
            trials: BernoulliTrials::new(),
        })
    }

    /// Restrict the mutator to the given loci.
    pub fn with_loci(mut self, loci: Vec<usize>) -> Self {
        self.loci = loci;
        self.initialized = false;
        self
    }

    /// Restrict the mutator to the given (virtual) subpopulations.
    pub fn with_subpops(mut self, subpops: Vec<SubPopId>) -> Self {
        self.subpops = subpops;
        self
    }

    pub fn with_map_in(mut self, map_in: ValueMap) -> Self {
        self.map_in = map_in;
        self
    }

    pub fn with_map_out(mut self, map_out: ValueMap) -> Self {
        self.map_out = map_out;
        self
    }

    /// Read `half_width` alleles on each side of a mutated locus and pass
    /// them to the model.
    ///
    /// # Errors
    /// Returns `ContextLength` if the model matches patterns of another length.
    pub fn with_context_half_width(mut self, half_width: usize) -> Result<Self, MutationError> {
        if let MutationModel::Context(m) = &self.model {
            m.check_window(half_width)?;
        }
        self.context_half_width = half_width;
        Ok(self)
    }

    pub fn model(&self) -> &MutationModel {
        &self.model
    }

    /// Loci resolved at the last initialization.
    pub fn loci(&self) -> &[usize] {
        &self.resolved_loci
    }

    /// One rate per resolved locus.
    pub fn rates(&self) -> &[f64] {
        &self.resolved_rates
    }

    pub fn subpops(&self) -> &[SubPopId] {
        &self.subpops
    }

    pub fn map_in(&self) -> &ValueMap {
        &self.map_in
    }

    pub fn map_out(&self) -> &ValueMap {
        &self.map_out
    }

    pub fn context_half_width(&self) -> usize {
        self.context_half_width
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of trials per locus the mutator was initialized for.
    #[inline]
    pub fn trial_size(&self) -> usize {
        self.trial_size
    }

    /// Mutation rate at `locus`, or 0 if the mutator does not cover it.
    #[inline]
    pub fn mut_rate(&self, locus: usize) -> f64 {
        self.locus_rates.get(locus).copied().unwrap_or(0.0)
    }

    /// Resolve loci and rates against `pop` and initialize child mutators.
    ///
    /// # Errors
    /// Returns an error if a locus is out of range or listed twice, more
    /// rates than loci were given, or a child fails to initialize.
    pub fn initialize(&mut self, pop: &Population) -> Result<(), MutationError> {
        let num_loci = pop.num_loci();
        let loci: Vec<usize> = if self.loci.is_empty() {
            (0..num_loci).collect()
        } else {
            if let Some(&locus) = self.loci.iter().find(|&&l| l >= num_loci) {
                return Err(MutationError::LocusOutOfRange { locus, num_loci });
            }
            let mut seen = vec![false; num_loci];
            for &locus in &self.loci {
                if std::mem::replace(&mut seen[locus], true) {
                    return Err(MutationError::DuplicateLocus(locus));
                }
            }
            self.loci.clone()
        };

        let rates = if self.rates.len() == loci.len() {
            self.rates.clone()
        } else if self.rates.len() < loci.len() {
            vec![self.rates[0]; loci.len()]
        } else {
            return Err(MutationError::RateCountMismatch {
                rates: self.rates.len(),
                loci: loci.len(),
            });
        };

        let trial_size = pop.ploidy() * pop.size();
        self.trials.set_parameter(&rates, trial_size)?;

        let mut locus_rates = vec![0.0; num_loci];
        for (&locus, &rate) in loci.iter().zip(&rates) {
            locus_rates[locus] = rate;
        }

        if let MutationModel::Context(m) = &self.model {
            m.check_window(self.context_half_width)?;
        }
        self.model.initialize(pop)?;

        debug!(
            model = self.model.name(),
            loci = loci.len(),
            trial_size,
            "initialize mutator"
        );

        self.resolved_loci = loci;
        self.resolved_rates = rates;
        self.locus_rates = locus_rates;
        self.trial_size = trial_size;
        self.num_loci = num_loci;
        self.initialized = true;
        Ok(())
    }

    /// Apply the mutator to `pop` once.
    ///
    /// Returns the number of mutation events, counting events whose model
    /// left the allele unchanged.
    ///
    /// # Errors
    /// Any error aborts the call. Alleles mutated before the error keep their
    /// new values, and an activated virtual subpopulation is deactivated.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        pop: &mut Population,
        rng: &mut R,
    ) -> Result<usize, MutationError> {
        if !self.initialized
            || self.trial_size != pop.ploidy() * pop.size()
            || self.num_loci != pop.num_loci()
        {
            self.initialize(pop)?;
        }

        let targets: Vec<SubPopId> = if self.subpops.is_empty() {
            (0..pop.num_subpops()).map(SubPopId::new).collect()
        } else {
            self.subpops.clone()
        };
        for &id in &targets {
            pop.check_subpop(id)?;
        }

        let ploidy = pop.ploidy();
        let mut window = Vec::with_capacity(2 * self.context_half_width);
        let mut events = 0;

        for id in targets {
            if pop.subpop_size(id)? == 0 {
                continue;
            }
            let mut active = pop.activate(id)?;
            self.trials
                .set_parameter(&self.resolved_rates, ploidy * active.size())?;
            self.trials.do_trial(rng);

            for (idx, &locus) in self.resolved_loci.iter().enumerate() {
                let mut cursor = active.allele_cursor(locus);
                let mut last = 0;
                for pos in self.trials.successes(idx) {
                    cursor.advance(pos - last);
                    last = pos;
                    if !cursor.is_valid() {
                        continue;
                    }
                    self.mutate_at(&mut active, &cursor, &mut window, rng)?;
                    events += 1;
                }
            }
        }
        Ok(events)
    }

    fn mutate_at<R: Rng + ?Sized>(
        &self,
        pop: &mut Population,
        cursor: &AlleleCursor,
        window: &mut Vec<i64>,
        rng: &mut R,
    ) -> Result<(), MutationError> {
        let (Some(ind), Some(index)) = (cursor.individual(), cursor.index()) else {
            return Ok(());
        };
        let locus = cursor.locus();
        let mode = pop.mode();

        let stored = pop.genotypes().get(index);
        let allele = self.map_in.map(stored, mode)?;
        fill_context(
            pop,
            ind,
            cursor.copy(),
            locus,
            self.context_half_width,
            &self.map_in,
            window,
        )?;

        let site = MutationSite::new(locus, window, mode);
        let mutated = self.model.mutate(allele, &site, rng)?;
        let new: Allele = self.map_out.map(mutated, mode)?;
        if u32::from(new) > mode.max_allele() {
            return Err(MutationError::AlleleOutOfRange {
                allele: i64::from(new),
                max: mode.max_allele(),
            });
        }

        trace!(
            generation = pop.generation(),
            replicate = pop.replicate(),
            ind,
            copy = cursor.copy(),
            locus,
            from = stored,
            to = new,
            "mutate allele"
        );
        pop.genotypes_mut().set(index, new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::AlleleMode;
    use crate::evolution::callback::{AlleleFn, ContextFn};
    use crate::evolution::mutation::{CallbackModel, ContextModel, KAlleleModel, MatrixModel};
    use crate::genome::GenomeStructure;
    use crate::simulation::VirtualSplitter;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn population(ploidy: usize, loci: Vec<usize>, sizes: Vec<usize>, mode: AlleleMode) -> Population {
        let structure = GenomeStructure::new(ploidy, loci).unwrap();
        Population::new("test", structure, sizes, mode)
    }

    fn k_allele(k: u32, rates: Vec<f64>) -> Mutator {
        Mutator::new(MutationModel::RandomAllele(KAlleleModel::new(k).unwrap()), rates).unwrap()
    }

    fn callback(f: impl Fn(i64) -> Result<i64, String> + Send + Sync + 'static, rate: f64) -> Mutator {
        let model = MutationModel::Callback(CallbackModel::from(AlleleFn::new(f)));
        Mutator::new(model, vec![rate]).unwrap()
    }

    #[test]
    fn test_rate_broadcast() {
        let pop = population(2, vec![5], vec![10], AlleleMode::Standard);
        let mut m = k_allele(4, vec![0.3]);
        m.initialize(&pop).unwrap();
        assert_eq!(m.loci(), &[0, 1, 2, 3, 4]);
        assert_eq!(m.rates(), &[0.3; 5]);
        assert_eq!(m.trial_size(), 20);
        assert!(m.is_initialized());
    }

    #[test]
    fn test_rate_validation() {
        let model = MutationModel::RandomAllele(KAlleleModel::new(4).unwrap());
        assert_eq!(
            Mutator::new(model.clone(), vec![0.1, 1.5]).unwrap_err(),
            MutationError::InvalidMutationRate(1.5)
        );
        assert!(Mutator::new(model, vec![]).is_err());
    }

    #[test]
    fn test_too_many_rates() {
        let pop = population(1, vec![2], vec![1], AlleleMode::Standard);
        let mut m = k_allele(4, vec![0.1, 0.2, 0.3]);
        assert_eq!(
            m.initialize(&pop),
            Err(MutationError::RateCountMismatch { rates: 3, loci: 2 })
        );
    }

    #[test]
    fn test_locus_out_of_range() {
        let pop = population(1, vec![3], vec![1], AlleleMode::Standard);
        let mut m = k_allele(4, vec![0.1]).with_loci(vec![1, 3]);
        assert_eq!(
            m.initialize(&pop),
            Err(MutationError::LocusOutOfRange {
                locus: 3,
                num_loci: 3
            })
        );
    }

    #[test]
    fn test_duplicate_locus_rejected() {
        let pop = population(1, vec![4], vec![1], AlleleMode::Standard);
        let mut m = k_allele(4, vec![0.1]).with_loci(vec![2, 0, 2]);
        assert_eq!(m.initialize(&pop), Err(MutationError::DuplicateLocus(2)));
        assert!(!m.is_initialized());
    }

    #[test]
    fn test_reinitialize_on_fewer_loci_same_trial_size() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut m = callback(|_| Ok(1), 1.0);

        let mut long = population(1, vec![10], vec![4], AlleleMode::Standard);
        assert_eq!(m.apply(&mut long, &mut rng).unwrap(), 40);
        assert_eq!(m.loci().len(), 10);

        // same ploidy and size, half the loci
        let mut short = population(1, vec![5], vec![4], AlleleMode::Standard);
        assert_eq!(m.apply(&mut short, &mut rng).unwrap(), 20);
        assert_eq!(m.loci(), &[0, 1, 2, 3, 4]);
        assert_eq!(m.trial_size(), 4);
        assert!(short.genotypes().as_slice().iter().all(|&a| a == 1));
    }

    #[test]
    fn test_explicit_loci_checked_against_new_population() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut m = callback(|_| Ok(1), 1.0).with_loci(vec![7]);
        let mut long = population(1, vec![10], vec![2], AlleleMode::Standard);
        assert_eq!(m.apply(&mut long, &mut rng).unwrap(), 2);

        let mut short = population(1, vec![5], vec![2], AlleleMode::Standard);
        assert_eq!(
            m.apply(&mut short, &mut rng),
            Err(MutationError::LocusOutOfRange {
                locus: 7,
                num_loci: 5
            })
        );
        assert!(short.genotypes().as_slice().iter().all(|&a| a == 0));
    }

    #[test]
    fn test_mut_rate_lookup() {
        let pop = population(1, vec![4], vec![1], AlleleMode::Standard);
        let mut m = k_allele(4, vec![0.1, 0.2]).with_loci(vec![3, 1]);
        assert_eq!(m.mut_rate(3), 0.0);
        m.initialize(&pop).unwrap();
        assert_eq!(m.mut_rate(3), 0.1);
        assert_eq!(m.mut_rate(1), 0.2);
        assert_eq!(m.mut_rate(0), 0.0);
        assert_eq!(m.mut_rate(99), 0.0);
    }

    #[test]
    fn test_matrix_mutator_uses_mu() {
        let model = MatrixModel::new(vec![
            vec![0.0, 0.1, 0.2],
            vec![0.3, 0.0, 0.1],
            vec![0.1, 0.1, 0.0],
        ])
        .unwrap();
        let pop = population(1, vec![2], vec![1], AlleleMode::Standard);
        let mut m = Mutator::new(MutationModel::Matrix(model), vec![0.9]).unwrap();
        m.initialize(&pop).unwrap();
        assert_eq!(m.rates().len(), 2);
        assert!(m.rates().iter().all(|r| (r - 0.4).abs() < 1e-12));
    }

    #[test]
    fn test_binary_flip_end_to_end() {
        // 2 diploid individuals, 3 loci
        let before = vec![0, 1, 1, 0, 0, 1, 1, 0, 1, 1, 0, 0];
        let structure = GenomeStructure::new(2, vec![3]).unwrap();
        let mut pop =
            Population::from_genotypes("flip", structure, vec![2], AlleleMode::Binary, before.clone())
                .unwrap();
        let mut m = k_allele(2, vec![1.0]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let events = m.apply(&mut pop, &mut rng).unwrap();
        assert_eq!(events, 12);
        let flipped: Vec<Allele> = before.iter().map(|&a| 1 - a).collect();
        assert_eq!(pop.genotypes().as_slice(), flipped.as_slice());
    }

    #[test]
    fn test_zero_rate_is_noop() {
        let mut pop = population(2, vec![10], vec![50], AlleleMode::Standard);
        let mut m = k_allele(4, vec![0.0]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(m.apply(&mut pop, &mut rng).unwrap(), 0);
        assert!(pop.genotypes().as_slice().iter().all(|&a| a == 0));
    }

    #[test]
    fn test_remap_round_trip_with_zero_rate() {
        let mut pop = population(1, vec![3], vec![4], AlleleMode::Standard);
        pop.set_allele(1, 0, 2, 7);
        let before = pop.genotypes().clone();
        let mut m = k_allele(10, vec![0.0])
            .with_map_in(ValueMap::Table(vec![1, 0]))
            .with_map_out(ValueMap::Table(vec![1, 0]));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        m.apply(&mut pop, &mut rng).unwrap();
        assert_eq!(pop.genotypes(), &before);
    }

    #[test]
    fn test_remap_applied_around_model() {
        let mut pop = population(1, vec![1], vec![3], AlleleMode::Standard);
        // stored 0 -> model sees 5 -> model returns 6 -> stored as 60
        let mut m = callback(|a| Ok(a + 1), 1.0)
            .with_map_in(ValueMap::Table(vec![5]))
            .with_map_out(ValueMap::Function(AlleleFn::new(|a| Ok(a * 10))));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(m.apply(&mut pop, &mut rng).unwrap(), 3);
        assert!(pop.genotypes().as_slice().iter().all(|&a| a == 60));
    }

    #[test]
    fn test_model_output_checked_against_mode() {
        let mut pop = population(1, vec![1], vec![1], AlleleMode::Binary);
        let model = MatrixModel::new(vec![
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap();
        let mut m = Mutator::new(MutationModel::Matrix(model), vec![]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(
            m.apply(&mut pop, &mut rng),
            Err(MutationError::AlleleOutOfRange { allele: 2, max: 1 })
        );
    }

    #[test]
    fn test_reinitialize_on_resize() {
        let mut pop = population(2, vec![2], vec![3], AlleleMode::Standard);
        let mut m = k_allele(4, vec![0.5]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        m.apply(&mut pop, &mut rng).unwrap();
        assert_eq!(m.trial_size(), 6);
        pop.resize(&[5]).unwrap();
        m.apply(&mut pop, &mut rng).unwrap();
        assert_eq!(m.trial_size(), 10);
    }

    #[test]
    fn test_subpop_targets() {
        let mut pop = population(1, vec![2], vec![2, 3], AlleleMode::Standard);
        let mut m = callback(|_| Ok(1), 1.0).with_subpops(vec![SubPopId::new(1)]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(m.apply(&mut pop, &mut rng).unwrap(), 6);
        for ind in 0..5 {
            let expected = u8::from(ind >= 2);
            assert_eq!(pop.genotype(ind), &[expected, expected]);
        }
    }

    #[test]
    fn test_subpop_out_of_range_before_any_change() {
        let mut pop = population(1, vec![1], vec![2], AlleleMode::Standard);
        let mut m =
            callback(|_| Ok(1), 1.0).with_subpops(vec![SubPopId::new(0), SubPopId::new(3)]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(
            m.apply(&mut pop, &mut rng),
            Err(MutationError::SubPopOutOfRange {
                subpop: 3,
                num_subpops: 1
            })
        );
        assert!(pop.genotypes().as_slice().iter().all(|&a| a == 0));
    }

    #[test]
    fn test_empty_subpop_skipped() {
        let mut pop = population(2, vec![2], vec![0, 2], AlleleMode::Standard);
        let mut m = callback(|_| Ok(3), 1.0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(m.apply(&mut pop, &mut rng).unwrap(), 8);
    }

    #[test]
    fn test_virtual_subpop_restricts_and_deactivates() {
        let mut pop = population(1, vec![1], vec![4], AlleleMode::Standard)
            .with_splitter(VirtualSplitter::Range(vec![0..1, 1..4]))
            .unwrap();
        let mut m =
            callback(|_| Ok(1), 1.0).with_subpops(vec![SubPopId::virtual_subpop(0, 1)]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(m.apply(&mut pop, &mut rng).unwrap(), 3);
        assert_eq!(pop.genotypes().as_slice(), &[0, 1, 1, 1]);
        assert_eq!(pop.active_virtual_subpop(), None);
    }

    #[test]
    fn test_virtual_subpop_deactivated_after_error() {
        let mut pop = population(1, vec![1], vec![4], AlleleMode::Standard)
            .with_splitter(VirtualSplitter::Proportion(vec![0.5, 0.5]))
            .unwrap();
        let mut m = callback(|_| Err("failed".into()), 1.0)
            .with_subpops(vec![SubPopId::virtual_subpop(0, 0)]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(
            m.apply(&mut pop, &mut rng),
            Err(MutationError::Callback("failed".into()))
        );
        assert_eq!(pop.active_virtual_subpop(), None);
    }

    #[test]
    fn test_context_passed_to_callback() {
        // alleles 0..4 on one haploid chromosome
        let structure = GenomeStructure::new(1, vec![4]).unwrap();
        let mut pop =
            Population::from_genotypes("ctx", structure, vec![1], AlleleMode::Standard, vec![0, 1, 2, 3])
                .unwrap();
        let model = MutationModel::Callback(CallbackModel::from(ContextFn::new(|_, ctx| {
            Ok(ctx.iter().filter(|&&v| v >= 0).sum::<i64>())
        })));
        let mut m = Mutator::new(model, vec![1.0])
            .unwrap()
            .with_loci(vec![0, 3])
            .with_context_half_width(1)
            .unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        m.apply(&mut pop, &mut rng).unwrap();
        // locus 0 sees [-1, 1], locus 3 sees [2, -1]
        assert_eq!(pop.genotypes().as_slice(), &[1, 1, 2, 2]);
    }

    #[test]
    fn test_context_mutator_dispatch() {
        // haploid, 3 loci per individual, middle locus sees [left, right]
        let structure = GenomeStructure::new(1, vec![3]).unwrap();
        let mut pop = Population::from_genotypes(
            "ctx",
            structure,
            vec![2],
            AlleleMode::Standard,
            vec![0, 5, 0, 1, 5, 1],
        )
        .unwrap();
        let children = vec![callback(|_| Ok(10), 1.0), callback(|_| Ok(20), 1.0)];
        let model = ContextModel::new(children, vec![vec![0, 0]]).unwrap();
        let mut m = Mutator::new(MutationModel::Context(model), vec![1.0])
            .unwrap()
            .with_loci(vec![1]);
        assert_eq!(m.context_half_width(), 1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        m.apply(&mut pop, &mut rng).unwrap();
        assert_eq!(pop.allele(0, 0, 1), 10);
        assert_eq!(pop.allele(1, 0, 1), 20);
    }

    #[test]
    fn test_context_half_width_mismatch() {
        let children = vec![callback(|_| Ok(1), 1.0)];
        let model = ContextModel::new(children, vec![vec![0, 0]]).unwrap();
        let m = Mutator::new(MutationModel::Context(model), vec![1.0]).unwrap();
        assert_eq!(
            m.with_context_half_width(2).unwrap_err(),
            MutationError::ContextLength {
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn test_inconsistent_pattern_lengths() {
        let children = vec![callback(|_| Ok(1), 1.0), callback(|_| Ok(2), 1.0)];
        let model = ContextModel::new(children, vec![vec![0, 0], vec![1, 1, 1, 1]]).unwrap();
        assert!(matches!(
            Mutator::new(MutationModel::Context(model), vec![1.0]),
            Err(MutationError::ContextLength { .. })
        ));
    }

    #[test]
    fn test_apply_frequency() {
        let mut pop = population(2, vec![10], vec![500], AlleleMode::Standard);
        let mut m = callback(|_| Ok(1), 0.05);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let events = m.apply(&mut pop, &mut rng).unwrap();
        // 10_000 trials at 5%
        assert!((400..600).contains(&events), "events {events}");
        let mutated = pop.genotypes().as_slice().iter().filter(|&&a| a == 1).count();
        assert_eq!(mutated, events);
    }
}
