//! Allele mutation models.
//!
//! A mutation model answers a single question: given that a mutation event
//! happens at an allele, what does the allele become? Deciding *whether* an
//! event happens is the job of the [`Mutator`] that owns the model, which runs
//! one Bernoulli trial per chromosome copy and locus.
//!
//! ## Models
//! - [`MatrixModel`]: transitions between a finite set of states drawn from a
//!   row of a transition-intensity matrix.
//! - [`KAlleleModel`]: the K-allele model, where a mutated allele becomes any of
//!   the other `k - 1` states with equal probability.
//! - [`StepwiseModel`]: the stepwise mutation model used for microsatellites.
//!   The allele performs a random walk, going up with probability `inc_prob`
//!   and down otherwise, clamped to `[0, max_allele]`.
//! - [`CallbackModel`]: the new allele is computed by a user function, which may
//!   look at the surrounding alleles.
//! - [`MixtureModel`]: each event is handed to one of several mutators, chosen
//!   with fixed weights.
//! - [`ContextModel`]: each event is handed to the mutator whose context pattern
//!   matches the alleles around the locus.
//!
//! The composite models own complete [`Mutator`]s so that every child keeps
//! its own loci and rates. A child that is picked for an event runs a second
//! Bernoulli trial at its own rate for that locus before mutating, so the
//! effective rate of a child is the parent rate times the child rate.

use super::callback::{AlleleFn, ContextFn};
use super::mutator::Mutator;
use crate::base::{Allele, AlleleMode, MAX_ALLELE};
use crate::errors::MutationError;
use crate::simulation::Population;
use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Geometric};

/// Where a mutation happens, as seen by a model.
#[derive(Debug, Clone, Copy)]
pub struct MutationSite<'a> {
    pub locus: usize,
    /// Alleles surrounding the locus, empty if the mutator reads no context.
    pub context: &'a [i64],
    pub mode: AlleleMode,
}

impl<'a> MutationSite<'a> {
    pub fn new(locus: usize, context: &'a [i64], mode: AlleleMode) -> Self {
        Self {
            locus,
            context,
            mode,
        }
    }
}

/// The closed set of mutation models.
#[derive(Debug, Clone)]
pub enum MutationModel {
    Matrix(MatrixModel),
    RandomAllele(KAlleleModel),
    Stepwise(StepwiseModel),
    Callback(CallbackModel),
    Mixture(MixtureModel),
    Context(ContextModel),
}

impl MutationModel {
    /// Compute the mutated value of `allele`.
    ///
    /// # Errors
    /// Returns an error if the allele cannot be handled by the model, a
    /// callback fails, or a context model finds no applicable child.
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        allele: Allele,
        site: &MutationSite<'_>,
        rng: &mut R,
    ) -> Result<Allele, MutationError> {
        match self {
            Self::Matrix(m) => m.mutate(allele, rng),
            Self::RandomAllele(m) => m.mutate(allele, site.mode, rng),
            Self::Stepwise(m) => m.mutate(allele, site.mode, rng),
            Self::Callback(m) => m.mutate(allele, site),
            Self::Mixture(m) => m.mutate(allele, site, rng),
            Self::Context(m) => m.mutate(allele, site, rng),
        }
    }

    /// Rate vector imposed by the model itself, overriding any rate given to
    /// the owning mutator.
    pub fn fixed_rates(&self) -> Option<Vec<f64>> {
        match self {
            Self::Matrix(m) => Some(vec![m.mu()]),
            _ => None,
        }
    }

    /// Bind the children of a composite model to `pop`.
    pub(crate) fn initialize(&mut self, pop: &Population) -> Result<(), MutationError> {
        let children = match self {
            Self::Mixture(m) => &mut m.children,
            Self::Context(m) => &mut m.children,
            _ => return Ok(()),
        };
        children.iter_mut().try_for_each(|child| child.initialize(pop))
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Matrix(_) => "matrix",
            Self::RandomAllele(_) => "k_allele",
            Self::Stepwise(_) => "stepwise",
            Self::Callback(_) => "callback",
            Self::Mixture(_) => "mixture",
            Self::Context(_) => "context",
        }
    }
}

/// Mutation between `n` states following a transition-intensity matrix.
///
/// Entry `(i, j)` of the matrix is the probability that state `i` mutates to
/// state `j` per generation; diagonal entries are ignored. The largest
/// off-diagonal row sum `μ` becomes the mutation rate of the owning mutator,
/// and once a mutation event happens state `i` moves to `j ≠ i` with
/// probability `(i, j) / μ` and stays with probability `1 - rowsum(i) / μ`.
/// Over a generation this reproduces the matrix exactly.
#[derive(Debug, Clone)]
pub struct MatrixModel {
    mu: f64,
    /// Conditional transition probabilities given a mutation event.
    rows: Vec<Vec<f64>>,
    /// One sampler per row, empty when `mu == 0`.
    samplers: Vec<WeightedIndex<f64>>,
}

impl MatrixModel {
    /// Build the model from an `n × n` intensity matrix.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The matrix is not square
    /// - It has more states than can be stored in an allele
    /// - An off-diagonal entry is outside [0, 1]
    /// - An off-diagonal row sum exceeds 1
    pub fn new(matrix: Vec<Vec<f64>>) -> Result<Self, MutationError> {
        let n = matrix.len();
        if n > MAX_ALLELE as usize + 1 {
            return Err(MutationError::InvalidParameter(format!(
                "mutation matrix has {n} states, at most {} are allowed",
                MAX_ALLELE + 1
            )));
        }

        let mut row_sums = Vec::with_capacity(n);
        for (i, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(MutationError::NonSquareMatrix {
                    row: i,
                    len: row.len(),
                    expected: n,
                });
            }
            let mut sum = 0.0;
            for (j, &p) in row.iter().enumerate() {
                if i == j {
                    continue;
                }
                if !(0.0..=1.0).contains(&p) {
                    return Err(MutationError::InvalidProbability {
                        name: "mutation matrix entry",
                        value: p,
                    });
                }
                sum += p;
            }
            if sum > 1.0 + 1e-9 {
                return Err(MutationError::InvalidMutationRate(sum));
            }
            row_sums.push(sum);
        }

        let mu = row_sums.iter().copied().fold(0.0f64, f64::max);
        if mu == 0.0 {
            let rows = (0..n)
                .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
                .collect();
            return Ok(Self {
                mu,
                rows,
                samplers: Vec::new(),
            });
        }

        let rows: Vec<Vec<f64>> = matrix
            .iter()
            .zip(&row_sums)
            .enumerate()
            .map(|(i, (row, &sum))| {
                row.iter()
                    .enumerate()
                    .map(|(j, &p)| {
                        if i == j {
                            // rounding can push this slightly below zero
                            (1.0 - sum / mu).max(0.0)
                        } else {
                            p / mu
                        }
                    })
                    .collect()
            })
            .collect();
        let samplers = rows
            .iter()
            .map(|row| {
                WeightedIndex::new(row).map_err(|e| MutationError::InvalidWeights(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { mu, rows, samplers })
    }

    /// Largest off-diagonal row sum of the matrix.
    #[inline]
    pub fn mu(&self) -> f64 {
        self.mu
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.rows.len()
    }

    /// Distribution of the new state of an allele in state `state`, given
    /// that a mutation event happens.
    pub fn row_probabilities(&self, state: usize) -> &[f64] {
        &self.rows[state]
    }

    pub fn mutate<R: Rng + ?Sized>(&self, allele: Allele, rng: &mut R) -> Result<Allele, MutationError> {
        let state = allele as usize;
        if state >= self.num_states() {
            return Err(MutationError::AlleleOutOfRange {
                allele: i64::from(allele),
                max: self.num_states().saturating_sub(1) as u32,
            });
        }
        match self.samplers.get(state) {
            // at most MAX_ALLELE + 1 states, so every index fits
            Some(sampler) => Ok(sampler.sample(rng) as Allele),
            None => Ok(allele),
        }
    }
}

/// K-allele model: a mutated allele takes any of the other `k - 1` states with
/// equal probability. In binary mode the allele is flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KAlleleModel {
    k: u32,
}

impl KAlleleModel {
    /// # Errors
    /// Returns an error unless `2 <= k <= MAX_ALLELE + 1`.
    pub fn new(k: u32) -> Result<Self, MutationError> {
        if !(2..=MAX_ALLELE + 1).contains(&k) {
            return Err(MutationError::InvalidParameter(format!(
                "number of allelic states must be between 2 and {}, got {k}",
                MAX_ALLELE + 1
            )));
        }
        Ok(Self { k })
    }

    #[inline]
    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn mutate<R: Rng + ?Sized>(
        &self,
        allele: Allele,
        mode: AlleleMode,
        rng: &mut R,
    ) -> Result<Allele, MutationError> {
        if mode.is_binary() {
            return Ok(allele ^ 1);
        }
        let current = u32::from(allele);
        if current >= self.k {
            return Err(MutationError::AlleleOutOfRange {
                allele: i64::from(allele),
                max: self.k - 1,
            });
        }
        // draw among k - 1 states and skip over the current one
        let draw = rng.random_range(0..self.k - 1);
        let new = if draw >= current { draw + 1 } else { draw };
        Ok(new as Allele)
    }
}

impl Default for KAlleleModel {
    fn default() -> Self {
        Self { k: MAX_ALLELE + 1 }
    }
}

/// Size of a stepwise mutation.
#[derive(Debug, Clone)]
pub enum MutationStep {
    /// Always the same number of steps.
    Fixed(u32),
    /// Number of trials until the first success with success probability `p`,
    /// so the step is at least 1 and its mean is `1 / p`.
    Geometric(f64),
    /// Computed from the current allele by a user function.
    Callback(AlleleFn),
}

impl Default for MutationStep {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

/// Stepwise mutation model (random walk on allele values).
#[derive(Debug, Clone)]
pub struct StepwiseModel {
    inc_prob: f64,
    max_allele: u32,
    step: MutationStep,
    /// Cached distribution for `MutationStep::Geometric`.
    geometric: Option<Geometric>,
}

impl StepwiseModel {
    /// Create a stepwise model.
    ///
    /// A `max_allele` of 0 means the largest representable allele.
    ///
    /// # Errors
    /// Returns an error if `inc_prob` is outside [0, 1], `max_allele` exceeds
    /// `MAX_ALLELE`, or a geometric step parameter is outside (0, 1].
    pub fn new(inc_prob: f64, max_allele: u32, step: MutationStep) -> Result<Self, MutationError> {
        if !(0.0..=1.0).contains(&inc_prob) {
            return Err(MutationError::InvalidProbability {
                name: "inc_prob",
                value: inc_prob,
            });
        }
        if max_allele > MAX_ALLELE {
            return Err(MutationError::AlleleOutOfRange {
                allele: i64::from(max_allele),
                max: MAX_ALLELE,
            });
        }
        let geometric = match step {
            MutationStep::Geometric(p) => {
                if !(p > 0.0 && p <= 1.0) {
                    return Err(MutationError::InvalidProbability {
                        name: "geometric step",
                        value: p,
                    });
                }
                Some(Geometric::new(p).map_err(|e| MutationError::InvalidStep(e.to_string()))?)
            }
            _ => None,
        };
        Ok(Self {
            inc_prob,
            max_allele: if max_allele == 0 { MAX_ALLELE } else { max_allele },
            step,
            geometric,
        })
    }

    #[inline]
    pub fn inc_prob(&self) -> f64 {
        self.inc_prob
    }

    #[inline]
    pub fn max_allele(&self) -> u32 {
        self.max_allele
    }

    pub fn step(&self) -> &MutationStep {
        &self.step
    }

    fn draw_step<R: Rng + ?Sized>(&self, allele: Allele, rng: &mut R) -> Result<u32, MutationError> {
        match (&self.step, &self.geometric) {
            (MutationStep::Fixed(step), _) => Ok(*step),
            (MutationStep::Geometric(_), Some(geo)) => {
                let failures = geo.sample(rng);
                Ok(u32::try_from(failures.saturating_add(1)).unwrap_or(u32::MAX))
            }
            (MutationStep::Geometric(p), None) => Err(MutationError::InvalidStep(format!(
                "geometric step with p = {p} was not validated"
            ))),
            (MutationStep::Callback(f), _) => {
                let step = f.call(i64::from(allele))?;
                if step < 0 {
                    return Err(MutationError::InvalidStep(format!(
                        "step function returned {step} for allele {allele}"
                    )));
                }
                Ok(u32::try_from(step).unwrap_or(u32::MAX))
            }
        }
    }

    pub fn mutate<R: Rng + ?Sized>(
        &self,
        allele: Allele,
        mode: AlleleMode,
        rng: &mut R,
    ) -> Result<Allele, MutationError> {
        let step = self.draw_step(allele, rng)?;
        let increase = rng.random::<f64>() < self.inc_prob;
        if mode.is_binary() {
            return Ok(Allele::from(increase));
        }
        let current = u32::from(allele);
        let new = if increase {
            current.saturating_add(step).min(self.max_allele)
        } else {
            current.saturating_sub(step)
        };
        Ok(new as Allele)
    }
}

/// Mutation computed by a user function.
#[derive(Debug, Clone)]
pub enum CallbackModel {
    /// Called with the current allele.
    Allele(AlleleFn),
    /// Called with the current allele and its context window.
    Context(ContextFn),
}

impl CallbackModel {
    pub fn mutate(&self, allele: Allele, site: &MutationSite<'_>) -> Result<Allele, MutationError> {
        let value = match self {
            Self::Allele(f) => f.call(i64::from(allele))?,
            Self::Context(f) => f.call(i64::from(allele), site.context)?,
        };
        site.mode
            .to_allele(value)
            .map_err(|(allele, max)| MutationError::AlleleOutOfRange { allele, max })
    }
}

impl From<AlleleFn> for CallbackModel {
    fn from(f: AlleleFn) -> Self {
        Self::Allele(f)
    }
}

impl From<ContextFn> for CallbackModel {
    fn from(f: ContextFn) -> Self {
        Self::Context(f)
    }
}

/// Hands each mutation event to one of several mutators chosen by weight.
#[derive(Debug, Clone)]
pub struct MixtureModel {
    children: Vec<Mutator>,
    weights: Vec<f64>,
    sampler: WeightedIndex<f64>,
}

impl MixtureModel {
    /// # Errors
    /// Returns an error unless there is one finite, non-negative weight per
    /// child and at least one weight is positive.
    pub fn new(children: Vec<Mutator>, weights: Vec<f64>) -> Result<Self, MutationError> {
        if weights.len() != children.len() {
            return Err(MutationError::InvalidWeights(format!(
                "{} weights given for {} mutators",
                weights.len(),
                children.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(MutationError::InvalidWeights(format!(
                "weight {w} is not a finite non-negative number"
            )));
        }
        let sampler =
            WeightedIndex::new(&weights).map_err(|e| MutationError::InvalidWeights(e.to_string()))?;
        Ok(Self {
            children,
            weights,
            sampler,
        })
    }

    pub fn children(&self) -> &[Mutator] {
        &self.children
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn mutate<R: Rng + ?Sized>(
        &self,
        allele: Allele,
        site: &MutationSite<'_>,
        rng: &mut R,
    ) -> Result<Allele, MutationError> {
        let child = &self.children[self.sampler.sample(rng)];
        let rate = child.mut_rate(site.locus);
        if rate == 1.0 || rng.random::<f64>() < rate {
            child.model().mutate(allele, site, rng)
        } else {
            Ok(allele)
        }
    }
}

/// Hands each mutation event to the mutator whose pattern matches the
/// alleles around the locus.
///
/// Patterns are compared in order against the context window and the first
/// exact match wins. With one more mutator than patterns, the last mutator
/// handles every unmatched context.
#[derive(Debug, Clone)]
pub struct ContextModel {
    children: Vec<Mutator>,
    patterns: Vec<Vec<i64>>,
}

impl ContextModel {
    /// # Errors
    /// Returns an error if there are no mutators, or if the number of
    /// patterns is neither the number of mutators nor one less.
    pub fn new(children: Vec<Mutator>, patterns: Vec<Vec<i64>>) -> Result<Self, MutationError> {
        if children.is_empty() {
            return Err(MutationError::InvalidParameter(
                "context model needs at least one mutator".into(),
            ));
        }
        if patterns.len() != children.len() && patterns.len() + 1 != children.len() {
            return Err(MutationError::ContextPatternMismatch {
                patterns: patterns.len(),
                models: children.len(),
            });
        }
        Ok(Self { children, patterns })
    }

    pub fn children(&self) -> &[Mutator] {
        &self.children
    }

    pub fn patterns(&self) -> &[Vec<i64>] {
        &self.patterns
    }

    /// Whether the last mutator handles unmatched contexts.
    #[inline]
    pub fn has_default(&self) -> bool {
        self.patterns.len() + 1 == self.children.len()
    }

    /// Half width implied by the patterns.
    pub fn half_width(&self) -> usize {
        self.patterns.first().map_or(0, |p| p.len() / 2)
    }

    /// Check that every pattern has the length of a window of `half_width`.
    pub fn check_window(&self, half_width: usize) -> Result<(), MutationError> {
        let expected = 2 * half_width;
        match self.patterns.iter().find(|p| p.len() != expected) {
            Some(p) => Err(MutationError::ContextLength {
                expected,
                found: p.len(),
            }),
            None => Ok(()),
        }
    }

    pub fn mutate<R: Rng + ?Sized>(
        &self,
        allele: Allele,
        site: &MutationSite<'_>,
        rng: &mut R,
    ) -> Result<Allele, MutationError> {
        let idx = match self.patterns.iter().position(|p| p.as_slice() == site.context) {
            Some(idx) => idx,
            None if self.has_default() => self.patterns.len(),
            None => return Err(MutationError::NoMatchingContext(site.context.to_vec())),
        };
        let child = &self.children[idx];
        if rng.random::<f64>() < child.mut_rate(site.locus) {
            child.model().mutate(allele, site, rng)
        } else {
            Ok(allele)
        }
    }
}
