//! Batched Bernoulli trials.
//!
//! A mutation operator runs one Bernoulli trial for every (individual × ploidy)
//! slot of every locus it covers. With realistic mutation rates almost all of
//! these trials fail, so instead of testing each slot we only produce the
//! positions of the successes.
//!
//! Each locus gets its own stream of `trial_size` independent trials. Low-rate
//! streams are generated by geometric gap skipping: the distance to the next
//! success follows a Geometric(p) distribution, so the cost is proportional to
//! the number of successes. High-rate streams are cheaper to draw slot by slot
//! into a bit set, since most slots succeed anyway.

use crate::errors::MutationError;
use bitvec::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Geometric};

/// Rates at or below this value are drawn by geometric gap skipping.
pub const SPARSE_THRESHOLD: f64 = 0.1;

/// How a single stream is drawn, fixed by its probability.
#[derive(Debug, Clone)]
enum Stream {
    Never,
    Always,
    Sparse(Geometric),
    Dense(f64),
}

impl Stream {
    fn new(prob: f64) -> Result<Self, MutationError> {
        if !(0.0..=1.0).contains(&prob) {
            return Err(MutationError::InvalidMutationRate(prob));
        }
        Ok(if prob == 0.0 {
            Self::Never
        } else if prob == 1.0 {
            Self::Always
        } else if prob <= SPARSE_THRESHOLD {
            let geo = Geometric::new(prob).map_err(|_| MutationError::InvalidMutationRate(prob))?;
            Self::Sparse(geo)
        } else {
            Self::Dense(prob)
        })
    }

    fn draw<R: Rng + ?Sized>(&self, trial_size: usize, rng: &mut R) -> Outcome {
        if trial_size == 0 {
            return Outcome::Never;
        }
        match self {
            Self::Never => Outcome::Never,
            Self::Always => Outcome::Always,
            Self::Sparse(geo) => {
                let n = trial_size as u64;
                let mut positions = Vec::new();
                // number of failures before the first success
                let mut pos = geo.sample(rng);
                while pos < n {
                    positions.push(pos as usize);
                    pos = pos.saturating_add(1).saturating_add(geo.sample(rng));
                }
                Outcome::Sparse(positions)
            }
            Self::Dense(prob) => {
                let mut bits = bitvec![u64, Lsb0; 0; trial_size];
                for i in 0..trial_size {
                    if rng.random::<f64>() < *prob {
                        bits.set(i, true);
                    }
                }
                Outcome::Dense(bits)
            }
        }
    }
}

/// Result of one draw of a stream.
#[derive(Debug, Clone)]
enum Outcome {
    Never,
    Always,
    /// Sorted success positions.
    Sparse(Vec<usize>),
    Dense(BitVec<u64, Lsb0>),
}

/// Independent Bernoulli trial streams, one per locus.
///
/// Call [`set_parameter`](Self::set_parameter) to configure the streams,
/// [`do_trial`](Self::do_trial) to draw a batch, then enumerate the succeeding
/// trial positions of a stream with [`successes`](Self::successes) or the
/// [`trial_first_succ`](Self::trial_first_succ) /
/// [`trial_next_succ`](Self::trial_next_succ) pair.
#[derive(Debug, Clone, Default)]
pub struct BernoulliTrials {
    probs: Vec<f64>,
    streams: Vec<Stream>,
    trial_size: usize,
    /// Outcomes of the last `do_trial`, empty before the first draw.
    outcomes: Vec<Outcome>,
}

impl BernoulliTrials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure one stream per probability, each with `trial_size` trials.
    /// Outcomes of a previous draw are discarded.
    ///
    /// # Errors
    /// Returns an error if any probability is outside [0, 1].
    pub fn set_parameter(&mut self, probs: &[f64], trial_size: usize) -> Result<(), MutationError> {
        self.streams = probs
            .iter()
            .map(|&p| Stream::new(p))
            .collect::<Result<_, _>>()?;
        self.probs = probs.to_vec();
        self.trial_size = trial_size;
        self.outcomes.clear();
        Ok(())
    }

    /// Number of trials per stream.
    #[inline]
    pub fn trial_size(&self) -> usize {
        self.trial_size
    }

    /// Number of streams.
    #[inline]
    pub fn num_streams(&self) -> usize {
        self.probs.len()
    }

    /// Success probability of a stream.
    #[inline]
    pub fn prob(&self, idx: usize) -> f64 {
        self.probs[idx]
    }

    /// Draw a fresh batch of outcomes for every stream.
    pub fn do_trial<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let trial_size = self.trial_size;
        self.outcomes = self
            .streams
            .iter()
            .map(|stream| stream.draw(trial_size, rng))
            .collect();
    }

    /// First succeeding trial of stream `idx`, or `None` if no trial
    /// succeeded (or nothing has been drawn yet).
    pub fn trial_first_succ(&self, idx: usize) -> Option<usize> {
        match self.outcomes.get(idx)? {
            Outcome::Never => None,
            Outcome::Always => (self.trial_size > 0).then_some(0),
            Outcome::Sparse(positions) => positions.first().copied(),
            Outcome::Dense(bits) => bits.first_one(),
        }
    }

    /// First succeeding trial of stream `idx` after position `pos`.
    pub fn trial_next_succ(&self, idx: usize, pos: usize) -> Option<usize> {
        let next = pos + 1;
        if next >= self.trial_size {
            return None;
        }
        match self.outcomes.get(idx)? {
            Outcome::Never => None,
            Outcome::Always => Some(next),
            Outcome::Sparse(positions) => {
                let i = positions.partition_point(|&p| p <= pos);
                positions.get(i).copied()
            }
            Outcome::Dense(bits) => bits[next..].first_one().map(|offset| next + offset),
        }
    }

    /// Succeeding trial positions of stream `idx` in ascending order.
    pub fn successes(&self, idx: usize) -> Successes<'_> {
        match self.outcomes.get(idx) {
            None | Some(Outcome::Never) => Successes::Empty,
            Some(Outcome::Always) => Successes::All(0..self.trial_size),
            Some(Outcome::Sparse(positions)) => Successes::Listed(positions.iter()),
            Some(Outcome::Dense(bits)) => Successes::Bits(bits.iter_ones()),
        }
    }

    /// Number of succeeding trials of stream `idx` in the last draw.
    pub fn succ_count(&self, idx: usize) -> usize {
        match self.outcomes.get(idx) {
            None | Some(Outcome::Never) => 0,
            Some(Outcome::Always) => self.trial_size,
            Some(Outcome::Sparse(positions)) => positions.len(),
            Some(Outcome::Dense(bits)) => bits.count_ones(),
        }
    }
}

/// Iterator over the succeeding trial positions of one stream.
#[derive(Debug)]
pub enum Successes<'a> {
    Empty,
    All(std::ops::Range<usize>),
    Listed(std::slice::Iter<'a, usize>),
    Bits(bitvec::slice::IterOnes<'a, u64, Lsb0>),
}

impl Iterator for Successes<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::All(range) => range.next(),
            Self::Listed(iter) => iter.next().copied(),
            Self::Bits(iter) => iter.next(),
        }
    }
}
