//! Simulation configuration.
//!
//! A [`Configuration`] describes a population and the mutation operators to
//! apply to it. It can be loaded from a JSON file to reproduce a run.

use crate::base::{Allele, AlleleMode, MAX_ALLELE};
use crate::errors::{ConfigError, MutationError, PopulationError};
use crate::evolution::{
    ContextModel, KAlleleModel, MatrixModel, MixtureModel, MutationModel, MutationOperator,
    MutationStep, Mutator, PointMutator, StepwiseModel, ValueMap,
};
use crate::genome::GenomeStructure;
use crate::simulation::{Population, SubPopId, VirtualSplitter};
use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The master configuration struct.
/// Can be deserialized from a file to fully reproduce a simulation setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub execution: ExecutionConfig,
    pub population: PopulationConfig,
    /// Operators, applied in order every generation.
    #[serde(default)]
    pub mutators: Vec<MutatorConfig>,
}

/// High-level run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Number of generations to simulate
    pub generations: usize,
    /// Optional RNG seed for reproducibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ExecutionConfig {
    pub fn new(generations: usize, seed: Option<u64>) -> Self {
        Self { generations, seed }
    }
}

/// Genome layout, size and initial state of the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    #[serde(default = "default_ploidy")]
    pub ploidy: usize,
    pub loci_per_chromosome: Vec<usize>,
    pub subpop_sizes: Vec<usize>,
    #[serde(default)]
    pub allele_mode: AlleleMode,
    #[serde(default)]
    pub initial: InitialAlleles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splitter: Option<VirtualSplitter>,
}

fn default_ploidy() -> usize {
    2
}

/// How alleles are set when the population is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialAlleles {
    /// Every allele takes this value.
    Fixed(Allele),
    /// Every allele is drawn independently; entry `a` is the weight of allele `a`.
    Frequencies(Vec<f64>),
}

impl Default for InitialAlleles {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

impl PopulationConfig {
    /// Build the population described by this configuration.
    ///
    /// # Errors
    /// Returns an error if the genome layout, initial alleles or splitter are
    /// invalid.
    pub fn build<R: Rng + ?Sized>(
        &self,
        id: &str,
        rng: &mut R,
    ) -> Result<Population, PopulationError> {
        let structure = GenomeStructure::new(self.ploidy, self.loci_per_chromosome.clone())?;
        let mut pop = Population::new(id, structure, self.subpop_sizes.clone(), self.allele_mode);
        let max = self.allele_mode.max_allele();

        match &self.initial {
            InitialAlleles::Fixed(allele) => {
                if u32::from(*allele) > max {
                    return Err(PopulationError::AlleleOutOfRange {
                        allele: i64::from(*allele),
                        max,
                    });
                }
                pop.genotypes_mut().as_mut_slice().fill(*allele);
            }
            InitialAlleles::Frequencies(freqs) => {
                if freqs.len() > max as usize + 1 {
                    return Err(PopulationError::InvalidFrequencies(format!(
                        "{} frequencies given but alleles only go up to {max}",
                        freqs.len()
                    )));
                }
                let dist = WeightedIndex::new(freqs)
                    .map_err(|e| PopulationError::InvalidFrequencies(e.to_string()))?;
                for allele in pop.genotypes_mut().as_mut_slice() {
                    *allele = dist.sample(rng) as Allele;
                }
            }
        }

        match &self.splitter {
            Some(splitter) => pop.with_splitter(splitter.clone()),
            None => Ok(pop),
        }
    }
}

/// Size of the steps taken by a stepwise mutator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepConfig {
    Fixed(u32),
    /// Geometric step with the given success probability.
    Geometric(f64),
}

impl Default for StepConfig {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

impl From<StepConfig> for MutationStep {
    fn from(step: StepConfig) -> Self {
        match step {
            StepConfig::Fixed(n) => Self::Fixed(n),
            StepConfig::Geometric(p) => Self::Geometric(p),
        }
    }
}

/// Model-specific part of a mutator description, tagged by `model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelConfig {
    KAllele {
        #[serde(default = "default_k")]
        k: u32,
    },
    Stepwise {
        #[serde(default = "default_inc_prob")]
        inc_prob: f64,
        /// 0 means the largest representable allele.
        #[serde(default)]
        max_allele: u32,
        #[serde(default)]
        step: StepConfig,
    },
    /// Mutation rate is taken from the matrix; `rates` is ignored.
    Matrix { matrix: Vec<Vec<f64>> },
    Mixture {
        mutators: Vec<MutatorConfig>,
        weights: Vec<f64>,
    },
    Context {
        mutators: Vec<MutatorConfig>,
        patterns: Vec<Vec<i64>>,
    },
    /// Deterministic assignment; `rates`, remapping and `subpops` are ignored.
    Point {
        inds: Vec<usize>,
        allele: Allele,
        #[serde(default = "default_point_ploidy")]
        ploidy: Vec<usize>,
    },
}

fn default_k() -> u32 {
    MAX_ALLELE + 1
}

fn default_inc_prob() -> f64 {
    0.5
}

fn default_point_ploidy() -> Vec<usize> {
    vec![0]
}

/// Description of one mutation operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutatorConfig {
    #[serde(flatten)]
    pub model: ModelConfig,
    /// Loci to mutate; empty means every locus.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loci: Vec<usize>,
    /// One rate per locus, or a single rate for all loci.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rates: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_in: Option<Vec<Allele>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_out: Option<Vec<Allele>>,
    /// Target (virtual) subpopulations; empty means every subpopulation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subpops: Vec<SubPopId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_half_width: Option<usize>,
}

impl MutatorConfig {
    /// Describe a mutator with the given model and rates.
    pub fn new(model: ModelConfig, rates: Vec<f64>) -> Self {
        Self {
            model,
            loci: Vec::new(),
            rates,
            map_in: None,
            map_out: None,
            subpops: Vec::new(),
            context_half_width: None,
        }
    }

    /// Build the operator.
    pub fn build(&self) -> Result<MutationOperator, MutationError> {
        match &self.model {
            ModelConfig::Point {
                inds,
                allele,
                ploidy,
            } => {
                if self.loci.is_empty() {
                    return Err(MutationError::InvalidParameter(
                        "point mutator needs explicit loci".into(),
                    ));
                }
                Ok(PointMutator::new(self.loci.clone(), inds.clone(), *allele)
                    .with_ploidy(ploidy.clone())
                    .into())
            }
            _ => self.build_mutator().map(MutationOperator::from),
        }
    }

    /// Build a stochastic mutator, as used for the children of composite
    /// models.
    pub fn build_mutator(&self) -> Result<Mutator, MutationError> {
        let model = match &self.model {
            ModelConfig::KAllele { k } => MutationModel::RandomAllele(KAlleleModel::new(*k)?),
            ModelConfig::Stepwise {
                inc_prob,
                max_allele,
                step,
            } => MutationModel::Stepwise(StepwiseModel::new(
                *inc_prob,
                *max_allele,
                (*step).into(),
            )?),
            ModelConfig::Matrix { matrix } => MutationModel::Matrix(MatrixModel::new(matrix.clone())?),
            ModelConfig::Mixture { mutators, weights } => {
                let children = build_children(mutators)?;
                MutationModel::Mixture(MixtureModel::new(children, weights.clone())?)
            }
            ModelConfig::Context { mutators, patterns } => {
                let children = build_children(mutators)?;
                MutationModel::Context(ContextModel::new(children, patterns.clone())?)
            }
            ModelConfig::Point { .. } => {
                return Err(MutationError::InvalidParameter(
                    "a point mutator cannot be used as a stochastic mutator".into(),
                ))
            }
        };

        let mut mutator = Mutator::new(model, self.rates.clone())?
            .with_loci(self.loci.clone())
            .with_subpops(self.subpops.clone());
        if let Some(table) = &self.map_in {
            mutator = mutator.with_map_in(ValueMap::Table(table.clone()));
        }
        if let Some(table) = &self.map_out {
            mutator = mutator.with_map_out(ValueMap::Table(table.clone()));
        }
        if let Some(half_width) = self.context_half_width {
            mutator = mutator.with_context_half_width(half_width)?;
        }
        Ok(mutator)
    }
}

fn build_children(configs: &[MutatorConfig]) -> Result<Vec<Mutator>, MutationError> {
    configs.iter().map(MutatorConfig::build_mutator).collect()
}

impl Configuration {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the initial population.
    pub fn build_population<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Population, ConfigError> {
        Ok(self.population.build("pop", rng)?)
    }

    /// Build the mutation operators in application order.
    ///
    /// # Errors
    /// Returns `MissingRequired` if no operator is configured, or the index
    /// and cause of the first operator that fails to build.
    pub fn build_operators(&self) -> Result<Vec<MutationOperator>, ConfigError> {
        if self.mutators.is_empty() {
            return Err(ConfigError::MissingRequired("mutators"));
        }
        self.mutators
            .iter()
            .enumerate()
            .map(|(i, m)| m.build().map_err(ConfigError::mutator(i)))
            .collect()
    }

    /// A small configuration exercising several models.
    pub fn example() -> Self {
        let mut stepwise = MutatorConfig::new(
            ModelConfig::Stepwise {
                inc_prob: 0.5,
                max_allele: 40,
                step: StepConfig::Geometric(0.8),
            },
            vec![0.001],
        );
        stepwise.loci = vec![0, 1, 2, 3];

        let mut k_allele = MutatorConfig::new(ModelConfig::KAllele { k: 4 }, vec![0.0005]);
        k_allele.loci = vec![4, 5, 6, 7];

        let mut context = MutatorConfig::new(
            ModelConfig::Context {
                mutators: vec![
                    MutatorConfig::new(ModelConfig::KAllele { k: 4 }, vec![1.0]),
                    MutatorConfig::new(ModelConfig::KAllele { k: 4 }, vec![0.1]),
                ],
                patterns: vec![vec![2, 2]],
            },
            vec![0.001],
        );
        context.loci = vec![5, 6];

        Self {
            execution: ExecutionConfig::new(100, Some(42)),
            population: PopulationConfig {
                ploidy: 2,
                loci_per_chromosome: vec![4, 4],
                subpop_sizes: vec![500, 500],
                allele_mode: AlleleMode::Standard,
                initial: InitialAlleles::Fixed(2),
                splitter: None,
            },
            mutators: vec![stepwise, k_allele, context],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    const MINIMAL: &str = r#"{
        "execution": { "generations": 10 },
        "population": { "loci_per_chromosome": [3], "subpop_sizes": [4] },
        "mutators": [ { "model": "k_allele", "k": 4, "rates": [0.01] } ]
    }"#;

    #[test]
    fn test_minimal_defaults() {
        let config = Configuration::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.execution, ExecutionConfig::new(10, None));
        assert_eq!(config.population.ploidy, 2);
        assert_eq!(config.population.allele_mode, AlleleMode::Standard);
        assert_eq!(config.population.initial, InitialAlleles::Fixed(0));
        assert_eq!(config.mutators[0].model, ModelConfig::KAllele { k: 4 });
    }

    #[test]
    fn test_k_defaults_to_all_alleles() {
        let json = r#"{ "model": "k_allele", "rates": [0.1] }"#;
        let m: MutatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(m.model, ModelConfig::KAllele { k: 256 });
    }

    #[test]
    fn test_example_round_trip() {
        let config = Configuration::example();
        let json = config.to_json_string().unwrap();
        let back = Configuration::from_json_str(&json).unwrap();
        assert_eq!(back.population, config.population);
        assert_eq!(back.mutators, config.mutators);
        assert_eq!(back.execution, config.execution);
        assert_eq!(back.build_operators().unwrap().len(), 3);
    }

    #[test]
    fn test_build_population_fixed() {
        let config = Configuration::example();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let pop = config.build_population(&mut rng).unwrap();
        assert_eq!(pop.size(), 1000);
        assert_eq!(pop.num_loci(), 8);
        assert!(pop.genotypes().as_slice().iter().all(|&a| a == 2));
    }

    #[test]
    fn test_example_runs() {
        let config = Configuration::example();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut pop = config.build_population(&mut rng).unwrap();
        let mut ops = config.build_operators().unwrap();
        for _ in 0..20 {
            for op in &mut ops {
                op.apply(&mut pop, &mut rng).unwrap();
            }
            pop.increment_generation();
        }
        assert_eq!(pop.generation(), 20);
        for locus in 4..8 {
            assert!(pop.allele_frequencies(locus).len() <= 4);
        }
    }

    #[test]
    fn test_build_population_frequencies() {
        let mut config = Configuration::from_json_str(MINIMAL).unwrap();
        config.population.initial = InitialAlleles::Frequencies(vec![0.0, 1.0, 1.0]);
        config.population.subpop_sizes = vec![1000];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let pop = config.build_population(&mut rng).unwrap();
        let freqs = pop.allele_frequencies(0);
        assert_eq!(freqs.len(), 3);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1] - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_build_population_errors() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut config = Configuration::from_json_str(MINIMAL).unwrap();
        config.population.allele_mode = AlleleMode::Binary;
        config.population.initial = InitialAlleles::Fixed(2);
        assert!(matches!(
            config.build_population(&mut rng),
            Err(ConfigError::Population(PopulationError::AlleleOutOfRange { .. }))
        ));

        config.population.initial = InitialAlleles::Frequencies(vec![0.5, 0.25, 0.25]);
        assert!(matches!(
            config.build_population(&mut rng),
            Err(ConfigError::Population(PopulationError::InvalidFrequencies(_)))
        ));

        config.population.ploidy = 0;
        assert!(matches!(
            config.build_population(&mut rng),
            Err(ConfigError::Population(PopulationError::ZeroPloidy))
        ));
    }

    #[test]
    fn test_build_operators_reports_index() {
        let json = r#"{
            "execution": { "generations": 1 },
            "population": { "loci_per_chromosome": [3], "subpop_sizes": [4] },
            "mutators": [
                { "model": "k_allele", "rates": [0.01] },
                { "model": "stepwise", "inc_prob": 2.0, "rates": [0.01] }
            ]
        }"#;
        let config = Configuration::from_json_str(json).unwrap();
        match config.build_operators() {
            Err(ConfigError::Mutator { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(source, MutationError::InvalidProbability { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_no_mutators() {
        let mut config = Configuration::from_json_str(MINIMAL).unwrap();
        config.mutators.clear();
        assert!(matches!(
            config.build_operators(),
            Err(ConfigError::MissingRequired("mutators"))
        ));
    }

    #[test]
    fn test_point_and_nested_models() {
        let json = r#"[
            { "model": "point", "loci": [0], "inds": [1, 2], "allele": 3, "ploidy": [0, 1] },
            { "model": "mixture", "weights": [1, 3], "rates": [0.1],
              "mutators": [
                { "model": "stepwise", "step": { "geometric": 0.5 }, "rates": [1.0] },
                { "model": "matrix", "matrix": [[0, 0.1], [0.2, 0]] }
              ] },
            { "model": "context", "rates": [0.1], "patterns": [[0, 0]],
              "mutators": [ { "model": "k_allele", "rates": [1.0] } ] }
        ]"#;
        let configs: Vec<MutatorConfig> = serde_json::from_str(json).unwrap();
        let ops: Vec<MutationOperator> = configs.iter().map(|c| c.build().unwrap()).collect();
        assert!(matches!(ops[0], MutationOperator::Point(_)));
        assert_eq!(ops[1].name(), "mixture");
        match &ops[2] {
            MutationOperator::Stochastic(m) => assert_eq!(m.context_half_width(), 1),
            other => panic!("unexpected operator {other:?}"),
        }
    }

    #[test]
    fn test_point_requires_loci() {
        let json = r#"{ "model": "point", "inds": [0], "allele": 1 }"#;
        let m: MutatorConfig = serde_json::from_str(json).unwrap();
        assert!(m.build().is_err());
    }

    #[test]
    fn test_unknown_model_rejected() {
        let json = r#"{ "model": "unknown", "rates": [0.1] }"#;
        assert!(serde_json::from_str::<MutatorConfig>(json).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = Configuration::from_json_file(&path).unwrap();
        assert_eq!(config.execution.generations, 10);

        assert!(matches!(
            Configuration::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
