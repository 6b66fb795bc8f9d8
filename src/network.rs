use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::{has_non_finite, lerp};

/// Output order of the final level.
pub const OUTPUT_COUNT: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("input vector has {actual} values, level expects {expected}")]
    InputSize { expected: usize, actual: usize },
    #[error("network must have exactly 2 levels, found {0}")]
    LevelCount(usize),
    #[error("level {index} declares {inputs}x{outputs} but stores {rows} weight rows and {biases} biases")]
    Topology {
        index: usize,
        inputs: usize,
        outputs: usize,
        rows: usize,
        biases: usize,
    },
    #[error("level {index} input {actual} does not match previous output {expected}")]
    MismatchedLevels {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("level {0} holds a non-finite parameter")]
    NonFinite(usize),
    #[error("network produced {actual} outputs, controls need {expected}")]
    OutputSize { expected: usize, actual: usize },
}

/// Connection block between two layers. `weights[i][o]` links input `i` to output `o`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl Level {
    pub fn new<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let weights = (0..inputs)
            .map(|_| (0..outputs).map(|_| rng.gen_range(-1.0..=1.0)).collect())
            .collect();
        let biases = (0..outputs).map(|_| rng.gen_range(-1.0..=1.0)).collect();

        Self {
            inputs,
            outputs,
            weights,
            biases,
        }
    }

    /// Output `o` fires (1.0) when the weighted input sum exceeds `biases[o]`.
    pub fn feed_forward(&self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.forward(0, inputs)
    }

    fn forward(&self, index: usize, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        if inputs.len() != self.inputs {
            return Err(NetworkError::InputSize {
                expected: self.inputs,
                actual: inputs.len(),
            });
        }
        // stored matrices must match the declared sizes, never zip short
        self.check_shape(index)?;

        // step activation: strictly above the bias fires
        let outputs = (0..self.outputs)
            .map(|o| {
                let sum: f64 = inputs
                    .iter()
                    .zip(&self.weights)
                    .map(|(input, row)| input * row[o])
                    .sum();
                if sum > self.biases[o] { 1.0 } else { 0.0 }
            })
            .collect();
        Ok(outputs)
    }

    fn check_shape(&self, index: usize) -> Result<(), NetworkError> {
        let shape_ok = self.weights.len() == self.inputs
            && self.weights.iter().all(|row| row.len() == self.outputs)
            && self.biases.len() == self.outputs;
        if !shape_ok {
            return Err(NetworkError::Topology {
                index,
                inputs: self.inputs,
                outputs: self.outputs,
                rows: self.weights.len(),
                biases: self.biases.len(),
            });
        }
        Ok(())
    }

    fn check(&self, index: usize) -> Result<(), NetworkError> {
        self.check_shape(index)?;
        if has_non_finite(&self.biases) || self.weights.iter().any(|row| has_non_finite(row)) {
            return Err(NetworkError::NonFinite(index));
        }
        Ok(())
    }

    fn mutate_with(&mut self, variance: f64, sample: &mut impl FnMut() -> f64) {
        for bias in &mut self.biases {
            *bias = lerp(*bias, sample(), variance);
        }
        for row in &mut self.weights {
            for weight in row {
                *weight = lerp(*weight, sample(), variance);
            }
        }
    }
}

/// Input -> hidden -> output, outputs ordered `[forward, left, right, reverse]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub levels: Vec<Level>,
}

impl Network {
    pub fn new<R: Rng + ?Sized>(inputs: usize, hidden: usize, outputs: usize, rng: &mut R) -> Self {
        Self {
            levels: vec![Level::new(inputs, hidden, rng), Level::new(hidden, outputs, rng)],
        }
    }

    pub fn input_size(&self) -> usize {
        self.levels.first().map_or(0, |l| l.inputs)
    }

    pub fn hidden_size(&self) -> usize {
        self.levels.first().map_or(0, |l| l.outputs)
    }

    pub fn output_size(&self) -> usize {
        self.levels.last().map_or(0, |l| l.outputs)
    }

    /// Well formed and with the same layer sizes, so one can stand in for
    /// (or be mutated into) the other.
    pub fn is_compatible(&self, inputs: usize, hidden: usize, outputs: usize) -> bool {
        self.validate().is_ok()
            && self.input_size() == inputs
            && self.hidden_size() == hidden
            && self.output_size() == outputs
    }

    /// Structural check for networks that did not come from [`Network::new`].
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.levels.len() != 2 {
            return Err(NetworkError::LevelCount(self.levels.len()));
        }
        for (index, level) in self.levels.iter().enumerate() {
            level.check(index)?;
        }
        let (first, second) = (&self.levels[0], &self.levels[1]);
        if second.inputs != first.outputs {
            return Err(NetworkError::MismatchedLevels {
                index: 1,
                expected: first.outputs,
                actual: second.inputs,
            });
        }
        Ok(())
    }

    pub fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let mut outputs = inputs.to_vec();
        for (index, level) in self.levels.iter().enumerate() {
            outputs = level.forward(index, &outputs)?;
        }
        Ok(outputs)
    }

    /// Pull every parameter toward a fresh uniform draw from [-1, 1].
    ///
    /// `variance` 0 leaves the network untouched, 1 replaces it outright.
    /// Values outside [0, 1] are clamped.
    pub fn mutate<R: Rng + ?Sized>(&mut self, variance: f64, rng: &mut R) {
        self.mutate_with(variance, || rng.gen_range(-1.0..=1.0));
    }

    /// [`Network::mutate`] with the fresh values supplied by `sample`.
    pub fn mutate_with(&mut self, variance: f64, mut sample: impl FnMut() -> f64) {
        // NaN counts as "no change"
        let variance = if variance.is_nan() { 0.0 } else { variance.clamp(0.0, 1.0) };
        for level in &mut self.levels {
            level.mutate_with(variance, &mut sample);
        }
    }

    /// Count of weights plus biases.
    pub fn parameter_count(&self) -> usize {
        self.levels
            .iter()
            .map(|l| l.inputs * l.outputs + l.outputs)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn level(weights: Vec<Vec<f64>>, biases: Vec<f64>) -> Level {
        Level {
            inputs: weights.len(),
            outputs: biases.len(),
            weights,
            biases,
        }
    }

    fn all_params(net: &Network) -> Vec<f64> {
        net.levels
            .iter()
            .flat_map(|l| l.weights.iter().flatten().chain(l.biases.iter()).copied())
            .collect()
    }

    #[test]
    fn fresh_network_has_requested_shape_and_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let net = Network::new(7, 9, OUTPUT_COUNT, &mut rng);
        assert!(net.is_compatible(7, 9, 4));
        assert!(!net.is_compatible(5, 9, 4));
        assert_eq!(net.parameter_count(), 7 * 9 + 9 + 9 * 4 + 4);
        net.validate().expect("valid");
        assert!(all_params(&net).iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn level_fires_only_above_bias() {
        let l = level(vec![vec![1.0, 0.5], vec![1.0, 0.5]], vec![1.0, 1.0]);
        // sums: [2.0, 1.0] against bias 1.0; equality does not fire
        assert_eq!(l.feed_forward(&[1.0, 1.0]).expect("eval"), vec![1.0, 0.0]);
        assert_eq!(l.feed_forward(&[0.0, 0.0]).expect("eval"), vec![0.0, 0.0]);
    }

    #[test]
    fn evaluate_chains_both_levels() {
        let net = Network {
            levels: vec![
                level(vec![vec![1.0, -1.0]], vec![0.5, 0.5]),
                level(
                    vec![vec![1.0, 0.0, 0.0, -1.0], vec![0.0, 1.0, 0.0, 0.0]],
                    vec![0.0, 0.0, 0.0, -0.5],
                ),
            ],
        };
        // hidden = [1, 0] -> outputs: forward on, reverse sum -1 is not > -0.5
        assert_eq!(net.evaluate(&[1.0]).expect("eval"), vec![1.0, 0.0, 0.0, 0.0]);
        // hidden = [0, 0] -> only reverse (0 > -0.5)
        assert_eq!(net.evaluate(&[0.0]).expect("eval"), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn evaluation_is_pure() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = Network::new(7, 9, 4, &mut rng);
        let input = [0.0, 0.3, 0.9, 0.0, 0.1, 0.5, 1.0];
        let first = net.evaluate(&input).expect("eval");
        for _ in 0..10 {
            assert_eq!(net.evaluate(&input).expect("eval"), first);
        }
        assert!(first.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn wrong_input_length_is_an_error() {
        let mut rng = StdRng::seed_from_u64(2);
        let net = Network::new(7, 9, 4, &mut rng);
        assert_eq!(
            net.evaluate(&[0.0; 3]),
            Err(NetworkError::InputSize {
                expected: 7,
                actual: 3
            })
        );
    }

    #[test]
    fn zero_variance_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(3);
        let original = Network::new(7, 9, 4, &mut rng);
        let mut mutated = original.clone();
        mutated.mutate(0.0, &mut rng);
        assert_eq!(mutated, original);
    }

    #[test]
    fn full_variance_replaces_every_parameter() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut net = Network::new(3, 4, 4, &mut rng);
        net.mutate_with(1.0, || 0.25);
        assert!(all_params(&net).iter().all(|&v| (v - 0.25).abs() < 1e-12));

        net.mutate(1.0, &mut rng);
        assert!(all_params(&net).iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn partial_variance_blends_with_the_sample() {
        let mut rng = StdRng::seed_from_u64(6);
        let original = Network::new(3, 4, 4, &mut rng);
        let mut mutated = original.clone();
        mutated.mutate_with(0.3, || -1.0);
        for (old, new) in all_params(&original).iter().zip(all_params(&mutated)) {
            assert_eq!(new, lerp(*old, -1.0, 0.3));
        }
    }

    #[test]
    fn variance_outside_unit_range_is_clamped() {
        let mut rng = StdRng::seed_from_u64(8);
        let original = Network::new(2, 2, 4, &mut rng);

        let mut below = original.clone();
        below.mutate_with(-3.0, || 0.9);
        assert_eq!(below, original);

        let mut above = original.clone();
        above.mutate_with(7.0, || 0.9);
        assert!(all_params(&above).iter().all(|&v| (v - 0.9).abs() < 1e-12));
    }

    #[test]
    fn mutation_keeps_shape() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut net = Network::new(7, 9, 4, &mut rng);
        net.mutate(0.5, &mut rng);
        assert!(net.is_compatible(7, 9, 4));
        net.validate().expect("still valid");
    }

    #[test]
    fn validate_catches_bad_shapes() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut net = Network::new(3, 2, 4, &mut rng);
        net.levels[0].weights.pop();
        assert!(matches!(net.validate(), Err(NetworkError::Topology { index: 0, .. })));

        let mut net = Network::new(3, 2, 4, &mut rng);
        net.levels[1].biases[0] = f64::INFINITY;
        assert_eq!(net.validate(), Err(NetworkError::NonFinite(1)));

        let mut net = Network::new(3, 2, 4, &mut rng);
        net.levels.truncate(1);
        assert_eq!(net.validate(), Err(NetworkError::LevelCount(1)));
    }

    #[test]
    fn ragged_level_fails_instead_of_truncating() {
        // declares 3 inputs but stores a single weight row
        let net = Network {
            levels: vec![
                Level {
                    inputs: 3,
                    outputs: 1,
                    weights: vec![vec![1.0]],
                    biases: vec![0.0],
                },
                level(vec![vec![1.0, 1.0, 1.0, 1.0]], vec![0.0; 4]),
            ],
        };
        assert!(!net.is_compatible(3, 1, 4));
        assert!(matches!(
            net.evaluate(&[0.0, 1.0, 1.0]),
            Err(NetworkError::Topology { index: 0, rows: 1, .. })
        ));

        // short weight row in the second level
        let mut rng = StdRng::seed_from_u64(12);
        let mut net = Network::new(2, 2, 4, &mut rng);
        net.levels[1].weights[1].pop();
        assert!(matches!(
            net.evaluate(&[1.0, 1.0]),
            Err(NetworkError::Topology { index: 1, .. })
        ));

        // missing bias
        let mut short = level(vec![vec![1.0, 1.0]], vec![0.0, 0.0]);
        short.biases.pop();
        assert!(matches!(short.feed_forward(&[1.0]), Err(NetworkError::Topology { .. })));
    }
}
