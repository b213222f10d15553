use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::sigmoid::{sigmoid, sigmoid_derivative};
use crate::error::{Error, Result};
use crate::network::parameters::NetworkParameters;

/// A fully connected feed-forward network with sigmoid neurons, trained one
/// sample at a time by backpropagation.
///
/// Layer `l` is connected to layer `l + 1` by the flat vector `weights[l]`,
/// where the weight from source neuron `s` to target neuron `t` lives at
/// `s * layer_sizes[l + 1] + t`. Forward propagation, backpropagation and the
/// update rule all read the buffer through that formula.
#[derive(Debug, Clone)]
pub struct Network {
    layer_sizes: Vec<usize>,
    /// Output of every layer from the last forward pass; `activations[0]` is the input.
    activations: Vec<Vec<f64>>,
    weights: Vec<Vec<f64>>,
    thresholds: Vec<Vec<f64>>,
    /// Pre-activation sums of layer `l + 1`, kept for backpropagation.
    summations: Vec<Vec<f64>>,
    /// Error signal of layer `l + 1` from the last training step.
    deltas: Vec<Vec<f64>>,
    alpha: f64,
}

impl Network {
    /// Builds a fresh network with weights drawn uniformly from [-1, 1) and
    /// every threshold set to 1.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        alpha: f64,
        hidden_sizes: &[usize],
        rng: &mut R,
    ) -> Result<Network> {
        let layer_sizes = join_layer_sizes(input_size, hidden_sizes, output_size);
        validate_shape(&layer_sizes, alpha)?;

        let weights: Vec<Vec<f64>> = layer_sizes
            .windows(2)
            .map(|pair| {
                (0..pair[0] * pair[1])
                    .map(|_| rng.gen::<f64>() * 2.0 - 1.0)
                    .collect()
            })
            .collect();
        let thresholds: Vec<Vec<f64>> =
            layer_sizes[1..].iter().map(|&size| vec![1.0; size]).collect();

        debug!("built network {:?} with alpha {}", layer_sizes, alpha);
        Ok(Network::assemble(layer_sizes, alpha, weights, thresholds))
    }

    /// Same as [`Network::new`] with a `StdRng` seeded from `seed`.
    pub fn with_seed(
        input_size: usize,
        output_size: usize,
        alpha: f64,
        hidden_sizes: &[usize],
        seed: u64,
    ) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        Network::new(input_size, output_size, alpha, hidden_sizes, &mut rng)
    }

    /// Adopts previously trained weights and thresholds without randomizing.
    ///
    /// Fails with [`Error::Configuration`] when a vector's length disagrees
    /// with the declared layer sizes.
    pub fn from_parameters(params: NetworkParameters) -> Result<Network> {
        let layer_sizes = params.layer_sizes();
        validate_shape(&layer_sizes, params.alpha)?;

        let connections = layer_sizes.len() - 1;
        if params.weights.len() != connections {
            return Err(Error::Configuration(format!(
                "expected {} weight vectors for layers {:?}, got {}",
                connections,
                layer_sizes,
                params.weights.len()
            )));
        }
        if params.thresholds.len() != connections {
            return Err(Error::Configuration(format!(
                "expected {} threshold vectors for layers {:?}, got {}",
                connections,
                layer_sizes,
                params.thresholds.len()
            )));
        }
        for (l, pair) in layer_sizes.windows(2).enumerate() {
            let expected = pair[0] * pair[1];
            if params.weights[l].len() != expected {
                return Err(Error::Configuration(format!(
                    "weight vector {} has {} values, expected {} ({} x {})",
                    l,
                    params.weights[l].len(),
                    expected,
                    pair[0],
                    pair[1]
                )));
            }
            if params.thresholds[l].len() != pair[1] {
                return Err(Error::Configuration(format!(
                    "threshold vector {} has {} values, expected {}",
                    l,
                    params.thresholds[l].len(),
                    pair[1]
                )));
            }
        }

        debug!("restored network {:?} with alpha {}", layer_sizes, params.alpha);
        Ok(Network::assemble(
            layer_sizes,
            params.alpha,
            params.weights,
            params.thresholds,
        ))
    }

    fn assemble(
        layer_sizes: Vec<usize>,
        alpha: f64,
        weights: Vec<Vec<f64>>,
        thresholds: Vec<Vec<f64>>,
    ) -> Network {
        let activations: Vec<Vec<f64>> = layer_sizes.iter().map(|&size| vec![0.0; size]).collect();
        let summations: Vec<Vec<f64>> =
            layer_sizes[1..].iter().map(|&size| vec![0.0; size]).collect();
        let deltas = summations.clone();
        Network {
            layer_sizes,
            activations,
            weights,
            thresholds,
            summations,
            deltas,
            alpha,
        }
    }

    /// Copies the trained state out so it can be persisted.
    pub fn to_parameters(&self) -> NetworkParameters {
        NetworkParameters {
            input_size: self.input_size(),
            output_size: self.output_size(),
            alpha: self.alpha,
            hidden_sizes: self.layer_sizes[1..self.layer_sizes.len() - 1].to_vec(),
            weights: self.weights.clone(),
            thresholds: self.thresholds.clone(),
        }
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Read-only view of the weight vectors, one per connection layer.
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn thresholds(&self) -> &[Vec<f64>] {
        &self.thresholds
    }

    /// Deltas computed by the most recent [`Network::train_step`].
    pub fn deltas(&self) -> &[Vec<f64>] {
        &self.deltas
    }

    /// Runs the forward pass and returns the output layer's activations.
    pub fn infer(&mut self, input: &[f64]) -> Result<&[f64]> {
        check_len("input", self.input_size(), input.len())?;
        self.propagate(input);
        Ok(self.output())
    }

    /// Inference-only entry point; returns an owned copy of the output.
    pub fn classify(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.infer(input).map(<[f64]>::to_vec)
    }

    /// Returns true when every output lies within `tolerance` of its expected value.
    pub fn evaluate(&mut self, input: &[f64], expected: &[f64], tolerance: f64) -> Result<bool> {
        check_len("input", self.input_size(), input.len())?;
        check_len("expected output", self.output_size(), expected.len())?;
        self.propagate(input);
        let hit = self
            .output()
            .iter()
            .zip(expected)
            .all(|(&out, &want)| out >= want - tolerance && out <= want + tolerance);
        Ok(hit)
    }

    /// One step of online gradient descent on a single sample.
    ///
    /// Both vectors are checked before anything is written, so a rejected call
    /// leaves the network unchanged.
    pub fn train_step(&mut self, input: &[f64], expected: &[f64]) -> Result<()> {
        check_len("input", self.input_size(), input.len())?;
        check_len("expected output", self.output_size(), expected.len())?;
        self.propagate(input);
        self.backpropagate(expected);
        self.update_parameters();
        Ok(())
    }

    fn output(&self) -> &[f64] {
        &self.activations[self.activations.len() - 1]
    }

    fn propagate(&mut self, input: &[f64]) {
        self.activations[0].copy_from_slice(input);

        for l in 0..self.weights.len() {
            let target_size = self.layer_sizes[l + 1];
            let (before, after) = self.activations.split_at_mut(l + 1);
            let sources = &before[l];
            let targets = &mut after[0];
            let weights = &self.weights[l];
            let thresholds = &self.thresholds[l];
            let summations = &mut self.summations[l];

            for t in 0..target_size {
                let mut sum = thresholds[t];
                for (s, &activation) in sources.iter().enumerate() {
                    sum += weights[s * target_size + t] * activation;
                }
                summations[t] = sum;
                targets[t] = sigmoid(sum);
            }
        }
    }

    fn backpropagate(&mut self, expected: &[f64]) {
        let last = self.deltas.len() - 1;

        // Output layer: gradient of the squared error w.r.t. the summation.
        let outputs = &self.activations[last + 1];
        let output_sums = &self.summations[last];
        for (t, delta) in self.deltas[last].iter_mut().enumerate() {
            *delta = -(expected[t] - outputs[t]) * sigmoid_derivative(output_sums[t]);
        }

        // Hidden layers, back to front. Reading block `s` of the next layer's
        // weights walks the same connections the forward pass used, reversed.
        for l in (0..last).rev() {
            let target_size = self.layer_sizes[l + 2];
            let (current, next) = self.deltas.split_at_mut(l + 1);
            let next = &next[0];
            let weights = &self.weights[l + 1];
            let sums = &self.summations[l];

            for (s, delta) in current[l].iter_mut().enumerate() {
                let block = &weights[s * target_size..(s + 1) * target_size];
                let weighted: f64 = block.iter().zip(next).map(|(w, d)| w * d).sum();
                *delta = sigmoid_derivative(sums[s]) * weighted;
            }
        }
    }

    fn update_parameters(&mut self) {
        let alpha = self.alpha;
        for l in 0..self.weights.len() {
            let target_size = self.layer_sizes[l + 1];
            let deltas = &self.deltas[l];
            let sources = &self.activations[l];

            for (idx, weight) in self.weights[l].iter_mut().enumerate() {
                *weight -= alpha * deltas[idx % target_size] * sources[idx / target_size];
            }
            for (threshold, delta) in self.thresholds[l].iter_mut().zip(deltas) {
                *threshold -= alpha * delta;
            }
        }
    }
}

fn join_layer_sizes(input_size: usize, hidden_sizes: &[usize], output_size: usize) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(hidden_sizes.len() + 2);
    sizes.push(input_size);
    sizes.extend_from_slice(hidden_sizes);
    sizes.push(output_size);
    sizes
}

fn validate_shape(layer_sizes: &[usize], alpha: f64) -> Result<()> {
    if let Some(l) = layer_sizes.iter().position(|&size| size == 0) {
        return Err(Error::Configuration(format!(
            "layer {} of {:?} has no neurons",
            l, layer_sizes
        )));
    }
    if !alpha.is_finite() {
        return Err(Error::Configuration(format!(
            "alpha must be a finite number, got {}",
            alpha
        )));
    }
    Ok(())
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// [2, 2, 1] network with hand-picked parameters.
    fn fixed_network() -> Network {
        Network::from_parameters(NetworkParameters {
            input_size: 2,
            output_size: 1,
            alpha: 0.5,
            hidden_sizes: vec![2],
            // source-major: [s0->t0, s0->t1, s1->t0, s1->t1]
            weights: vec![vec![0.1, 0.2, 0.3, 0.4], vec![0.6, -0.7]],
            thresholds: vec![vec![0.5, -0.5], vec![0.2]],
        })
        .unwrap()
    }

    fn squared_error(network: &mut Network, input: &[f64], expected: &[f64]) -> f64 {
        network
            .infer(input)
            .unwrap()
            .iter()
            .zip(expected)
            .map(|(o, e)| (o - e).powi(2))
            .sum()
    }

    #[test]
    fn fresh_network_has_expected_shapes() {
        let net = Network::with_seed(784, 1, 0.2, &[10, 20, 10], 1).unwrap();
        assert_eq!(net.layer_sizes(), &[784, 10, 20, 10, 1]);
        let weight_lens: Vec<usize> = net.weights().iter().map(Vec::len).collect();
        assert_eq!(weight_lens, vec![7840, 200, 200, 10]);
        let threshold_lens: Vec<usize> = net.thresholds().iter().map(Vec::len).collect();
        assert_eq!(threshold_lens, vec![10, 20, 10, 1]);
    }

    #[test]
    fn fresh_weights_are_in_range_and_thresholds_are_one() {
        let net = Network::with_seed(30, 3, 0.1, &[12], 99).unwrap();
        assert!(net
            .weights()
            .iter()
            .flatten()
            .all(|&w| (-1.0..1.0).contains(&w)));
        assert!(net.thresholds().iter().flatten().all(|&t| t == 1.0));
    }

    #[test]
    fn same_seed_gives_same_network() {
        let a = Network::with_seed(8, 2, 0.3, &[4, 3], 42).unwrap();
        let b = Network::with_seed(8, 2, 0.3, &[4, 3], 42).unwrap();
        let c = Network::with_seed(8, 2, 0.3, &[4, 3], 43).unwrap();
        assert_eq!(a.weights(), b.weights());
        assert_ne!(a.weights(), c.weights());
    }

    #[test]
    fn zero_sized_layer_is_rejected() {
        let err = Network::with_seed(4, 1, 0.2, &[3, 0], 0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn restored_shape_mismatch_is_rejected() {
        let mut params = fixed_network().to_parameters();
        params.weights[1].push(0.0);
        assert!(matches!(
            Network::from_parameters(params),
            Err(Error::Configuration(_))
        ));

        let mut params = fixed_network().to_parameters();
        params.thresholds.pop();
        assert!(matches!(
            Network::from_parameters(params),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn parameters_round_trip_through_restore() {
        let mut original = Network::with_seed(5, 2, 0.25, &[4], 3).unwrap();
        let mut restored = Network::from_parameters(original.to_parameters()).unwrap();
        let input = [0.2, 0.4, 0.6, 0.8, 1.0];
        assert_eq!(
            original.classify(&input).unwrap(),
            restored.classify(&input).unwrap()
        );
        assert_eq!(restored.alpha(), 0.25);
    }

    #[test]
    fn repeated_inference_is_bit_identical() {
        let mut net = Network::with_seed(16, 3, 0.2, &[7, 5], 11).unwrap();
        let zeros = vec![0.0; 16];
        let first = net.classify(&zeros).unwrap();
        let second = net.classify(&zeros).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn outputs_stay_inside_open_unit_interval() {
        let mut net = Network::with_seed(6, 4, 0.2, &[5], 5).unwrap();
        for input in [
            vec![0.0; 6],
            vec![1.0; 6],
            vec![-3.0, 2.0, 0.5, 7.0, -1.0, 0.0],
        ] {
            for &out in net.infer(&input).unwrap() {
                assert!(out > 0.0 && out < 1.0, "output {out} escaped (0, 1)");
            }
        }
    }

    #[test]
    fn forward_pass_matches_hand_computation() {
        let mut net = fixed_network();
        let out = net.classify(&[1.0, 0.0]).unwrap();

        let h0 = sigmoid(0.5 + 0.1 * 1.0 + 0.3 * 0.0);
        let h1 = sigmoid(-0.5 + 0.2 * 1.0 + 0.4 * 0.0);
        let expected = sigmoid(0.2 + 0.6 * h0 + -0.7 * h1);
        assert!((out[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn one_training_step_matches_hand_computation() {
        let mut net = fixed_network();
        net.train_step(&[1.0, 0.0], &[0.9]).unwrap();

        let alpha = 0.5;
        let z0 = 0.5 + 0.1 * 1.0 + 0.3 * 0.0;
        let z1 = -0.5 + 0.2 * 1.0 + 0.4 * 0.0;
        let (h0, h1) = (sigmoid(z0), sigmoid(z1));
        let zo = 0.2 + 0.6 * h0 + -0.7 * h1;
        let out = sigmoid(zo);

        let d_out = -(0.9 - out) * sigmoid_derivative(zo);
        let d_h0 = sigmoid_derivative(z0) * (d_out * 0.6);
        let d_h1 = sigmoid_derivative(z1) * (d_out * -0.7);

        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;

        // Output below target: the residual form gives a negative delta.
        assert!(d_out < 0.0);
        assert!(close(net.deltas()[1][0], d_out));
        assert!(close(net.deltas()[0][0], d_h0));
        assert!(close(net.deltas()[0][1], d_h1));

        let w1 = &net.weights()[1];
        assert!(close(w1[0], 0.6 - alpha * d_out * h0));
        assert!(close(w1[1], -0.7 - alpha * d_out * h1));

        let w0 = &net.weights()[0];
        assert!(close(w0[0], 0.1 - alpha * d_h0 * 1.0));
        assert!(close(w0[1], 0.2 - alpha * d_h1 * 1.0));
        assert!(close(w0[2], 0.3));
        assert!(close(w0[3], 0.4));

        assert!(close(net.thresholds()[0][0], 0.5 - alpha * d_h0));
        assert!(close(net.thresholds()[0][1], -0.5 - alpha * d_h1));
        assert!(close(net.thresholds()[1][0], 0.2 - alpha * d_out));
    }

    #[test]
    fn training_step_reduces_squared_error() {
        let mut net = fixed_network();
        let input = [1.0, 0.0];
        let expected = [0.9];
        let before = squared_error(&mut net, &input, &expected);
        net.train_step(&input, &expected).unwrap();
        let after = squared_error(&mut net, &input, &expected);
        assert!(after < before, "error went from {before} to {after}");
    }

    #[test]
    fn weight_updates_follow_the_numerical_gradient() {
        let input = [0.3, 0.9, 0.1];
        let expected = [0.2, 0.7];
        let base = Network::with_seed(3, 2, 0.1, &[4, 3], 17).unwrap();

        let mut trained = base.clone();
        trained.train_step(&input, &expected).unwrap();

        // Half squared error, the loss whose gradient the update rule follows.
        let loss = |params: NetworkParameters| -> f64 {
            let mut net = Network::from_parameters(params).unwrap();
            0.5 * squared_error(&mut net, &input, &expected)
        };

        let h = 1e-6;
        for l in 0..base.weights().len() {
            for idx in 0..base.weights()[l].len() {
                let mut plus = base.to_parameters();
                plus.weights[l][idx] += h;
                let mut minus = base.to_parameters();
                minus.weights[l][idx] -= h;
                let numeric = (loss(plus) - loss(minus)) / (2.0 * h);

                let applied = (base.weights()[l][idx] - trained.weights()[l][idx]) / base.alpha();
                assert!(
                    (numeric - applied).abs() < 1e-6,
                    "layer {l} weight {idx}: numeric {numeric}, applied {applied}"
                );
            }
        }
    }

    #[test]
    fn repeated_training_converges_on_one_sample() {
        let mut net = Network::with_seed(4, 1, 0.5, &[3], 8).unwrap();
        let input = [0.0, 1.0, 0.5, 0.25];
        for _ in 0..2000 {
            net.train_step(&input, &[0.3]).unwrap();
        }
        assert!(net.evaluate(&input, &[0.3], 0.03).unwrap());
    }

    #[test]
    fn wrong_input_length_is_rejected_without_mutation() {
        let mut net = Network::with_seed(784, 1, 0.2, &[10], 2).unwrap();
        let weights_before = net.weights().to_vec();
        let thresholds_before = net.thresholds().to_vec();

        let err = net.infer(&[0.5; 10]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 784,
                actual: 10,
                ..
            }
        ));
        assert!(net.train_step(&[0.5; 10], &[0.1]).is_err());
        assert!(net.train_step(&[0.5; 784], &[0.1, 0.2]).is_err());
        assert!(net.evaluate(&[0.5; 784], &[], 0.03).is_err());

        assert_eq!(net.weights(), weights_before.as_slice());
        assert_eq!(net.thresholds(), thresholds_before.as_slice());
    }

    #[test]
    fn evaluate_uses_inclusive_tolerance_band() {
        let mut net = fixed_network();
        let out = net.classify(&[1.0, 0.0]).unwrap()[0];
        assert!(net.evaluate(&[1.0, 0.0], &[out], 0.0).unwrap());
        assert!(net.evaluate(&[1.0, 0.0], &[out + 0.02], 0.03).unwrap());
        assert!(!net.evaluate(&[1.0, 0.0], &[out + 0.05], 0.03).unwrap());
        assert!(!net.evaluate(&[1.0, 0.0], &[out - 0.05], 0.03).unwrap());
    }
}
