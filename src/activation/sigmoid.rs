use std::f64::consts::E;

/// Logistic function, `1 / (1 + e^-x)`. Range is the open interval (0, 1).
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

/// Derivative of the logistic function evaluated at the pre-activation `x`.
///
/// Takes the summation, not the cached activation, so the derivative is
/// recomputed from the same value the forward pass used.
pub fn sigmoid_derivative(x: f64) -> f64 {
    let fx = sigmoid(x);
    fx * (1.0 - fx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_of_zero_is_one_half() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!((sigmoid_derivative(0.0) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn sigmoid_is_symmetric() {
        for &x in &[0.1, 1.0, 3.5, 12.0] {
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn sigmoid_stays_inside_unit_interval() {
        for &x in &[-30.0, -5.0, -0.5, 0.5, 5.0, 30.0] {
            let y = sigmoid(x);
            assert!(y > 0.0 && y < 1.0, "sigmoid({x}) = {y}");
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let h = 1e-6;
        for &x in &[-2.0, -0.3, 0.0, 0.7, 4.0] {
            let numeric = (sigmoid(x + h) - sigmoid(x - h)) / (2.0 * h);
            assert!((numeric - sigmoid_derivative(x)).abs() < 1e-8);
        }
    }
}
