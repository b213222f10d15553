//! Text layout of a saved model.
//!
//! ```text
//! PerceptronID: <name>
//! NeuronsPerLayer: 784 10 20 10 1
//! AlphaConstant: 0.2
//! TestDataRightGuessed: 1234
//! TrainingDataRightGuessed: 5678
//! Weights:
//! <one line per connection layer, space-separated>
//! EndWeights
//! Thresholds:
//! <one line per connection layer, space-separated>
//! EndThresholds
//! ```
//!
//! Floats are written with `{}`, which prints the shortest string that parses
//! back to the same `f64`, so a saved model reloads bit for bit.

use std::fmt;

use log::warn;

use crate::error::{Error, Result};
use crate::network::{Network, NetworkParameters};

/// A trained network plus the hit counts it scored when it was saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub name: String,
    pub parameters: NetworkParameters,
    pub test_hits: usize,
    pub training_hits: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Header,
    Weights,
    Thresholds,
}

impl ModelRecord {
    pub fn new(
        name: impl Into<String>,
        network: &Network,
        test_hits: usize,
        training_hits: usize,
    ) -> Self {
        ModelRecord {
            name: name.into(),
            parameters: network.to_parameters(),
            test_hits,
            training_hits,
        }
    }

    /// Rebuilds the network, validating every vector's shape.
    pub fn to_network(&self) -> Result<Network> {
        Network::from_parameters(self.parameters.clone())
    }

    pub fn into_network(self) -> Result<Network> {
        Network::from_parameters(self.parameters)
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Parses the layout written by [`ModelRecord::to_text`]. Keys are matched
    /// case-insensitively and blank lines are skipped.
    pub fn parse(name: &str, text: &str) -> Result<ModelRecord> {
        let format_err = |line: usize, reason: String| Error::ModelFormat {
            name: name.to_owned(),
            line,
            reason,
        };

        let mut section = Section::Header;
        let mut layer_sizes: Option<Vec<usize>> = None;
        let mut alpha: Option<f64> = None;
        let mut test_hits = 0;
        let mut training_hits = 0;
        let mut weights = Vec::new();
        let mut thresholds = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let mut words = line.split_whitespace();
            let Some(key) = words.next() else {
                continue;
            };

            match section {
                Section::Weights if key.eq_ignore_ascii_case("EndWeights") => {
                    section = Section::Header;
                }
                Section::Thresholds if key.eq_ignore_ascii_case("EndThresholds") => {
                    section = Section::Header;
                }
                Section::Weights | Section::Thresholds => {
                    let values = line
                        .split_whitespace()
                        .map(|word| {
                            word.parse::<f64>().map_err(|e| {
                                format_err(line_no, format!("bad number '{}': {}", word, e))
                            })
                        })
                        .collect::<Result<Vec<f64>>>()?;
                    if section == Section::Weights {
                        weights.push(values);
                    } else {
                        thresholds.push(values);
                    }
                }
                Section::Header => {
                    let key = key.to_ascii_lowercase();
                    match key.as_str() {
                        "neuronsperlayer:" => {
                            let sizes = words
                                .map(|word| {
                                    word.parse::<usize>().map_err(|e| {
                                        let reason = format!("bad layer size '{}': {}", word, e);
                                        format_err(line_no, reason)
                                    })
                                })
                                .collect::<Result<Vec<usize>>>()?;
                            layer_sizes = Some(sizes);
                        }
                        "alphaconstant:" => {
                            let value = words
                                .next()
                                .ok_or_else(|| format_err(line_no, "missing alpha".to_owned()))?;
                            alpha = Some(value.parse::<f64>().map_err(|e| {
                                format_err(line_no, format!("bad alpha '{}': {}", value, e))
                            })?);
                        }
                        "testdatarightguessed:" => {
                            test_hits = parse_count(&mut words).ok_or_else(|| {
                                format_err(line_no, "bad test hit count".to_owned())
                            })?;
                        }
                        // Older files spell the key "Rigth".
                        "trainingdatarightguessed:" | "trainingdatarigthguessed:" => {
                            training_hits = parse_count(&mut words).ok_or_else(|| {
                                format_err(line_no, "bad training hit count".to_owned())
                            })?;
                        }
                        "weights:" => section = Section::Weights,
                        "thresholds:" => section = Section::Thresholds,
                        "perceptronid:" => {
                            let stored = line.splitn(2, ':').nth(1).unwrap_or("").trim();
                            if stored != name {
                                warn!(
                                    "model file for '{}' identifies itself as '{}'",
                                    name, stored
                                );
                            }
                        }
                        _ => warn!(
                            "model '{}', line {}: ignoring unknown key '{}'",
                            name, line_no, key
                        ),
                    }
                }
            }
        }

        match section {
            Section::Weights => {
                return Err(format_err(text.lines().count(), "missing EndWeights".to_owned()))
            }
            Section::Thresholds => {
                return Err(format_err(text.lines().count(), "missing EndThresholds".to_owned()))
            }
            Section::Header => {}
        }

        let layer_sizes =
            layer_sizes.ok_or_else(|| format_err(0, "missing NeuronsPerLayer".to_owned()))?;
        let alpha = alpha.ok_or_else(|| format_err(0, "missing AlphaConstant".to_owned()))?;
        let (input_size, hidden_sizes, output_size) =
            NetworkParameters::split_layer_sizes(&layer_sizes)?;

        Ok(ModelRecord {
            name: name.to_owned(),
            parameters: NetworkParameters {
                input_size,
                output_size,
                alpha,
                hidden_sizes,
                weights,
                thresholds,
            },
            test_hits,
            training_hits,
        })
    }
}

impl fmt::Display for ModelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = &self.parameters;
        writeln!(f, "PerceptronID: {}", self.name)?;
        writeln!(f, "NeuronsPerLayer: {}", join(&params.layer_sizes()))?;
        writeln!(f, "AlphaConstant: {}", params.alpha)?;
        writeln!(f, "TestDataRightGuessed: {}", self.test_hits)?;
        writeln!(f, "TrainingDataRightGuessed: {}", self.training_hits)?;

        writeln!(f, "Weights:")?;
        for layer in &params.weights {
            writeln!(f, "{}", join(layer))?;
        }
        writeln!(f, "EndWeights")?;

        writeln!(f, "Thresholds:")?;
        for layer in &params.thresholds {
            writeln!(f, "{}", join(layer))?;
        }
        writeln!(f, "EndThresholds")
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_count<'a>(words: &mut impl Iterator<Item = &'a str>) -> Option<usize> {
    words.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ModelRecord {
        let network = Network::with_seed(4, 1, 0.2, &[3, 2], 21).unwrap();
        ModelRecord::new("sample", &network, 12, 34)
    }

    #[test]
    fn text_layout_has_marker_lines() {
        let text = record().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "PerceptronID: sample");
        assert_eq!(lines[1], "NeuronsPerLayer: 4 3 2 1");
        assert_eq!(lines[2], "AlphaConstant: 0.2");
        assert_eq!(lines[3], "TestDataRightGuessed: 12");
        assert_eq!(lines[4], "TrainingDataRightGuessed: 34");
        assert_eq!(lines[5], "Weights:");
        assert_eq!(lines[6].split(' ').count(), 12);
        assert_eq!(lines[9], "EndWeights");
        assert_eq!(lines[10], "Thresholds:");
        assert_eq!(lines[11], "1 1 1");
        assert_eq!(lines[13], "1");
        assert_eq!(lines[14], "EndThresholds");
    }

    #[test]
    fn parse_restores_exact_bits() {
        let original = record();
        let parsed = ModelRecord::parse("sample", &original.to_text()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_accepts_legacy_spelling_and_blank_lines() {
        let text = "PerceptronID: legacy\n\
                    NeuronsPerLayer: 2 1\n\
                    \n\
                    AlphaConstant: 0.5\n\
                    TestDataRightGuessed: 3\n\
                    TrainingDataRigthGuessed: 7\n\
                    weights:\n\
                    0.25 -0.75\n\
                    EndWeights\n\
                    Thresholds:\n\
                    1.0\n\
                    EndThresholds\n";
        let parsed = ModelRecord::parse("legacy", text).unwrap();
        assert_eq!(parsed.training_hits, 7);
        assert_eq!(parsed.test_hits, 3);
        assert_eq!(parsed.parameters.weights, vec![vec![0.25, -0.75]]);
        assert!(parsed.parameters.hidden_sizes.is_empty());
        assert!(parsed.to_network().is_ok());
    }

    #[test]
    fn bad_number_reports_line() {
        let text = record().to_text().replacen("Weights:\n", "Weights:\n0.1 zebra\n", 1);
        match ModelRecord::parse("sample", &text) {
            Err(Error::ModelFormat { line, .. }) => assert_eq!(line, 7),
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_section_is_rejected() {
        let text = "NeuronsPerLayer: 2 1\nAlphaConstant: 0.5\nWeights:\n0.1 0.2\n";
        assert!(matches!(
            ModelRecord::parse("cut", text),
            Err(Error::ModelFormat { .. })
        ));
    }

    #[test]
    fn missing_layer_sizes_are_rejected() {
        let text = "AlphaConstant: 0.5\nWeights:\nEndWeights\nThresholds:\nEndThresholds\n";
        assert!(matches!(
            ModelRecord::parse("headless", text),
            Err(Error::ModelFormat { .. })
        ));
    }

    #[test]
    fn wrong_vector_length_fails_when_rebuilding() {
        let text = "NeuronsPerLayer: 2 1\nAlphaConstant: 0.5\n\
                    Weights:\n0.1\nEndWeights\nThresholds:\n1\nEndThresholds\n";
        let parsed = ModelRecord::parse("short", text).unwrap();
        assert!(matches!(
            parsed.into_network(),
            Err(Error::Configuration(_))
        ));
    }
}
