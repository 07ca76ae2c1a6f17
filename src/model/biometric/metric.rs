use serde::{Deserialize, Serialize};

/// The distance metric used for duplicate detection.
///
/// Pluggable but fixed per deployment. The two metrics point in opposite
/// directions, so all comparisons go through [`Metric::matches`] and
/// [`Metric::closer`] rather than raw score comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Euclidean distance: smaller is more similar.
    Euclidean,
    /// Cosine similarity: larger is more similar.
    Cosine,
}

impl Metric {
    /// The default match threshold for this metric.
    pub fn default_threshold(self) -> f64 {
        match self {
            Metric::Euclidean => 0.45,
            Metric::Cosine => 0.97,
        }
    }

    /// Score two equal-length vectors under this metric.
    pub fn score(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Euclidean => euclidean(a, b),
            Metric::Cosine => cosine(a, b),
        }
    }

    /// Whether a score clears the match threshold.
    ///
    /// Boundary semantics are deliberate and tested: Euclidean matches
    /// strictly below the threshold, cosine matches at or above it.
    pub fn matches(self, score: f64, threshold: f64) -> bool {
        match self {
            Metric::Euclidean => score < threshold,
            Metric::Cosine => score >= threshold,
        }
    }

    /// Whether score `a` indicates a closer match than score `b`.
    pub fn closer(self, a: f64, b: f64) -> bool {
        match self {
            Metric::Euclidean => a < b,
            Metric::Cosine => a > b,
        }
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut mag_a = 0.0;
    let mut mag_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a.sqrt() * mag_b.sqrt())
}
