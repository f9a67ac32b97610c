//! Distance families and distance-to-score transforms
//!
//! The similarity index reports raw distances; queries surface bounded
//! similarity scores in `[0, 1]`, rounded to 3 decimal digits.

use serde::{Deserialize, Serialize};
use std::fmt;
use usearch::MetricKind;

use crate::error::{Error, Result};

/// Distance family used to compare embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
}

impl Metric {
    /// Parse a caller-supplied metric name
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(Error::InvalidMetric(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
        }
    }

    /// The native index metric backing this distance family
    pub(crate) fn index_kind(&self) -> MetricKind {
        match self {
            Metric::Cosine => MetricKind::IP,
            Metric::Euclidean => MetricKind::L2sq,
        }
    }

    /// Map a raw index distance to a similarity score in `[0, 1]`
    ///
    /// Cosine scoring is defined over the negative-inner-product distance
    /// `d = -<a,b>`; the index's inner-product metric reports `1 - <a,b>`,
    /// so the raw value is shifted by one before the transform
    /// `(1 - d) / 2`, clamped to `[0, 1]`. The transform is matched
    /// empirically against the original deployment's inner-product operator
    /// rather than derived from the textbook cosine formula; revisit it if
    /// the index's cosine semantics ever change. Self-similarity of a unit
    /// vector scores 1.0; unnormalized vectors can exceed 1.0 before the
    /// clamp.
    ///
    /// Euclidean scoring takes the square root of the index's squared-L2
    /// distance and maps it through `1 / (1 + d)`, so zero self-distance
    /// scores exactly 1.0.
    ///
    /// Scores assume the raw distance came from an index built with the
    /// same metric family. Scoring another index's distances is permitted
    /// but the ranking and values are of undefined quality.
    pub fn score(&self, raw_distance: f64) -> f64 {
        let score = match self {
            Metric::Cosine => {
                let d = raw_distance - 1.0;
                ((1.0 - d) / 2.0).clamp(0.0, 1.0)
            }
            Metric::Euclidean => {
                let d = raw_distance.max(0.0).sqrt();
                1.0 / (1.0 + d)
            }
        };
        round3(score)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to 3 decimal digits for reporting
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_known_metrics() {
        assert_eq!(Metric::parse("cosine").unwrap(), Metric::Cosine);
        assert_eq!(Metric::parse("euclidean").unwrap(), Metric::Euclidean);
    }

    #[test]
    fn test_parse_rejects_unknown_metric() {
        let err = Metric::parse("manhattan").unwrap_err();
        assert!(matches!(err, Error::InvalidMetric(ref m) if m == "manhattan"));

        // Case-sensitive, like the original wire contract
        assert!(Metric::parse("Cosine").is_err());
    }

    #[test]
    fn test_cosine_score_identity() {
        // Unit self-match: inner-product distance 1 - 1 = 0
        assert_eq!(Metric::Cosine.score(0.0), 1.0);
    }

    #[test]
    fn test_cosine_score_orthogonal_and_opposite() {
        // Orthogonal unit vectors: raw 1.0 -> d = 0 -> 0.5
        assert_eq!(Metric::Cosine.score(1.0), 0.5);
        // Opposite unit vectors: raw 2.0 -> d = 1 -> 0.0
        assert_eq!(Metric::Cosine.score(2.0), 0.0);
    }

    #[test]
    fn test_cosine_score_clamps_unnormalized_vectors() {
        // Self-match of an unnormalized vector, e.g. [2,0,0]: <e,e> = 4,
        // raw distance 1 - 4 = -3, transform yields 2.5 before the clamp
        assert_eq!(Metric::Cosine.score(-3.0), 1.0);
        // Strongly anti-aligned unnormalized vectors clamp to 0
        assert_eq!(Metric::Cosine.score(5.0), 0.0);
    }

    #[test]
    fn test_euclidean_score_zero_distance_is_exactly_one() {
        assert_eq!(Metric::Euclidean.score(0.0), 1.0);
    }

    #[test]
    fn test_euclidean_score_uses_unsquared_distance() {
        // Raw squared distance 4 -> d = 2 -> 1/3
        assert_eq!(Metric::Euclidean.score(4.0), 0.333);
        // Raw squared distance 1 -> d = 1 -> 0.5
        assert_eq!(Metric::Euclidean.score(1.0), 0.5);
    }

    #[test]
    fn test_euclidean_score_in_unit_interval() {
        for raw in [0.0, 0.01, 1.0, 100.0, 1e12] {
            let score = Metric::Euclidean.score(raw);
            assert!(score > 0.0 && score <= 1.0, "score {score} for raw {raw}");
        }
    }

    #[test]
    fn test_scores_rounded_to_three_digits() {
        // 1 / (1 + sqrt(2)) = 0.41421...
        assert_eq!(Metric::Euclidean.score(2.0), 0.414);
    }
}
