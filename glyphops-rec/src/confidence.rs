//! Confidence aggregation over per-character probabilities.

/// Cumulative product of `probs`, read at its last element.
///
/// An empty sequence (nothing decoded, or `[s]` at the first step) scores 0.0.
pub fn confidence(probs: &[f32]) -> f32 {
    if probs.is_empty() {
        return 0.0;
    }
    probs.iter().product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_scores_zero() {
        assert_eq!(confidence(&[]), 0.0);
    }

    #[test]
    fn single_certain_character_scores_one() {
        assert_eq!(confidence(&[1.0]), 1.0);
    }

    #[test]
    fn multiplies_in_order() {
        assert_eq!(confidence(&[0.5, 0.5]), 0.25);
        assert!((confidence(&[0.9, 0.8, 0.5]) - 0.36).abs() < 1e-6);
    }
}
