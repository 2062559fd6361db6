//! The dynamic-limit selector (specification §4.6).
//!
//! Turns "top-K" into "top cluster": a descending score list is walked and
//! cut at the first point where results stop looking like they belong
//! together, rather than always returning exactly `maxResults` entries.

pub use config::DynamicLimitConfig;

/// Applies the dynamic-limit rule to `scored`, a list already sorted by
/// descending score, returning the number of leading entries to keep.
///
/// The first entry is accepted only if it clears `min_score`. Each
/// subsequent entry `i` is accepted unless the cap is already reached, its
/// score falls below the floor, or the relative drop from `i - 1` exceeds
/// `drop_threshold`.
pub fn select(scores: &[f32], config: &DynamicLimitConfig) -> usize {
    let Some(&first) = scores.first() else {
        return 0;
    };

    if first < config.min_score {
        return 0;
    }

    let mut accepted = 1;

    for window in scores.windows(2) {
        if accepted >= config.max_results {
            break;
        }

        let [previous, current] = window else { unreachable!() };

        if *current < config.min_score {
            break;
        }

        let drop = (previous - current) / previous;

        if drop > config.drop_threshold {
            break;
        }

        accepted += 1;
    }

    accepted.min(config.max_results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_results: usize, min_score: f32, drop_threshold: f32) -> DynamicLimitConfig {
        DynamicLimitConfig {
            max_results,
            min_score,
            drop_threshold,
        }
    }

    #[test]
    fn s4_stops_at_significant_drop() {
        let scores = [0.95, 0.93, 0.90, 0.50, 0.48];
        assert_eq!(select(&scores, &config(10, 0.3, 0.30)), 3);
    }

    #[test]
    fn s5_absolute_floor_rejects_everything() {
        let scores = [0.20, 0.19];
        assert_eq!(select(&scores, &config(10, 0.3, 0.30)), 0);
    }

    #[test]
    fn empty_scores_select_nothing() {
        assert_eq!(select(&[], &config(10, 0.3, 0.30)), 0);
    }

    #[test]
    fn hard_cap_is_respected_even_with_near_tied_scores() {
        let scores = [0.9, 0.89, 0.88, 0.87, 0.86];
        assert_eq!(select(&scores, &config(2, 0.3, 0.30)), 2);
    }

    #[test]
    fn increasing_max_results_never_decreases_output() {
        let scores = [0.9, 0.88, 0.87, 0.2];
        let small = select(&scores, &config(2, 0.1, 0.9));
        let large = select(&scores, &config(10, 0.1, 0.9));
        assert!(large >= small);
    }

    #[test]
    fn raising_min_score_never_increases_output() {
        let scores = [0.9, 0.5, 0.4];
        let lenient = select(&scores, &config(10, 0.1, 0.9));
        let strict = select(&scores, &config(10, 0.6, 0.9));
        assert!(strict <= lenient);
    }

    #[test]
    fn lowering_drop_threshold_never_increases_output() {
        let scores = [0.9, 0.6, 0.59];
        let lenient = select(&scores, &config(10, 0.1, 0.9));
        let strict = select(&scores, &config(10, 0.1, 0.1));
        assert!(strict <= lenient);
    }

    #[test]
    fn single_score_above_floor_is_kept() {
        assert_eq!(select(&[0.5], &config(10, 0.3, 0.3)), 1);
    }
}
