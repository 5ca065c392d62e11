//! Property checks for the score engine over a grid of inputs

use oracle_common::Tier;
use oracle_jobs::services::{ScoreEngine, ScoreInputs};

fn grid() -> Vec<ScoreInputs> {
    let mut all = Vec::new();
    for average_rating in [0.0, 12.5, 50.0, 80.0, 100.0] {
        for feedback_count in [0, 1, 2, 9, 100, 5_000] {
            for rating_std_dev in [0.0, 5.0, 49.9, 120.0] {
                for validation_success_rate in [0.0, 66.67, 100.0] {
                    for account_age_days in [-3, 0, 1, 364, 3_650] {
                        for uptime_pct in [None, Some(0.0), Some(99.9)] {
                            all.push(ScoreInputs {
                                average_rating,
                                feedback_count,
                                rating_std_dev,
                                validation_success_rate,
                                account_age_days,
                                uptime_pct,
                            });
                        }
                    }
                }
            }
        }
    }
    all
}

#[test]
fn test_score_within_bounds() {
    let engine = ScoreEngine::default();
    for inputs in grid() {
        let score = engine.compute_score(&inputs);
        assert!((0.0..=100.0).contains(&score), "{:?} scored {}", inputs, score);
    }
}

#[test]
fn test_score_is_deterministic() {
    let engine = ScoreEngine::default();
    for inputs in grid() {
        assert_eq!(engine.compute_score(&inputs), engine.compute_score(&inputs));
    }
}

#[test]
fn test_no_feedback_ignores_rating_signals() {
    let engine = ScoreEngine::default();
    for inputs in grid().into_iter().filter(|i| i.feedback_count == 0) {
        let sub = engine.sub_scores(&inputs);
        assert_eq!(sub.volume, 0.0);
        assert_eq!(sub.consistency, 50.0);
    }
}

#[test]
fn test_tier_monotonic_in_score() {
    let engine = ScoreEngine::default();
    for feedback_count in [0, 4, 5, 10, 20, 30, 50, 1_000] {
        let mut previous = Tier::Unranked;
        for step in 0..=10_000 {
            let score = step as f64 / 100.0;
            let tier = engine.determine_tier(score, feedback_count);
            assert!(
                tier >= previous,
                "Tier dropped from {} to {} at score {} with {} ratings",
                previous,
                tier,
                score,
                feedback_count
            );
            previous = tier;
        }
    }
}

#[test]
fn test_tier_monotonic_in_feedback() {
    let engine = ScoreEngine::default();
    for score in [0.0, 55.0, 65.0, 75.0, 85.0, 95.0] {
        let mut previous = Tier::Unranked;
        for feedback_count in 0..200 {
            let tier = engine.determine_tier(score, feedback_count);
            assert!(tier >= previous);
            previous = tier;
        }
    }
}
