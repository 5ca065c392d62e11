//! Trust score engine
//!
//! Pure function from aggregated feedback/validation signals to a composite
//! score in [0, 100] and a discrete [`Tier`].
//!
//! # Sub-scores
//! - **rating**: Bayesian shrinkage of the average rating toward a neutral
//!   prior, `(avg·n + prior·k) / (n + k)`
//! - **volume**: `log10(n+1) / log10(sat+1) · 100`, 0 with no feedback
//! - **consistency**: `100 · (1 − σ/span)`, neutral below 2 ratings
//! - **validation**: validation success rate as-is
//! - **age**: `log10(days+1) / log10(sat+1) · 100`, 0 for brand-new agents
//! - **uptime**: measured uptime, neutral when unknown
//!
//! All constants live in [`ScoringConfig`].

use oracle_common::Tier;

/// Weight of each sub-score in the composite (sums to 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub rating: f64,
    pub volume: f64,
    pub consistency: f64,
    pub validation: f64,
    pub age: f64,
    pub uptime: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rating: 0.35,
            volume: 0.12,
            consistency: 0.13,
            validation: 0.18,
            age: 0.07,
            uptime: 0.15,
        }
    }
}

/// Minimum composite score and feedback count for a tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierRule {
    pub tier: Tier,
    pub min_score: f64,
    pub min_feedback: u64,
}

/// Tier rules, highest first; the first satisfied rule wins
pub const DEFAULT_TIER_RULES: [TierRule; 5] = [
    TierRule { tier: Tier::Diamond, min_score: 90.0, min_feedback: 50 },
    TierRule { tier: Tier::Platinum, min_score: 80.0, min_feedback: 30 },
    TierRule { tier: Tier::Gold, min_score: 70.0, min_feedback: 20 },
    TierRule { tier: Tier::Silver, min_score: 60.0, min_feedback: 10 },
    TierRule { tier: Tier::Bronze, min_score: 50.0, min_feedback: 5 },
];

/// Scoring constants
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Neutral rating the average is shrunk toward
    pub prior_rating: f64,
    /// Pseudo-count of prior ratings
    pub prior_weight: f64,
    /// Feedback count at which the volume score reaches 100
    pub volume_saturation: f64,
    /// Ratings needed before the standard deviation is trusted
    pub consistency_min_feedback: u64,
    /// Standard deviation that drives consistency to 0
    pub consistency_std_dev_span: f64,
    /// Consistency score used below `consistency_min_feedback`
    pub neutral_consistency: f64,
    /// Account age in days at which the age score reaches 100
    pub age_saturation_days: f64,
    /// Uptime score used when uptime is unknown
    pub neutral_uptime: f64,
    pub weights: ScoreWeights,
    pub tier_rules: Vec<TierRule>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            prior_rating: 50.0,
            prior_weight: 3.0,
            volume_saturation: 100.0,
            consistency_min_feedback: 2,
            consistency_std_dev_span: 50.0,
            neutral_consistency: 50.0,
            age_saturation_days: 365.0,
            neutral_uptime: 50.0,
            weights: ScoreWeights::default(),
            tier_rules: DEFAULT_TIER_RULES.to_vec(),
        }
    }
}

/// Aggregated signals for one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Mean rating on the 0–100 scale
    pub average_rating: f64,
    pub feedback_count: u64,
    /// Population standard deviation of the ratings
    pub rating_std_dev: f64,
    /// Successful / completed validations, as a percentage
    pub validation_success_rate: f64,
    pub account_age_days: i64,
    /// Measured uptime percentage; `None` or negative means unknown
    pub uptime_pct: Option<f64>,
}

/// The six normalized components of a composite score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub rating: f64,
    pub volume: f64,
    pub consistency: f64,
    pub validation: f64,
    pub age: f64,
    pub uptime: f64,
}

/// Composite score calculator
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn rating_score(&self, average_rating: f64, feedback_count: u64) -> f64 {
        let n = feedback_count as f64;
        let k = self.config.prior_weight;
        (average_rating * n + self.config.prior_rating * k) / (n + k)
    }

    pub fn volume_score(&self, feedback_count: u64) -> f64 {
        if feedback_count == 0 {
            return 0.0;
        }
        let n = feedback_count as f64;
        (log_ratio(n, self.config.volume_saturation) * 100.0).min(100.0)
    }

    pub fn consistency_score(&self, feedback_count: u64, rating_std_dev: f64) -> f64 {
        if feedback_count < self.config.consistency_min_feedback {
            return self.config.neutral_consistency;
        }
        (100.0 * (1.0 - rating_std_dev / self.config.consistency_std_dev_span)).max(0.0)
    }

    pub fn validation_score(&self, validation_success_rate: f64) -> f64 {
        validation_success_rate
    }

    pub fn age_score(&self, account_age_days: i64) -> f64 {
        if account_age_days <= 0 {
            return 0.0;
        }
        let days = account_age_days as f64;
        (log_ratio(days, self.config.age_saturation_days) * 100.0).min(100.0)
    }

    pub fn uptime_score(&self, uptime_pct: Option<f64>) -> f64 {
        match uptime_pct {
            Some(pct) if pct >= 0.0 => pct,
            _ => self.config.neutral_uptime,
        }
    }

    pub fn sub_scores(&self, inputs: &ScoreInputs) -> SubScores {
        SubScores {
            rating: self.rating_score(inputs.average_rating, inputs.feedback_count),
            volume: self.volume_score(inputs.feedback_count),
            consistency: self.consistency_score(inputs.feedback_count, inputs.rating_std_dev),
            validation: self.validation_score(inputs.validation_success_rate),
            age: self.age_score(inputs.account_age_days),
            uptime: self.uptime_score(inputs.uptime_pct),
        }
    }

    /// Weighted blend clamped to [0, 100], unrounded
    pub fn blend(&self, sub: &SubScores) -> f64 {
        let w = &self.config.weights;
        let composite = sub.rating * w.rating
            + sub.volume * w.volume
            + sub.consistency * w.consistency
            + sub.validation * w.validation
            + sub.age * w.age
            + sub.uptime * w.uptime;
        composite.clamp(0.0, 100.0)
    }

    /// Composite score in [0, 100], rounded to 2 decimals
    pub fn compute_score(&self, inputs: &ScoreInputs) -> f64 {
        let composite = self.blend(&self.sub_scores(inputs));
        // NaN inputs (e.g. NaN ratings) fall through clamp untouched
        if composite.is_nan() {
            return 0.0;
        }
        round2(composite)
    }

    /// First tier rule satisfied by (score, feedback), else `Unranked`
    pub fn determine_tier(&self, score: f64, feedback_count: u64) -> Tier {
        self.config
            .tier_rules
            .iter()
            .find(|rule| score >= rule.min_score && feedback_count >= rule.min_feedback)
            .map(|rule| rule.tier)
            .unwrap_or(Tier::Unranked)
    }
}

/// `log10(x+1) / log10(saturation+1)`
fn log_ratio(x: f64, saturation: f64) -> f64 {
    (x + 1.0).log10() / (saturation + 1.0).log10()
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
