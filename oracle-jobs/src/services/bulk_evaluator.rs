//! Bulk evaluation job
//!
//! Rescores every stored agent from the feedback and validation tables:
//! - Pre-pass: page both event tables into per-agent aggregates
//! - Main pass: page the agent table, score each agent, write it back
//!
//! Each write-back is independent; a failed write is logged and skipped.
//! Read failures are counted in the summary and never end the run.
//! Metadata comes from inline `data:` URIs only, so the job makes no
//! network calls besides storage.

use crate::config::EvaluationSettings;
use crate::error::JobResult;
use crate::models::{AgentMetadata, EvaluationSummary};
use crate::services::category_classifier::{classify_stored_agent, Category};
use crate::services::metadata_resolver::MetadataResolver;
use crate::services::score_engine::{round2, ScoreEngine, ScoreInputs};
use crate::storage::AgentStore;
use crate::utils::retry_fixed;
use chrono::{DateTime, Utc};
use oracle_common::{time, ScoreUpdate, StoredAgent};
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Lowest accepted rating; lower values are clamped
pub const MIN_RATING: f64 = 0.0;
/// Highest accepted rating; higher values are clamped
pub const MAX_RATING: f64 = 100.0;

/// Validation counts for one agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationCounts {
    pub completed: u64,
    pub successful: u64,
}

impl ValidationCounts {
    /// Successful / completed as a percentage, 0 with no completions
    pub fn success_rate(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.successful as f64 / self.completed as f64 * 100.0
    }
}

/// Per-agent aggregates from the pre-pass
#[derive(Debug, Clone, Default)]
pub struct FeedbackAggregates {
    pub ratings: HashMap<i64, Vec<f64>>,
    pub validations: HashMap<i64, ValidationCounts>,
    /// Ratings pulled into [0, 100]
    pub clamped_ratings: usize,
}

impl FeedbackAggregates {
    /// Record one rating, clamping it to the accepted scale
    pub fn add_rating(&mut self, agent_id: i64, rating: f64) {
        let clamped = rating.clamp(MIN_RATING, MAX_RATING);
        if clamped != rating {
            self.clamped_ratings += 1;
        }
        self.ratings.entry(agent_id).or_default().push(clamped);
    }

    pub fn add_validation(&mut self, agent_id: i64, is_valid: bool) {
        let counts = self.validations.entry(agent_id).or_default();
        counts.completed += 1;
        if is_valid {
            counts.successful += 1;
        }
    }
}

/// Mean and population standard deviation
///
/// The deviation is 0 with fewer than two ratings; both are 0 with none.
pub fn rating_stats(ratings: &[f64]) -> (f64, f64) {
    if ratings.is_empty() {
        return (0.0, 0.0);
    }
    let n = ratings.len() as f64;
    let mean = ratings.iter().sum::<f64>() / n;
    if ratings.len() < 2 {
        return (mean, 0.0);
    }
    let variance = ratings.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Protocol flags advertised by one agent
pub fn protocol_flags(metadata: &AgentMetadata) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if metadata.flag("x402Support") || metadata.flag("x402support") {
        flags.push("x402");
    }
    if metadata.flag("8004Support") {
        flags.push("8004");
    }
    if metadata.flag("active") {
        flags.push("active");
    }
    flags.push("https");
    flags
}

/// One scored agent, before write-back
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedAgent {
    pub update: ScoreUpdate,
    pub category: Category,
    pub protocols: Vec<&'static str>,
}

/// Score one stored agent against the pre-pass aggregates
pub fn evaluate_agent(
    engine: &ScoreEngine,
    agent: &StoredAgent,
    aggregates: &FeedbackAggregates,
    now: DateTime<Utc>,
) -> EvaluatedAgent {
    let ratings = aggregates
        .ratings
        .get(&agent.agent_id)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let (average_rating, rating_std_dev) = rating_stats(ratings);
    let feedback_count = ratings.len() as u64;

    let validation_success_rate = aggregates
        .validations
        .get(&agent.agent_id)
        .map(ValidationCounts::success_rate)
        .unwrap_or(0.0);

    let inputs = ScoreInputs {
        average_rating,
        feedback_count,
        rating_std_dev,
        validation_success_rate,
        account_age_days: time::age_in_days(agent.registered_at.as_deref(), now),
        uptime_pct: None,
    };
    let composite_score = engine.compute_score(&inputs);
    let tier = engine.determine_tier(composite_score, feedback_count);

    let metadata = MetadataResolver::resolve_inline(&agent.agent_uri);
    let category = classify_stored_agent(&metadata, agent.description.as_deref());

    let name = agent
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| metadata.name().map(str::to_string));

    EvaluatedAgent {
        update: ScoreUpdate {
            agent_id: agent.agent_id,
            chain: agent.chain.clone(),
            name,
            category: category.as_str().to_string(),
            composite_score,
            tier,
            total_feedback: ratings.len() as i64,
            average_rating: round2(average_rating),
            validation_success_rate: round2(validation_success_rate),
            updated_at: now,
        },
        category,
        protocols: protocol_flags(&metadata),
    }
}

/// Full rescan of the agent table
pub struct BulkEvaluator<S> {
    store: S,
    engine: ScoreEngine,
    settings: EvaluationSettings,
}

impl<S: AgentStore> BulkEvaluator<S> {
    pub fn new(store: S, engine: ScoreEngine, settings: EvaluationSettings) -> Self {
        Self {
            store,
            engine,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run pre-pass and main pass once
    ///
    /// When the pre-pass cannot read the event tables the write-back pass is
    /// skipped and `prepass_incomplete` is set; scores are never written
    /// from partial aggregates.
    pub async fn run(&self) -> EvaluationSummary {
        info!("{}", "=".repeat(60));
        info!("Bulk agent evaluation");
        info!("{}", "=".repeat(60));

        info!("Loading feedback and validations...");
        let aggregates = match self.load_aggregates().await {
            Ok(aggregates) => aggregates,
            Err(e) => {
                error!(error = %e, "Event table read failed, skipping score write-back");
                let summary = EvaluationSummary {
                    prepass_incomplete: true,
                    ..EvaluationSummary::default()
                };
                log_summary(&summary);
                return summary;
            }
        };

        let mut summary = EvaluationSummary {
            agents_with_feedback: aggregates.ratings.len(),
            agents_with_validations: aggregates.validations.len(),
            clamped_ratings: aggregates.clamped_ratings,
            ..EvaluationSummary::default()
        };
        info!(
            agents_with_feedback = summary.agents_with_feedback,
            agents_with_validations = summary.agents_with_validations,
            "Aggregates loaded"
        );
        if summary.clamped_ratings > 0 {
            warn!(count = summary.clamped_ratings, "Ratings outside 0-100 were clamped");
        }

        self.score_all(&aggregates, &mut summary).await;

        log_summary(&summary);
        summary
    }

    /// Page both event tables into per-agent aggregates
    pub async fn load_aggregates(&self) -> JobResult<FeedbackAggregates> {
        let page_size = self.settings.page_size.max(1);
        let mut aggregates = FeedbackAggregates::default();

        let mut offset = 0;
        loop {
            let page = retry_fixed("reputation page", self.settings.read_retry, || {
                self.store.fetch_reputation_page(offset, page_size)
            })
            .await?;
            let page_len = page.len();
            for event in page {
                aggregates.add_rating(event.agent_id, event.rating);
            }
            if page_len < page_size {
                break;
            }
            offset += page_size;
        }

        let mut offset = 0;
        loop {
            let page = retry_fixed("validation page", self.settings.read_retry, || {
                self.store.fetch_validation_page(offset, page_size)
            })
            .await?;
            let page_len = page.len();
            for record in page {
                if let Some(is_valid) = record.is_valid {
                    aggregates.add_validation(record.agent_id, is_valid);
                }
            }
            if page_len < page_size {
                break;
            }
            offset += page_size;
        }

        Ok(aggregates)
    }

    async fn score_all(&self, aggregates: &FeedbackAggregates, summary: &mut EvaluationSummary) {
        let page_size = self.settings.page_size.max(1);
        let progress_interval = self.settings.progress_interval.max(1);
        let now = time::now();
        let mut offset = 0;
        let mut seen = 0;

        loop {
            let page = match retry_fixed("agent page", self.settings.read_retry, || {
                self.store.fetch_agents_page(offset, page_size)
            })
            .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(offset, error = %e, "Agent page read failed, stopping scan");
                    summary.scan_incomplete = true;
                    break;
                }
            };
            let page_len = page.len();

            for agent in &page {
                let evaluated = evaluate_agent(&self.engine, agent, aggregates, now);

                *summary.tiers.entry(evaluated.update.tier).or_default() += 1;
                *summary
                    .categories
                    .entry(evaluated.category.as_str().to_string())
                    .or_default() += 1;
                for flag in &evaluated.protocols {
                    *summary.protocols.entry(flag.to_string()).or_default() += 1;
                }

                match retry_fixed("score write-back", self.settings.write_retry, || {
                    self.store.update_agent_scores(&evaluated.update)
                })
                .await
                {
                    Ok(()) => summary.processed += 1,
                    Err(e) => {
                        summary.write_errors += 1;
                        warn!(
                            agent_id = agent.agent_id,
                            chain = %agent.chain,
                            error = %e,
                            "Score write-back failed, skipping agent"
                        );
                    }
                }

                seen += 1;
                if seen % progress_interval == 0 {
                    info!("Processed {} agents...", seen);
                }
            }

            if page_len < page_size {
                break;
            }
            offset += page_size;
        }
    }
}

fn log_summary(summary: &EvaluationSummary) {
    info!("{}", "=".repeat(60));
    info!("Bulk evaluation complete:");
    info!("  Agents evaluated: {}", summary.processed);
    info!("  Write errors:     {}", summary.write_errors);
    info!("  With feedback:    {}", summary.agents_with_feedback);
    info!("  With validations: {}", summary.agents_with_validations);
    if summary.prepass_incomplete {
        warn!("  Feedback or validations unreadable; no scores were written");
    }
    if summary.scan_incomplete {
        warn!("  Agent scan stopped early; rerun to score the remaining agents");
    }
    info!("  Tier distribution:");
    for (tier, count) in summary.tiers.iter().rev() {
        info!("    {:<10} {}", tier.as_str(), count);
    }
    info!("  Category distribution:");
    for (category, count) in &summary.categories {
        info!("    {:<10} {}", category, count);
    }
    info!("  Protocol support:");
    for (protocol, count) in &summary.protocols {
        info!("    {:<10} {}", protocol, count);
    }
    info!("{}", "=".repeat(60));
}
