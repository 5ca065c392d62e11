//! Service modules for the oracle jobs
//!
//! - Indexer client and metadata resolution (network edge)
//! - Category classification and scoring (pure)
//! - The two batch pipelines built on top of them

pub mod bulk_evaluator;
pub mod category_classifier;
pub mod metadata_resolver;
pub mod score_engine;
pub mod subgraph_client;
pub mod sync_pipeline;

pub use bulk_evaluator::{BulkEvaluator, EvaluatedAgent, FeedbackAggregates, ValidationCounts};
pub use category_classifier::{classify_registry_metadata, classify_stored_agent, classify_text, Category};
pub use metadata_resolver::MetadataResolver;
pub use score_engine::{ScoreEngine, ScoreInputs, ScoreWeights, ScoringConfig, SubScores, TierRule};
pub use subgraph_client::{RegistryIndexer, SubgraphClient};
pub use sync_pipeline::{FetchOutcome, SyncPipeline};
