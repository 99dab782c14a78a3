pub mod analysis;
pub mod config;
pub mod engine;
pub mod factors;
pub mod registry;
pub mod validation;

pub use analysis::{analyze, recommendations, AnalysisContext, RiskKind, RiskNote};
pub use config::*;
pub use engine::{compute_total, EvaluationTier, FactorContribution, ScoreResult, Scorer};
pub use factors::{Factor, FactorScoreSet};
pub use registry::{FactorFn, FactorInput, FactorRegistry, ScheduleLoad};
pub use validation::{validate_scoring, weight_sum_warnings};
