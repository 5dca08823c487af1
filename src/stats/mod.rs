//! Karlin-Altschul 统计：原始得分 → bit score → E 值。

pub mod context;
pub mod karlin;

pub use context::{
    length_adjustment, minimal_nominal_score_for_evalue, to_evalue, to_normalized_score, StatisticsContext,
};
pub use karlin::{k_constant, relative_entropy, score_probabilities, solve_lambda, KarlinParams, ScoreDistribution};
