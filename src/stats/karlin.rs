//! Karlin-Altschul 参数：得分分布、λ、H、K。
//!
//! 得分区间小而稠密，分布用 `score - min_score` 下标的连续数组保存。

use serde::{Deserialize, Serialize};

use crate::align::ScoringScheme;
use crate::codec::Alphabet;
use crate::error::{BlastError, Result};

const LAMBDA_START: f64 = 0.5;
const LAMBDA_ITER_MAX: usize = 20;
const LAMBDA_ACCURACY: f64 = 1.0e-5;
const BISECTION_ITER: usize = 60;
const MAX_DOUBLINGS: usize = 64;

/// 整数得分上的概率分布
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDistribution {
    min_score: i32,
    probs: Vec<f64>,
}

impl ScoreDistribution {
    pub fn new(min_score: i32, max_score: i32) -> Self {
        let range = (max_score - min_score).max(0) as usize + 1;
        Self { min_score, probs: vec![0.0; range] }
    }

    pub fn min_score(&self) -> i32 {
        self.min_score
    }

    pub fn max_score(&self) -> i32 {
        self.min_score + self.probs.len() as i32 - 1
    }

    pub fn prob(&self, score: i32) -> f64 {
        if score < self.min_score {
            return 0.0;
        }
        self.probs.get((score - self.min_score) as usize).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, score: i32, p: f64) {
        if let Some(slot) = self.probs.get_mut((score - self.min_score) as usize) {
            *slot += p;
        }
    }

    /// (score, probability)，跳过零概率
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.probs
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > 0.0)
            .map(move |(i, &p)| (self.min_score + i as i32, p))
    }

    pub fn total(&self) -> f64 {
        self.probs.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.iter().map(|(s, p)| s as f64 * p).sum()
    }

    /// Σ p_i · e^{λ·i}
    fn phi(&self, lambda: f64) -> f64 {
        self.iter().map(|(s, p)| p * (lambda * s as f64).exp()).sum()
    }

    /// Σ i · p_i · e^{λ·i}
    fn phi_prime(&self, lambda: f64) -> f64 {
        self.iter().map(|(s, p)| s as f64 * p * (lambda * s as f64).exp()).sum()
    }
}

/// 成对得分分布：target 在规则符号上均匀分布，按 query 的实际组成加权。
///
/// 歧义码不计入归一化分母。
pub fn score_probabilities(scheme: &ScoringScheme, alphabet: &Alphabet, query: &[u8]) -> Result<ScoreDistribution> {
    let regular = alphabet.regular_len();
    let mut counts = vec![0u64; regular];
    for &s in query {
        if let Ok(c) = alphabet.code(s) {
            if alphabet.is_regular_code(c) {
                counts[c as usize] += 1;
            }
        }
    }
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return Err(BlastError::out_of_range("regular query symbols", 0, 1, u64::MAX));
    }

    let mut dist = ScoreDistribution::new(scheme.min_score(), scheme.max_score());
    let target_p = 1.0 / regular as f64;
    for (a, &n) in counts.iter().enumerate() {
        if n == 0 {
            continue;
        }
        let freq = n as f64 / total as f64;
        for b in 0..regular {
            dist.add(scheme.pair_score(a as u8, b as u8, alphabet), freq * target_p);
        }
    }
    Ok(dist)
}

/// 求 Σ p_i·e^{λ·i} = 1 的正根。
///
/// 先从固定起点做 Newton-Raphson；导数非正、步进结果非正或迭代不收敛时
/// 改用二分：上界倍增直到和超过 1，再固定次数二分。
pub fn solve_lambda(dist: &ScoreDistribution) -> Result<f64> {
    if dist.max_score() <= 0 || dist.prob(dist.max_score()) <= 0.0 {
        return Err(BlastError::NumericDivergence("no positive score is possible".to_string()));
    }
    if dist.mean() >= 0.0 {
        return Err(BlastError::NumericDivergence(format!(
            "expected score {:.4} is not negative",
            dist.mean()
        )));
    }

    let mut lambda = LAMBDA_START;
    for _ in 0..LAMBDA_ITER_MAX {
        let f = dist.phi(lambda) - 1.0;
        let df = dist.phi_prime(lambda);
        if df <= 0.0 {
            break;
        }
        let next = lambda - f / df;
        if !next.is_finite() || next <= 0.0 {
            break;
        }
        if (next - lambda).abs() < LAMBDA_ACCURACY {
            return Ok(next);
        }
        lambda = next;
    }

    lambda_bisection(dist)
}

fn lambda_bisection(dist: &ScoreDistribution) -> Result<f64> {
    let mut hi = 1.0f64;
    let mut doublings = 0;
    while dist.phi(hi) <= 1.0 {
        hi *= 2.0;
        doublings += 1;
        if doublings > MAX_DOUBLINGS || !hi.is_finite() {
            return Err(BlastError::NumericDivergence("cannot bracket lambda".to_string()));
        }
    }
    let mut lo = 0.0f64;
    for _ in 0..BISECTION_ITER {
        let mid = 0.5 * (lo + hi);
        if dist.phi(mid) > 1.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let lambda = 0.5 * (lo + hi);
    if lambda.is_finite() && lambda > 0.0 {
        Ok(lambda)
    } else {
        Err(BlastError::NumericDivergence(format!("bisection ended at lambda={}", lambda)))
    }
}

/// H = λ · Σ i · p_i · e^{λ·i}
pub fn relative_entropy(dist: &ScoreDistribution, lambda: f64) -> f64 {
    lambda * dist.phi_prime(lambda)
}

/// K = (H/λ)·(1 − e^{−λ})，仅适用于最低分 −1 或最高分 1 的简单方案
pub fn k_constant(dist: &ScoreDistribution, lambda: f64, h: f64) -> Result<f64> {
    if dist.min_score() != -1 && dist.max_score() != 1 {
        return Err(BlastError::NotImplemented(format!(
            "K for score range [{}, {}]",
            dist.min_score(),
            dist.max_score()
        )));
    }
    Ok((h / lambda) * (1.0 - (-lambda).exp()))
}

/// λ、K、H 三元组
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KarlinParams {
    pub lambda: f64,
    pub k: f64,
    pub log_k: f64,
    pub h: f64,
}

impl KarlinParams {
    pub fn from_distribution(dist: &ScoreDistribution) -> Result<Self> {
        let lambda = solve_lambda(dist)?;
        let h = relative_entropy(dist, lambda);
        let k = k_constant(dist, lambda, h)?;
        Ok(Self { lambda, k, log_k: k.ln(), h })
    }
}
