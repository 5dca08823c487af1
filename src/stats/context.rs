use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use super::karlin::{score_probabilities, KarlinParams};
use crate::align::ScoringScheme;
use crate::codec::Alphabet;
use crate::error::Result;

const LENGTH_ADJUSTMENT_ITER: usize = 5;

/// 有限长度的边缘效应修正，固定 5 次不动点迭代：
/// ell = (log K + ln((m - ell)(n - N·ell))) / H
pub fn length_adjustment(params: &KarlinParams, query_len: u64, db_len: u64, num_seqs: u64) -> u64 {
    let m = query_len as f64;
    let n = db_len as f64;
    let seqs = num_seqs as f64;
    if m <= 0.0 || n <= 0.0 || params.h <= 0.0 {
        return 0;
    }

    let mut ell = 0.0f64;
    for _ in 0..LENGTH_ADJUSTMENT_ITER {
        let space = (m - ell) * (n - seqs * ell);
        if space <= 0.0 {
            break;
        }
        let next = (params.log_k + space.ln()) / params.h;
        ell = next.clamp(0.0, m);
    }
    ell.floor() as u64
}

/// (nominal·λ − log K) / ln 2
#[inline]
pub fn to_normalized_score(nominal: i32, lambda: f64, log_k: f64) -> f64 {
    (nominal as f64 * lambda - log_k) / LN_2
}

/// searchSpace / 2^bits
#[inline]
pub fn to_evalue(normalized: f64, search_space: f64) -> f64 {
    search_space / normalized.exp2()
}

/// 达到给定 E 值所需的最小原始得分（向上取整）
pub fn minimal_nominal_score_for_evalue(evalue: f64, lambda: f64, log_k: f64, search_space: f64) -> i32 {
    let bits = (search_space / evalue).log2();
    let nominal = (bits * LN_2 + log_k) / lambda;
    // 吸收浮点误差，避免恰好整数的得分被进一位
    (nominal - 1e-9).ceil() as i32
}

/// 单个查询的统计上下文：构造一次，之后只读。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsContext {
    pub params: KarlinParams,
    pub length_adjustment: u64,
    pub effective_query_len: u64,
    pub effective_db_len: u64,
    pub search_space: f64,
}

impl StatisticsContext {
    pub fn new(
        scheme: &ScoringScheme,
        alphabet: &Alphabet,
        query: &[u8],
        db_len: u64,
        num_seqs: u64,
    ) -> Result<Self> {
        let dist = score_probabilities(scheme, alphabet, query)?;
        let params = KarlinParams::from_distribution(&dist)?;
        Ok(Self::from_params(params, query.len() as u64, db_len, num_seqs))
    }

    pub fn from_params(params: KarlinParams, query_len: u64, db_len: u64, num_seqs: u64) -> Self {
        let adj = length_adjustment(&params, query_len, db_len, num_seqs);
        let effective_query_len = query_len.saturating_sub(adj).max(1);
        let effective_db_len = db_len.saturating_sub(num_seqs.saturating_mul(adj)).max(1);
        Self {
            params,
            length_adjustment: adj,
            effective_query_len,
            effective_db_len,
            search_space: effective_query_len as f64 * effective_db_len as f64,
        }
    }

    pub fn bit_score(&self, nominal: i32) -> f64 {
        to_normalized_score(nominal, self.params.lambda, self.params.log_k)
    }

    pub fn evalue(&self, nominal: i32) -> f64 {
        to_evalue(self.bit_score(nominal), self.search_space)
    }

    pub fn minimal_nominal_score(&self, evalue: f64) -> i32 {
        minimal_nominal_score_for_evalue(evalue, self.params.lambda, self.params.log_k, self.search_space)
    }

    /// 在阈值下可能显著的最短无错配长度；更短的种子不值得延伸
    pub fn minimum_reportable_length(&self, evalue_threshold: f64, match_score: i32) -> usize {
        let score = self.minimal_nominal_score(evalue_threshold).max(0);
        (score / match_score.max(1)) as usize
    }
}
