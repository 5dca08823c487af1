use serde::{Deserialize, Serialize};

use crate::codec::Alphabet;
use crate::error::{BlastError, Result};

/// 简单 match/mismatch 打分方案及检索参数
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringScheme {
    /// 匹配得分（正数）
    pub match_score: i32,
    /// 错配罚分（正数，计分时取负）
    pub mismatch_penalty: i32,
    /// X-drop 阈值
    pub x_dropoff: i32,
    /// 种子 k-mer 长度
    pub word_size: usize,
    /// 报告阈值
    pub evalue_threshold: f64,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_penalty: 2,
            x_dropoff: 20,
            word_size: 11,
            evalue_threshold: 10.0,
        }
    }
}

impl ScoringScheme {
    pub fn validate(&self) -> Result<()> {
        if self.match_score <= 0 {
            return Err(BlastError::out_of_range("match score", 0, 1, i32::MAX as u64));
        }
        if self.mismatch_penalty <= 0 {
            return Err(BlastError::out_of_range("mismatch penalty", 0, 1, i32::MAX as u64));
        }
        if self.x_dropoff < 0 {
            return Err(BlastError::out_of_range("x-dropoff", 0, 0, i32::MAX as u64));
        }
        if self.word_size == 0 {
            return Err(BlastError::out_of_range("word size", 0, 1, 64));
        }
        if !(self.evalue_threshold.is_finite() && self.evalue_threshold > 0.0) {
            return Err(BlastError::out_of_range("e-value threshold", 0, 1, u64::MAX));
        }
        Ok(())
    }

    #[inline]
    pub fn mismatch_score(&self) -> i32 {
        -self.mismatch_penalty
    }

    pub fn min_score(&self) -> i32 {
        self.mismatch_score()
    }

    pub fn max_score(&self) -> i32 {
        self.match_score
    }

    /// 一对编码的得分；歧义码与任何符号（包括自身）都按错配计
    #[inline]
    pub fn pair_score(&self, a: u8, b: u8, alphabet: &Alphabet) -> i32 {
        if a == b && alphabet.is_regular_code(a) {
            self.match_score
        } else {
            self.mismatch_score()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let s = ScoringScheme::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.min_score(), -2);
        assert_eq!(s.max_score(), 1);
    }

    #[test]
    fn rejects_non_positive_values() {
        let bad = [
            ScoringScheme { match_score: 0, ..Default::default() },
            ScoringScheme { mismatch_penalty: 0, ..Default::default() },
            ScoringScheme { x_dropoff: -1, ..Default::default() },
            ScoringScheme { word_size: 0, ..Default::default() },
            ScoringScheme { evalue_threshold: 0.0, ..Default::default() },
            ScoringScheme { evalue_threshold: f64::NAN, ..Default::default() },
        ];
        for s in bad {
            assert!(matches!(s.validate(), Err(BlastError::OutOfRange { .. })), "{:?}", s);
        }
    }

    #[test]
    fn ambiguous_codes_never_match() {
        let nt = Alphabet::nucleotide();
        let s = ScoringScheme::default();
        let n = nt.code(b'N').unwrap();
        let a = nt.code(b'A').unwrap();
        assert_eq!(s.pair_score(a, a, &nt), 1);
        assert_eq!(s.pair_score(n, n, &nt), -2);
        assert_eq!(s.pair_score(a, n, &nt), -2);
    }
}
