use super::scoring::ScoringScheme;
use crate::codec::{Alphabet, EncodedSequence, Word};
use crate::error::{BlastError, Result};

/// 一次种子延伸的结果（无空位局部比对）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension<W: Word> {
    /// query 上的区间 [query_start, query_end)
    pub query_start: usize,
    pub query_end: usize,
    /// target 上的区间 [target_start, target_end)
    pub target_start: usize,
    pub target_end: usize,
    /// 原始得分
    pub score: i32,
    pub identities: usize,
    pub query_segment: EncodedSequence<W>,
    pub target_segment: EncodedSequence<W>,
}

impl<W: Word> Extension<W> {
    /// 比对长度（无空位，两侧相同）
    pub fn length(&self) -> usize {
        self.query_end - self.query_start
    }

    pub fn mismatches(&self) -> usize {
        self.length() - self.identities
    }

    pub fn percent_identity(&self) -> f64 {
        if self.length() == 0 {
            return 0.0;
        }
        100.0 * self.identities as f64 / self.length() as f64
    }
}

/// X-drop 无空位延伸器，dropoff 取自打分方案
pub struct XDropExtender<'a> {
    alphabet: &'a Alphabet,
    scheme: ScoringScheme,
}

impl<'a> XDropExtender<'a> {
    pub fn new(alphabet: &'a Alphabet, scheme: ScoringScheme) -> Self {
        Self { alphabet, scheme }
    }

    pub fn scheme(&self) -> &ScoringScheme {
        &self.scheme
    }

    pub fn extend<W: Word>(
        &self,
        query: &EncodedSequence<W>,
        query_seed_start: usize,
        query_seed_end: usize,
        target: &EncodedSequence<W>,
        target_seed_start: usize,
        target_seed_end: usize,
    ) -> Result<Extension<W>> {
        extend_seed(
            self.alphabet,
            query,
            query_seed_start,
            query_seed_end,
            target,
            target_seed_start,
            target_seed_end,
            self.scheme.x_dropoff,
            &self.scheme,
        )
    }
}

/// 从种子两端向外逐对延伸。
///
/// 每个方向维护累计得分和历史最高分；累计得分低于 `最高分 - dropoff`
/// 或碰到序列边界即停止，并回退到最高分处。返回得分 = 种子自身得分 +
/// 左右两侧各自的峰值。
pub fn extend_seed<W: Word>(
    alphabet: &Alphabet,
    query: &EncodedSequence<W>,
    query_seed_start: usize,
    query_seed_end: usize,
    target: &EncodedSequence<W>,
    target_seed_start: usize,
    target_seed_end: usize,
    dropoff: i32,
    scheme: &ScoringScheme,
) -> Result<Extension<W>> {
    if dropoff < 0 {
        return Err(BlastError::out_of_range("x-dropoff", 0, 0, i32::MAX as u64));
    }
    check_seed("query seed", query_seed_start, query_seed_end, query.len())?;
    check_seed("target seed", target_seed_start, target_seed_end, target.len())?;
    if query_seed_end - query_seed_start != target_seed_end - target_seed_start {
        return Err(BlastError::IndexOutOfBounds {
            what: "target seed (length differs from query seed)",
            start: target_seed_start,
            end: target_seed_end,
            len: target.len(),
        });
    }

    let score_at = |qi: usize, ti: usize| scheme.pair_score(query.code(qi), target.code(ti), alphabet);

    let seed_score: i32 = (0..query_seed_end - query_seed_start)
        .map(|i| score_at(query_seed_start + i, target_seed_start + i))
        .sum();

    // 左侧：i 为已延伸的长度
    let max_left = query_seed_start.min(target_seed_start);
    let (left_best, left_len) = xdrop_walk(max_left, dropoff, |i| {
        score_at(query_seed_start - i, target_seed_start - i)
    });

    // 右侧
    let max_right = (query.len() - query_seed_end).min(target.len() - target_seed_end);
    let (right_best, right_len) = xdrop_walk(max_right, dropoff, |i| {
        score_at(query_seed_end + i - 1, target_seed_end + i - 1)
    });

    let query_start = query_seed_start - left_len;
    let query_end = query_seed_end + right_len;
    let target_start = target_seed_start - left_len;
    let target_end = target_seed_end + right_len;

    let identities = (0..query_end - query_start)
        .filter(|&i| {
            let q = query.code(query_start + i);
            q == target.code(target_start + i) && alphabet.is_regular_code(q)
        })
        .count();

    Ok(Extension {
        query_start,
        query_end,
        target_start,
        target_end,
        score: seed_score + left_best + right_best,
        identities,
        query_segment: query.slice(query_start, query_end)?,
        target_segment: target.slice(target_start, target_end)?,
    })
}

fn check_seed(what: &'static str, start: usize, end: usize, len: usize) -> Result<()> {
    if start > end || end > len {
        return Err(BlastError::IndexOutOfBounds { what, start, end, len });
    }
    Ok(())
}

/// 单方向 X-drop：`pair(i)` 给出第 i 步（1 起）的得分。
/// 返回 (峰值得分, 峰值处的延伸长度)。
#[inline]
fn xdrop_walk(max_steps: usize, dropoff: i32, pair: impl Fn(usize) -> i32) -> (i32, usize) {
    let mut running = 0i32;
    let mut best = 0i32;
    let mut best_len = 0usize;
    for i in 1..=max_steps {
        running += pair(i);
        if running > best {
            best = running;
            best_len = i;
        } else if running < best - dropoff {
            break;
        }
    }
    (best, best_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SequenceEncoder;

    fn unit_scheme(dropoff: i32) -> ScoringScheme {
        ScoringScheme { match_score: 1, mismatch_penalty: 1, x_dropoff: dropoff, ..Default::default() }
    }

    fn run(q: &[u8], qs: usize, qe: usize, t: &[u8], ts: usize, te: usize, dropoff: i32) -> (Vec<u8>, Vec<u8>, Extension<u16>) {
        let dna = Alphabet::nucleotide();
        let enc = SequenceEncoder::<u16>::full_width(&dna).unwrap();
        let query = enc.encode(q).unwrap();
        let target = enc.encode(t).unwrap();
        let ext = XDropExtender::new(&dna, unit_scheme(dropoff))
            .extend(&query, qs, qe, &target, ts, te)
            .unwrap();
        (enc.decode(&ext.query_segment).unwrap(), enc.decode(&ext.target_segment).unwrap(), ext)
    }

    #[test]
    fn whole_sequence_seed_is_unchanged() {
        for s in [&b"G"[..], b"AGA", b"AACCCAA"] {
            let (q, t, ext) = run(s, 0, s.len(), s, 0, s.len(), 5);
            assert_eq!(q, s);
            assert_eq!(t, s);
            assert_eq!(ext.score, s.len() as i32);
            assert_eq!(ext.identities, s.len());
        }
    }

    #[test]
    fn trailing_mismatches_are_trimmed() {
        let (q, t, ext) = run(b"ATGCATGACTA", 2, 4, b"GTGCATGACTC", 2, 4, 10);
        assert_eq!(q, b"TGCATGACT");
        assert_eq!(t, b"TGCATGACT");
        assert_eq!((ext.query_start, ext.query_end), (1, 10));
        assert_eq!((ext.target_start, ext.target_end), (1, 10));
        assert_eq!(ext.score, 9);
        assert_eq!(ext.mismatches(), 0);
    }

    #[test]
    fn dropoff_stops_at_mismatch_run() {
        let q = b"GGGGGAAAACCCCCC";
        let t = b"GGGGGTTTTCCCCCC";
        // 4 个错配后累计 -4，低于 0 - 3
        let (_, _, ext) = run(q, 0, 5, t, 0, 5, 3);
        assert_eq!((ext.query_start, ext.query_end), (0, 5));
        assert_eq!(ext.score, 5);

        // dropoff 足够大时跨过错配区
        let (_, _, ext) = run(q, 0, 5, t, 0, 5, 5);
        assert_eq!((ext.query_start, ext.query_end), (0, 15));
        assert_eq!(ext.score, 5 - 4 + 6);
        assert_eq!(ext.identities, 11);
        assert_eq!(ext.mismatches(), 4);
    }

    #[test]
    fn offset_seeds_on_different_diagonal() {
        // target 前多 3 个碱基
        let (q, t, ext) = run(b"CCACGTACGG", 3, 7, b"TTTCCACGTACGGAA", 6, 10, 10);
        assert_eq!(q, b"CCACGTACGG");
        assert_eq!(t, b"CCACGTACGG");
        assert_eq!((ext.target_start, ext.target_end), (3, 13));
    }

    #[test]
    fn ambiguous_symbols_score_as_mismatch() {
        let (q, _, ext) = run(b"NACGTN", 1, 5, b"NACGTN", 1, 5, 10);
        assert_eq!(q, b"ACGT");
        assert_eq!(ext.score, 4);
    }

    #[test]
    fn seed_at_boundaries_does_not_extend_outward() {
        let (_, _, ext) = run(b"ACGTT", 0, 2, b"ACGTA", 0, 2, 10);
        assert_eq!(ext.query_start, 0);
        assert_eq!(ext.query_end, 4);
        let (_, _, ext) = run(b"TTACG", 3, 5, b"GTACG", 3, 5, 10);
        assert_eq!(ext.query_end, 5);
        assert_eq!(ext.query_start, 1);
    }

    #[test]
    fn negative_dropoff_is_rejected() {
        let dna = Alphabet::dna();
        let enc = SequenceEncoder::<u32>::full_width(&dna).unwrap();
        let q = enc.encode(b"ACGTACGT").unwrap();
        let scheme = unit_scheme(10);
        for dropoff in [-1, i32::MIN] {
            let r = extend_seed(&dna, &q, 2, 4, &q, 2, 4, dropoff, &scheme);
            assert!(matches!(r, Err(BlastError::OutOfRange { what: "x-dropoff", .. })));
        }
        // dropoff 为 0 合法：遇到第一个下降即停止
        let t = enc.encode(b"ACGTTCGT").unwrap();
        let ext = extend_seed(&dna, &q, 0, 2, &t, 0, 2, 0, &scheme).unwrap();
        assert_eq!((ext.query_start, ext.query_end), (0, 4));
        assert_eq!(ext.score, 4);
    }

    #[test]
    fn out_of_bounds_seed_is_rejected() {
        let dna = Alphabet::dna();
        let enc = SequenceEncoder::<u32>::full_width(&dna).unwrap();
        let q = enc.encode(b"ACGT").unwrap();
        let t = enc.encode(b"ACGTACGT").unwrap();
        let x = XDropExtender::new(&dna, ScoringScheme::default());
        assert!(matches!(x.extend(&q, 2, 5, &t, 2, 5), Err(BlastError::IndexOutOfBounds { .. })));
        assert!(matches!(x.extend(&q, 3, 2, &t, 3, 2), Err(BlastError::IndexOutOfBounds { .. })));
        assert!(matches!(x.extend(&q, 0, 2, &t, 0, 3), Err(BlastError::IndexOutOfBounds { .. })));
        assert!(matches!(x.extend(&q, 0, 4, &t, 6, 10), Err(BlastError::IndexOutOfBounds { .. })));
    }
}
