use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::extend::{Extension, XDropExtender};
use super::scoring::ScoringScheme;
use super::seed::{find_seed_hits, group_by_diagonal, SeedHit};
use crate::codec::{Alphabet, EncodedSequence, SequenceEncoder, Word};
use crate::error::{BlastError, Result};
use crate::index::{Database, SeedIndex};
use crate::stats::StatisticsContext;
use crate::util::dna;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strand {
    Plus,
    Minus,
}

/// 检索参数
#[derive(Clone, Debug)]
pub struct SearchOpt {
    pub scheme: ScoringScheme,
    /// 工作线程数，0 表示使用全局线程池（CPU 并行度）
    pub threads: usize,
    /// 核酸查询同时检索反向互补链
    pub both_strands: bool,
}

impl Default for SearchOpt {
    fn default() -> Self {
        Self { scheme: ScoringScheme::default(), threads: 0, both_strands: true }
    }
}

/// 一条达到阈值的比对
#[derive(Debug, Clone)]
pub struct Hit<W: Word> {
    pub strand: Strand,
    /// Minus 链时 query 坐标相对于反向互补后的 query
    pub extension: Extension<W>,
    pub bit_score: f64,
    pub evalue: f64,
}

/// 同一条参考序列上的全部命中，按 E 值升序
#[derive(Debug, Clone)]
pub struct SubjectHits<W: Word> {
    pub seq_id: u32,
    pub name: String,
    pub len: usize,
    pub hits: Vec<Hit<W>>,
}

#[derive(Debug, Clone)]
pub struct SearchReport<W: Word> {
    pub query_len: usize,
    pub stats: StatisticsContext,
    /// 查到的种子总数（延伸前）
    pub seeds: usize,
    pub subjects: Vec<SubjectHits<W>>,
    /// 被取消的查询不带任何结果
    pub cancelled: bool,
}

impl<W: Word> SearchReport<W> {
    pub fn num_hits(&self) -> usize {
        self.subjects.iter().map(|s| s.hits.len()).sum()
    }
}

/// 查询级的协作式取消标记
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 单次查询的检索流程：编码 → 查种子 → X-drop 延伸 → E 值过滤。
///
/// 索引与参考集合只读共享；每个 (序列, 对角线) 分组是一个并行任务。
pub struct Searcher<'a, W: Word> {
    db: &'a Database<W>,
    index: &'a SeedIndex<W>,
    alphabet: &'a Alphabet,
    encoder: SequenceEncoder<'a, W>,
    opt: SearchOpt,
    pool: Option<rayon::ThreadPool>,
}

type Found<W> = Vec<(u32, Hit<W>)>;

impl<'a, W: Word> Searcher<'a, W> {
    pub fn new(db: &'a Database<W>, index: &'a SeedIndex<W>, alphabet: &'a Alphabet, opt: SearchOpt) -> Result<Self> {
        opt.scheme.validate()?;
        if opt.scheme.word_size != index.word_size() {
            return Err(BlastError::out_of_range(
                "word size",
                opt.scheme.word_size as u64,
                index.word_size() as u64,
                index.word_size() as u64,
            ));
        }
        if alphabet.bits() != index.bits() {
            return Err(BlastError::out_of_range(
                "alphabet bit width",
                alphabet.bits() as u64,
                index.bits() as u64,
                index.bits() as u64,
            ));
        }
        if let Some(built) = index.alphabet() {
            if built.symbols() != alphabet.symbols() || built.regular_len() != alphabet.regular_len() {
                return Err(BlastError::AlphabetMismatch {
                    expected: built.name().to_string(),
                    found: alphabet.name().to_string(),
                });
            }
        }
        let encoder = SequenceEncoder::full_width(alphabet)?;
        let pool = if opt.threads > 0 {
            let p = rayon::ThreadPoolBuilder::new()
                .num_threads(opt.threads)
                .build()
                .map_err(|e| BlastError::WorkerPool(e.to_string()))?;
            Some(p)
        } else {
            None
        };
        Ok(Self { db, index, alphabet, encoder, opt, pool })
    }

    pub fn opt(&self) -> &SearchOpt {
        &self.opt
    }

    pub fn search(&self, query: &[u8], cancel: &CancelToken) -> Result<SearchReport<W>> {
        let scheme = &self.opt.scheme;
        let stats =
            StatisticsContext::new(scheme, self.alphabet, query, self.db.total_len(), self.db.len() as u64)?;
        let min_len = stats
            .minimum_reportable_length(scheme.evalue_threshold, scheme.match_score)
            .max(scheme.word_size);

        log::debug!(
            "query len={} lambda={:.4} K={:.4} H={:.4} search_space={:.3e} min_len={}",
            query.len(),
            stats.params.lambda,
            stats.params.k,
            stats.params.h,
            stats.search_space,
            min_len
        );

        let mut report = SearchReport { query_len: query.len(), stats, seeds: 0, subjects: Vec::new(), cancelled: false };
        if query.len() < min_len {
            return Ok(report);
        }

        let mut strands = vec![(Strand::Plus, query.to_vec())];
        if self.opt.both_strands && is_nucleotide(self.alphabet) {
            strands.push((Strand::Minus, dna::revcomp(query)));
        }

        let mut found: Found<W> = Vec::new();
        for (strand, symbols) in strands {
            if cancel.is_cancelled() {
                return Ok(cancelled(report));
            }
            let encoded = self.encoder.encode(&symbols)?;
            let hits = find_seed_hits(self.index, self.alphabet, &encoded)?;
            report.seeds += hits.len();
            let groups = group_by_diagonal(hits);

            let run = || self.extend_groups(&encoded, groups, strand, &stats, min_len, cancel);
            let part = match &self.pool {
                Some(pool) => pool.install(run)?,
                None => run()?,
            };
            match part {
                Some(v) => found.extend(v),
                None => return Ok(cancelled(report)),
            }
        }

        report.subjects = self.collect_subjects(found);
        log::debug!(
            "query len={} seeds={} hits={} subjects={}",
            query.len(),
            report.seeds,
            report.num_hits(),
            report.subjects.len()
        );
        Ok(report)
    }

    /// 延伸所有分组；取消时返回 None
    fn extend_groups(
        &self,
        query: &EncodedSequence<W>,
        groups: Vec<Vec<SeedHit>>,
        strand: Strand,
        stats: &StatisticsContext,
        min_len: usize,
        cancel: &CancelToken,
    ) -> Result<Option<Found<W>>> {
        let extender = XDropExtender::new(self.alphabet, self.opt.scheme);
        let threshold = self.opt.scheme.evalue_threshold;

        let per_group = groups
            .into_par_iter()
            .map(|group| -> Result<Option<Found<W>>> {
                if cancel.is_cancelled() {
                    return Ok(None);
                }
                let seq_id = group[0].seq_id;
                let rec = self.db.get(seq_id).ok_or(BlastError::IndexOutOfBounds {
                    what: "subject id",
                    start: seq_id as usize,
                    end: seq_id as usize + 1,
                    len: self.db.len(),
                })?;
                let mut out = Vec::new();
                if rec.seq.len() < min_len {
                    return Ok(Some(out));
                }

                // 同一对角线上已被前一次延伸覆盖的种子不再延伸
                let mut covered_end = 0usize;
                for seed in group {
                    if seed.query_offset + seed.len <= covered_end {
                        continue;
                    }
                    let ext = extender.extend(
                        query,
                        seed.query_offset,
                        seed.query_offset + seed.len,
                        &rec.seq,
                        seed.target_offset,
                        seed.target_offset + seed.len,
                    )?;
                    covered_end = ext.query_end;
                    let evalue = stats.evalue(ext.score);
                    if evalue <= threshold {
                        let hit = Hit { strand, bit_score: stats.bit_score(ext.score), evalue, extension: ext };
                        out.push((seq_id, hit));
                    }
                }
                Ok(Some(out))
            })
            .collect::<Result<Vec<_>>>()?;

        if cancel.is_cancelled() || per_group.iter().any(Option::is_none) {
            return Ok(None);
        }
        Ok(Some(per_group.into_iter().flatten().flatten().collect()))
    }

    fn collect_subjects(&self, found: Found<W>) -> Vec<SubjectHits<W>> {
        let mut by_subject: BTreeMap<u32, Vec<Hit<W>>> = BTreeMap::new();
        for (seq_id, hit) in found {
            by_subject.entry(seq_id).or_default().push(hit);
        }

        let mut subjects: Vec<SubjectHits<W>> = by_subject
            .into_iter()
            .filter_map(|(seq_id, mut hits)| {
                let rec = self.db.get(seq_id)?;
                hits.sort_by(|a, b| {
                    a.evalue
                        .total_cmp(&b.evalue)
                        .then(b.extension.score.cmp(&a.extension.score))
                        .then(a.extension.query_start.cmp(&b.extension.query_start))
                        .then(a.extension.target_start.cmp(&b.extension.target_start))
                });
                Some(SubjectHits { seq_id, name: rec.name.clone(), len: rec.seq.len(), hits })
            })
            .collect();

        subjects.sort_by(|a, b| {
            let (ea, eb) = (a.hits[0].evalue, b.hits[0].evalue);
            ea.total_cmp(&eb)
                .then(b.hits[0].extension.score.cmp(&a.hits[0].extension.score))
                .then(a.seq_id.cmp(&b.seq_id))
        });
        subjects
    }
}

fn cancelled<W: Word>(mut report: SearchReport<W>) -> SearchReport<W> {
    report.subjects.clear();
    report.cancelled = true;
    report
}

fn is_nucleotide(alphabet: &Alphabet) -> bool {
    alphabet.regular_symbols() == b"ACGT"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reference(len: usize, seed: u32) -> Vec<u8> {
        let bases = [b'A', b'C', b'G', b'T'];
        let mut x = seed;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                bases[(x >> 16) as usize % 4]
            })
            .collect()
    }

    fn setup(alphabet: &Alphabet, refs: &[Vec<u8>], word_size: usize) -> (Database<u64>, SeedIndex<u64>) {
        let enc = SequenceEncoder::<u64>::full_width(alphabet).unwrap();
        let mut db = Database::new();
        for (i, r) in refs.iter().enumerate() {
            db.push(&enc, &format!("ref{}", i), r).unwrap();
        }
        let idx = SeedIndex::build(&db, alphabet, word_size).unwrap();
        (db, idx)
    }

    fn opt(word_size: usize, threads: usize) -> SearchOpt {
        SearchOpt {
            scheme: ScoringScheme { word_size, evalue_threshold: 1e-3, ..Default::default() },
            threads,
            both_strands: true,
        }
    }

    #[test]
    fn finds_embedded_query() {
        let dna = Alphabet::dna();
        let refs = vec![make_reference(2_000, 1), make_reference(2_000, 2), make_reference(2_000, 3)];
        let (db, idx) = setup(&dna, &refs, 11);
        let query = refs[1][700..820].to_vec();

        let searcher = Searcher::new(&db, &idx, &dna, opt(11, 2)).unwrap();
        let report = searcher.search(&query, &CancelToken::new()).unwrap();
        assert!(!report.cancelled);
        assert!(report.seeds >= 110);

        let best = &report.subjects[0];
        assert_eq!(best.name, "ref1");
        let hit = &best.hits[0];
        assert_eq!(hit.strand, Strand::Plus);
        assert_eq!((hit.extension.query_start, hit.extension.query_end), (0, 120));
        assert_eq!((hit.extension.target_start, hit.extension.target_end), (700, 820));
        assert_eq!(hit.extension.score, 120);
        assert!(hit.evalue < 1e-20);
        // 一条对角线上的 110 个种子只产生一次延伸
        assert_eq!(best.hits.iter().filter(|h| h.strand == Strand::Plus && h.extension.score == 120).count(), 1);
    }

    #[test]
    fn finds_reverse_complement() {
        let dna = Alphabet::dna();
        let refs = vec![make_reference(3_000, 7)];
        let (db, idx) = setup(&dna, &refs, 11);
        let query = dna::revcomp(&refs[0][1_000..1_100]);

        let searcher = Searcher::new(&db, &idx, &dna, opt(11, 0)).unwrap();
        let report = searcher.search(&query, &CancelToken::new()).unwrap();
        let hit = &report.subjects[0].hits[0];
        assert_eq!(hit.strand, Strand::Minus);
        assert_eq!((hit.extension.target_start, hit.extension.target_end), (1_000, 1_100));

        let plus_only = SearchOpt { both_strands: false, ..opt(11, 0) };
        let searcher = Searcher::new(&db, &idx, &dna, plus_only).unwrap();
        let report = searcher.search(&query, &CancelToken::new()).unwrap();
        assert!(report.subjects.iter().all(|s| s.hits.iter().all(|h| h.strand == Strand::Plus)));
    }

    #[test]
    fn unrelated_query_reports_nothing() {
        let dna = Alphabet::dna();
        let refs = vec![make_reference(1_000, 11)];
        let (db, idx) = setup(&dna, &refs, 11);
        let query = make_reference(60, 99);
        let searcher = Searcher::new(&db, &idx, &dna, opt(11, 0)).unwrap();
        let report = searcher.search(&query, &CancelToken::new()).unwrap();
        assert_eq!(report.num_hits(), 0);
    }

    #[test]
    fn short_query_is_skipped() {
        let dna = Alphabet::dna();
        let refs = vec![make_reference(1_000, 5)];
        let (db, idx) = setup(&dna, &refs, 11);
        let searcher = Searcher::new(&db, &idx, &dna, opt(11, 0)).unwrap();
        let report = searcher.search(&refs[0][10..18], &CancelToken::new()).unwrap();
        assert_eq!(report.seeds, 0);
        assert!(report.subjects.is_empty());
    }

    #[test]
    fn cancelled_query_discards_results() {
        let dna = Alphabet::dna();
        let refs = vec![make_reference(2_000, 3)];
        let (db, idx) = setup(&dna, &refs, 11);
        let token = CancelToken::new();
        token.cancel();
        let searcher = Searcher::new(&db, &idx, &dna, opt(11, 0)).unwrap();
        let report = searcher.search(&refs[0][100..300], &token).unwrap();
        assert!(report.cancelled);
        assert!(report.subjects.is_empty());
    }

    #[test]
    fn hits_sorted_by_evalue() {
        let dna = Alphabet::dna();
        let base = make_reference(1_500, 21);
        let mut weaker = make_reference(1_500, 22);
        weaker[200..260].copy_from_slice(&base[400..460]);
        let refs = vec![weaker, base.clone()];
        let (db, idx) = setup(&dna, &refs, 11);
        let query = base[300..500].to_vec();

        let searcher = Searcher::new(&db, &idx, &dna, opt(11, 0)).unwrap();
        let report = searcher.search(&query, &CancelToken::new()).unwrap();
        assert_eq!(report.subjects[0].seq_id, 1);
        assert!(report.subjects.iter().any(|s| s.seq_id == 0));
        for w in report.subjects.windows(2) {
            assert!(w[0].hits[0].evalue <= w[1].hits[0].evalue);
        }
        for s in &report.subjects {
            for w in s.hits.windows(2) {
                assert!(w[0].evalue <= w[1].evalue);
            }
        }
    }

    #[test]
    fn mismatched_configuration_is_rejected() {
        let dna = Alphabet::dna();
        let refs = vec![make_reference(500, 1)];
        let (db, idx) = setup(&dna, &refs, 11);
        assert!(Searcher::new(&db, &idx, &dna, opt(12, 0)).is_err());
        let protein = Alphabet::protein();
        assert!(Searcher::new(&db, &idx, &protein, opt(11, 0)).is_err());
    }

    #[test]
    fn same_width_different_alphabet_is_rejected() {
        // protein 与这个 24 符号字母表都是 5 位，但符号表不同
        let protein = Alphabet::protein();
        let other = Alphabet::new("shuffled", b"RANDCQEGHILKMFPSTWYVBZX*", 20).unwrap();
        assert_eq!(protein.bits(), other.bits());

        let enc = SequenceEncoder::<u64>::full_width(&protein).unwrap();
        let mut db = Database::new();
        db.push(&enc, "p", b"MKTAYIAKQRQISFVKSHFSRQ").unwrap();
        let idx = SeedIndex::build(&db, &protein, 3).unwrap();

        let o = SearchOpt { scheme: ScoringScheme { word_size: 3, ..Default::default() }, threads: 0, both_strands: true };
        assert!(matches!(
            Searcher::new(&db, &idx, &other, o.clone()),
            Err(BlastError::AlphabetMismatch { .. })
        ));
        assert!(Searcher::new(&db, &idx, &protein, o).is_ok());
    }
}
