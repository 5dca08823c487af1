use anyhow::Result;
use std::io::Write;

use crate::align::{Hit, SearchReport, Strand};
use crate::codec::Word;

pub const TABULAR_HEADER: &str =
    "# qseqid\tsseqid\tpident\tlength\tmismatch\tgapopen\tqstart\tqend\tsstart\tsend\tevalue\tbitscore";

/// 输出坐标（1 起、闭区间）：(qstart, qend, sstart, send)。
///
/// Minus 链时 query 坐标换回原始方向，subject 坐标降序。
pub fn hit_coordinates<W: Word>(hit: &Hit<W>, query_len: usize) -> (usize, usize, usize, usize) {
    let e = &hit.extension;
    match hit.strand {
        Strand::Plus => (e.query_start + 1, e.query_end, e.target_start + 1, e.target_end),
        Strand::Minus => (query_len - e.query_end + 1, query_len - e.query_start, e.target_end, e.target_start + 1),
    }
}

pub fn format_evalue(evalue: f64) -> String {
    if evalue < 1e-180 {
        "0.0".to_string()
    } else if evalue < 0.01 {
        format!("{:.2e}", evalue)
    } else {
        format!("{:.3}", evalue)
    }
}

/// 按 outfmt 6 的 12 列写出一个查询的全部命中
pub fn write_tabular<W: Word, O: Write>(out: &mut O, query_name: &str, report: &SearchReport<W>) -> Result<()> {
    for subject in &report.subjects {
        for hit in &subject.hits {
            let (qs, qe, ss, se) = hit_coordinates(hit, report.query_len);
            let e = &hit.extension;
            writeln!(
                out,
                "{}\t{}\t{:.2}\t{}\t{}\t0\t{}\t{}\t{}\t{}\t{}\t{:.1}",
                query_name,
                subject.name,
                e.percent_identity(),
                e.length(),
                e.mismatches(),
                qs,
                qe,
                ss,
                se,
                format_evalue(hit.evalue),
                hit.bit_score
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{CancelToken, ScoringScheme, SearchOpt, Searcher};
    use crate::codec::{Alphabet, SequenceEncoder};
    use crate::index::{Database, SeedIndex};
    use crate::util::dna;

    const REF: &[u8] = b"GATTACACCGTAGCTAGCTTGACCGATCGGCTAACGTTAGCCATGCAAGTCCGATGACTGGACTTACGGATCCAGTTGCAACGTAGGCTTAAC";

    fn search(query: &[u8]) -> SearchReport<u32> {
        let dna = Alphabet::dna();
        let enc = SequenceEncoder::<u32>::full_width(&dna).unwrap();
        let mut db = Database::new();
        db.push(&enc, "chrT", REF).unwrap();
        let idx = SeedIndex::build(&db, &dna, 8).unwrap();
        let opt = SearchOpt {
            scheme: ScoringScheme { word_size: 8, evalue_threshold: 1e-3, ..Default::default() },
            threads: 1,
            both_strands: true,
        };
        let searcher = Searcher::new(&db, &idx, &dna, opt).unwrap();
        searcher.search(query, &CancelToken::new()).unwrap()
    }

    fn rows(query: &[u8]) -> Vec<Vec<String>> {
        let report = search(query);
        let mut out = Vec::new();
        write_tabular(&mut out, "q1", &report).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| l.split('\t').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn plus_strand_row() {
        let rows = rows(&REF[20..60]);
        let r = &rows[0];
        assert_eq!(r.len(), 12);
        assert_eq!(&r[..10], ["q1", "chrT", "100.00", "40", "0", "0", "1", "40", "21", "60"]);
    }

    #[test]
    fn minus_strand_row_has_descending_subject() {
        let q = dna::revcomp(&REF[20..60]);
        let rows = rows(&q);
        let r = &rows[0];
        assert_eq!(&r[6..10], ["1", "40", "60", "21"]);
    }

    #[test]
    fn evalue_formatting() {
        assert_eq!(format_evalue(0.0), "0.0");
        assert_eq!(format_evalue(3.5e-20), "3.50e-20");
        assert_eq!(format_evalue(0.5), "0.500");
    }
}
