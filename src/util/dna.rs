/// 大写化；U → T，其余非 ACGTN 字符映射为 N
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&b| {
            let up = b.to_ascii_uppercase();
            match up {
                b'A' | b'C' | b'G' | b'T' | b'N' => up,
                b'U' => b'T',
                _ => b'N',
            }
        })
        .collect()
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_rna_and_unknowns() {
        assert_eq!(normalize_seq(b"acguRYn"), b"ACGTNNN".to_vec());
    }

    #[test]
    fn revcomp_is_involution() {
        let s = b"AACGTTTGCAN";
        assert_eq!(revcomp(s), b"NTGCAAACGTT".to_vec());
        assert_eq!(revcomp(&revcomp(s)), s.to_vec());
    }
}
