use std::fmt;

use crate::error::{BlastError, Result};

pub const MAX_ALPHABET_SIZE: usize = 256;

const NO_CODE: u16 = u16::MAX;

/// 表示一个字母表所需的最小位宽：`max(1, ceil(log2(n)))`。
///
/// 通过扫描 `n - 1` 的最高位得到 ceil(log2(n))，n 必须在 1..=256。
pub fn bits_for_alphabet_size(n: usize) -> Result<u32> {
    if n == 0 || n > MAX_ALPHABET_SIZE {
        return Err(BlastError::out_of_range("alphabet size", n as u64, 1, MAX_ALPHABET_SIZE as u64));
    }
    if n == 1 {
        return Ok(1);
    }
    Ok(usize::BITS - (n - 1).leading_zeros())
}

/// 能容纳 `total_bits` 位的最小存储字宽（8/16/32/64）。
pub fn minimal_word_width(total_bits: u32) -> Result<u32> {
    match total_bits {
        0..=8 => Ok(8),
        9..=16 => Ok(16),
        17..=32 => Ok(32),
        33..=64 => Ok(64),
        _ => Err(BlastError::out_of_range("bit width", total_bits as u64, 0, 64)),
    }
}

/// 有限、有序的符号表，符号 ↔ 编码双向查表。
///
/// 前 `regular` 个符号为“规则”符号（如 DNA 的 ACGT），其余视为歧义码：
/// 它们可以被编码和解码，但不参与种子索引和统计，延伸时总按错配计分。
#[derive(Clone)]
pub struct Alphabet {
    name: String,
    symbols: Vec<u8>,
    regular: usize,
    bits: u32,
    /// codes[symbol] = 编码值，NO_CODE 表示不在字母表中
    codes: [u16; 256],
}

impl Alphabet {
    pub fn new(name: &str, symbols: &[u8], regular: usize) -> Result<Self> {
        let bits = bits_for_alphabet_size(symbols.len())?;
        if regular > symbols.len() {
            return Err(BlastError::out_of_range(
                "regular symbol count",
                regular as u64,
                0,
                symbols.len() as u64,
            ));
        }
        let mut codes = [NO_CODE; 256];
        for (i, &s) in symbols.iter().enumerate() {
            if codes[s as usize] != NO_CODE {
                return Err(BlastError::IllegalSymbol { symbol: s, alphabet: name.to_string() });
            }
            codes[s as usize] = i as u16;
        }
        Ok(Self { name: name.to_string(), symbols: symbols.to_vec(), regular, bits, codes })
    }

    /// DNA：A=00, C=01, G=10, T=11
    pub fn dna() -> Self {
        Self::builtin("dna", b"ACGT", 4)
    }

    /// DNA 加歧义碱基 N（3 位）
    pub fn nucleotide() -> Self {
        Self::builtin("nucleotide", b"ACGTN", 4)
    }

    /// 20 种标准氨基酸 + B Z X *（5 位）
    pub fn protein() -> Self {
        Self::builtin("protein", b"ARNDCQEGHILKMFPSTWYVBZX*", 20)
    }

    /// Murphy 10 组约化蛋白字母表，每组以代表字母表示，见 [`reduce_to_murphy10`]。
    /// 另有歧义码 X（4 位）。
    pub fn murphy10() -> Self {
        Self::builtin("murphy10", b"LCAGSPFEKHX", 10)
    }

    fn builtin(name: &str, symbols: &[u8], regular: usize) -> Self {
        let mut codes = [NO_CODE; 256];
        for (i, &s) in symbols.iter().enumerate() {
            codes[s as usize] = i as u16;
        }
        let bits = usize::BITS - (symbols.len() - 1).leading_zeros();
        Self { name: name.to_string(), symbols: symbols.to_vec(), regular, bits, codes }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// 每个符号占用的位数
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn regular_len(&self) -> usize {
        self.regular
    }

    pub fn regular_symbols(&self) -> &[u8] {
        &self.symbols[..self.regular]
    }

    #[inline]
    pub fn code(&self, symbol: u8) -> Result<u8> {
        match self.codes[symbol as usize] {
            NO_CODE => Err(BlastError::IllegalSymbol { symbol, alphabet: self.name.clone() }),
            c => Ok(c as u8),
        }
    }

    #[inline]
    pub fn symbol(&self, code: u8) -> Option<u8> {
        self.symbols.get(code as usize).copied()
    }

    #[inline]
    pub fn contains(&self, symbol: u8) -> bool {
        self.codes[symbol as usize] != NO_CODE
    }

    #[inline]
    pub fn is_regular_code(&self, code: u8) -> bool {
        (code as usize) < self.regular
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alphabet")
            .field("name", &self.name)
            .field("symbols", &String::from_utf8_lossy(&self.symbols))
            .field("regular", &self.regular)
            .field("bits", &self.bits)
            .finish()
    }
}

impl PartialEq for Alphabet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.symbols == other.symbols && self.regular == other.regular
    }
}

impl Eq for Alphabet {}

/// 把蛋白序列映射到 Murphy 10 组代表字母。
/// 不属于任何组的残基（X、*、未知字母）映射为歧义码 X，长度不变。
pub fn reduce_to_murphy10(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&b| match b.to_ascii_uppercase() {
            b'L' | b'V' | b'I' | b'M' | b'J' => b'L',
            b'C' => b'C',
            b'A' => b'A',
            b'G' => b'G',
            b'S' | b'T' => b'S',
            b'P' => b'P',
            b'F' | b'Y' | b'W' => b'F',
            b'E' | b'D' | b'N' | b'Q' | b'B' | b'Z' => b'E',
            b'K' | b'R' => b'K',
            b'H' => b'H',
            _ => b'X',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_table() {
        let table = [
            (1, 1),
            (2, 1),
            (3, 2),
            (4, 2),
            (5, 3),
            (8, 3),
            (15, 4),
            (32, 5),
            (33, 6),
            (64, 6),
            (66, 7),
            (128, 7),
            (200, 8),
            (256, 8),
        ];
        for (n, bits) in table {
            assert_eq!(bits_for_alphabet_size(n).unwrap(), bits, "n={}", n);
        }
    }

    #[test]
    fn bits_match_log2_for_all_sizes() {
        for n in 1..=256usize {
            let expected = ((n as f64).log2().ceil() as u32).max(1);
            assert_eq!(bits_for_alphabet_size(n).unwrap(), expected, "n={}", n);
        }
    }

    #[test]
    fn bits_reject_out_of_range() {
        assert!(matches!(bits_for_alphabet_size(0), Err(BlastError::OutOfRange { .. })));
        assert!(matches!(bits_for_alphabet_size(257), Err(BlastError::OutOfRange { .. })));
    }

    #[test]
    fn word_width() {
        assert_eq!(minimal_word_width(0).unwrap(), 8);
        assert_eq!(minimal_word_width(8).unwrap(), 8);
        assert_eq!(minimal_word_width(9).unwrap(), 16);
        assert_eq!(minimal_word_width(16).unwrap(), 16);
        assert_eq!(minimal_word_width(31).unwrap(), 32);
        assert_eq!(minimal_word_width(64).unwrap(), 64);
        assert!(minimal_word_width(65).is_err());
    }

    #[test]
    fn dna_table() {
        let a = Alphabet::dna();
        assert_eq!(a.bits(), 2);
        for (i, &s) in b"ACGT".iter().enumerate() {
            assert_eq!(a.code(s).unwrap(), i as u8);
            assert_eq!(a.symbol(i as u8), Some(s));
        }
        assert!(matches!(a.code(b'N'), Err(BlastError::IllegalSymbol { symbol: b'N', .. })));
    }

    #[test]
    fn builtin_widths() {
        assert_eq!(Alphabet::nucleotide().bits(), 3);
        assert_eq!(Alphabet::protein().bits(), 5);
        assert_eq!(Alphabet::murphy10().bits(), 4);
        assert!(!Alphabet::nucleotide().is_regular_code(4));
        assert!(Alphabet::nucleotide().is_regular_code(3));
    }

    #[test]
    fn custom_alphabet() {
        let all: Vec<u8> = (0..=255u8).collect();
        let a = Alphabet::new("bytes", &all, 256).unwrap();
        assert_eq!(a.bits(), 8);
        assert_eq!(a.code(200).unwrap(), 200);

        assert!(matches!(
            Alphabet::new("dup", b"ACGA", 4),
            Err(BlastError::IllegalSymbol { symbol: b'A', .. })
        ));
        assert!(Alphabet::new("empty", b"", 0).is_err());
        assert!(Alphabet::new("bad", b"AC", 3).is_err());
    }

    #[test]
    fn murphy10_reduction() {
        let reduced = reduce_to_murphy10(b"MKTAYIAKQR");
        assert_eq!(reduced, b"LKSAFLAKEK");
        let a = Alphabet::murphy10();
        assert!(reduced.iter().all(|&b| a.contains(b)));
    }

    #[test]
    fn murphy10_keeps_length_for_unknown_residues() {
        let raw = b"MKXXXAYIAKQR*o";
        let reduced = reduce_to_murphy10(raw);
        assert_eq!(reduced.len(), raw.len());
        assert_eq!(reduced, b"LKXXXAFLAKEKXX");

        let a = Alphabet::murphy10();
        assert_eq!(a.regular_len(), 10);
        assert!(!a.is_regular_code(a.code(b'X').unwrap()));
    }
}
