use std::marker::PhantomData;

use super::alphabet::Alphabet;
use super::word::{low_mask, Word};
use crate::error::{BlastError, Result};

/// 按定宽字打包的序列。
///
/// 每个字从高位起存放 `window` 个符号，最后一个字不足时低位补零；
/// `len` 保存精确的符号数，解码时不会把补齐位当作数据。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedSequence<W: Word> {
    len: usize,
    bits: u32,
    window: usize,
    words: Vec<W>,
}

impl<W: Word> EncodedSequence<W> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn window_size(&self) -> usize {
        self.window
    }

    /// 仅数据字（不含长度字）
    pub fn words(&self) -> &[W] {
        &self.words
    }

    /// 取第 i 个符号的编码，只读取它所在的那个字。越界返回 `IndexOutOfBounds`。
    pub fn code_at(&self, i: usize) -> Result<u8> {
        if i >= self.len {
            return Err(BlastError::IndexOutOfBounds {
                what: "symbol index",
                start: i,
                end: i.saturating_add(1),
                len: self.len,
            });
        }
        Ok(self.code(i))
    }

    /// 调用方保证 `i < len`
    #[inline]
    pub(crate) fn code(&self, i: usize) -> u8 {
        debug_assert!(i < self.len);
        let word = self.words[i / self.window].to_u64();
        let slot = (i % self.window) as u32;
        let shift = W::BITS - self.bits * (slot + 1);
        ((word >> shift) & low_mask(self.bits)) as u8
    }

    pub fn codes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len).map(move |i| self.code(i))
    }

    /// 取子区间 [start, end) 重新打包
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len {
            return Err(BlastError::IndexOutOfBounds { what: "slice", start, end, len: self.len });
        }
        let words = pack((start..end).map(|i| self.code(i)), self.bits, self.window);
        Ok(Self { len: end - start, bits: self.bits, window: self.window, words })
    }

    /// 原始字数组形式：word 0 为符号数，其后为数据字。
    pub fn to_raw_words(&self) -> Result<Vec<W>> {
        if self.len as u64 > W::MAX {
            return Err(BlastError::out_of_range("symbol count", self.len as u64, 0, W::MAX));
        }
        let mut raw = Vec::with_capacity(self.words.len() + 1);
        raw.push(W::from_u64(self.len as u64));
        raw.extend_from_slice(&self.words);
        Ok(raw)
    }

    pub fn from_raw_words(raw: &[W], bits: u32, window: usize) -> Result<Self> {
        check_layout::<W>(bits, window)?;
        let Some((&count, words)) = raw.split_first() else {
            return Err(BlastError::out_of_range("raw word count", 0, 1, u64::MAX));
        };
        let count = count.to_u64();
        let len = usize::try_from(count)
            .map_err(|_| BlastError::out_of_range("symbol count", count, 0, usize::MAX as u64))?;
        // 计数来自外部数据，先确认不会溢出
        let expected = len
            .checked_add(window - 1)
            .map(|n| n / window)
            .ok_or_else(|| BlastError::out_of_range("symbol count", count, 0, (usize::MAX - window + 1) as u64))?;
        if words.len() != expected {
            return Err(BlastError::out_of_range(
                "raw word count",
                words.len() as u64 + 1,
                expected as u64 + 1,
                expected as u64 + 1,
            ));
        }
        Ok(Self { len, bits, window, words: words.to_vec() })
    }
}

fn check_layout<W: Word>(bits: u32, window: usize) -> Result<()> {
    if bits == 0 || bits > 8 {
        return Err(BlastError::out_of_range("symbol bit width", bits as u64, 1, 8));
    }
    let max_window = (W::BITS / bits) as usize;
    if window == 0 || window > max_window {
        return Err(BlastError::out_of_range("window size", window as u64, 1, max_window as u64));
    }
    Ok(())
}

/// MSB 优先打包；最后一个字的剩余低位保持为零
fn pack<W: Word>(codes: impl Iterator<Item = u8>, bits: u32, window: usize) -> Vec<W> {
    let mut words = Vec::new();
    let mut cur = 0u64;
    let mut slot = 0usize;
    for c in codes {
        let shift = W::BITS - bits * (slot as u32 + 1);
        cur |= (c as u64) << shift;
        slot += 1;
        if slot == window {
            words.push(W::from_u64(cur));
            cur = 0;
            slot = 0;
        }
    }
    if slot > 0 {
        words.push(W::from_u64(cur));
    }
    words
}

/// 符号序列 ↔ 定宽字数组的编解码器。
pub struct SequenceEncoder<'a, W: Word> {
    alphabet: &'a Alphabet,
    window: usize,
    _word: PhantomData<W>,
}

impl<'a, W: Word> SequenceEncoder<'a, W> {
    /// `window * bits` 必须不超过字宽
    pub fn new(alphabet: &'a Alphabet, window: usize) -> Result<Self> {
        check_layout::<W>(alphabet.bits(), window)?;
        Ok(Self { alphabet, window, _word: PhantomData })
    }

    /// 每个字装满：window = 字宽 / 符号位宽
    pub fn full_width(alphabet: &'a Alphabet) -> Result<Self> {
        Self::new(alphabet, (W::BITS / alphabet.bits()) as usize)
    }

    pub fn alphabet(&self) -> &'a Alphabet {
        self.alphabet
    }

    pub fn window_size(&self) -> usize {
        self.window
    }

    pub fn bits(&self) -> u32 {
        self.alphabet.bits()
    }

    pub fn encode(&self, symbols: &[u8]) -> Result<EncodedSequence<W>> {
        let codes = symbols
            .iter()
            .map(|&s| self.alphabet.code(s))
            .collect::<Result<Vec<u8>>>()?;
        let words = pack(codes.into_iter(), self.bits(), self.window);
        Ok(EncodedSequence { len: symbols.len(), bits: self.bits(), window: self.window, words })
    }

    /// 把至多 `window` 个符号打包成一个字，用作种子键
    pub fn encode_window(&self, symbols: &[u8]) -> Result<W> {
        if symbols.len() > self.window {
            return Err(BlastError::out_of_range(
                "window length",
                symbols.len() as u64,
                0,
                self.window as u64,
            ));
        }
        let bits = self.bits();
        let mut word = 0u64;
        for (slot, &s) in symbols.iter().enumerate() {
            let c = self.alphabet.code(s)? as u64;
            word |= c << (W::BITS - bits * (slot as u32 + 1));
        }
        Ok(W::from_u64(word))
    }

    pub fn decode(&self, seq: &EncodedSequence<W>) -> Result<Vec<u8>> {
        self.decode_range(seq, 0, seq.len())
    }

    /// 只解码 [start, end)，不展开整条序列
    pub fn decode_range(&self, seq: &EncodedSequence<W>, start: usize, end: usize) -> Result<Vec<u8>> {
        if seq.bits() != self.bits() {
            return Err(BlastError::out_of_range(
                "symbol bit width",
                seq.bits() as u64,
                self.bits() as u64,
                self.bits() as u64,
            ));
        }
        if start > end || end > seq.len() {
            return Err(BlastError::IndexOutOfBounds { what: "decode range", start, end, len: seq.len() });
        }
        (start..end)
            .map(|i| {
                let code = seq.code(i);
                self.alphabet.symbol(code).ok_or_else(|| {
                    BlastError::out_of_range("symbol code", code as u64, 0, self.alphabet.len() as u64 - 1)
                })
            })
            .collect()
    }
}
