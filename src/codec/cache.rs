use std::collections::HashMap;
use std::sync::Arc;

use super::encoder::{EncodedSequence, SequenceEncoder};
use super::word::Word;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    alphabet: String,
    table: Vec<u8>,
    regular: usize,
    bits: u32,
    window: usize,
    symbols: Vec<u8>,
}

/// 调用方持有的编码缓存，按 (字母表符号表, 窗口, 符号串) 复用已编码序列。
/// 同名但符号顺序不同的字母表不会共用条目。
///
/// 只是性能优化；不存在进程级的全局状态，测试可以随时 `clear`。
#[derive(Debug, Default)]
pub struct EncodingCache<W: Word> {
    entries: HashMap<CacheKey, Arc<EncodedSequence<W>>>,
    hits: u64,
    misses: u64,
}

impl<W: Word> EncodingCache<W> {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), hits: 0, misses: 0 }
    }

    pub fn get_or_encode(
        &mut self,
        encoder: &SequenceEncoder<'_, W>,
        symbols: &[u8],
    ) -> Result<Arc<EncodedSequence<W>>> {
        let alphabet = encoder.alphabet();
        let key = CacheKey {
            alphabet: alphabet.name().to_string(),
            table: alphabet.symbols().to_vec(),
            regular: alphabet.regular_len(),
            bits: alphabet.bits(),
            window: encoder.window_size(),
            symbols: symbols.to_vec(),
        };
        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(hit));
        }
        self.misses += 1;
        let encoded = Arc::new(encoder.encode(symbols)?);
        self.entries.insert(key, Arc::clone(&encoded));
        Ok(encoded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (命中次数, 未命中次数)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
