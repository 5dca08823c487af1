use crate::codec::{EncodedSequence, SequenceEncoder, Word};
use crate::error::{BlastError, Result};

/// 参考集合中的一条序列
#[derive(Debug, Clone)]
pub struct DbRecord<W: Word> {
    pub name: String,
    pub seq: EncodedSequence<W>,
}

/// 参考序列集合：名称 + 已编码序列，序列号即下标。
#[derive(Debug, Clone)]
pub struct Database<W: Word> {
    records: Vec<DbRecord<W>>,
    total_len: u64,
}

impl<W: Word> Default for Database<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Word> Database<W> {
    pub fn new() -> Self {
        Self { records: Vec::new(), total_len: 0 }
    }

    /// 编码并追加一条序列，返回它的序列号
    pub fn push(&mut self, encoder: &SequenceEncoder<'_, W>, name: &str, symbols: &[u8]) -> Result<u32> {
        if self.records.len() >= u32::MAX as usize {
            return Err(BlastError::out_of_range(
                "database sequence count",
                self.records.len() as u64 + 1,
                0,
                u32::MAX as u64,
            ));
        }
        if symbols.len() > u32::MAX as usize {
            return Err(BlastError::out_of_range("sequence length", symbols.len() as u64, 0, u32::MAX as u64));
        }
        let seq = encoder.encode(symbols)?;
        let id = self.records.len() as u32;
        self.total_len += seq.len() as u64;
        self.records.push(DbRecord { name: name.to_string(), seq });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 全部序列的符号总数
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn get(&self, id: u32) -> Option<&DbRecord<W>> {
        self.records.get(id as usize)
    }

    pub fn records(&self) -> &[DbRecord<W>] {
        &self.records
    }
}
