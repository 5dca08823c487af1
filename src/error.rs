use thiserror::Error;

/// 检索内核的错误类型。
///
/// 全部是同步、局部的失败：要么输入非法，要么参数超出支持的数值范围，
/// 内核不会自动重试。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlastError {
    /// 字母表大小、位宽或长度超出支持范围
    #[error("{what} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        what: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    /// 输入符号不在字母表中
    #[error("illegal symbol {} for alphabet '{alphabet}'", show_symbol(.symbol))]
    IllegalSymbol { symbol: u8, alphabet: String },

    /// 种子坐标越界（调用方 bug）
    #[error("{what} [{start}, {end}) out of bounds for length {len}")]
    IndexOutOfBounds {
        what: &'static str,
        start: usize,
        end: usize,
        len: usize,
    },

    /// 不支持的打分方案
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// λ 求解不收敛
    #[error("numeric divergence: {0}")]
    NumericDivergence(String),

    /// 查询字母表与建索引时的字母表不一致
    #[error("alphabet '{found}' does not match index alphabet '{expected}'")]
    AlphabetMismatch { expected: String, found: String },

    /// 工作线程池创建失败
    #[error("worker pool: {0}")]
    WorkerPool(String),
}

fn show_symbol(symbol: &u8) -> String {
    if symbol.is_ascii_graphic() {
        format!("'{}'", *symbol as char)
    } else {
        format!("0x{:02x}", symbol)
    }
}

pub type Result<T> = std::result::Result<T, BlastError>;

impl BlastError {
    pub(crate) fn out_of_range(what: &'static str, value: u64, min: u64, max: u64) -> Self {
        BlastError::OutOfRange { what, value, min, max }
    }
}
