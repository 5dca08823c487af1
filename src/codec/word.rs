use std::fmt::Debug;
use std::hash::Hash;

/// 定宽存储字（u8/u16/u32/u64）。
///
/// 编码器内部统一在 u64 上做位运算，再截断到目标字宽。
pub trait Word: Copy + Default + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    const BITS: u32;
    const MAX: u64;

    fn from_u64(v: u64) -> Self;
    fn to_u64(self) -> u64;
}

macro_rules! impl_word {
    ($($t:ty),*) => {
        $(
            impl Word for $t {
                const BITS: u32 = <$t>::BITS;
                const MAX: u64 = <$t>::MAX as u64;

                #[inline]
                fn from_u64(v: u64) -> Self {
                    v as $t
                }

                #[inline]
                fn to_u64(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_word!(u8, u16, u32, u64);

/// 低 `bits` 位全 1 的掩码（bits 可以是 64）
#[inline]
pub(crate) fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
