//! 序列位打包编码：字母表、定宽字、编解码器和调用方缓存。

pub mod alphabet;
pub mod cache;
pub mod encoder;
pub mod word;

pub use alphabet::{bits_for_alphabet_size, minimal_word_width, reduce_to_murphy10, Alphabet};
pub use cache::EncodingCache;
pub use encoder::{EncodedSequence, SequenceEncoder};
pub use word::Word;
