//! 命令行使用的 FASTA 读取与表格输出。
pub mod fasta;
pub mod report;
