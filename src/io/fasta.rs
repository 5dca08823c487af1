use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    /// 头行第一个空白前的部分
    pub name: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

/// 流式 FASTA 读取器：多行序列拼接、去空白、转大写。
pub struct FastaReader<R: BufRead> {
    reader: R,
    line: String,
    pending: Option<String>,
    done: bool,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: String::new(), pending: None, done: false }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line)?;
        if n == 0 {
            self.done = true;
        }
        Ok(n > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        let header = match self.pending.take() {
            Some(h) => h,
            None => loop {
                if self.done || !self.read_line()? {
                    return Ok(None);
                }
                if let Some(h) = self.line.strip_prefix('>') {
                    break h.trim().to_string();
                }
            },
        };

        let (name, desc) = match header.split_once(char::is_whitespace) {
            Some((n, d)) => (n.to_string(), Some(d.trim().to_string()).filter(|d| !d.is_empty())),
            None => (header, None),
        };

        let mut seq = Vec::new();
        while !self.done && self.read_line()? {
            if let Some(h) = self.line.strip_prefix('>') {
                self.pending = Some(h.trim().to_string());
                break;
            }
            seq.extend(
                self.line
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase()),
            );
        }

        Ok(Some(FastaRecord { name, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// 读入整个 FASTA 文件
pub fn read_fasta_file(path: impl AsRef<Path>) -> Result<Vec<FastaRecord>> {
    let path = path.as_ref();
    let fh = std::fs::File::open(path).with_context(|| format!("cannot open FASTA '{}'", path.display()))?;
    FastaReader::new(std::io::BufReader::new(fh))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("cannot parse FASTA '{}'", path.display()))
}
