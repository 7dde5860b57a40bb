use std::io::BufRead;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

pub struct FastqReader<R: BufRead> {
    reader: R,
    path: PathBuf,
    buf: String,
    line: usize,
    done: bool,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, path: PathBuf::from("-"), buf: String::new(), line: 0, done: false }
    }

    /// Name used in format errors.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    fn read_line(&mut self) -> Result<usize> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n > 0 { self.line += 1; }
        Ok(n)
    }

    fn err(&self, msg: &str) -> Error {
        Error::format(self.path.clone(), self.line, msg)
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        if self.done { return Ok(None); }

        // header line starting with '@', blank lines between records are tolerated
        loop {
            if self.read_line()? == 0 { self.done = true; return Ok(None); }
            if !self.buf.trim().is_empty() { break; }
        }
        if !self.buf.starts_with('@') {
            return Err(self.err("FASTQ header not starting with '@'"));
        }
        let id = self.buf[1..].split_whitespace().next().unwrap_or("").to_string();

        // sequence line
        if self.read_line()? == 0 { return Err(self.err("unexpected EOF after header")); }
        let seq: Vec<u8> = self.buf.trim_end().bytes().map(|b| b.to_ascii_uppercase()).collect();

        // plus line
        if self.read_line()? == 0 || !self.buf.starts_with('+') {
            return Err(self.err("missing '+' line"));
        }

        // quality line
        if self.read_line()? == 0 { return Err(self.err("missing quality line")); }
        if self.buf.trim_end().len() != seq.len() {
            return Err(self.err("seq/qual length mismatch"));
        }

        Ok(Some(FastqRecord { id, seq }))
    }
}

impl<R: BufRead> Iterator for FastqReader<R> {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_two_records() {
        let data = b"@r1 x\nacgt\n+\nIIII\n\n@r2\nTT\n+r2\nII\n";
        let recs: Vec<FastqRecord> =
            FastqReader::new(Cursor::new(&data[..])).collect::<Result<_>>().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "r1");
        assert_eq!(recs[0].seq, b"ACGT");
        assert_eq!(recs[1].seq, b"TT");
    }

    #[test]
    fn length_mismatch_reports_line() {
        let data = b"@r1\nACGT\n+\nII\n";
        let err = FastqReader::new(Cursor::new(&data[..]))
            .with_path("reads.fq")
            .next_record()
            .unwrap_err();
        match err {
            Error::Format { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
