//! Input readers: FASTA/FASTQ sequence files and the plain-text lists that
//! name them (strain lists, file-of-files, query lists).

pub mod fasta;
pub mod fastq;
pub mod lists;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// Open `path` for buffered reading; failures become `UnreadableInput`.
pub fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| Error::unreadable(path, e))
}

/// Read every record of a FASTA or FASTQ file, in file order.
///
/// The format is picked from the first non-blank byte (`@` means FASTQ).
/// Sequences are uppercased; no other normalization happens here.
pub fn read_sequences(path: &Path) -> Result<Vec<Vec<u8>>> {
    let mut reader = open(path)?;
    let is_fastq = loop {
        let buf = reader.fill_buf().map_err(|e| Error::unreadable(path, e))?;
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(i) => break buf[i] == b'@',
            None if buf.is_empty() => break false,
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    };

    if is_fastq {
        fastq::FastqReader::new(reader)
            .with_path(path)
            .map(|r| r.map(|rec| rec.seq))
            .collect()
    } else {
        fasta::FastaReader::new(reader).map(|r| r.map(|rec| rec.seq)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn detects_fastq_and_fasta() {
        let dir = tempfile::tempdir().unwrap();

        let fa = dir.path().join("a.fa");
        std::fs::File::create(&fa).unwrap().write_all(b">x\nacgt\nAC\n>y\nTT\n").unwrap();
        assert_eq!(read_sequences(&fa).unwrap(), vec![b"ACGTAC".to_vec(), b"TT".to_vec()]);

        let fq = dir.path().join("a.fq");
        std::fs::File::create(&fq).unwrap().write_all(b"\n@r\nGGA\n+\nIII\n").unwrap();
        assert_eq!(read_sequences(&fq).unwrap(), vec![b"GGA".to_vec()]);
    }

    #[test]
    fn missing_file_is_unreadable_input() {
        let err = read_sequences(Path::new("/nonexistent/x.fa")).unwrap_err();
        assert!(matches!(err, Error::UnreadableInput { .. }));
    }
}
