use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{fasta::FastaReader, open};
use crate::error::{Error, Result};
use crate::index::Collection;

/// File name up to its first `.`, used as the display name of a sample.
pub fn file_stem_name(path: &Path) -> String {
    let file = path.file_name().map(|f| f.to_string_lossy()).unwrap_or_default();
    match file.find('.') {
        Some(idx) if idx > 0 => file[..idx].to_string(),
        _ => file.into_owned(),
    }
}

/// Strain list: one `name<TAB>path` per line. A line holding only a path
/// takes the file stem as its name. Blank lines are skipped.
pub fn read_strain_list(path: &Path) -> Result<Vec<Collection>> {
    let reader = open(path)?;
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let collection = match (fields.next(), fields.next()) {
            (Some(name), Some(source)) if !name.is_empty() && !source.is_empty() => {
                Collection::new(name, source)
            }
            (Some(source), None) => {
                let source = PathBuf::from(source.trim());
                Collection::new(file_stem_name(&source), source)
            }
            _ => return Err(Error::format(path, i + 1, "expected 'name<TAB>path'")),
        };
        out.push(collection);
    }
    debug!(strains = out.len(), list = %path.display(), "read strain list");
    Ok(out)
}

/// File-of-files: one sequence file path per line.
pub fn read_file_list(path: &Path) -> Result<Vec<PathBuf>> {
    let reader = open(path)?;
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            out.push(PathBuf::from(line));
        }
    }
    Ok(out)
}

/// Queries from a FASTA file (leading `>`) or a plain list holding one query
/// per line in its first tab-separated field.
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    let mut reader = open(path)?;
    let is_fasta = reader
        .fill_buf()
        .map_err(|e| Error::unreadable(path, e))?
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'>');

    let queries = if is_fasta {
        FastaReader::new(reader)
            .map(|r| r.map(|rec| String::from_utf8_lossy(&rec.seq).into_owned()))
            .collect::<Result<Vec<_>>>()?
    } else {
        let mut out = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Some(field) = line.split('\t').next().map(str::trim) {
                if !field.is_empty() {
                    out.push(field.to_string());
                }
            }
        }
        out
    };
    debug!(queries = queries.len(), file = %path.display(), "read queries");
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::File::create(&p).unwrap().write_all(body.as_bytes()).unwrap();
        p
    }

    #[test]
    fn stem_stops_at_first_dot() {
        assert_eq!(file_stem_name(Path::new("data/sample_1.contigs.fa")), "sample_1");
        assert_eq!(file_stem_name(Path::new("plain")), "plain");
    }

    #[test]
    fn strain_list_with_and_without_names() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "strains.txt", "A\ta.fa\n\nb/B.fasta\n");
        let strains = read_strain_list(&p).unwrap();
        assert_eq!(strains.len(), 2);
        assert_eq!(strains[0].name, "A");
        assert_eq!(strains[0].source_path, PathBuf::from("a.fa"));
        assert_eq!(strains[1].name, "B");
    }

    #[test]
    fn queries_plain_and_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let plain = write(dir.path(), "q.txt", "ACGT\tx\n\nGGGG\n");
        assert_eq!(read_queries(&plain).unwrap(), vec!["ACGT", "GGGG"]);

        let fa = write(dir.path(), "q.fa", ">u1\nACG\nT\n>u2\nGGGG\n");
        assert_eq!(read_queries(&fa).unwrap(), vec!["ACGT", "GGGG"]);
    }
}
