//! Per-collection exact-match indexes and their on-disk cache.
//!
//! A collection's records are normalized, encoded and concatenated with a
//! separator after every record, then handed to one of the backends in
//! [`IndexBackend`]. Built indexes are immutable and shared read-only
//! across search tasks.

pub mod fm;
pub mod raw;
pub mod sa;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::io;
use crate::util::dna;

/// A named sequence collection (one assembly or read set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub source_path: PathBuf,
}

impl Collection {
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), source_path: source_path.into() }
    }
}

/// Exact substring containment over one collection.
///
/// `pattern` is in the index alphabet (see [`dna::encode`]) and must not
/// contain the separator symbol.
pub trait ExactMatchIndex: Send + Sync {
    fn contains(&self, pattern: &[u8]) -> bool;
}

/// Which backend to build for new indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum IndexBackend {
    /// Compressed FM-index (suffix array + BWT)
    #[default]
    Fm,
    /// Keep the text and scan it linearly
    Raw,
}

impl IndexBackend {
    /// Suffix appended to a collection's source path for its persisted index.
    pub fn cache_suffix(self) -> &'static str {
        match self {
            IndexBackend::Fm => ".fm",
            IndexBackend::Raw => ".rawidx",
        }
    }
}

/// Canonical cache location: `<source_path><suffix>`.
pub fn cache_path(source: &Path, backend: IndexBackend) -> PathBuf {
    let mut s = source.as_os_str().to_owned();
    s.push(backend.cache_suffix());
    PathBuf::from(s)
}

const MAGIC: [u8; 4] = *b"UCIX";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub source_path: Option<String>,
    pub backend: IndexBackend,
    pub records: u32,
    pub text_len: u64,
    pub build_timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
enum IndexBody {
    Fm(fm::FMIndex),
    Raw(raw::RawIndex),
}

/// A built index of either backend, plus what it was built from.
#[derive(Debug, Serialize, Deserialize)]
pub struct SequenceIndex {
    magic: [u8; 4],
    version: u32,
    pub meta: IndexMeta,
    body: IndexBody,
}

/// Encode and join records, placing a separator after each one so that
/// no match can span two records.
pub fn concat_records<'a, I>(records: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut text = Vec::new();
    for rec in records {
        text.extend(rec.iter().map(|&b| dna::to_alphabet(b)));
        text.push(dna::SEPARATOR);
    }
    text
}

impl SequenceIndex {
    pub fn from_records<'a, I>(records: I, backend: IndexBackend) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut n_records = 0u32;
        let text = concat_records(records.into_iter().inspect(|_| n_records += 1));
        let meta = IndexMeta {
            source_path: None,
            backend,
            records: n_records,
            text_len: text.len() as u64,
            build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        };
        let body = match backend {
            IndexBackend::Fm => IndexBody::Fm(fm::FMIndex::from_text(&text, fm::DEFAULT_BLOCK)),
            IndexBackend::Raw => IndexBody::Raw(raw::RawIndex::new(text)),
        };
        Self { magic: MAGIC, version: FORMAT_VERSION, meta, body }
    }

    /// Read and index every record of `collection`'s source file.
    pub fn build(collection: &Collection, backend: IndexBackend) -> Result<Self> {
        let seqs = io::read_sequences(&collection.source_path)?;
        if seqs.is_empty() {
            warn!(collection = %collection.name, "collection has no sequences");
        }
        let mut idx = Self::from_records(seqs.iter().map(Vec::as_slice), backend);
        idx.meta.source_path = Some(collection.source_path.display().to_string());
        Ok(idx)
    }

    pub fn backend(&self) -> IndexBackend {
        self.meta.backend
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let f = File::create(path)?;
        let mut w = BufWriter::new(f);
        bincode::serialize_into(&mut w, self).map_err(|e| match *e {
            bincode::ErrorKind::Io(io_err) => Error::Io(io_err),
            other => Error::Io(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
        })?;
        Ok(())
    }

    /// Load a persisted index. A file that opens but does not decode, or
    /// carries the wrong magic/version, is `CorruptIndex`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let reader = io::open(path)?;
        let idx: Self = bincode::deserialize_from(reader).map_err(|e| Error::CorruptIndex {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if idx.magic != MAGIC || idx.version != FORMAT_VERSION {
            return Err(Error::CorruptIndex {
                path: path.to_path_buf(),
                reason: format!("unrecognised header (version {})", idx.version),
            });
        }
        Ok(idx)
    }
}

impl ExactMatchIndex for SequenceIndex {
    fn contains(&self, pattern: &[u8]) -> bool {
        match &self.body {
            IndexBody::Fm(fm) => fm.contains(pattern),
            IndexBody::Raw(raw) => raw.contains(pattern),
        }
    }
}

/// Load the persisted index for `collection` if one exists, otherwise build
/// it (and persist it when `persist` is set).
///
/// A corrupt cache file is a hard error, never a silent rebuild. A failed
/// write is only logged; the index is still returned for this run.
pub fn get_or_build(collection: &Collection, backend: IndexBackend, persist: bool) -> Result<SequenceIndex> {
    let path = cache_path(&collection.source_path, backend);
    if path.exists() {
        debug!(collection = %collection.name, index = %path.display(), "loading persisted index");
        let idx = SequenceIndex::load_from_file(&path)?;
        if idx.backend() != backend {
            return Err(Error::CorruptIndex {
                path,
                reason: format!("holds a {:?} index, expected {:?}", idx.backend(), backend),
            });
        }
        return Ok(idx);
    }

    build_and_persist(collection, backend, persist.then_some(path.as_path()))
}

/// 构建索引并（可选）写入 `target`；写入失败只记 warn，索引照常返回。
fn build_and_persist(collection: &Collection, backend: IndexBackend, target: Option<&Path>) -> Result<SequenceIndex> {
    debug!(collection = %collection.name, ?backend, "building index");
    let idx = SequenceIndex::build(collection, backend)?;
    if let Some(path) = target {
        if let Err(e) = idx.save_to_file(path) {
            warn!(index = %path.display(), error = %e, "could not persist index, keeping it in memory");
        }
    }
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fasta(dir: &Path, name: &str, body: &str) -> Collection {
        let p = dir.join(name);
        File::create(&p).unwrap().write_all(body.as_bytes()).unwrap();
        Collection::new(name.split('.').next().unwrap(), p)
    }

    #[test]
    fn cache_path_appends_suffix() {
        assert_eq!(cache_path(Path::new("x/a.fa"), IndexBackend::Fm), PathBuf::from("x/a.fa.fm"));
        assert_eq!(cache_path(Path::new("a.fa"), IndexBackend::Raw), PathBuf::from("a.fa.rawidx"));
    }

    #[test]
    fn backends_agree() {
        let recs = [b"ACGTACGT".as_slice(), b"ttttacgt".as_slice()];
        let fm = SequenceIndex::from_records(recs, IndexBackend::Fm);
        let raw = SequenceIndex::from_records(recs, IndexBackend::Raw);
        assert_eq!(fm.meta.records, 2);
        for q in [&b"ACGT"[..], b"TTTTACGT", b"GTAC", b"GTTT", b"GGGG"] {
            let p = dna::encode(q);
            assert_eq!(fm.contains(&p), raw.contains(&p), "{}", String::from_utf8_lossy(q));
        }
    }

    #[test]
    fn persist_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let c = fasta(dir.path(), "a.fa", ">1\nACGTACGT\n");
        let built = get_or_build(&c, IndexBackend::Fm, true).unwrap();
        assert!(built.contains(&dna::encode(b"GTAC")));

        let cached = cache_path(&c.source_path, IndexBackend::Fm);
        assert!(cached.exists());

        // remove the source: the cache alone must be enough
        std::fs::remove_file(&c.source_path).unwrap();
        let loaded = get_or_build(&c, IndexBackend::Fm, true).unwrap();
        assert!(loaded.contains(&dna::encode(b"GTAC")));
        assert_eq!(loaded.meta.source_path, built.meta.source_path);
    }

    #[test]
    fn no_persist_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let c = fasta(dir.path(), "b.fa", ">1\nACGT\n");
        get_or_build(&c, IndexBackend::Raw, false).unwrap();
        assert!(!cache_path(&c.source_path, IndexBackend::Raw).exists());
    }

    #[test]
    fn failed_persist_keeps_index_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let c = fasta(dir.path(), "d.fa", ">1\nACGTTGCA\n");
        let target = dir.path().join("no_such_dir").join("d.fa.fm");

        let idx = build_and_persist(&c, IndexBackend::Fm, Some(&target)).unwrap();
        assert!(!target.exists());
        assert!(idx.contains(&dna::encode(b"GTTG")));
        assert_eq!(idx.meta.records, 1);
    }

    #[test]
    fn corrupt_cache_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let c = fasta(dir.path(), "c.fa", ">1\nACGT\n");
        File::create(cache_path(&c.source_path, IndexBackend::Fm))
            .unwrap()
            .write_all(b"not an index")
            .unwrap();
        let err = get_or_build(&c, IndexBackend::Fm, true).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex { .. }));
    }

    #[test]
    fn missing_source_is_unreadable() {
        let c = Collection::new("x", "/nonexistent/x.fa");
        assert!(matches!(get_or_build(&c, IndexBackend::Fm, false), Err(Error::UnreadableInput { .. })));
    }
}
