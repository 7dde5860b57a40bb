//! Graph files.
//!
//! `<prefix>.gfa` holds the unitig sequences and their k-1 overlaps in GFA1;
//! `<prefix>.bfg_colors` holds the colour names and per-position colour sets
//! (bincode, run-length encoded along each unitig). Segment `i` of the GFA
//! file is unitig `i - 1`.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::colours::ColourVector;
use super::dbg::ColouredDbg;
use super::ColouredGraph;
use crate::error::{Error, Result};
use crate::io;
use crate::util::dna;

const MAGIC: [u8; 4] = *b"UCCF";
const FORMAT_VERSION: u32 = 1;

/// `len` consecutive k-mer positions sharing one colour set.
#[derive(Debug, Serialize, Deserialize)]
struct ColourRun {
    len: u32,
    ids: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColourFile {
    magic: [u8; 4],
    version: u32,
    k: u32,
    colour_names: Vec<String>,
    unitig_kmers: Vec<u32>,
    runs: Vec<Vec<ColourRun>>,
}

fn encode_runs(cols: &[ColourVector]) -> Vec<ColourRun> {
    let mut runs: Vec<ColourRun> = Vec::new();
    let mut prev: Option<&ColourVector> = None;
    for c in cols {
        match runs.last_mut() {
            Some(last) if prev == Some(c) => last.len += 1,
            _ => runs.push(ColourRun { len: 1, ids: c.ones().map(|id| id as u32).collect() }),
        }
        prev = Some(c);
    }
    runs
}

/// 展开第 `unitig` 个 unitig 的颜色游程；游程总长必须等于 `n_kmers`，
/// 颜色 id 必须小于 `nb_colours`，否则视为 `GraphMismatch`。
fn decode_runs(unitig: usize, runs: &[ColourRun], n_kmers: u32, nb_colours: usize) -> Result<Vec<ColourVector>> {
    let covered: u64 = runs.iter().map(|r| u64::from(r.len)).sum();
    if covered != u64::from(n_kmers) {
        return Err(Error::GraphMismatch(format!(
            "unitig {unitig} has colour runs over {covered} k-mers, expected {n_kmers}"
        )));
    }
    if let Some(id) = runs.iter().flat_map(|r| &r.ids).find(|&&id| id as usize >= nb_colours) {
        return Err(Error::GraphMismatch(format!(
            "unitig {unitig} uses colour {id} but the file names {nb_colours} colours"
        )));
    }

    let mut out = Vec::with_capacity(n_kmers as usize);
    for run in runs {
        let v = ColourVector::from_ids(nb_colours, run.ids.iter().map(|&id| id as usize));
        out.extend(std::iter::repeat(v).take(run.len as usize));
    }
    Ok(out)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::UnwritableOutput { path: path.to_path_buf(), source })
}

/// A GFA link between oriented segments (0-based ids, `true` = `+`).
type Link = (usize, bool, usize, bool);

/// Successor links of every unitig end, each edge reported once.
fn links(g: &ColouredDbg) -> Vec<Link> {
    let k = g.kmer_size();
    let mut out = Vec::new();
    for u in g.unitigs() {
        for from_fwd in [true, false] {
            let oriented = if from_fwd {
                u.sequence.to_vec()
            } else {
                match dna::revcomp(u.sequence) {
                    Ok(rc) => rc,
                    Err(_) => continue,
                }
            };
            let last = &oriented[oriented.len() - k..];
            for &b in b"ACGT" {
                let mut next = last[1..].to_vec();
                next.push(b);
                let Some(hit) = g.find_kmer(&next) else { continue };
                let to = g.unitig(hit.unitig);
                let to_fwd = if hit.forward && hit.position == 0 {
                    true
                } else if !hit.forward && hit.position + 1 == to.len_kmers {
                    false
                } else {
                    continue;
                };
                let link = (u.id, from_fwd, hit.unitig, to_fwd);
                let mirror = (hit.unitig, !to_fwd, u.id, !from_fwd);
                out.push(link.min(mirror));
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

fn sign(fwd: bool) -> char {
    if fwd {
        '+'
    } else {
        '-'
    }
}

/// Write `<prefix>.gfa` and `<prefix>.bfg_colors`.
pub fn write_graph(g: &ColouredDbg, prefix: &str) -> Result<()> {
    let k = g.kmer_size();
    let gfa_path = PathBuf::from(format!("{prefix}.gfa"));
    let mut w = create(&gfa_path)?;
    writeln!(w, "H\tVN:Z:1.0")?;
    for u in g.unitigs() {
        writeln!(w, "S\t{}\t{}", u.id + 1, String::from_utf8_lossy(u.sequence))?;
    }
    let links = links(g);
    for &(a, a_fwd, b, b_fwd) in &links {
        writeln!(w, "L\t{}\t{}\t{}\t{}\t{}M", a + 1, sign(a_fwd), b + 1, sign(b_fwd), k - 1)?;
    }
    w.flush()?;

    let file = ColourFile {
        magic: MAGIC,
        version: FORMAT_VERSION,
        k: k as u32,
        colour_names: g.colour_names().to_vec(),
        unitig_kmers: g.unitigs().map(|u| u.len_kmers as u32).collect(),
        runs: (0..g.unitig_count()).map(|u| encode_runs(g.unitig_colours(u))).collect(),
    };
    let colour_path = PathBuf::from(format!("{prefix}.bfg_colors"));
    let mut w = create(&colour_path)?;
    bincode::serialize_into(&mut w, &file).map_err(|e| match *e {
        bincode::ErrorKind::Io(io_err) => Error::Io(io_err),
        other => Error::Io(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
    })?;
    w.flush()?;

    debug!(gfa = %gfa_path.display(), links = links.len(), "graph written");
    Ok(())
}

fn read_colour_file(path: &Path) -> Result<ColourFile> {
    let reader = io::open(path)?;
    let file: ColourFile = bincode::deserialize_from(reader)
        .map_err(|e| Error::GraphMismatch(format!("cannot decode colour file '{}': {e}", path.display())))?;
    if file.magic != MAGIC || file.version != FORMAT_VERSION {
        return Err(Error::GraphMismatch(format!(
            "'{}' is not a colour file this version understands",
            path.display()
        )));
    }
    Ok(file)
}

/// Segment sequences by 0-based id. Link overlaps must be `k-1` matches.
fn read_segments(path: &Path, k: usize) -> Result<Vec<Vec<u8>>> {
    let overlap = format!("{}M", k - 1);
    let mut segments: FxHashMap<usize, Vec<u8>> = FxHashMap::default();
    for (i, line) in io::open(path)?.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.first().copied() {
            Some("S") => {
                let [_, id, seq, ..] = fields.as_slice() else {
                    return Err(Error::format(path, lineno, "S line needs an id and a sequence"));
                };
                let id: usize = id
                    .parse()
                    .ok()
                    .filter(|&id| id > 0)
                    .ok_or_else(|| Error::format(path, lineno, format!("bad segment id '{id}'")))?;
                if segments.insert(id - 1, seq.as_bytes().to_ascii_uppercase()).is_some() {
                    return Err(Error::format(path, lineno, format!("segment {id} defined twice")));
                }
            }
            Some("L") => {
                let Some(cigar) = fields.get(5) else {
                    return Err(Error::format(path, lineno, "L line needs an overlap"));
                };
                if *cigar != overlap {
                    return Err(Error::GraphMismatch(format!(
                        "{}:{lineno}: overlap {cigar} does not match k={k}",
                        path.display()
                    )));
                }
            }
            _ => {}
        }
    }

    let n = segments.len();
    let mut out = Vec::with_capacity(n);
    for id in 0..n {
        let seq = segments.remove(&id).ok_or_else(|| {
            Error::GraphMismatch(format!("{}: segment ids are not 1..={n}", path.display()))
        })?;
        out.push(seq);
    }
    Ok(out)
}

/// Load a graph written by [`write_graph`].
pub fn load_graph(graph_path: &Path, colour_path: &Path) -> Result<ColouredDbg> {
    let file = read_colour_file(colour_path)?;
    let k = file.k as usize;
    super::dbg::check_k(k)?;
    let unitigs = read_segments(graph_path, k)?;

    if unitigs.len() != file.unitig_kmers.len() || unitigs.len() != file.runs.len() {
        return Err(Error::GraphMismatch(format!(
            "{} segments in '{}' but {} unitigs in '{}'",
            unitigs.len(),
            graph_path.display(),
            file.unitig_kmers.len(),
            colour_path.display()
        )));
    }

    let nb = file.colour_names.len();
    let mut colours = Vec::with_capacity(unitigs.len());
    for (u, ((seq, &n_kmers), runs)) in unitigs.iter().zip(&file.unitig_kmers).zip(&file.runs).enumerate() {
        if seq.len() + 1 != n_kmers as usize + k {
            return Err(Error::GraphMismatch(format!(
                "unitig {u} has {} bases but the colour file expects {n_kmers} k-mers of size {k}",
                seq.len()
            )));
        }
        colours.push(decode_runs(u, runs, n_kmers, nb)?);
    }

    debug!(unitigs = unitigs.len(), colours = nb, k, "graph loaded");
    ColouredDbg::from_parts(k, file.colour_names, unitigs, colours)
}
