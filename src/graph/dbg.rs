use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use super::colours::ColourVector;
use super::{gfa, ColouredGraph, KmerHit, UnitigView};
use crate::error::{Error, Result};
use crate::io;
use crate::pool::WorkerPool;
use crate::util::dna;

pub const MIN_K: usize = 3;
pub const MAX_K: usize = 63;

/// 仅出现在 reads 中的 k-mer 至少需要出现这么多次才进入图。
pub const MIN_READ_KMER_COUNT: u32 = 2;

#[derive(Debug, Clone)]
pub struct BuildOpt {
    pub kmer_size: usize,
    /// Clip short tips and drop short isolated unitigs
    pub clean: bool,
}

impl Default for BuildOpt {
    fn default() -> Self {
        Self { kmer_size: 31, clean: false }
    }
}

/// Files to colour the graph with. Each file is one colour; references
/// come first, then reads, each in list order.
#[derive(Debug, Clone, Default)]
pub struct GraphInput {
    pub refs: Vec<PathBuf>,
    pub reads: Vec<PathBuf>,
}

impl GraphInput {
    fn sources(&self) -> Vec<(&Path, bool)> {
        self.refs
            .iter()
            .map(|p| (p.as_path(), true))
            .chain(self.reads.iter().map(|p| (p.as_path(), false)))
            .collect()
    }
}

#[derive(Debug, Default)]
struct KmerEntry {
    colours: Vec<u32>,
    read_count: u32,
    in_ref: bool,
}

/// 内存中的着色压缩 de Bruijn 图。
///
/// unitig 以规范方向存储（序列与其反向互补中较小者）。
/// 每个 unitig 的每个 k-mer 位置各有一个颜色集合，因此同一 unitig 的首尾颜色可能不同。
#[derive(Debug)]
pub struct ColouredDbg {
    k: usize,
    colour_names: Vec<String>,
    unitigs: Vec<Vec<u8>>,
    colours: Vec<Vec<ColourVector>>,
    /// canonical k-mer -> (unitig, position, stored k-mer is the canonical one)
    index: FxHashMap<Vec<u8>, (u32, u32, bool)>,
}

pub(crate) fn check_k(k: usize) -> Result<()> {
    if (MIN_K..=MAX_K).contains(&k) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("k-mer size {k} outside {MIN_K}..={MAX_K}")))
    }
}

fn count_kmers(seqs: &[Vec<u8>], k: usize) -> FxHashMap<Vec<u8>, u32> {
    let mut counts: FxHashMap<Vec<u8>, u32> = FxHashMap::default();
    for seq in seqs.iter().filter(|s| s.len() >= k) {
        for w in seq.windows(k) {
            if let Some((canon, _)) = dna::canonical(w) {
                *counts.entry(canon).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Oriented k-mers one step forward (`forward`) or backward from `kmer`
/// that are in the graph.
fn neighbours<V>(kmers: &FxHashMap<Vec<u8>, V>, kmer: &[u8], forward: bool) -> Vec<Vec<u8>> {
    let k = kmer.len();
    let mut out = Vec::new();
    for &b in b"ACGT" {
        let mut cand = Vec::with_capacity(k);
        if forward {
            cand.extend_from_slice(&kmer[1..]);
            cand.push(b);
        } else {
            cand.push(b);
            cand.extend_from_slice(&kmer[..k - 1]);
        }
        if let Some((canon, _)) = dna::canonical(&cand) {
            if kmers.contains_key(&canon) {
                out.push(cand);
            }
        }
    }
    out
}

/// Bases gained by walking from `start` while the path stays non-branching
/// and does not revisit a k-mer.
fn extend<V>(
    kmers: &FxHashMap<Vec<u8>, V>,
    start: &[u8],
    forward: bool,
    visited: &mut FxHashSet<Vec<u8>>,
) -> Vec<u8> {
    let k = start.len();
    let mut bases = Vec::new();
    let mut current = start.to_vec();
    loop {
        let step = neighbours(kmers, &current, forward);
        let [next] = step.as_slice() else { break };
        if neighbours(kmers, next, !forward).len() != 1 {
            break;
        }
        let Some((canon, _)) = dna::canonical(next) else { break };
        if !visited.insert(canon) {
            break;
        }
        bases.push(if forward { next[k - 1] } else { next[0] });
        current.clone_from(next);
    }
    bases
}

/// `kmers`（规范 k-mer 为键）上的极大无分支路径，每条以规范方向输出。
/// 起点 k-mer 按排序顺序选取，结果与哈希顺序无关。
fn compact<V>(kmers: &FxHashMap<Vec<u8>, V>, k: usize) -> Vec<Vec<u8>> {
    let mut starts: Vec<&Vec<u8>> = kmers.keys().collect();
    starts.sort_unstable();

    let mut visited: FxHashSet<Vec<u8>> = FxHashSet::default();
    let mut unitigs = Vec::new();
    for start in starts {
        if !visited.insert(start.clone()) {
            continue;
        }
        let right = extend(kmers, start, true, &mut visited);
        let left = extend(kmers, start, false, &mut visited);

        let mut seq = Vec::with_capacity(left.len() + k + right.len());
        seq.extend(left.iter().rev());
        seq.extend_from_slice(start);
        seq.extend_from_slice(&right);
        if let Ok(rc) = dna::revcomp(&seq) {
            if rc < seq {
                seq = rc;
            }
        }
        unitigs.push(seq);
    }
    unitigs
}

/// 去除短于 k 个 k-mer 的末梢（tip）和孤立 unitig，返回被删除的数量。
fn clean<V>(kmers: &mut FxHashMap<Vec<u8>, V>, unitigs: &[Vec<u8>], k: usize) -> usize {
    let doomed: Vec<&Vec<u8>> = unitigs
        .iter()
        .filter(|u| u.len() - k + 1 < k)
        .filter(|u| {
            let has_pred = !neighbours(kmers, &u[..k], false).is_empty();
            let has_succ = !neighbours(kmers, &u[u.len() - k..], true).is_empty();
            !(has_pred && has_succ)
        })
        .collect();

    for u in &doomed {
        for w in u.windows(k) {
            if let Some((canon, _)) = dna::canonical(w) {
                kmers.remove(&canon);
            }
        }
    }
    doomed.len()
}

impl ColouredDbg {
    /// Build from sequence files. Per-file k-mer counting runs on `pool`.
    pub fn build<P: WorkerPool>(input: &GraphInput, opt: &BuildOpt, pool: &P) -> Result<Self> {
        let k = opt.kmer_size;
        check_k(k)?;
        let sources = input.sources();
        if sources.is_empty() {
            return Err(Error::InvalidArgument("no reference or read files given".into()));
        }
        info!(files = sources.len(), k, "Building coloured de Bruijn graph...");

        let counted = pool.map_items(&sources, |&(path, _)| {
            let seqs = io::read_sequences(path)?;
            debug!(file = %path.display(), records = seqs.len(), "counted k-mers");
            Ok::<_, Error>(count_kmers(&seqs, k))
        });

        let mut entries: FxHashMap<Vec<u8>, KmerEntry> = FxHashMap::default();
        for (colour, (counts, &(_, is_ref))) in counted.into_iter().zip(&sources).enumerate() {
            for (kmer, n) in counts? {
                let e = entries.entry(kmer).or_default();
                e.colours.push(colour as u32);
                if is_ref {
                    e.in_ref = true;
                } else {
                    e.read_count = e.read_count.saturating_add(n);
                }
            }
        }
        let before = entries.len();
        entries.retain(|_, e| e.in_ref || e.read_count >= MIN_READ_KMER_COUNT);
        debug!(kept = entries.len(), dropped = before - entries.len(), "filtered read k-mers");

        let mut unitigs = compact(&entries, k);
        if opt.clean {
            let dropped = clean(&mut entries, &unitigs, k);
            debug!(dropped, "clipped tips and isolated unitigs");
            if dropped > 0 {
                unitigs = compact(&entries, k);
            }
        }

        let colour_names: Vec<String> = sources.iter().map(|(p, _)| p.display().to_string()).collect();
        let nb = colour_names.len();
        let colours = unitigs
            .iter()
            .map(|u| {
                u.windows(k)
                    .map(|w| {
                        let ids = dna::canonical(w)
                            .and_then(|(canon, _)| entries.get(&canon))
                            .map(|e| e.colours.as_slice())
                            .unwrap_or_default();
                        ColourVector::from_ids(nb, ids.iter().map(|&c| c as usize))
                    })
                    .collect()
            })
            .collect();

        let graph = Self::from_parts(k, colour_names, unitigs, colours)?;
        info!(unitigs = graph.unitig_count(), colours = nb, "graph built");
        Ok(graph)
    }

    /// Assemble a graph from unitigs and their per-position colours,
    /// checking that they fit together.
    pub fn from_parts(
        k: usize,
        colour_names: Vec<String>,
        unitigs: Vec<Vec<u8>>,
        colours: Vec<Vec<ColourVector>>,
    ) -> Result<Self> {
        check_k(k)?;
        if unitigs.len() != colours.len() {
            return Err(Error::GraphMismatch(format!(
                "{} unitigs but colours for {}",
                unitigs.len(),
                colours.len()
            )));
        }

        let mut index = FxHashMap::default();
        for (u, (seq, cols)) in unitigs.iter().zip(&colours).enumerate() {
            if seq.len() < k {
                return Err(Error::GraphMismatch(format!("unitig {u} is shorter than k={k}")));
            }
            if cols.len() != seq.len() - k + 1 {
                return Err(Error::GraphMismatch(format!(
                    "unitig {u} has {} k-mers but {} colour sets",
                    seq.len() - k + 1,
                    cols.len()
                )));
            }
            if let Some(c) = cols.iter().find(|c| c.len() != colour_names.len()) {
                return Err(Error::GraphMismatch(format!(
                    "unitig {u} has a colour set over {} colours, expected {}",
                    c.len(),
                    colour_names.len()
                )));
            }
            for (pos, w) in seq.windows(k).enumerate() {
                let (canon, is_canon) = dna::canonical(w)
                    .ok_or_else(|| Error::GraphMismatch(format!("unitig {u} has a non-ACGT k-mer")))?;
                if index.insert(canon, (u as u32, pos as u32, is_canon)).is_some() {
                    return Err(Error::GraphMismatch(format!("k-mer at unitig {u}:{pos} occurs twice")));
                }
            }
        }

        Ok(Self { k, colour_names, unitigs, colours, index })
    }

    pub(crate) fn unitig_colours(&self, unitig: usize) -> &[ColourVector] {
        &self.colours[unitig]
    }

    /// Write `<prefix>.gfa` and `<prefix>.bfg_colors`.
    pub fn write(&self, prefix: &str) -> Result<()> {
        gfa::write_graph(self, prefix)
    }

    /// Load a graph written by [`ColouredDbg::write`].
    pub fn load(graph_path: &Path, colour_path: &Path) -> Result<Self> {
        gfa::load_graph(graph_path, colour_path)
    }
}

impl ColouredGraph for ColouredDbg {
    fn kmer_size(&self) -> usize {
        self.k
    }

    fn colour_names(&self) -> &[String] {
        &self.colour_names
    }

    fn find_kmer(&self, kmer: &[u8]) -> Option<KmerHit> {
        if kmer.len() != self.k {
            return None;
        }
        let (canon, query_is_canon) = dna::canonical(kmer)?;
        let &(unitig, position, stored_is_canon) = self.index.get(&canon)?;
        Some(KmerHit {
            unitig: unitig as usize,
            position: position as usize,
            forward: query_is_canon == stored_is_canon,
        })
    }

    fn unitig_count(&self) -> usize {
        self.unitigs.len()
    }

    fn unitig(&self, id: usize) -> UnitigView<'_> {
        let sequence = self.unitigs[id].as_slice();
        UnitigView { id, sequence, len_kmers: sequence.len() + 1 - self.k }
    }

    fn colour_set(&self, unitig: usize, position: usize) -> ColourVector {
        self.colours[unitig][position].clone()
    }
}
