//! 着色压缩 de Bruijn 图。
//!
//! [`ColouredGraph`] 是颜色推断所依赖的只读接口；
//! [`dbg::ColouredDbg`] 是内存实现，可从序列文件构建，并通过 GFA + 颜色文件（[`gfa`]）读写。

pub mod colours;
pub mod dbg;
pub mod gfa;
pub mod resolver;

use colours::ColourVector;

/// k-mer 在图中的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerHit {
    pub unitig: usize,
    /// k-mer position inside the unitig, 0-based
    pub position: usize,
    /// whether the queried k-mer reads the same way as the stored unitig
    pub forward: bool,
}

/// A unitig as stored in the graph (its reference strand).
#[derive(Debug, Clone, Copy)]
pub struct UnitigView<'g> {
    pub id: usize,
    pub sequence: &'g [u8],
    /// number of k-mers, `sequence.len() - k + 1`
    pub len_kmers: usize,
}

pub trait ColouredGraph: Sync {
    fn kmer_size(&self) -> usize;

    /// Source of each colour, indexed by colour id.
    fn colour_names(&self) -> &[String];

    fn colour_count(&self) -> usize {
        self.colour_names().len()
    }

    /// 查找一个 k-mer（任一链）。不在图中或含非 ACGT 字符时返回 `None`。
    fn find_kmer(&self, kmer: &[u8]) -> Option<KmerHit>;

    fn unitig_count(&self) -> usize;

    /// # Panics
    /// If `id >= unitig_count()`.
    fn unitig(&self, id: usize) -> UnitigView<'_>;

    /// Colours present at k-mer `position` of unitig `unitig`.
    fn colour_set(&self, unitig: usize, position: usize) -> ColourVector;

    /// One pass over all unitigs; call again to restart.
    fn unitigs(&self) -> Unitigs<'_, Self>
    where
        Self: Sized,
    {
        Unitigs { graph: self, next: 0 }
    }
}

pub struct Unitigs<'g, G: ColouredGraph> {
    graph: &'g G,
    next: usize,
}

impl<'g, G: ColouredGraph> Iterator for Unitigs<'g, G> {
    type Item = UnitigView<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.graph.unitig_count() {
            return None;
        }
        let view = self.graph.unitig(self.next);
        self.next += 1;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.graph.unitig_count().saturating_sub(self.next);
        (left, Some(left))
    }
}
