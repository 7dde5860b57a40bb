use std::io::Write;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::index::{get_or_build, Collection, ExactMatchIndex, IndexBackend, SequenceIndex};
use crate::output::MatchWriter;
use crate::partition::partition;
use crate::pool::WorkerPool;
use crate::util::dna;

#[derive(Debug, Clone)]
pub struct SearchOpt {
    pub backend: IndexBackend,
    /// Persist freshly built indexes next to their source files
    pub write_index: bool,
}

impl Default for SearchOpt {
    fn default() -> Self {
        Self { backend: IndexBackend::Fm, write_index: true }
    }
}

/// 预处理后的查询：正链编码一次，反向互补链可能不存在（含非 ACGT 字符）。
struct PreparedQuery {
    forward: Vec<u8>,
    reverse: Option<Vec<u8>>,
}

impl PreparedQuery {
    fn new(query: &str) -> Result<Self> {
        if query.is_empty() || !query.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::MalformedQuery(query.to_string()));
        }
        let upper = query.to_ascii_uppercase();
        let forward = dna::encode(upper.as_bytes());
        let reverse = match dna::revcomp(upper.as_bytes()) {
            Ok(rc) => Some(dna::encode(&rc)),
            Err(e) => {
                warn!(query, error = %e, "skipping reverse strand");
                None
            }
        };
        Ok(Self { forward, reverse })
    }

    /// Forward strand first; the reverse strand only if that misses.
    fn found_in<I: ExactMatchIndex + ?Sized>(&self, idx: &I) -> bool {
        idx.contains(&self.forward) || self.reverse.as_ref().is_some_and(|rc| idx.contains(rc))
    }
}

/// Exact substring search of queries across a set of indexed collections.
///
/// Built indexes are split into contiguous shards, one per pool worker.
/// Queries run one at a time; each query fans out to every shard and the
/// per-shard hits are joined before the next query starts.
pub struct SearchEngine<'p, P: WorkerPool> {
    pool: &'p P,
    indices: Vec<SequenceIndex>,
    names: Vec<String>,
    bounds: Vec<usize>,
}

impl<'p, P: WorkerPool> SearchEngine<'p, P> {
    /// 索引构建阶段：每个分片一个任务，按顺序加载或构建其中的样本索引。
    /// 任一样本失败则整体失败。
    pub fn build(collections: &[Collection], opt: &SearchOpt, pool: &'p P) -> Result<Self> {
        info!(collections = collections.len(), "Constructing indexes for all input sequences...");
        let bounds = partition(collections.len(), pool.workers());
        let per_shard: Vec<Result<Vec<SequenceIndex>>> = pool.map_shards(&bounds, |range| {
            collections[range]
                .iter()
                .map(|c| get_or_build(c, opt.backend, opt.write_index))
                .collect()
        });

        let mut indices = Vec::with_capacity(collections.len());
        for shard in per_shard {
            indices.extend(shard?);
        }
        let names = collections.iter().map(|c| c.name.clone()).collect();
        Ok(Self { pool, indices, names, bounds })
    }

    /// Wrap indexes that were built elsewhere. `names[i]` labels `indices[i]`.
    pub fn from_indices(indices: Vec<SequenceIndex>, names: Vec<String>, pool: &'p P) -> Result<Self> {
        if indices.len() != names.len() {
            return Err(Error::InvalidArgument(format!(
                "{} indexes but {} names",
                indices.len(),
                names.len()
            )));
        }
        let bounds = partition(indices.len(), pool.workers());
        Ok(Self { pool, indices, names, bounds })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// 返回正链或反向互补链包含 `query` 的样本名（分片顺序）。
    pub fn search_one(&self, query: &str) -> Result<Vec<&str>> {
        let prepared = PreparedQuery::new(query)?;
        let per_shard: Vec<Vec<&str>> = self.pool.map_shards(&self.bounds, |range| {
            range
                .filter(|&i| prepared.found_in(&self.indices[i]))
                .map(|i| self.names[i].as_str())
                .collect()
        });
        Ok(per_shard.into_iter().flatten().collect())
    }

    /// 批量检索，按输入顺序把至少命中一个样本的查询写入 `out`。
    ///
    /// 返回写出的行数；非法查询记 warn 后跳过。
    pub fn call_strings<W: Write + Send>(&self, queries: &[String], out: &MatchWriter<W>) -> Result<usize> {
        info!(queries = queries.len(), "Calling unitigs...");
        let mut written = 0;
        for query in queries {
            let present = match self.search_one(query) {
                Ok(present) => present,
                Err(e) => {
                    warn!(error = %e, "query skipped");
                    continue;
                }
            };
            debug!(query = %query, hits = present.len(), "searched");
            if !present.is_empty() {
                out.write_hits(query, &present)?;
                written += 1;
            }
        }
        out.flush()?;
        info!(written, "Done.");
        Ok(written)
    }
}
