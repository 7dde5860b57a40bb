//! 数据并行阶段使用的线程池。
//!
//! 每个分片（或每个元素）派发一个任务，返回前全部汇合，结果始终保持输入顺序。
//! [`InlinePool`] 在调用线程上执行同样的约定，便于写确定性的分片测试。

use std::ops::Range;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::partition::shards;

pub trait WorkerPool: Sync {
    /// Number of worker units; shard counts are derived from this.
    fn workers(&self) -> usize;

    /// Run `task` once per shard described by `bounds` (see
    /// [`crate::partition::partition`]) and collect results in shard order.
    fn map_shards<T, F>(&self, bounds: &[usize], task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync + Send;

    /// 对每个元素执行一次 `task`，按元素顺序收集结果。
    fn map_items<I, T, F>(&self, items: &[I], task: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send;
}

/// 固定线程数的 rayon 线程池。
pub struct RayonPool {
    pool: rayon::ThreadPool,
}

impl RayonPool {
    /// `threads < 1` is normalized to 1.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("unitig-caller-{i}"))
            .build()
            .map_err(|e| Error::InvalidArgument(format!("cannot start worker pool: {e}")))?;
        Ok(Self { pool })
    }
}

impl WorkerPool for RayonPool {
    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn map_shards<T, F>(&self, bounds: &[usize], task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync + Send,
    {
        let ranges: Vec<Range<usize>> = shards(bounds).collect();
        self.pool.install(|| ranges.into_par_iter().map(&task).collect())
    }

    fn map_items<I, T, F>(&self, items: &[I], task: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(&task).collect())
    }
}

/// Single-worker pool that runs every task on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlinePool;

impl WorkerPool for InlinePool {
    fn workers(&self) -> usize {
        1
    }

    fn map_shards<T, F>(&self, bounds: &[usize], task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync + Send,
    {
        shards(bounds).map(task).collect()
    }

    fn map_items<I, T, F>(&self, items: &[I], task: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        items.iter().map(task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition;

    fn shard_sums<P: WorkerPool>(pool: &P, n: usize, workers: usize) -> Vec<usize> {
        let data: Vec<usize> = (0..n).collect();
        pool.map_shards(&partition(n, workers), |r| data[r].iter().sum())
    }

    #[test]
    fn inline_and_rayon_agree() {
        let rayon = RayonPool::new(3).unwrap();
        assert_eq!(rayon.workers(), 3);
        for n in [0, 1, 7, 50] {
            assert_eq!(shard_sums(&InlinePool, n, 4), shard_sums(&rayon, n, 4));
        }
    }

    #[test]
    fn items_keep_order() {
        let rayon = RayonPool::new(0).unwrap();
        assert_eq!(rayon.workers(), 1);
        let items = vec![3, 1, 2];
        assert_eq!(rayon.map_items(&items, |x| x * 10), vec![30, 10, 20]);
        assert_eq!(InlinePool.map_items(&items, |x| x * 10), vec![30, 10, 20]);
    }
}
