use std::ops::Range;

/// Split `n_items` into `n_workers` contiguous shards, returning the
/// `n_workers + 1` boundary offsets.
///
/// The first `n_items % n_workers` shards get one extra item. Workers past
/// `n_items` get empty shards. `n_workers == 0` is treated as 1.
pub fn partition(n_items: usize, n_workers: usize) -> Vec<usize> {
    let n_workers = n_workers.max(1);
    let base = n_items / n_workers;
    let big = n_items % n_workers;

    let mut bounds = Vec::with_capacity(n_workers + 1);
    let mut start = 0;
    bounds.push(start);
    for worker in 0..n_workers {
        start += if worker < big { base + 1 } else { base };
        bounds.push(start);
    }
    bounds
}

/// Boundary offsets as half-open ranges, one per worker.
pub fn shards(bounds: &[usize]) -> impl Iterator<Item = Range<usize>> + '_ {
    bounds.windows(2).map(|w| w[0]..w[1])
}
