//! unitig 与查询串的颜色推断。
//!
//! 两个操作都只取首 k-mer 与尾 k-mer 的颜色集合，经
//! [`ColourVector::from_head_tail`] 合并；中间位置不参与判断。

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::colours::ColourVector;
use super::{ColouredGraph, KmerHit};
use crate::error::{Error, Result};
use crate::pool::WorkerPool;

/// Colour vector of every unitig, keyed by its stored sequence.
///
/// If two unitigs share a sequence the later one replaces the earlier.
pub fn call_unitigs<G: ColouredGraph>(graph: &G) -> FxHashMap<String, ColourVector> {
    let mut out = FxHashMap::default();
    out.reserve(graph.unitig_count());
    for u in graph.unitigs() {
        let head = graph.colour_set(u.id, 0);
        let tail = graph.colour_set(u.id, u.len_kmers - 1);
        let seq = String::from_utf8_lossy(u.sequence).into_owned();
        if out.insert(seq, ColourVector::from_head_tail(head, &tail)).is_some() {
            debug!(unitig = u.id, "duplicate unitig sequence, keeping the later one");
        }
    }
    info!(unitigs = out.len(), "unitigs called");
    out
}

#[derive(Debug, Clone, Copy)]
enum Walk {
    Searching,
    FoundHead(KmerHit),
    Walking { head: KmerHit, tail: KmerHit },
    Present { head: KmerHit, tail: KmerHit },
    Absent,
}

fn walk<G: ColouredGraph>(graph: &G, query: &str) -> Result<Option<ColourVector>> {
    let k = graph.kmer_size();
    let seq = query.trim().as_bytes().to_ascii_uppercase();
    if seq.len() < k {
        return Err(Error::EmptyHeadOrTail);
    }

    let mut kmers = seq.windows(k);
    let mut state = Walk::Searching;
    loop {
        state = match state {
            Walk::Searching => match kmers.next().and_then(|w| graph.find_kmer(w)) {
                Some(hit) => Walk::FoundHead(hit),
                None => Walk::Absent,
            },
            Walk::FoundHead(head) => Walk::Walking { head, tail: head },
            Walk::Walking { head, tail } => match kmers.next() {
                None => Walk::Present { head, tail },
                Some(w) => match graph.find_kmer(w) {
                    Some(hit) => Walk::Walking { head, tail: hit },
                    None => Walk::Absent,
                },
            },
            Walk::Present { head, tail } => {
                let head = graph.colour_set(head.unitig, head.position);
                let tail = graph.colour_set(tail.unitig, tail.position);
                return Ok(Some(ColourVector::from_head_tail(head, &tail)));
            }
            Walk::Absent => return Ok(None),
        }
    }
}

/// Colour vector of `query` if every one of its k-mers is in the graph,
/// `None` otherwise. Case is ignored; either strand may be given.
///
/// `None` means "not in the graph". A query that is in the graph but whose
/// head and tail share no colour gets an all-zero vector instead.
pub fn query_unitig<G: ColouredGraph>(graph: &G, query: &str) -> Option<ColourVector> {
    match walk(graph, query) {
        Ok(v) => v,
        Err(e) => {
            debug!(query, error = %e, "query not resolved");
            None
        }
    }
}

/// 在 `pool` 上逐条独立推断；每条查询按输入顺序输出一行，不在图中的为 `None`。
pub fn query_unitigs<G, P>(graph: &G, queries: &[String], pool: &P) -> Vec<(String, Option<ColourVector>)>
where
    G: ColouredGraph,
    P: WorkerPool,
{
    info!(queries = queries.len(), "Querying unitigs...");
    let rows: Vec<(String, Option<ColourVector>)> =
        pool.map_items(queries, |q| (q.clone(), query_unitig(graph, q)));
    let found = rows.iter().filter(|(_, c)| c.is_some()).count();
    info!(found, absent = rows.len() - found, "Done.");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::dbg::ColouredDbg;
    use crate::graph::UnitigView;
    use crate::pool::{InlinePool, RayonPool};

    fn cv(bits: &str) -> ColourVector {
        ColourVector::from_bit_str(bits).unwrap()
    }

    /// AACGTGA -> GTGATT, k=5; colour 1 drops out after the second k-mer.
    fn two_unitigs() -> ColouredDbg {
        let names = vec!["a".to_string(), "b".to_string()];
        let unitigs = vec![b"AACGTGA".to_vec(), b"GTGATT".to_vec(), b"CCTTAGG".to_vec()];
        let colours = vec![
            vec![cv("11"), cv("11"), cv("10")],
            vec![cv("10"), cv("10")],
            vec![cv("10"), cv("11"), cv("01")],
        ];
        ColouredDbg::from_parts(5, names, unitigs, colours).unwrap()
    }

    /// Forward-strand-only graph that allows repeated unitig sequences.
    struct ListGraph {
        names: Vec<String>,
        unitigs: Vec<(Vec<u8>, Vec<ColourVector>)>,
    }

    impl ColouredGraph for ListGraph {
        fn kmer_size(&self) -> usize {
            3
        }
        fn colour_names(&self) -> &[String] {
            &self.names
        }
        fn find_kmer(&self, kmer: &[u8]) -> Option<KmerHit> {
            self.unitigs.iter().enumerate().find_map(|(unitig, (seq, _))| {
                seq.windows(3)
                    .position(|w| w == kmer)
                    .map(|position| KmerHit { unitig, position, forward: true })
            })
        }
        fn unitig_count(&self) -> usize {
            self.unitigs.len()
        }
        fn unitig(&self, id: usize) -> UnitigView<'_> {
            let seq = &self.unitigs[id].0;
            UnitigView { id, sequence: seq, len_kmers: seq.len() - 2 }
        }
        fn colour_set(&self, unitig: usize, position: usize) -> ColourVector {
            self.unitigs[unitig].1[position].clone()
        }
    }

    #[test]
    fn call_applies_head_tail_rule() {
        let called = call_unitigs(&two_unitigs());
        assert_eq!(called.len(), 3);
        // head {0,1}, tail {0}
        assert_eq!(called["AACGTGA"].to_string(), "10");
        assert_eq!(called["GTGATT"].to_string(), "10");
        // head {0}, tail {1}: present but in no colour
        assert_eq!(called["CCTTAGG"].to_string(), "00");
    }

    #[test]
    fn call_keeps_later_duplicate() {
        let g = ListGraph {
            names: vec!["x".into(), "y".into()],
            unitigs: vec![
                (b"ACGT".to_vec(), vec![cv("10"), cv("10")]),
                (b"ACGT".to_vec(), vec![cv("01"), cv("01")]),
            ],
        };
        let called = call_unitigs(&g);
        assert_eq!(called.len(), 1);
        assert_eq!(called["ACGT"].to_string(), "01");
    }

    #[test]
    fn query_walks_across_unitigs() {
        let g = two_unitigs();
        // head at AACGTGA:0 {0,1}, tail at GTGATT:1 {0}
        assert_eq!(query_unitig(&g, "AACGTGATT").unwrap().to_string(), "10");
        assert_eq!(query_unitig(&g, "aacgtgatt").unwrap().to_string(), "10");
        // reverse strand of the same walk: head {0}, tail {0,1}
        assert_eq!(query_unitig(&g, "AATCACGTT").unwrap().to_string(), "10");
        // a single k-mer is its own head and tail
        assert_eq!(query_unitig(&g, "ACGTG").unwrap().to_string(), "11");
    }

    #[test]
    fn absent_is_not_all_zero() {
        let g = two_unitigs();
        let zero = query_unitig(&g, "CCTTAGG").unwrap();
        assert!(!zero.any());
        assert_eq!(zero.len(), 2);

        assert!(query_unitig(&g, "GGGGGGG").is_none());
        // first k-mer found, a later one missing
        assert!(query_unitig(&g, "AACGTGG").is_none());
        assert!(query_unitig(&g, "ACGNTGA").is_none());
        // shorter than k
        assert!(query_unitig(&g, "ACGT").is_none());
        assert!(matches!(walk(&g, "ACG"), Err(Error::EmptyHeadOrTail)));
    }

    #[test]
    fn batch_keeps_order_and_absent_rows() {
        let g = two_unitigs();
        let queries: Vec<String> = vec!["GGGGGGG".into(), "AACGTGATT".into(), "CCTTAGG".into()];
        for rows in [
            query_unitigs(&g, &queries, &InlinePool),
            query_unitigs(&g, &queries, &RayonPool::new(3).unwrap()),
        ] {
            assert_eq!(rows.len(), 3);
            assert_eq!(rows[0], ("GGGGGGG".to_string(), None));
            assert_eq!(rows[1].1.as_ref().map(|c| c.to_string()), Some("10".into()));
            assert_eq!(rows[2].1.as_ref().map(|c| c.to_string()), Some("00".into()));
        }
    }
}
