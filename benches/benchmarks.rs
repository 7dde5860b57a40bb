use criterion::{black_box, criterion_group, criterion_main, Criterion};

use unitig_caller::graph::colours::ColourVector;
use unitig_caller::index::{concat_records, fm, sa, IndexBackend, SequenceIndex};
use unitig_caller::output::MatchWriter;
use unitig_caller::pool::{InlinePool, RayonPool};
use unitig_caller::util::dna;
use unitig_caller::{query_unitig, ColouredDbg, SearchEngine};

fn make_reference(len: usize, seed: u32) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    let mut seq = Vec::with_capacity(len);
    let mut x: u32 = seed;
    for _ in 0..len {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seq.push(bases[(x >> 16) as usize % 4]);
    }
    seq
}

fn bench_backward_search(c: &mut Criterion) {
    let reference = make_reference(10_000, 42);
    let fm_idx = fm::FMIndex::from_text(&concat_records([reference.as_slice()]), fm::DEFAULT_BLOCK);
    let pattern = dna::encode(&reference[100..131]);

    c.bench_function("backward_search_31bp", |b| {
        b.iter(|| {
            black_box(fm_idx.backward_search(black_box(&pattern)));
        })
    });
}

fn bench_build_sa(c: &mut Criterion) {
    let reference = make_reference(10_000, 42);
    let text = concat_records([reference.as_slice()]);

    c.bench_function("build_sa_10k", |b| {
        b.iter(|| {
            black_box(sa::build_sa(black_box(&text)));
        })
    });
}

fn bench_search_engine(c: &mut Criterion) {
    let strains: Vec<Vec<u8>> = (0..16).map(|i| make_reference(5_000, 7 + i)).collect();
    let queries: Vec<String> = strains
        .iter()
        .map(|s| String::from_utf8_lossy(&s[1000..1031]).into_owned())
        .chain(std::iter::once("ACGTACGTACGTACGTACGTACGTACGTACG".to_string()))
        .collect();
    let names: Vec<String> = (0..strains.len()).map(|i| format!("s{i}")).collect();
    let indices = || {
        strains
            .iter()
            .map(|s| SequenceIndex::from_records([s.as_slice()], IndexBackend::Fm))
            .collect::<Vec<_>>()
    };

    let inline = SearchEngine::from_indices(indices(), names.clone(), &InlinePool).unwrap();
    c.bench_function("search_16_strains_inline", |b| {
        b.iter(|| {
            let out = MatchWriter::new(std::io::sink());
            black_box(inline.call_strings(black_box(&queries), &out).unwrap())
        })
    });

    let pool = RayonPool::new(4).unwrap();
    let parallel = SearchEngine::from_indices(indices(), names, &pool).unwrap();
    c.bench_function("search_16_strains_4_threads", |b| {
        b.iter(|| {
            let out = MatchWriter::new(std::io::sink());
            black_box(parallel.call_strings(black_box(&queries), &out).unwrap())
        })
    });
}

fn bench_query_unitig(c: &mut Criterion) {
    let k = 31;
    // one long unitig over two colours; random sequence has no repeated 31-mers
    let seq = make_reference(2_000, 99);
    let n_kmers = seq.len() - k + 1;
    let colours = vec![(0..n_kmers).map(|_| ColourVector::from_ids(2, [0, 1])).collect()];
    let graph = ColouredDbg::from_parts(k, vec!["a".into(), "b".into()], vec![seq.clone()], colours).unwrap();
    let query = String::from_utf8_lossy(&seq[500..700]).into_owned();

    c.bench_function("query_unitig_200bp", |b| {
        b.iter(|| black_box(query_unitig(&graph, black_box(&query))))
    });
}

criterion_group!(benches, bench_backward_search, bench_build_sa, bench_search_engine, bench_query_unitig);
criterion_main!(benches);
