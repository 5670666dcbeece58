use kmer_shards::index::ShardedIndex;
use kmer_shards::transform::{unpack, KmerLayout, TransformerKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn index_with(method: &str, k: usize, p: usize) -> ShardedIndex {
    let layout = KmerLayout::new(k, p).unwrap();
    let transformer = method.parse::<TransformerKind>().unwrap().build(layout).unwrap();
    ShardedIndex::new(k, p, transformer).unwrap()
}

#[test]
fn test_disjoint_batches_from_many_threads() {
    let k = 15;
    let index = Arc::new(index_with("identity", k, 4));
    let threads = 8;
    let per_thread = 2_000u64;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                let start = t * per_thread;
                // Spread the codes so every thread hits many shards.
                (start..start + per_thread)
                    .map(|v| unpack(v.wrapping_mul(0x9E37_79B9) & ((1 << 30) - 1), 15))
                    .filter(|kmer| index.insert(kmer).unwrap())
                    .count()
            })
        })
        .collect();

    let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let expected: HashSet<u64> = (0..threads * per_thread)
        .map(|v| v.wrapping_mul(0x9E37_79B9) & ((1 << 30) - 1))
        .collect();

    assert_eq!(inserted, expected.len());
    assert_eq!(index.size(), expected.len());
    assert_eq!(index.shard_sizes().iter().sum::<usize>(), index.size());
}

#[test]
fn test_overlapping_batches_count_each_kmer_once() {
    let index = index_with("zigzag", 12, 3);
    let mut rng = StdRng::seed_from_u64(2024);
    let pool: Vec<String> = (0..5_000).map(|_| unpack(rng.gen::<u64>() & 0xFF_FFFF, 12)).collect();
    let distinct: HashSet<&String> = pool.iter().collect();

    // Every thread inserts the whole pool: only one insert per k-mer may succeed.
    let inserted: usize = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|_| pool.iter().filter(|kmer| index.insert(kmer).unwrap()).count()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum::<usize>()
    })
    .unwrap();

    assert_eq!(inserted, distinct.len());
    assert_eq!(index.size(), distinct.len());
    for kmer in &pool {
        assert!(index.contains(kmer).unwrap());
    }
}

#[test]
fn test_readers_alongside_writers() {
    let index = index_with("cyclic", 10, 2);
    let kmers: Vec<String> = (0..10_000u64).map(|v| unpack(v * 97, 10)).collect();

    crossbeam::scope(|scope| {
        for chunk in kmers.chunks(2_500) {
            let index = &index;
            scope.spawn(move |_| {
                for kmer in chunk {
                    index.insert(kmer).unwrap();
                }
            });
        }
        // Statistics read-lock shards one at a time while writers run.
        let index = &index;
        scope.spawn(move |_| {
            for _ in 0..20 {
                let stats = index.statistics();
                assert!(stats.values().all(|v| v.is_finite()));
            }
        });
    })
    .unwrap();

    assert_eq!(index.size(), 10_000);
    let total: f64 = index.statistics().iter().filter(|(l, _)| l.contains("bin_") && !l.contains("size")).map(|(_, v)| v).sum();
    assert_eq!(total, 10_000.0);
}

#[test]
fn test_every_method_roundtrips_through_the_index() {
    let k = 7;
    let all: Vec<String> = (0..1u64 << (2 * k)).map(|v| unpack(v, k)).collect();
    for method in ["identity", "random", "inverse", "cyclic", "cyclic=4", "zigzag", "permutation=6,5,0,1,4,3,2"] {
        let index = index_with(method, k, 2);
        for kmer in &all {
            assert!(index.insert(kmer).unwrap(), "{}: {}", method, kmer);
        }
        assert_eq!(index.size(), all.len());

        let mut dumped = Vec::new();
        index.write_to(&mut dumped).unwrap();
        let dumped = String::from_utf8(dumped).unwrap();
        let decoded: HashSet<&str> = dumped
            .lines()
            .skip(1)
            .map(|l| l.trim_start_matches("- '").trim_end_matches('\''))
            .collect();
        assert_eq!(decoded.len(), all.len(), "{}", method);
        assert!(all.iter().all(|kmer| decoded.contains(kmer.as_str())));
    }
}
