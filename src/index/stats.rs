// src/index/stats.rs
//! Shard size statistics.
//!
//! Labels are prefixed with a zero-padded rank so that their lexicographic order is the
//! reporting order: `01 min`, `02 med`, `03 max`, `04 mean`, `05 var`, `06 bin_size`,
//! `07 bin_1`, ... The padding width is the number of digits of `bins + 6` (at least two).

use std::collections::BTreeMap;

/// Number of labels preceding the bins.
const FIXED_LABELS: usize = 6;

fn label(name: &str, rank: usize, width: usize) -> String {
    format!("{:0width$} {}", rank, name, width = width)
}

/// The label without its rank, e.g. `bin_3` for `09 bin_3`.
pub fn label_name(label: &str) -> &str {
    label.split_once(' ').map_or(label, |(_, name)| name)
}

/// Compute the statistics of a list of shard sizes.
///
/// Sizes are sorted, the median is the element at `n / 2`, the variance is the population
/// variance. The sorted sizes are then cut into `min(bins, n)` consecutive groups of
/// `ceil(n / groups)` shards; each `bin_i` value is the total number of k-mers in group `i`.
/// An empty input yields an empty map.
pub fn statistics_from_sizes(sizes: &[usize], bins: usize) -> BTreeMap<String, f64> {
    let mut stats = BTreeMap::new();
    let n = sizes.len();
    if n == 0 {
        return stats;
    }

    let nb_bins = bins.clamp(1, n);
    let width = (nb_bins + FIXED_LABELS).to_string().len().max(2);

    let mut sorted = sizes.to_vec();
    sorted.sort_unstable();

    let (sum, sum_sq) = sorted.iter().fold((0f64, 0f64), |(s, sq), &x| {
        let x = x as f64;
        (s + x, sq + x * x)
    });
    let mean = sum / n as f64;
    let variance = sum_sq / n as f64 - mean * mean;

    stats.insert(label("min", 1, width), sorted[0] as f64);
    stats.insert(label("med", 2, width), sorted[n / 2] as f64);
    stats.insert(label("max", 3, width), sorted[n - 1] as f64);
    stats.insert(label("mean", 4, width), mean);
    stats.insert(label("var", 5, width), variance);

    let bin_size = n.div_ceil(nb_bins);
    stats.insert(label("bin_size", 6, width), bin_size as f64);

    let mut totals = vec![0usize; nb_bins];
    for (i, &size) in sorted.iter().enumerate() {
        totals[i / bin_size] += size;
    }
    for (i, total) in totals.into_iter().enumerate() {
        stats.insert(
            label(&format!("bin_{}", i + 1), i + 1 + FIXED_LABELS, width),
            total as f64,
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(stats: &BTreeMap<String, f64>, name: &str) -> f64 {
        stats
            .iter()
            .find(|(label, _)| label_name(label) == name)
            .map(|(_, v)| *v)
            .unwrap_or_else(|| panic!("missing {}", name))
    }

    #[test]
    fn test_consecutive_sizes() {
        let n = 16;
        let sizes: Vec<usize> = (0..n).rev().collect();
        let stats = statistics_from_sizes(&sizes, 4);

        let mean = (n - 1) as f64 / 2.0;
        let variance = ((n * n) as f64 - 1.0) / 12.0;
        assert_eq!(get(&stats, "min"), 0.0);
        assert_eq!(get(&stats, "max"), (n - 1) as f64);
        assert_eq!(get(&stats, "med"), 8.0);
        assert!((get(&stats, "mean") - mean).abs() < 1e-9);
        assert!((get(&stats, "var") - variance).abs() < 1e-9);
        assert_eq!(get(&stats, "bin_size"), 4.0);
        assert_eq!(get(&stats, "bin_1"), 6.0);
        assert_eq!(get(&stats, "bin_4"), 54.0);
    }

    #[test]
    fn test_label_order() {
        let stats = statistics_from_sizes(&[3, 1, 2, 0], 2);
        let labels: Vec<&str> = stats.keys().map(String::as_str).collect();
        assert_eq!(
            labels,
            vec!["01 min", "02 med", "03 max", "04 mean", "05 var", "06 bin_size", "07 bin_1", "08 bin_2"]
        );
    }

    #[test]
    fn test_bins_capped_and_padded() {
        // 4 shards, 100 bins requested: only 4 bins, one shard each.
        let stats = statistics_from_sizes(&[5, 0, 0, 1], 100);
        assert_eq!(stats.len(), FIXED_LABELS + 4);
        assert_eq!(stats["06 bin_size"], 1.0);
        assert_eq!(stats["10 bin_4"], 5.0);

        // 100 bins + 6 labels need three digits.
        let sizes = vec![1; 256];
        let stats = statistics_from_sizes(&sizes, 100);
        assert!(stats.contains_key("001 min"));
        assert!(stats.contains_key("106 bin_100"));
        assert_eq!(stats["006 bin_size"], 3.0);
        // 256 = 85 * 3 + 1: the last bin holds a single shard.
        assert_eq!(stats["091 bin_85"], 3.0);
        assert_eq!(stats["092 bin_86"], 1.0);
        assert_eq!(stats["106 bin_100"], 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(statistics_from_sizes(&[], 10).is_empty());
    }

    #[test]
    fn test_label_name() {
        assert_eq!(label_name("07 bin_1"), "bin_1");
        assert_eq!(label_name("003 max"), "max");
        assert_eq!(label_name("plain"), "plain");
    }
}
