//! Two-way split of an oversized cluster.
//!
//! Not called by [`super::generate_clusters`]; `min_items_per_cluster` is
//! only consulted here.

use super::similarity::calculate_item_similarity;
use super::Cluster;
use crate::tags::TagType;

/// Split `cluster` around its two most dissimilar members.
///
/// Clusters smaller than `2 * min_items_per_cluster` (or with fewer than
/// two items) come back unchanged as a single-element vec. Otherwise every
/// other member goes to the seed it is more similar to, ties going to the
/// first seed; member order is preserved within each half.
pub fn split_cluster(
    cluster: &Cluster,
    min_items_per_cluster: usize,
    source_tags: &[TagType],
) -> Vec<Cluster> {
    let items = cluster.items();
    let n = items.len();
    if n < 2 || n < min_items_per_cluster.saturating_mul(2) {
        return vec![cluster.clone()];
    }

    // Seeds: the first pair with the lowest similarity.
    let mut seeds = (0, 1);
    let mut lowest = f64::INFINITY;
    for i in 0..n {
        for j in (i + 1)..n {
            let s = calculate_item_similarity(&items[i], &items[j], source_tags);
            if s < lowest {
                lowest = s;
                seeds = (i, j);
            }
        }
    }
    let (seed_a, seed_b) = seeds;

    let mut left = Vec::new();
    let mut right = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        if idx == seed_a {
            left.push(item.clone());
        } else if idx == seed_b {
            right.push(item.clone());
        } else {
            let to_a = calculate_item_similarity(item, &items[seed_a], source_tags);
            let to_b = calculate_item_similarity(item, &items[seed_b], source_tags);
            if to_a >= to_b {
                left.push(item.clone());
            } else {
                right.push(item.clone());
            }
        }
    }

    vec![Cluster::from_items(left), Cluster::from_items(right)]
}
