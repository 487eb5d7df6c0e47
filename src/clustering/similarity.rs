//! Weighted Jaccard similarity between tagged items and clusters.

use std::collections::BTreeSet;

use crate::tags::{TagType, TaggedItem};

const SOURCE_TAG_WEIGHT: f64 = 1.5;
const VALUE_TAG_WEIGHT: f64 = 1.0;
const INCIDENTAL_TAG_WEIGHT: f64 = 0.3;

/// Weight of one tag-type bucket: caller-nominated types dominate.
pub fn tag_type_weight(tag_type: &TagType, source_tags: &[TagType]) -> f64 {
    if source_tags.contains(tag_type) {
        SOURCE_TAG_WEIGHT
    } else if *tag_type == TagType::Value {
        VALUE_TAG_WEIGHT
    } else {
        INCIDENTAL_TAG_WEIGHT
    }
}

/// Plain Jaccard over all tag values of both items, type ignored.
pub fn unweighted_similarity(a: &TaggedItem, b: &TaggedItem) -> f64 {
    let sa = a.flat_values();
    let sb = b.flat_values();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 0.0;
    }
    sa.intersection(&sb).count() as f64 / union as f64
}

/// Item similarity in [0,1].
///
/// With empty `source_tags` this is [`unweighted_similarity`]. Otherwise
/// each tag type present on either item contributes `w·|∩|` and `w·|∪|`.
pub fn calculate_item_similarity(a: &TaggedItem, b: &TaggedItem, source_tags: &[TagType]) -> f64 {
    if source_tags.is_empty() {
        return unweighted_similarity(a, b);
    }

    let types: BTreeSet<&TagType> = a.tags.keys().chain(b.tags.keys()).collect();

    let mut weighted_inter = 0.0;
    let mut weighted_union = 0.0;
    for t in types {
        let empty = BTreeSet::new();
        let va = a.tags.get(t).unwrap_or(&empty);
        let vb = b.tags.get(t).unwrap_or(&empty);
        let w = tag_type_weight(t, source_tags);
        weighted_inter += w * va.intersection(vb).count() as f64;
        weighted_union += w * va.union(vb).count() as f64;
    }

    if weighted_union <= 0.0 {
        0.0
    } else {
        weighted_inter / weighted_union
    }
}

/// Average over all cross pairs of item similarities; 0 if either side is empty.
pub fn cluster_similarity(a: &[TaggedItem], b: &[TaggedItem], source_tags: &[TagType]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    for x in a {
        for y in b {
            sum += calculate_item_similarity(x, y, source_tags);
        }
    }
    sum / (a.len() * b.len()) as f64
}

/// Pairwise item similarities computed once per run. Items never change
/// during clustering, so every cluster comparison reads from here.
#[derive(Debug)]
pub(crate) struct SimilarityMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    pub(crate) fn build(items: &[TaggedItem], source_tags: &[TagType]) -> Self {
        let n = items.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let s = calculate_item_similarity(&items[i], &items[j], source_tags);
                data[i * n + j] = s;
                data[j * n + i] = s;
            }
        }
        Self { n, data }
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Average linkage between two member lists.
    pub(crate) fn average(&self, a: &[usize], b: &[usize]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0;
        for &i in a {
            for &j in b {
                sum += self.get(i, j);
            }
        }
        sum / (a.len() * b.len()) as f64
    }
}
