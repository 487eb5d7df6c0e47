//! Greedy agglomerative merge with singleton cleanup.
//!
//! The working set is an arena of optional slots indexed like the initial
//! singleton list. Merging pair `(i, j)` with `i < j` moves `j`'s members
//! into `i` and empties slot `j`, so the order of live slots is exactly
//! the order a list with in-place removal would have.

use metrics::counter;
use serde::Serialize;
use tracing::{debug, warn};

use super::similarity::SimilarityMatrix;
use super::{Cluster, ClusterParams};
use crate::debug::{anon_hash, dev_logging_enabled, truncate_vec};
use crate::tags::TaggedItem;

/// Which phase accepted a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePhase {
    Agglomerative,
    SingletonCleanup,
}

/// One accepted merge, recorded for diagnostics and invariant checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeStep {
    pub phase: MergePhase,
    /// Slot that survives.
    pub into: usize,
    /// Slot that was emptied.
    pub from: usize,
    pub similarity: f64,
    /// Live clusters after this merge.
    pub clusters_after: usize,
    /// Items across live clusters after this merge.
    pub items_after: usize,
}

#[derive(Debug)]
struct Slot {
    members: Vec<usize>,
}

struct WorkingSet {
    slots: Vec<Option<Slot>>,
}

impl WorkingSet {
    fn singletons(n: usize) -> Self {
        Self {
            slots: (0..n)
                .map(|i| Some(Slot { members: vec![i] }))
                .collect(),
        }
    }

    fn live(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn item_count(&self) -> usize {
        self.live().map(|(_, s)| s.members.len()).sum()
    }

    fn members(&self, idx: usize) -> &[usize] {
        self.slots[idx]
            .as_ref()
            .map(|s| s.members.as_slice())
            .unwrap_or(&[])
    }

    /// Move every member of `from` into `into`. Both must be live and distinct.
    fn merge(&mut self, into: usize, from: usize) {
        if let Some(src) = self.slots[from].take() {
            if let Some(dst) = self.slots[into].as_mut() {
                dst.members.extend(src.members);
            }
        }
    }

    /// Best pair by average linkage; the first pair wins ties.
    fn best_pair(&self, sim: &SimilarityMatrix) -> Option<(usize, usize, f64)> {
        let live: Vec<usize> = self.live().map(|(i, _)| i).collect();
        let mut best: Option<(usize, usize, f64)> = None;
        for (a, &i) in live.iter().enumerate() {
            for &j in &live[a + 1..] {
                let s = sim.average(self.members(i), self.members(j));
                if best.map_or(true, |(_, _, b)| s > b) {
                    best = Some((i, j, s));
                }
            }
        }
        best
    }

    /// Most similar other live slot for `idx`; the first wins ties.
    fn nearest(&self, idx: usize, sim: &SimilarityMatrix) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (k, slot) in self.live() {
            if k == idx {
                continue;
            }
            let s = sim.average(self.members(idx), &slot.members);
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((k, s));
            }
        }
        best
    }
}

/// Group `items` into themes. See module docs for the merge order.
pub fn generate_clusters(items: &[TaggedItem], params: &ClusterParams) -> Vec<Cluster> {
    generate_clusters_traced(items, params).0
}

/// Same as [`generate_clusters`], also returning every accepted merge.
pub fn generate_clusters_traced(
    items: &[TaggedItem],
    params: &ClusterParams,
) -> (Vec<Cluster>, Vec<MergeStep>) {
    if items.is_empty() {
        return (Vec::new(), Vec::new());
    }

    counter!("flow_cluster_runs_total").increment(1);
    counter!("flow_cluster_items_total").increment(items.len() as u64);

    // Only source tag types take part in merge decisions.
    let prepared: Vec<TaggedItem> = if params.source_tags.is_empty() {
        items.to_vec()
    } else {
        items
            .iter()
            .map(|i| i.filtered_to(&params.source_tags))
            .collect()
    };
    let sim = SimilarityMatrix::build(&prepared, &params.source_tags);

    let mut set = WorkingSet::singletons(items.len());
    let mut steps = Vec::new();

    // (1) Agglomerative phase
    let mut iterations = 0usize;
    while set.live_count() > 1 {
        if iterations >= params.max_merge_iterations {
            warn!(
                target: "clustering",
                iterations,
                clusters = set.live_count(),
                "merge iteration cap reached"
            );
            break;
        }
        iterations += 1;

        let Some((i, j, best)) = set.best_pair(&sim) else {
            break;
        };
        if best < params.similarity_threshold {
            if dev_logging_enabled() {
                debug!(
                    target: "clustering",
                    best,
                    threshold = params.similarity_threshold,
                    clusters = set.live_count(),
                    "merge stopped below threshold"
                );
            }
            break;
        }

        dev_log_merge("merge", &set, items, i, j, best);
        set.merge(i, j);
        steps.push(MergeStep {
            phase: MergePhase::Agglomerative,
            into: i,
            from: j,
            similarity: best,
            clusters_after: set.live_count(),
            items_after: set.item_count(),
        });
    }

    // (2) Singleton cleanup
    for idx in 0..set.slots.len() {
        if set.members(idx).len() != 1 {
            continue; // absorbed earlier, or not a singleton
        }
        let Some((target, s)) = set.nearest(idx, &sim) else {
            continue;
        };
        if s >= params.min_merge_similarity {
            dev_log_merge("absorb_singleton", &set, items, target, idx, s);
            set.merge(target, idx);
            steps.push(MergeStep {
                phase: MergePhase::SingletonCleanup,
                into: target,
                from: idx,
                similarity: s,
                clusters_after: set.live_count(),
                items_after: set.item_count(),
            });
        }
    }

    counter!("flow_cluster_merges_total").increment(steps.len() as u64);

    let clusters: Vec<Cluster> = set
        .live()
        .map(|(_, slot)| {
            Cluster::from_items(slot.members.iter().map(|&m| items[m].clone()).collect())
        })
        .collect();

    if dev_logging_enabled() {
        let sizes: Vec<usize> = clusters.iter().map(Cluster::item_count).collect();
        debug!(
            target: "clustering",
            items = items.len(),
            clusters = clusters.len(),
            merges = steps.len(),
            sizes = ?sizes,
            "clustering finished"
        );
    }

    (clusters, steps)
}

/// Never logs raw text: members are identified by hash only.
fn dev_log_merge(
    event: &str,
    set: &WorkingSet,
    items: &[TaggedItem],
    into: usize,
    from: usize,
    similarity: f64,
) {
    if !dev_logging_enabled() {
        return;
    }
    let ids = |idx: usize| -> Vec<String> {
        let hashes: Vec<String> = set
            .members(idx)
            .iter()
            .map(|&m| anon_hash(&items[m].text))
            .collect();
        truncate_vec(&hashes, 5)
    };
    debug!(
        target: "clustering",
        event,
        similarity,
        into = ?ids(into),
        from = ?ids(from),
        "cluster merge"
    );
}
