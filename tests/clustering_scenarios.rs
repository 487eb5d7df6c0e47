// tests/clustering_scenarios.rs
//
// Behavioural checks for the merge loop: hand-picked scenarios plus
// seeded random inputs for partition / shrink / termination invariants.

use std::collections::BTreeMap;

use flow_themes::clustering::{
    calculate_item_similarity, cluster_similarity, generate_clusters, generate_clusters_traced,
    MergePhase,
};
use flow_themes::{ClusterParams, TagType, TaggedItem};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SKILLS: &[&str] = &["coaching", "writing", "painting", "coding", "teaching", "cooking"];
const DOMAINS: &[&str] = &["education", "health", "art", "tech"];
const VALUES: &[&str] = &["growth", "freedom", "care"];
const EMOTIONS: &[&str] = &["calm", "excited", "proud"];

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> Vec<&'a str> {
    pool.iter()
        .copied()
        .filter(|_| rng.random_bool(0.35))
        .collect()
}

fn random_items(seed: u64, n: usize) -> Vec<TaggedItem> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let mut it = TaggedItem::new(format!("item-{i}"));
            it.id = Some(format!("id-{i}"));
            it.with_tags("skill_verb", pick(&mut rng, SKILLS))
                .with_tags("domain_topic", pick(&mut rng, DOMAINS))
                .with_tags("value", pick(&mut rng, VALUES))
                .with_tags("emotion", pick(&mut rng, EMOTIONS))
        })
        .collect()
}

fn ids(items: &[TaggedItem]) -> Vec<String> {
    let mut v: Vec<String> = items.iter().filter_map(|i| i.id.clone()).collect();
    v.sort();
    v
}

#[test]
fn scenario_identical_pair_and_outlier() {
    let items = vec![
        TaggedItem::new("A").with_tags("skill_verb", ["coaching"]),
        TaggedItem::new("B").with_tags("skill_verb", ["coaching"]),
        TaggedItem::new("C").with_tags("skill_verb", ["painting"]),
    ];
    let params = ClusterParams {
        source_tags: vec![TagType::SkillVerb],
        similarity_threshold: 0.25,
        ..ClusterParams::default()
    };
    let out = generate_clusters(&items, &params);
    let sizes: Vec<usize> = out.iter().map(|c| c.item_count()).collect();
    assert_eq!(sizes, vec![2, 1]);
}

#[test]
fn scenario_empty_input() {
    assert!(generate_clusters(&[], &ClusterParams::default()).is_empty());
}

#[test]
fn untagged_items_stay_apart() {
    let items: Vec<TaggedItem> = (0..4).map(|i| TaggedItem::new(i.to_string())).collect();
    let out = generate_clusters(&items, &ClusterParams::default());
    assert_eq!(out.len(), 4);
}

#[test]
fn zero_threshold_collapses_everything() {
    let items = random_items(3, 12);
    let params = ClusterParams {
        similarity_threshold: 0.0,
        ..ClusterParams::default()
    };
    let out = generate_clusters(&items, &params);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].item_count(), 12);
}

#[test]
fn partition_is_preserved_for_random_inputs() {
    for seed in 0..20u64 {
        let items = random_items(seed, 15);
        let (out, steps) = generate_clusters_traced(&items, &ClusterParams::default());

        let got: Vec<TaggedItem> = out.iter().flat_map(|c| c.items().to_vec()).collect();
        assert_eq!(got.len(), items.len(), "seed {seed}: item count changed");
        assert_eq!(ids(&got), ids(&items), "seed {seed}: items lost or duplicated");

        // Every intermediate stage conserved the items too.
        assert!(steps.iter().all(|s| s.items_after == items.len()));
        assert!(out.iter().all(|c| c.item_count() > 0));
    }
}

#[test]
fn every_merge_shrinks_by_exactly_one() {
    for seed in 0..20u64 {
        let items = random_items(seed, 12);
        let (out, steps) = generate_clusters_traced(&items, &ClusterParams::default());

        let mut expected = items.len();
        for s in &steps {
            expected -= 1;
            assert_eq!(s.clusters_after, expected, "seed {seed}");
        }
        assert_eq!(out.len(), expected);
    }
}

fn source_only(items: &[TaggedItem], sources: &[TagType]) -> Vec<TaggedItem> {
    items
        .iter()
        .map(|i| {
            let mut f = i.clone();
            f.tags.retain(|t, vals| sources.contains(t) && !vals.is_empty());
            f
        })
        .collect()
}

#[test]
fn agglomeration_stops_exactly_at_threshold() {
    let params = ClusterParams {
        min_merge_similarity: 2.0, // no cleanup merges
        ..ClusterParams::default()
    };
    for seed in 0..20u64 {
        let items = random_items(seed, 10);
        let (out, steps) = generate_clusters_traced(&items, &params);

        // Every accepted merge met the threshold...
        assert!(steps.iter().all(|s| s.phase == MergePhase::Agglomerative));
        assert!(steps
            .iter()
            .all(|s| s.similarity >= params.similarity_threshold));

        // ...and no remaining pair of clusters would still qualify.
        let groups: Vec<Vec<TaggedItem>> = out
            .iter()
            .map(|c| source_only(c.items(), &params.source_tags))
            .collect();
        for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                let s = cluster_similarity(&groups[i], &groups[j], &params.source_tags);
                assert!(
                    s < params.similarity_threshold,
                    "seed {seed}: clusters {i},{j} still at {s}"
                );
            }
        }
    }
}

#[test]
fn cleanup_merges_respect_min_similarity() {
    let params = ClusterParams::default();
    for seed in 0..20u64 {
        let items = random_items(seed, 10);
        let (_, steps) = generate_clusters_traced(&items, &params);
        assert!(steps
            .iter()
            .filter(|s| s.phase == MergePhase::SingletonCleanup)
            .all(|s| s.similarity >= params.min_merge_similarity));
    }
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    let items = random_items(42, 25);
    let sources = TagType::default_source_tags();
    for a in &items {
        for b in &items {
            let ab = calculate_item_similarity(a, b, &sources);
            let ba = calculate_item_similarity(b, a, &sources);
            assert_eq!(ab, ba);
            assert!((0.0..=1.0).contains(&ab));

            let plain = calculate_item_similarity(a, b, &[]);
            assert_eq!(plain, calculate_item_similarity(b, a, &[]));
            assert!((0.0..=1.0).contains(&plain));
        }
    }
}

#[test]
fn output_is_deterministic() {
    let items = random_items(7, 14);
    let a = generate_clusters(&items, &ClusterParams::default());
    let b = generate_clusters(&items, &ClusterParams::default());
    assert_eq!(a, b);
}

#[test]
fn centroid_reflects_majority_tags() {
    let items = vec![
        TaggedItem::new("a").with_tags("skill_verb", ["coaching", "writing"]),
        TaggedItem::new("b").with_tags("skill_verb", ["coaching"]),
        TaggedItem::new("c").with_tags("skill_verb", ["coaching", "painting"]),
    ];
    let params = ClusterParams {
        source_tags: vec![TagType::SkillVerb],
        ..ClusterParams::default()
    };
    let out = generate_clusters(&items, &params);
    assert_eq!(out.len(), 1);

    let skills: BTreeMap<_, _> = out[0]
        .centroid()
        .iter()
        .map(|(t, v)| (t.clone(), v.len()))
        .collect();
    // coaching 3/3, writing 1/3, painting 1/3 (all ≥ 30%)
    assert_eq!(skills.get(&TagType::SkillVerb), Some(&3));
}
