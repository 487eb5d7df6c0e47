// tests/quality_metrics.rs
// Quality grading of clustering runs through the public API.

use flow_themes::quality::{calculate_intra_cluster_similarity, gini};
use flow_themes::{
    calculate_cluster_quality_metrics, generate_clusters, Cluster, ClusterParams, Grade,
    QualityMetrics, TaggedItem,
};

fn item(text: &str, skills: &[&str]) -> TaggedItem {
    TaggedItem::new(text).with_tags("skill_verb", skills.iter().copied())
}

#[test]
fn empty_cluster_list_is_all_zero_with_grade_f() {
    let m = calculate_cluster_quality_metrics(&[]);
    assert_eq!(
        m,
        QualityMetrics {
            overall_score: 0.0,
            coherence: 0.0,
            distinctness: 0.0,
            balance: 0.0,
            grade: Grade::F,
        }
    );
}

#[test]
fn single_item_cluster_is_fully_coherent() {
    let c = Cluster::from_items(vec![item("solo", &["coaching"])]);
    assert_eq!(calculate_intra_cluster_similarity(&c), 1.0);

    // One singleton: coherence 1, distinctness 1, balance 1.
    let m = calculate_cluster_quality_metrics(&[c]);
    assert_eq!(m.overall_score, 1.0);
    assert_eq!(m.grade, Grade::A);
}

#[test]
fn metrics_are_idempotent() {
    let items = vec![
        item("a", &["coaching", "writing"]),
        item("b", &["coaching"]),
        item("c", &["painting"]),
        item("d", &["painting", "drawing"]),
        item("e", &["cooking"]),
    ];
    let clusters = generate_clusters(&items, &ClusterParams::default());
    let first = calculate_cluster_quality_metrics(&clusters);
    let second = calculate_cluster_quality_metrics(&clusters);
    assert_eq!(first, second);
}

#[test]
fn unbalanced_overlapping_clusters_score_lower() {
    let big = Cluster::from_items(vec![
        item("a", &["coaching", "writing"]),
        item("b", &["coaching", "painting"]),
        item("c", &["writing", "painting"]),
        item("d", &["coaching"]),
    ]);
    let small = Cluster::from_items(vec![item("e", &["coaching"])]);
    let m = calculate_cluster_quality_metrics(&[big, small]);

    // sizes [4,1]: gini = 2*(1+8)/(2*5) - 3/2 = 0.3
    assert!((m.balance - 0.7).abs() < 1e-9);
    assert!(m.coherence < 1.0);
    assert!(m.distinctness < 1.0);
    assert!(m.overall_score < 0.8);
    assert!((0.0..=1.0).contains(&m.overall_score));
}

#[test]
fn coherence_uses_unweighted_similarity() {
    // Same value under different tag types: unweighted Jaccard sees a match.
    let c = Cluster::from_items(vec![
        TaggedItem::new("a").with_tags("skill_verb", ["teaching"]),
        TaggedItem::new("b").with_tags("emotion", ["teaching"]),
    ]);
    assert_eq!(calculate_intra_cluster_similarity(&c), 1.0);
}

#[test]
fn gini_bounds() {
    assert_eq!(gini(&[5]), 0.0);
    let g = gini(&[1, 1, 1, 50]);
    assert!(g > 0.5 && g < 1.0);
}
