//! Fallback cluster names built from the most frequent tags.

use std::collections::HashMap;

use super::Cluster;
use crate::tags::TagType;

pub const LABEL_TAG_COUNT: usize = 3;
pub const UNTITLED_LABEL: &str = "Untitled theme";

/// Join the 3 most frequent (tag type, tag value) pairs into a name.
///
/// Frequency counts members carrying the pair. Ties keep first-seen order
/// (members in order, tag types in their natural order).
pub fn generate_cluster_label(cluster: &Cluster) -> String {
    let mut order: Vec<(&TagType, &str)> = Vec::new();
    let mut counts: HashMap<(&TagType, &str), usize> = HashMap::new();

    for item in cluster.items() {
        for (t, vals) in &item.tags {
            for v in vals {
                let key = (t, v.as_str());
                let n = counts.entry(key).or_insert(0);
                if *n == 0 {
                    order.push(key);
                }
                *n += 1;
            }
        }
    }

    if order.is_empty() {
        return UNTITLED_LABEL.to_string();
    }

    // Stable sort keeps first-seen order among equal counts.
    order.sort_by_key(|k| std::cmp::Reverse(counts.get(k).copied().unwrap_or(0)));

    order
        .iter()
        .take(LABEL_TAG_COUNT)
        .map(|(_, v)| *v)
        .collect::<Vec<_>>()
        .join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TaggedItem;

    #[test]
    fn picks_top_three_by_frequency() {
        let c = Cluster::from_items(vec![
            TaggedItem::new("a")
                .with_tags("skill_verb", ["coaching", "writing"])
                .with_tags("domain_topic", ["education"]),
            TaggedItem::new("b")
                .with_tags("skill_verb", ["coaching"])
                .with_tags("domain_topic", ["education"]),
            TaggedItem::new("c")
                .with_tags("skill_verb", ["coaching", "mentoring"])
                .with_tags("value", ["growth"]),
        ]);
        assert_eq!(generate_cluster_label(&c), "coaching / education / writing");
    }

    #[test]
    fn untagged_cluster_gets_placeholder() {
        let c = Cluster::from_items(vec![TaggedItem::new("plain")]);
        assert_eq!(generate_cluster_label(&c), UNTITLED_LABEL);
    }
}
