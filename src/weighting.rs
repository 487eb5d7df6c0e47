//! # Tag Weighting
//! Normalized importance of every (tag type, tag value) pair across three
//! semantic contexts (joy, meaning, direction), and the fixed linear
//! combination that turns those weights into a bullet score.
//!
//! Pipeline:
//! 1. classify each response into contexts via its `store_as` key
//! 2. count, per tag, the responses of each context that carry it
//! 3. normalize counts by the context's grand total
//! 4. bullet score = 0.5*joy + 0.35*meaning + 0.15*direction (2 decimals)

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::clustering::Cluster;
use crate::debug::dev_logging_enabled;
use crate::tags::{Response, TagType, TaggedItem};

pub const JOY_COEFFICIENT: f64 = 0.5;
pub const MEANING_COEFFICIENT: f64 = 0.35;
pub const DIRECTION_COEFFICIENT: f64 = 0.15;

/// Per distinct domain topic in a cluster.
pub const DIVERSITY_STEP: f64 = 0.1;
pub const DIVERSITY_CAP: f64 = 0.3;

/// Semantic bucket of the question a response answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    Joy,
    Meaning,
    Direction,
}

/// Explicit `store_as` classification table.
///
/// A response matches a context when any `.`-separated segment of its
/// `store_as` contains one of that context's patterns. Matching is
/// case-insensitive and a response may land in several contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextTable {
    pub joy: Vec<String>,
    pub meaning: Vec<String>,
    pub direction: Vec<String>,
}

impl Default for ContextTable {
    fn default() -> Self {
        fn own(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| s.to_string()).collect()
        }
        Self {
            joy: own(&[
                "joy", "hobbies", "hobby", "childhood", "fun", "flow", "energ", "enjoy",
                "passion", "curious",
            ]),
            meaning: own(&[
                "meaning", "impact", "values", "purpose", "proud", "problem", "cause", "help",
                "contribut",
            ]),
            direction: own(&[
                "direction", "future", "goal", "vision", "dream", "aspir", "learn", "next",
            ]),
        }
    }
}

impl ContextTable {
    fn patterns(&self, ctx: Context) -> &[String] {
        match ctx {
            Context::Joy => &self.joy,
            Context::Meaning => &self.meaning,
            Context::Direction => &self.direction,
        }
    }

    /// Contexts matched by `store_as`, in joy/meaning/direction order.
    pub fn classify(&self, store_as: &str) -> Vec<Context> {
        let lowered = store_as.to_ascii_lowercase();
        let segments: Vec<&str> = lowered
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        [Context::Joy, Context::Meaning, Context::Direction]
            .into_iter()
            .filter(|&ctx| {
                self.patterns(ctx).iter().any(|p| {
                    let p = p.trim().to_ascii_lowercase();
                    !p.is_empty() && segments.iter().any(|seg| seg.contains(p.as_str()))
                })
            })
            .collect()
    }
}

/// (tag type, tag value) key used by frequency and weight maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagKey {
    pub tag_type: TagType,
    pub tag_value: String,
}

impl TagKey {
    pub fn new(tag_type: impl Into<TagType>, tag_value: impl Into<String>) -> Self {
        Self {
            tag_type: tag_type.into(),
            tag_value: tag_value.into(),
        }
    }
}

/// Number of responses per context that carry a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFrequency {
    pub joy_count: u32,
    pub meaning_count: u32,
    pub direction_count: u32,
}

impl TagFrequency {
    fn bump(&mut self, ctx: Context) {
        match ctx {
            Context::Joy => self.joy_count += 1,
            Context::Meaning => self.meaning_count += 1,
            Context::Direction => self.direction_count += 1,
        }
    }
}

/// Normalized per-context weights in [0,1]. Missing fields read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagWeights {
    pub joy_weight: f64,
    pub meaning_weight: f64,
    pub direction_weight: f64,
}

pub type FrequencyMap = BTreeMap<TagKey, TagFrequency>;
pub type WeightMap = BTreeMap<TagKey, TagWeights>;

/// One output row of [`process_tag_weights`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagScore {
    pub tag_type: TagType,
    pub tag_value: String,
    pub joy_count: u32,
    pub meaning_count: u32,
    pub direction_count: u32,
    pub joy_weight: f64,
    pub meaning_weight: f64,
    pub direction_weight: f64,
    pub bullet_score: f64,
}

/// Round to 2 decimals, half away from zero.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Count tag occurrences per context using the default classification table.
pub fn calculate_tag_frequencies(responses: &[Response]) -> FrequencyMap {
    calculate_tag_frequencies_with(responses, &ContextTable::default())
}

/// Count tag occurrences per context. A tag repeated inside one response
/// still counts that response once.
pub fn calculate_tag_frequencies_with(responses: &[Response], table: &ContextTable) -> FrequencyMap {
    let mut freq = FrequencyMap::new();

    for r in responses {
        let contexts = table.classify(&r.store_as);

        let distinct: BTreeSet<TagKey> = r
            .tags
            .iter()
            .flat_map(|(t, vals)| vals.iter().map(move |v| TagKey::new(t.clone(), v.clone())))
            .collect();

        for key in distinct {
            // Unclassified responses still register the tag with zero counts.
            let entry = freq.entry(key).or_default();
            for &ctx in &contexts {
                entry.bump(ctx);
            }
        }
    }

    freq
}

/// Normalize every context count by that context's total across all tags.
pub fn calculate_weights(frequencies: &FrequencyMap) -> WeightMap {
    let (total_joy, total_meaning, total_direction) =
        frequencies
            .values()
            .fold((0u64, 0u64, 0u64), |(j, m, d), f| {
                (
                    j + u64::from(f.joy_count),
                    m + u64::from(f.meaning_count),
                    d + u64::from(f.direction_count),
                )
            });

    fn ratio(count: u32, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            f64::from(count) / total as f64
        }
    }

    frequencies
        .iter()
        .map(|(k, f)| {
            (
                k.clone(),
                TagWeights {
                    joy_weight: ratio(f.joy_count, total_joy),
                    meaning_weight: ratio(f.meaning_count, total_meaning),
                    direction_weight: ratio(f.direction_count, total_direction),
                },
            )
        })
        .collect()
}

/// `round2(0.5*joy + 0.35*meaning + 0.15*direction)`.
pub fn calculate_bullet_score(w: &TagWeights) -> f64 {
    round2(
        JOY_COEFFICIENT * w.joy_weight
            + MEANING_COEFFICIENT * w.meaning_weight
            + DIRECTION_COEFFICIENT * w.direction_weight,
    )
}

/// Frequencies → weights → scores, sorted by bullet score (descending, stable).
pub fn process_tag_weights(responses: &[Response]) -> Vec<TagScore> {
    process_tag_weights_with(responses, &ContextTable::default())
}

pub fn process_tag_weights_with(responses: &[Response], table: &ContextTable) -> Vec<TagScore> {
    counter!("flow_weight_runs_total").increment(1);

    let freq = calculate_tag_frequencies_with(responses, table);
    let weights = calculate_weights(&freq);

    let mut out: Vec<TagScore> = weights
        .iter()
        .map(|(k, w)| {
            let f = freq.get(k).copied().unwrap_or_default();
            TagScore {
                tag_type: k.tag_type.clone(),
                tag_value: k.tag_value.clone(),
                joy_count: f.joy_count,
                meaning_count: f.meaning_count,
                direction_count: f.direction_count,
                joy_weight: w.joy_weight,
                meaning_weight: w.meaning_weight,
                direction_weight: w.direction_weight,
                bullet_score: calculate_bullet_score(w),
            }
        })
        .collect();

    // sort_by is stable: equal scores keep key order and stay adjacent.
    out.sort_by(|a, b| b.bullet_score.total_cmp(&a.bullet_score));

    if dev_logging_enabled() {
        let top: Vec<String> = out
            .iter()
            .take(5)
            .map(|s| format!("{}:{}={:.2}", s.tag_type, s.tag_value, s.bullet_score))
            .collect();
        debug!(
            target: "weighting",
            responses = responses.len(),
            tags = out.len(),
            top = ?top,
            "tag weights computed"
        );
    }

    out
}

/// Context weights of an item: per context, the sum over its distinct tags.
pub fn item_weights(item: &TaggedItem, weights: &WeightMap) -> TagWeights {
    let mut acc = TagWeights::default();
    for (t, vals) in &item.tags {
        for v in vals {
            if let Some(w) = weights.get(&TagKey::new(t.clone(), v.clone())) {
                acc.joy_weight += w.joy_weight;
                acc.meaning_weight += w.meaning_weight;
                acc.direction_weight += w.direction_weight;
            }
        }
    }
    acc
}

/// Bullet score of a single item.
pub fn score_item(item: &TaggedItem, weights: &WeightMap) -> f64 {
    calculate_bullet_score(&item_weights(item, weights))
}

/// Fill `score` on items that do not carry one yet.
pub fn annotate_scores(items: &mut [TaggedItem], weights: &WeightMap) {
    for item in items.iter_mut().filter(|i| i.score.is_none()) {
        item.score = Some(score_item(item, weights));
    }
}

/// Mean member score plus a capped bonus for distinct domain topics.
pub fn calculate_cluster_score(cluster: &Cluster) -> f64 {
    let items = cluster.items();
    let mean = if items.is_empty() {
        0.0
    } else {
        items.iter().map(|i| i.score.unwrap_or(0.0)).sum::<f64>() / items.len() as f64
    };

    let domains: BTreeSet<&str> = items
        .iter()
        .filter_map(|i| i.tags.get(&TagType::DomainTopic))
        .flat_map(|vals| vals.iter().map(String::as_str))
        .collect();
    let bonus = (domains.len() as f64 * DIVERSITY_STEP).min(DIVERSITY_CAP);

    round2(mean + bonus)
}
