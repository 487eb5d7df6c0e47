//! # Tags
//! Data model shared by weighting and clustering: tag types, tag maps,
//! tagged items and the raw quiz responses they are extracted from.
//!
//! Tagging itself happens upstream; everything here is read-only input.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Category of a tag attached to a piece of free text.
///
/// Unknown names coming from the extractor are kept as `Other` so that a
/// new tag type upstream never breaks deserialization here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TagType {
    SkillVerb,
    DomainTopic,
    Value,
    Emotion,
    Context,
    ProblemTheme,
    PersonaHint,
    Other(String),
}

impl TagType {
    pub fn as_str(&self) -> &str {
        match self {
            TagType::SkillVerb => "skill_verb",
            TagType::DomainTopic => "domain_topic",
            TagType::Value => "value",
            TagType::Emotion => "emotion",
            TagType::Context => "context",
            TagType::ProblemTheme => "problem_theme",
            TagType::PersonaHint => "persona_hint",
            TagType::Other(name) => name.as_str(),
        }
    }

    /// Tag types that drive clustering when the caller does not say otherwise.
    pub fn default_source_tags() -> Vec<TagType> {
        vec![TagType::SkillVerb, TagType::DomainTopic, TagType::Value]
    }
}

impl From<String> for TagType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "skill_verb" => TagType::SkillVerb,
            "domain_topic" => TagType::DomainTopic,
            "value" => TagType::Value,
            "emotion" => TagType::Emotion,
            "context" => TagType::Context,
            "problem_theme" => TagType::ProblemTheme,
            "persona_hint" => TagType::PersonaHint,
            _ => TagType::Other(raw),
        }
    }
}

impl From<&str> for TagType {
    fn from(raw: &str) -> Self {
        TagType::from(raw.to_string())
    }
}

impl From<TagType> for String {
    fn from(t: TagType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag type → set of tag values. Ordered so iteration (and therefore every
/// tie-break downstream) is deterministic.
pub type TagMap = BTreeMap<TagType, BTreeSet<String>>;

/// A unit of user-provided text annotated with tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedItem {
    /// Optional opaque id, passed through for persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub tags: TagMap,
    /// Bullet/item score, filled by the weighting stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl TaggedItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            tags: TagMap::new(),
            score: None,
        }
    }

    /// Builder-style helper: add values under one tag type.
    pub fn with_tags<I, S>(mut self, tag_type: impl Into<TagType>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.tags.entry(tag_type.into()).or_default().extend(values);
        }
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Copy of this item with its tag map reduced to `keep`. Empty buckets are dropped.
    pub(crate) fn filtered_to(&self, keep: &[TagType]) -> TaggedItem {
        let tags = self
            .tags
            .iter()
            .filter(|(t, vals)| keep.contains(t) && !vals.is_empty())
            .map(|(t, vals)| (t.clone(), vals.clone()))
            .collect();
        TaggedItem {
            id: self.id.clone(),
            text: self.text.clone(),
            tags,
            score: self.score,
        }
    }

    /// All tag values regardless of type, deduplicated.
    pub fn flat_values(&self) -> BTreeSet<&str> {
        self.tags
            .values()
            .flat_map(|vals| vals.iter().map(String::as_str))
            .collect()
    }
}

/// A raw answer to one onboarding question, already tagged upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Identifier of the originating question, e.g. `life_map.hobbies.childhood`.
    pub store_as: String,
    #[serde(default)]
    pub tags: BTreeMap<TagType, Vec<String>>,
}

impl Response {
    pub fn new(store_as: impl Into<String>) -> Self {
        Self {
            store_as: store_as.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tag_type: impl Into<TagType>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.tags.entry(tag_type.into()).or_default();
        list.extend(values.into_iter().map(Into::into));
        self
    }
}
