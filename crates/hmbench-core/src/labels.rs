//! # BIO Labels for Named Entity Recognition
//!
//! Tag model for the NER columns of the normalized corpora. Entity types are
//! open-ended strings (`pers`, `loc`, `org.ent`, `LOC`, ...) because every
//! benchmark family uses its own inventory.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single BIO tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BioTag {
    Begin(String),
    Inside(String),
    Outside,
}

impl BioTag {
    /// Parses a NER column value; `None` for anything that is not BIO.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "O" {
            return Some(BioTag::Outside);
        }
        let (prefix, entity) = raw.split_once('-')?;
        if entity.is_empty() {
            return None;
        }
        match prefix {
            "B" => Some(BioTag::Begin(entity.to_owned())),
            "I" => Some(BioTag::Inside(entity.to_owned())),
            _ => None,
        }
    }

    /// Entity type of the tag, `None` for `O`.
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            BioTag::Begin(entity) | BioTag::Inside(entity) => Some(entity),
            BioTag::Outside => None,
        }
    }

    /// Applies a label-name map to the entity type.
    pub fn renamed(self, label_name_map: &BTreeMap<String, String>) -> Self {
        match self {
            BioTag::Begin(entity) => {
                BioTag::Begin(label_name_map.get(&entity).cloned().unwrap_or(entity))
            }
            BioTag::Inside(entity) => {
                BioTag::Inside(label_name_map.get(&entity).cloned().unwrap_or(entity))
            }
            BioTag::Outside => BioTag::Outside,
        }
    }

    /// `I-x` may only follow `B-x` or `I-x`.
    pub fn is_valid_transition(from: &BioTag, to: &BioTag) -> bool {
        match to {
            BioTag::Inside(entity) => from.entity_type() == Some(entity.as_str()),
            _ => true,
        }
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioTag::Begin(entity) => write!(f, "B-{entity}"),
            BioTag::Inside(entity) => write!(f, "I-{entity}"),
            BioTag::Outside => write!(f, "O"),
        }
    }
}

/// An entity span over token indices (end exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub entity_type: String,
    pub start_token: usize,
    pub end_token: usize,
}

/// Groups a tag sequence into entity spans. An `I-x` that does not continue
/// an open `x` span starts a new one, the way lenient CoNLL readers do.
pub fn entities(tags: &[BioTag]) -> Vec<Entity> {
    let mut spans: Vec<Entity> = Vec::new();
    let mut open = false;

    for (i, tag) in tags.iter().enumerate() {
        match tag {
            BioTag::Outside => open = false,
            BioTag::Inside(entity)
                if open && spans.last().is_some_and(|s| &s.entity_type == entity) =>
            {
                if let Some(span) = spans.last_mut() {
                    span.end_token = i + 1;
                }
            }
            BioTag::Begin(entity) | BioTag::Inside(entity) => {
                spans.push(Entity {
                    entity_type: entity.clone(),
                    start_token: i,
                    end_token: i + 1,
                });
                open = true;
            }
        }
    }

    spans
}

/// Ordered entity-type inventory with `<unk>` at index 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDictionary {
    items: Vec<String>,
}

impl LabelDictionary {
    pub const UNKNOWN: &'static str = "<unk>";

    pub fn new() -> Self {
        Self {
            items: vec![Self::UNKNOWN.to_owned()],
        }
    }

    /// Adds an entity type, returning its index.
    pub fn add(&mut self, entity_type: &str) -> usize {
        if let Some(idx) = self.index_of(entity_type) {
            return idx;
        }
        self.items.push(entity_type.to_owned());
        self.items.len() - 1
    }

    pub fn index_of(&self, entity_type: &str) -> Option<usize> {
        self.items.iter().position(|item| item == entity_type)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Only `<unk>` present.
    pub fn is_empty(&self) -> bool {
        self.items.len() <= 1
    }
}

impl Default for LabelDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FromIterator<&'a BioTag> for LabelDictionary {
    fn from_iter<I: IntoIterator<Item = &'a BioTag>>(iter: I) -> Self {
        let mut dictionary = LabelDictionary::new();
        for tag in iter {
            if let Some(entity) = tag.entity_type() {
                dictionary.add(entity);
            }
        }
        dictionary
    }
}
