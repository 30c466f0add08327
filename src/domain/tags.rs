//! Fixed tag vocabulary and the per-post tag set.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Every tag a post may carry, in the order the writing form offers them.
pub const AVAILABLE_TAGS: [&str; 9] = [
    "AI",
    "Instagram",
    "YouTube",
    "TikTok",
    "Business",
    "Success Stories",
    "Viral Marketing",
    "Growth Strategies",
    "Tools",
];

pub const MAX_TAGS_PER_POST: usize = 2;

pub fn is_known_tag(tag: &str) -> bool {
    AVAILABLE_TAGS.contains(&tag)
}

/// Split a comma-joined tag string (`"AI, Business"`) into trimmed entries.
pub fn split_joined(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered, duplicate-free set of at most [`MAX_TAGS_PER_POST`] known tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Validate a caller-supplied list. Duplicates collapse onto their first
    /// occurrence before the size limit is checked.
    pub fn try_from_tags<I, S>(tags: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() {
                continue;
            }
            if !is_known_tag(tag) {
                return Err(DomainError::validation(format!("unknown tag `{tag}`")));
            }
            if !selected.iter().any(|existing| existing == tag) {
                selected.push(tag.to_string());
            }
        }

        if selected.len() > MAX_TAGS_PER_POST {
            return Err(DomainError::validation(format!(
                "at most {MAX_TAGS_PER_POST} tags may be selected"
            )));
        }

        Ok(Self(selected))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Wire representation accepted for tags: a JSON array or the legacy
/// comma-joined string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Joined(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl TagsInput {
    pub fn into_list(self) -> Vec<String> {
        match self {
            TagsInput::List(list) => list,
            TagsInput::Joined(joined) => split_joined(&joined),
        }
    }
}
