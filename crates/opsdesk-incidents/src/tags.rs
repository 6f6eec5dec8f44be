use opsdesk_types::validate::{MAX_TAGS, MAX_TAG_CHARS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("Tag cannot be empty")]
    Empty,

    #[error("Tag too long")]
    TooLong,

    #[error("This tag has already been added.")]
    Duplicate,

    #[error("Maximum 5 tags allowed")]
    LimitReached,
}

/// Tags are stored trimmed and lowercased.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// An incident's tag list: at most five unique tags of 1..=20 characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a submitted list, applying the same rules as `add`.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Result<Self, TagError> {
        let mut set = Self::new();
        for tag in tags {
            set.add(tag.as_ref())?;
        }
        Ok(set)
    }

    pub fn add(&mut self, raw: &str) -> Result<&str, TagError> {
        let tag = normalize(raw);
        if tag.is_empty() {
            return Err(TagError::Empty);
        }
        if self.tags.contains(&tag) {
            return Err(TagError::Duplicate);
        }
        if self.tags.len() >= MAX_TAGS {
            return Err(TagError::LimitReached);
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(TagError::TooLong);
        }
        self.tags.push(tag);
        Ok(self.tags.last().map(String::as_str).unwrap_or_default())
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let tag = normalize(tag);
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        self.tags.len() != before
    }

    pub fn is_full(&self) -> bool {
        self.tags.len() >= MAX_TAGS
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tags
    }
}
