#![forbid(unsafe_code)]

//! Tag-list control: an ordered, duplicate-free, optionally bounded list of
//! strings edited through one text input and a filtered suggestion list.
//!
//! # Example
//!
//! ```rust
//! use dform_core::tags::{TagKey, TagList, TagOutcome};
//!
//! let mut tags = TagList::new().with_max_tags(2);
//! tags.set_input("rust");
//! assert_eq!(tags.handle_key(TagKey::Enter), Some(TagOutcome::Added));
//! assert_eq!(tags.add_tag("rust"), TagOutcome::Duplicate);
//! assert_eq!(tags.tags(), ["rust"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::descriptor::TagConstraints;

/// Result of an add attempt. Only [`TagOutcome::Added`] changes the tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    Added,
    /// The trimmed input was empty.
    Empty,
    /// The tag is already present (case-sensitive).
    Duplicate,
    /// `max_tags` has been reached.
    Full,
    /// Custom tags are disabled and the tag is not a suggestion.
    NotAllowed,
}

/// Keys the control reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKey {
    Enter,
    Backspace,
    Escape,
    Char(char),
}

/// Tag-list state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<String>,
    input: String,
    suggestions: Vec<String>,
    max_tags: Option<usize>,
    allow_custom: bool,
    suggestions_open: bool,
}

impl Default for TagList {
    fn default() -> Self {
        Self::new()
    }
}

impl TagList {
    /// An empty list accepting any custom tag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            input: String::new(),
            suggestions: Vec::new(),
            max_tags: None,
            allow_custom: true,
            suggestions_open: false,
        }
    }

    /// A list configured from a `tags` descriptor.
    #[must_use]
    pub fn from_constraints(constraints: &TagConstraints) -> Self {
        Self {
            suggestions: constraints.suggestions.clone(),
            max_tags: constraints.max_tags,
            allow_custom: constraints.allow_custom,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_max_tags(mut self, max: usize) -> Self {
        self.max_tags = Some(max);
        self
    }

    #[must_use]
    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_allow_custom(mut self, allow: bool) -> Self {
        self.allow_custom = allow;
        self
    }

    /// Replace the tags wholesale, dropping blanks and duplicates.
    ///
    /// Used when the engine loads a stored value. The bound is not applied.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_tags(tags);
        self
    }

    /// In-place form of [`TagList::with_tags`]. The input text is kept.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.clear();
        for tag in tags {
            let tag: String = tag.into();
            let tag = tag.trim();
            if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.to_string());
            }
        }
    }

    /// Clear tags and input.
    pub fn clear(&mut self) {
        self.tags.clear();
        self.input.clear();
        self.suggestions_open = false;
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn max_tags(&self) -> Option<usize> {
        self.max_tags
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.max_tags.is_some_and(|max| self.tags.len() >= max)
    }

    /// Whether the suggestion list should be displayed.
    #[must_use]
    pub fn suggestions_open(&self) -> bool {
        self.suggestions_open && !self.input.is_empty()
    }

    /// Replace the input text. The list opens while the input is non-empty.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.suggestions_open = !self.input.is_empty();
    }

    /// Trim `raw` and append it if allowed.
    ///
    /// The input is cleared on every non-empty attempt, successful or not.
    pub fn add_tag(&mut self, raw: &str) -> TagOutcome {
        let tag = raw.trim();
        if tag.is_empty() {
            return TagOutcome::Empty;
        }
        let outcome = if self.tags.iter().any(|t| t == tag) {
            TagOutcome::Duplicate
        } else if self.is_full() {
            TagOutcome::Full
        } else if !self.allow_custom && !self.suggestions.iter().any(|s| s == tag) {
            TagOutcome::NotAllowed
        } else {
            self.tags.push(tag.to_string());
            self.suggestions_open = false;
            TagOutcome::Added
        };
        self.input.clear();
        outcome
    }

    /// Remove `value`, returning whether it was present.
    pub fn remove_tag(&mut self, value: &str) -> bool {
        match self.tags.iter().position(|t| t == value) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the most recently added tag.
    pub fn pop_tag(&mut self) -> Option<String> {
        self.tags.pop()
    }

    /// Suggestions not yet added whose text contains the input, ignoring case.
    ///
    /// Empty while the list is dismissed.
    #[must_use]
    pub fn suggestions(&self) -> Vec<&str> {
        if !self.suggestions_open() {
            return Vec::new();
        }
        let needle = self.input.to_lowercase();
        self.suggestions
            .iter()
            .filter(|s| !self.tags.contains(*s))
            .filter(|s| s.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    /// Commit the `index`-th entry of [`TagList::suggestions`].
    pub fn select_suggestion(&mut self, index: usize) -> Option<TagOutcome> {
        let chosen = self.suggestions().get(index).map(|s| (*s).to_string())?;
        Some(self.add_tag(&chosen))
    }

    /// Dismiss the suggestion list without touching the tags.
    pub fn dismiss_suggestions(&mut self) {
        self.suggestions_open = false;
    }

    /// Apply one key press.
    ///
    /// Returns the outcome when the key attempted an add.
    pub fn handle_key(&mut self, key: TagKey) -> Option<TagOutcome> {
        match key {
            TagKey::Enter => {
                if self.input.is_empty() {
                    return None;
                }
                let raw = self.input.clone();
                Some(self.add_tag(&raw))
            }
            TagKey::Backspace => {
                if self.input.is_empty() {
                    self.pop_tag();
                } else {
                    let cut = self
                        .input
                        .grapheme_indices(true)
                        .next_back()
                        .map_or(0, |(i, _)| i);
                    self.input.truncate(cut);
                    self.suggestions_open = !self.input.is_empty();
                }
                None
            }
            TagKey::Escape => {
                self.dismiss_suggestions();
                None
            }
            TagKey::Char(c) => {
                if !c.is_control() {
                    self.input.push(c);
                    self.suggestions_open = true;
                }
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
