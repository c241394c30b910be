//! Work (catalog entry) model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Author recorded when the catalog source has no author column
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// A lendable title with a pool of available copies.
///
/// `available_copies` is unsigned, so the counter can never go negative;
/// it moves only through [`Work::take_copy`] and [`Work::put_back_copy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Work {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub available_copies: u32,
}

impl Work {
    pub fn new(id: i32, title: impl Into<String>, author: Option<String>, available_copies: u32) -> Self {
        Self {
            id,
            title: title.into(),
            author: author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            available_copies,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Remove one copy from the shelf. Returns false when none are left.
    pub fn take_copy(&mut self) -> bool {
        match self.available_copies.checked_sub(1) {
            Some(remaining) => {
                self.available_copies = remaining;
                true
            }
            None => false,
        }
    }

    /// Put one copy back. There is no stored ceiling, so this always succeeds.
    pub fn put_back_copy(&mut self) {
        self.available_copies = self.available_copies.saturating_add(1);
    }

    pub fn title_matches(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.trim().to_lowercase()
    }
}
