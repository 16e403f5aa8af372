//! High score entries and leaderboard
//!
//! Entries come from the score service unsorted; the leaderboard keeps them
//! ranked and caches the last fetched board in LocalStorage for offline display.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of entries shown on the board
pub const MAX_HIGH_SCORES: usize = 10;

/// Name length bounds, in characters after sanitizing
pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 16;

/// Errors from building or submitting a score
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("name must be {min}-{max} characters (got {len})")]
    InvalidName { len: usize, min: usize, max: usize },
    #[error("score service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed score service response: {0}")]
    Malformed(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("no score service available")]
    Unavailable,
    #[error("no score waiting to be submitted")]
    NothingToSubmit,
}

/// A single high score record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u64,
    /// Set by the server when stored
    #[serde(rename = "scoreDate", default, skip_serializing_if = "Option::is_none")]
    pub score_date: Option<String>,
}

impl ScoreEntry {
    /// Build a submittable entry, stripping markup from the name
    pub fn new(name: &str, score: u64) -> Result<Self, ScoreError> {
        let name = sanitize_markup(name);
        let len = name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
            return Err(ScoreError::InvalidName {
                len,
                min: MIN_NAME_LEN,
                max: MAX_NAME_LEN,
            });
        }
        Ok(Self {
            name,
            score,
            score_date: None,
        })
    }
}

/// Remove anything that looks like an HTML tag and trim whitespace
pub fn sanitize_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Ranked scores, highest first
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    /// LocalStorage key (used only in wasm32)
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    const STORAGE_KEY: &'static str = "star_shooter_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank an unsorted list; equal scores keep their original order
    pub fn from_entries(mut entries: Vec<ScoreEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        Self { entries }
    }

    /// Whether a finished run should be offered a submission
    ///
    /// Zero never qualifies; otherwise the board is empty or the score beats
    /// the current top.
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        self.top_score().is_none_or(|top| score > top)
    }

    /// Insert a just-submitted entry at its rank
    pub fn insert(&mut self, entry: ScoreEntry) {
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// The best `n` entries
    pub fn top(&self, n: usize) -> &[ScoreEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Load the cached board from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load_cached() -> Self {
        let cached = crate::platform::web::storage_get(Self::STORAGE_KEY)
            .and_then(|json| serde_json::from_str::<Leaderboard>(&json).ok());
        match cached {
            Some(board) => {
                log::info!("Loaded {} cached high scores", board.len());
                board
            }
            None => {
                log::info!("No cached high scores, starting fresh");
                Self::new()
            }
        }
    }

    /// Cache the visible part of the board in LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save_cached(&self) {
        let visible = Self {
            entries: self.top(MAX_HIGH_SCORES).to_vec(),
        };
        match serde_json::to_string(&visible) {
            Ok(json) => crate::platform::web::storage_set(Self::STORAGE_KEY, &json),
            Err(e) => log::warn!("Could not serialize high scores: {}", e),
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_cached() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_cached(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u64) -> ScoreEntry {
        ScoreEntry::new(name, score).unwrap()
    }

    #[test]
    fn test_name_length_bounds() {
        assert_eq!(
            ScoreEntry::new("Al", 10),
            Err(ScoreError::InvalidName {
                len: 2,
                min: 3,
                max: 16
            })
        );
        let alex = ScoreEntry::new("Alex", 10).unwrap();
        assert_eq!(alex.name, "Alex");
        assert_eq!(alex.score, 10);
        assert!(ScoreEntry::new("abcdefghijklmnop", 1).is_ok());
        assert!(ScoreEntry::new("abcdefghijklmnopq", 1).is_err());
    }

    #[test]
    fn test_sanitize_strips_tags() {
        assert_eq!(sanitize_markup("<b>Zed</b>"), "Zed");
        assert_eq!(sanitize_markup("  <script>x</script>Ann "), "xAnn");
        assert_eq!(sanitize_markup("a > b"), "a > b");
        // Markup alone leaves nothing, which then fails the length check
        assert!(ScoreEntry::new("<i></i>", 5).is_err());
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_string(&entry("Alex", 10)).unwrap();
        assert_eq!(json, r#"{"name":"Alex","score":10}"#);

        let parsed: ScoreEntry =
            serde_json::from_str(r#"{"name":"Bob","score":3,"scoreDate":"2024-01-01"}"#).unwrap();
        assert_eq!(parsed.score_date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_qualifies() {
        let mut board = Leaderboard::new();
        assert!(!board.qualifies(0));
        assert!(board.qualifies(1));

        board.insert(entry("Ann", 50));
        assert!(!board.qualifies(50));
        assert!(!board.qualifies(20));
        assert!(board.qualifies(51));
    }

    #[test]
    fn test_from_entries_sorts_descending() {
        let board = Leaderboard::from_entries(vec![
            entry("Low", 5),
            entry("High", 90),
            entry("Mid", 40),
        ]);
        let scores: Vec<u64> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![90, 40, 5]);
        assert_eq!(board.top_score(), Some(90));
        assert_eq!(board.top(2).len(), 2);
        assert_eq!(board.top(20).len(), 3);
    }

    #[test]
    fn test_insert_keeps_rank_order() {
        let mut board = Leaderboard::from_entries(vec![entry("Ann", 30), entry("Bob", 10)]);
        board.insert(entry("Cat", 20));
        board.insert(entry("Dan", 40));
        let names: Vec<&str> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Dan", "Ann", "Cat", "Bob"]);
    }
}
