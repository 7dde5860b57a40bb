use serde::{Deserialize, Serialize};

use super::ExactMatchIndex;

/// Linear-scan backend: keeps the concatenated, encoded text as is.
///
/// Build is a copy; each query scans the whole text. Useful for small
/// collections and as a reference for the FM backend.
#[derive(Debug, Serialize, Deserialize)]
pub struct RawIndex {
    text: Vec<u8>,
}

impl RawIndex {
    pub fn new(text: Vec<u8>) -> Self {
        Self { text }
    }
}

impl ExactMatchIndex for RawIndex {
    fn contains(&self, pattern: &[u8]) -> bool {
        if pattern.len() > self.text.len() {
            return false;
        }
        let Some((&first, rest)) = pattern.split_first() else {
            return !self.text.is_empty();
        };
        self.text
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == first)
            .any(|(i, _)| self.text.get(i + 1..i + 1 + rest.len()) == Some(rest))
    }
}
