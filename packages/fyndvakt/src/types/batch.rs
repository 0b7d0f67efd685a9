use serde::{Deserialize, Serialize};

use crate::types::analysis::Analysis;

/// Resumable progress through a batch of listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Listings processed so far: `min(start + chunk_size, total)`.
    pub completed: usize,
    pub total: usize,
    /// Whole percent, rounded. 100 for an empty input.
    pub percentage: u32,
}

impl BatchProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

/// Outcome of scoring one listing inside a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub listing_title: String,
    pub analysis: Analysis,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of one chunk call: results for the window plus resume state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOutcome {
    pub results: Vec<ItemOutcome>,
    pub progress: BatchProgress,
    pub has_more: bool,
    /// Cursor to pass to the next call; `None` when the batch is done.
    pub next_cursor: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(BatchProgress::new(5, 12).percentage, 42);
        assert_eq!(BatchProgress::new(10, 12).percentage, 83);
        assert_eq!(BatchProgress::new(12, 12).percentage, 100);
    }

    #[test]
    fn test_empty_batch_is_complete() {
        let progress = BatchProgress::new(0, 0);
        assert_eq!(progress.percentage, 100);
    }
}
