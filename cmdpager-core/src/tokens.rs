use std::sync::Arc;

/// Estimates the number of tokens contained in a string.
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens for the provided text.
    fn estimate_tokens(&self, text: &str) -> usize;
}

/// A simple estimator that divides characters by a fixed ratio.
///
/// The result is rounded down, so text shorter than one ratio's worth of
/// characters estimates to zero tokens.
#[derive(Debug, Clone)]
pub struct CharacterRatioTokenEstimator {
    chars_per_token: usize,
}

impl CharacterRatioTokenEstimator {
    /// Create a new estimator that assumes the provided number of characters per token.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for CharacterRatioTokenEstimator {
    fn default() -> Self {
        Self::new(cmdpager_config::PaginationConfig::DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenEstimator for CharacterRatioTokenEstimator {
    fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count() / self.chars_per_token
    }
}

/// Shared token estimator handle.
pub type SharedTokenEstimator = Arc<dyn TokenEstimator>;
