use crate::types::Suggestion;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredSuggestion {
    pub name: String,
    pub score: i64,
    pub stones: u64,
    pub rating_count: usize,
}

/// Sum of all rating values.
pub fn suggestion_score(suggestion: &Suggestion) -> i64 {
    suggestion.ratings.iter().map(|r| r.value as i64).sum()
}

/// Score descending, then stones descending, then stored order.
pub fn rank_suggestions_by_score(suggestions: &[Suggestion]) -> Vec<ScoredSuggestion> {
    let mut scored: Vec<ScoredSuggestion> = suggestions
        .iter()
        .map(|s| ScoredSuggestion {
            name: s.name.clone(),
            score: suggestion_score(s),
            stones: s.stones,
            rating_count: s.ratings.len(),
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score).then(b.stones.cmp(&a.stones)));
    scored
}

/// Highest-ranked suggestion that received at least one rating.
pub fn find_consensus_winner(suggestions: &[Suggestion]) -> Option<ScoredSuggestion> {
    rank_suggestions_by_score(suggestions)
        .into_iter()
        .find(|s| s.rating_count > 0)
}
