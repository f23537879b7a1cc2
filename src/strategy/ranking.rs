use serde::Serialize;

use crate::types::PlayerId;

/// Points for the `rank`-th correct answer among `field` possible answerers.
/// First place earns the whole field, every later solver at least one point.
pub fn rank_points(field: usize, rank: u32) -> u32 {
    let field = field.max(1) as i64;
    (field - rank as i64 + 1).max(1) as u32
}

/// One player's answer in a guessing round, in arrival order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GuessEntry {
    pub player_id: PlayerId,
    pub answer: Vec<String>,
    pub correct: bool,
    /// Arrival rank among correct answers (1 = first)
    pub rank: Option<u32>,
    pub submitted_at: String,
}

/// Arrival-ordered answers; rank is fixed the moment an answer lands
#[derive(Debug, Clone, Default)]
pub struct GuessLedger {
    entries: Vec<GuessEntry>,
}

impl GuessLedger {
    pub fn has_answered(&self, player_id: &str) -> bool {
        self.entries.iter().any(|e| e.player_id == player_id)
    }

    pub fn get(&self, player_id: &str) -> Option<&GuessEntry> {
        self.entries.iter().find(|e| e.player_id == player_id)
    }

    pub fn entries(&self) -> &[GuessEntry] {
        &self.entries
    }

    pub fn correct_count(&self) -> usize {
        self.entries.iter().filter(|e| e.correct).count()
    }

    /// Record an answer; returns the rank when it is correct
    pub fn record(&mut self, player_id: &str, answer: Vec<String>, correct: bool) -> Option<u32> {
        let rank = correct.then(|| self.correct_count() as u32 + 1);
        self.entries.push(GuessEntry {
            player_id: player_id.to_string(),
            answer,
            correct,
            rank,
            submitted_at: chrono::Utc::now().to_rfc3339(),
        });
        rank
    }

    /// (player, rank, points) for every correct answer, first solver first
    pub fn awards(&self, field: usize) -> Vec<(PlayerId, u32, u32)> {
        self.entries
            .iter()
            .filter_map(|e| e.rank.map(|rank| (e.player_id.clone(), rank, rank_points(field, rank))))
            .collect()
    }
}
