//! Redaction puzzle: one player blacks out words, everyone else guesses them.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

use super::ranking::GuessLedger;
use crate::error::{GameError, GameResult};
use crate::text::{extract_words, is_stopword, normalize_word, render_puzzle, WordSpan};
use crate::types::Quote;

/// Shortest quote the redactor can be handed
pub const MIN_WORDS_FOR_QUOTE: usize = 10;

/// One redaction allowed per ten words, never fewer than one
pub fn allowed_redactions(word_count: usize) -> usize {
    (word_count / 10).max(1)
}

#[derive(Debug, Clone)]
pub struct RedactionPuzzle {
    pub source: Quote,
    words: Vec<WordSpan>,
    /// Other quotes to borrow decoy words from
    filler_pool: Vec<Quote>,
    redactions: Vec<usize>,
    answers: Vec<String>,
    puzzle_text: String,
    pub guesses: GuessLedger,
}

impl RedactionPuzzle {
    pub fn new(source: Quote, filler_pool: Vec<Quote>) -> Self {
        let words = extract_words(&source.text);
        Self {
            source,
            words,
            filler_pool,
            redactions: Vec::new(),
            answers: Vec::new(),
            puzzle_text: String::new(),
            guesses: GuessLedger::default(),
        }
    }

    pub fn words(&self) -> Vec<&str> {
        self.words.iter().map(|w| w.word.as_str()).collect()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn max_redactions(&self) -> usize {
        allowed_redactions(self.words.len())
    }

    pub fn is_redacted(&self) -> bool {
        !self.redactions.is_empty()
    }

    pub fn redactions(&self) -> &[usize] {
        &self.redactions
    }

    pub fn gap_count(&self) -> usize {
        self.redactions.len()
    }

    pub fn puzzle_text(&self) -> &str {
        &self.puzzle_text
    }

    /// The redacted words in their original spelling
    pub fn answer_words(&self) -> Vec<String> {
        self.redactions
            .iter()
            .filter_map(|&i| self.words.get(i).map(|w| w.word.clone()))
            .collect()
    }

    pub fn redact(&mut self, indices: &[usize]) -> GameResult<()> {
        if self.is_redacted() {
            return Err(GameError::AlreadySubmitted);
        }

        let mut picked: Vec<usize> = indices.to_vec();
        picked.sort_unstable();
        picked.dedup();

        if picked.is_empty() {
            return Err(GameError::Validation("Pick at least one word to redact".to_string()));
        }
        let allowed = self.max_redactions();
        if picked.len() > allowed {
            return Err(GameError::Validation(format!(
                "This quote allows at most {} redaction{}",
                allowed,
                if allowed == 1 { "" } else { "s" }
            )));
        }
        if let Some(&bad) = picked.iter().find(|&&i| i >= self.words.len()) {
            return Err(GameError::Validation(format!(
                "Word index {} is out of range (quote has {} words)",
                bad,
                self.words.len()
            )));
        }

        let answers: Vec<String> = picked.iter().map(|&i| self.words[i].normalized.clone()).collect();
        let excluded: HashSet<String> = answers.iter().cloned().collect();
        let fillers = pick_fillers(&self.source, &self.filler_pool, &excluded, picked.len());

        self.puzzle_text = render_puzzle(&self.source.text, &picked, &fillers);
        self.redactions = picked;
        self.answers = answers;
        Ok(())
    }

    /// Record a guess for every gap; returns the solve rank when all slots match
    pub fn guess(&mut self, player_id: &str, words: Vec<String>) -> GameResult<Option<u32>> {
        if !self.is_redacted() {
            return Err(GameError::InvalidState("Nothing has been redacted yet".to_string()));
        }
        if self.guesses.has_answered(player_id) {
            return Err(GameError::AlreadySubmitted);
        }
        if words.len() != self.answers.len() {
            return Err(GameError::Validation(format!(
                "Expected {} guesses, got {}",
                self.answers.len(),
                words.len()
            )));
        }

        let words: Vec<String> = words.into_iter().map(|w| w.trim().to_string()).collect();
        let correct = words
            .iter()
            .zip(&self.answers)
            .all(|(guess, answer)| normalize_word(guess) == *answer);
        Ok(self.guesses.record(player_id, words, correct))
    }
}

/// Decoy words shown in the redaction boxes. Words from quotes that share
/// keywords with the source are favoured; any other word is the fallback.
fn pick_fillers(
    source: &Quote,
    pool: &[Quote],
    excluded: &HashSet<String>,
    count: usize,
) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let keywords: HashSet<String> = extract_words(&source.text)
        .into_iter()
        .map(|w| w.normalized)
        .filter(|n| n.len() >= 4 && !is_stopword(n))
        .collect();

    let usable = |norm: &str| norm.len() >= 3 && !is_stopword(norm) && !excluded.contains(norm);

    let mut weights: HashMap<String, u32> = HashMap::new();
    let mut display: HashMap<String, String> = HashMap::new();
    let mut fallback: HashMap<String, String> = HashMap::new();

    for quote in pool {
        let words = extract_words(&quote.text);
        let overlap = if quote.id == source.id {
            0
        } else {
            words
                .iter()
                .map(|w| w.normalized.as_str())
                .filter(|n| usable(n))
                .collect::<HashSet<_>>()
                .iter()
                .filter(|n| keywords.contains(**n))
                .count() as u32
        };

        for word in &words {
            if !usable(&word.normalized) {
                continue;
            }
            fallback
                .entry(word.normalized.clone())
                .or_insert_with(|| word.word.to_lowercase());
            if overlap > 0 {
                *weights.entry(word.normalized.clone()).or_insert(0) += overlap;
                display
                    .entry(word.normalized.clone())
                    .or_insert_with(|| word.word.to_lowercase());
            }
        }
    }

    let mut rng = rand::rng();
    let mut picks = Vec::with_capacity(count);
    let mut chosen: HashSet<String> = HashSet::new();

    while picks.len() < count && !weights.is_empty() {
        let total: u32 = weights.values().sum();
        let mut marker = rng.random_range(0..total.max(1));
        let mut selected = None;
        for (norm, weight) in &weights {
            if marker < *weight {
                selected = Some(norm.clone());
                break;
            }
            marker -= *weight;
        }
        let Some(norm) = selected.or_else(|| weights.keys().next().cloned()) else {
            break;
        };
        weights.remove(&norm);
        if chosen.insert(norm.clone()) {
            picks.push(display.get(&norm).cloned().unwrap_or(norm));
        }
    }

    if picks.len() < count {
        let mut rest: Vec<(String, String)> = fallback
            .into_iter()
            .filter(|(norm, _)| !chosen.contains(norm))
            .collect();
        rest.shuffle(&mut rng);
        picks.extend(rest.into_iter().map(|(_, word)| word).take(count - picks.len()));
    }

    while picks.len() < count {
        picks.push("redacted".to_string());
    }
    picks
}
