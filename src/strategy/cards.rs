//! Card table shared by the judge-pick and all-vote modes of the card game.

use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{GameError, GameResult};
use crate::types::{PlayerId, Quote};

pub const HAND_SIZE: usize = 7;

/// A card laid on the table, known to others only by its entry id until reveal
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayedCard {
    pub entry_id: String,
    pub player_id: PlayerId,
    pub quote: Quote,
}

#[derive(Debug, Clone)]
pub struct CardTable {
    pub prompt: String,
    hands: HashMap<PlayerId, Vec<Quote>>,
    played: Vec<PlayedCard>,
    /// voter -> entry id
    votes: HashMap<PlayerId, String>,
    pick: Option<String>,
}

impl CardTable {
    pub fn deal(prompt: String, hands: HashMap<PlayerId, Vec<Quote>>) -> Self {
        Self {
            prompt,
            hands,
            played: Vec::new(),
            votes: HashMap::new(),
            pick: None,
        }
    }

    pub fn hand(&self, player_id: &str) -> Option<&[Quote]> {
        self.hands.get(player_id).map(|h| h.as_slice())
    }

    pub fn played(&self) -> &[PlayedCard] {
        &self.played
    }

    pub fn played_by(&self, player_id: &str) -> Option<&PlayedCard> {
        self.played.iter().find(|c| c.player_id == player_id)
    }

    pub fn has_played(&self, player_id: &str) -> bool {
        self.played_by(player_id).is_some()
    }

    pub fn vote_of(&self, player_id: &str) -> Option<&str> {
        self.votes.get(player_id).map(|v| v.as_str())
    }

    pub fn pick(&self) -> Option<&PlayedCard> {
        let entry_id = self.pick.as_deref()?;
        self.entry(entry_id)
    }

    fn entry(&self, entry_id: &str) -> Option<&PlayedCard> {
        self.played.iter().find(|c| c.entry_id == entry_id)
    }

    pub fn play_card(&mut self, player_id: &str, card_index: usize) -> GameResult<()> {
        if self.has_played(player_id) {
            return Err(GameError::AlreadySubmitted);
        }
        let hand = self
            .hands
            .get(player_id)
            .ok_or_else(|| GameError::Forbidden("You have no hand this round".to_string()))?;
        let quote = hand.get(card_index).cloned().ok_or_else(|| {
            GameError::Validation(format!(
                "Card index {} is out of range (hand has {} cards)",
                card_index,
                hand.len()
            ))
        })?;

        self.played.push(PlayedCard {
            entry_id: ulid::Ulid::new().to_string(),
            player_id: player_id.to_string(),
            quote,
        });
        Ok(())
    }

    /// Hide arrival order before anyone judges the cards
    pub fn shuffle(&mut self) {
        self.played.shuffle(&mut rand::rng());
    }

    pub fn choose_winner(&mut self, entry_id: &str) -> GameResult<()> {
        if self.pick.is_some() {
            return Err(GameError::AlreadySubmitted);
        }
        if self.entry(entry_id).is_none() {
            return Err(GameError::Validation("That card was not played this round".to_string()));
        }
        self.pick = Some(entry_id.to_string());
        Ok(())
    }

    pub fn vote(&mut self, voter_id: &str, entry_id: &str) -> GameResult<()> {
        if !self.has_played(voter_id) {
            return Err(GameError::Forbidden(
                "Only players who played a card can vote".to_string(),
            ));
        }
        if self.votes.contains_key(voter_id) {
            return Err(GameError::AlreadySubmitted);
        }
        let entry = self
            .entry(entry_id)
            .ok_or_else(|| GameError::Validation("That card was not played this round".to_string()))?;
        if entry.player_id == voter_id {
            return Err(GameError::Validation("You cannot vote for your own card".to_string()));
        }
        self.votes.insert(voter_id.to_string(), entry_id.to_string());
        Ok(())
    }

    /// Votes per entry id, zero for cards nobody voted for
    pub fn tally(&self) -> HashMap<String, u32> {
        let mut counts: HashMap<String, u32> =
            self.played.iter().map(|c| (c.entry_id.clone(), 0)).collect();
        for entry_id in self.votes.values() {
            *counts.entry(entry_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Owner of the judge's pick
    pub fn judged_winner(&self) -> Vec<PlayerId> {
        self.pick().map(|c| vec![c.player_id.clone()]).unwrap_or_default()
    }

    /// Owners of every card tied for the most votes. A lone card wins uncontested;
    /// a table with no votes has no winner.
    pub fn voted_winners(&self) -> Vec<PlayerId> {
        if self.played.len() == 1 {
            return vec![self.played[0].player_id.clone()];
        }
        let tally = self.tally();
        let top = tally.values().copied().max().unwrap_or(0);
        if top == 0 {
            return Vec::new();
        }
        self.played
            .iter()
            .filter(|c| tally.get(&c.entry_id).copied().unwrap_or(0) == top)
            .map(|c| c.player_id.clone())
            .collect()
    }
}
