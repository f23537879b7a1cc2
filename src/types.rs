use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque ID types
pub type SessionCode = String;
pub type PlayerId = String;
pub type QuoteId = u64;

/// Fewest players any game can start with
pub const MIN_PLAYERS: usize = 2;
pub const DEFAULT_MAX_ROUNDS: u32 = 8;
pub const MAX_ROUNDS_LIMIT: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Card game: fill the black card with the funniest quote
    QuoteAnarchy,
    /// Redaction game: guess the words the redactor blacked out
    BlacklineRush,
    /// Multiple choice: pick the author of a quote
    WhoSaidIt,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::QuoteAnarchy => "quote_anarchy",
            GameKind::BlacklineRush => "blackline_rush",
            GameKind::WhoSaidIt => "who_said_it",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GameKind::QuoteAnarchy => "Quote Anarchy",
            GameKind::BlacklineRush => "Blackline Rush",
            GameKind::WhoSaidIt => "Who Said It?",
        }
    }

    /// Hard seat limit per game
    pub fn max_players(&self) -> usize {
        match self {
            GameKind::QuoteAnarchy => 4,
            GameKind::BlacklineRush | GameKind::WhoSaidIt => 8,
        }
    }

    /// Whether rounds rotate a leader (judge or redactor) through the seats
    pub fn has_leader(&self, mode: JudgingMode) -> bool {
        match self {
            GameKind::QuoteAnarchy => mode == JudgingMode::Judge,
            GameKind::BlacklineRush => true,
            GameKind::WhoSaidIt => false,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "quote_anarchy" | "anarchy" => Ok(GameKind::QuoteAnarchy),
            "blackline_rush" | "blackline" => Ok(GameKind::BlacklineRush),
            "who_said_it" | "who_said" => Ok(GameKind::WhoSaidIt),
            other => Err(format!("Unknown game '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Collecting,
    Judging,
    Guessing,
    Reveal,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JudgingMode {
    #[default]
    Judge,
    AllVote,
}

/// Why a session stopped accepting moves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    HostEnded,
    HostLeft,
    NotEnoughPlayers,
    MaxRounds,
    QuotesExhausted,
}

impl EndReason {
    pub fn message(&self, rounds_played: u32) -> String {
        match self {
            EndReason::HostEnded => "Game ended by host.".to_string(),
            EndReason::HostLeft => "The host left before the game started.".to_string(),
            EndReason::NotEnoughPlayers => "Not enough players left to continue.".to_string(),
            EndReason::MaxRounds => format!("Game ended after {} rounds.", rounds_played),
            EndReason::QuotesExhausted => "Ran out of playable quotes.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub judging_mode: JudgingMode,
    pub max_players: usize,
    pub max_rounds: u32,
}

impl SessionConfig {
    /// Build a config for `kind`, clamping requested values into the allowed ranges
    pub fn for_game(
        kind: GameKind,
        judging_mode: Option<JudgingMode>,
        max_players: Option<usize>,
        max_rounds: Option<u32>,
    ) -> Self {
        let judging_mode = match kind {
            GameKind::QuoteAnarchy => judging_mode.unwrap_or_default(),
            _ => JudgingMode::Judge,
        };
        Self {
            judging_mode,
            max_players: max_players
                .unwrap_or(kind.max_players())
                .clamp(MIN_PLAYERS, kind.max_players()),
            max_rounds: max_rounds
                .unwrap_or(DEFAULT_MAX_ROUNDS)
                .clamp(1, MAX_ROUNDS_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub seat: u32,
    pub score: u32,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub id: QuoteId,
    #[serde(alias = "quote")]
    pub text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Quote {
    pub fn new(id: QuoteId, text: impl Into<String>, authors: &[&str]) -> Self {
        Self {
            id,
            text: text.into(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            context: None,
        }
    }

    pub fn word_count(&self) -> usize {
        crate::text::extract_words(&self.text).len()
    }

    /// The sole credited author, if exactly one is listed
    pub fn single_author(&self) -> Option<&str> {
        let mut named = self.authors.iter().map(|a| a.trim()).filter(|a| !a.is_empty());
        match (named.next(), named.next()) {
            (Some(author), None) => Some(author),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_parsing() {
        assert_eq!("quote_anarchy".parse::<GameKind>(), Ok(GameKind::QuoteAnarchy));
        assert_eq!("blackline-rush".parse::<GameKind>(), Ok(GameKind::BlacklineRush));
        assert_eq!("Who_Said_It".parse::<GameKind>(), Ok(GameKind::WhoSaidIt));
        assert!("poker".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_session_config_clamps() {
        let config = SessionConfig::for_game(GameKind::QuoteAnarchy, None, Some(10), Some(99));
        assert_eq!(config.max_players, 4);
        assert_eq!(config.max_rounds, MAX_ROUNDS_LIMIT);
        assert_eq!(config.judging_mode, JudgingMode::Judge);

        let config = SessionConfig::for_game(GameKind::WhoSaidIt, Some(JudgingMode::AllVote), None, Some(0));
        assert_eq!(config.max_players, 8);
        assert_eq!(config.max_rounds, 1);
        // only the card game has judging modes
        assert_eq!(config.judging_mode, JudgingMode::Judge);
    }

    #[test]
    fn test_single_author() {
        assert_eq!(Quote::new(1, "hi", &["Ada"]).single_author(), Some("Ada"));
        assert_eq!(Quote::new(2, "hi", &["Ada", "Bob"]).single_author(), None);
        assert_eq!(Quote::new(3, "hi", &[]).single_author(), None);
    }

    #[test]
    fn test_quote_accepts_legacy_field_name() {
        let quote: Quote =
            serde_json::from_str(r#"{"id": 7, "quote": "Hello there", "authors": ["Kenobi"]}"#)
                .unwrap();
        assert_eq!(quote.text, "Hello there");
        assert_eq!(quote.single_author(), Some("Kenobi"));
    }
}
