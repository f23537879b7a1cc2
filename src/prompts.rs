use rand::seq::IndexedRandom;
use std::path::Path;

const FALLBACK_PROMPT: &str = "The best response to this moment is ____.";

const BUILTIN_PROMPTS: &[&str] = &[
    "This meeting could have been an email, but instead we got ____.",
    "The group chat exploded after someone posted ____.",
    "My entire personality this week is just ____.",
    "The real reason we were late: ____.",
    "At 2am, all good ideas become ____.",
];

/// Black-card prompts for the card game
#[derive(Debug, Clone)]
pub struct PromptDeck {
    cards: Vec<String>,
}

impl Default for PromptDeck {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptDeck {
    pub fn builtin() -> Self {
        Self {
            cards: BUILTIN_PROMPTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn new(cards: Vec<String>) -> Self {
        let cards: Vec<String> = cards
            .into_iter()
            .map(|c| c.trim().replace("\\n", "\n"))
            .filter(|c| !c.is_empty())
            .collect();
        if cards.is_empty() {
            Self::builtin()
        } else {
            Self { cards }
        }
    }

    /// Load a JSON array of prompt strings, falling back to the built-in deck
    pub fn load(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(cards) => {
                let deck = Self::new(cards);
                tracing::info!(path = %path.display(), count = deck.len(), "Loaded prompt deck");
                deck
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load prompts from {}: {}. Using built-in prompts.",
                    path.display(),
                    e
                );
                Self::builtin()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn draw(&self) -> String {
        self.cards
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_PROMPT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_deck() {
        let deck = PromptDeck::default();
        assert_eq!(deck.len(), BUILTIN_PROMPTS.len());
        assert!(deck.draw().contains("____"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Only ____ can save us now.", "   "]"#).unwrap();

        let deck = PromptDeck::load(file.path());
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.draw(), "Only ____ can save us now.");
    }

    #[test]
    fn test_bad_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{broken").unwrap();
        assert_eq!(PromptDeck::load(file.path()).len(), BUILTIN_PROMPTS.len());

        let empty = PromptDeck::new(vec![]);
        assert_eq!(empty.len(), BUILTIN_PROMPTS.len());
    }
}
