use rand::{seq::SliceRandom, Rng};

/// A word shown to the player together with the key that answers it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundPrompt {
    pub word: &'static str,
    pub key: char,
}

impl RoundPrompt {
    pub const fn new(word: &'static str, key: char) -> Self {
        Self { word, key }
    }

    /// Case-insensitive comparison of a raw key name against the required key.
    ///
    /// Multi-character names such as "Shift" or "Enter" never match.
    pub fn matches(&self, raw_key: &str) -> bool {
        let mut chars = raw_key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_uppercase().eq(self.key.to_uppercase()),
            _ => false,
        }
    }
}

pub const CATALOG: [RoundPrompt; 5] = [
    RoundPrompt::new("Queen", 'Q'),
    RoundPrompt::new("Whale", 'W'),
    RoundPrompt::new("Elephant", 'E'),
    RoundPrompt::new("Robot", 'R'),
    RoundPrompt::new("Tiger", 'T'),
];

/// Draw one prompt uniformly from the catalog. Consecutive draws are
/// independent, so the same prompt may come up twice in a row.
pub fn sample_prompt<R: Rng + ?Sized>(rng: &mut R) -> RoundPrompt {
    // CATALOG is non-empty
    *CATALOG.choose(rng).unwrap_or(&CATALOG[0])
}
