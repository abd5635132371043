use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog entry. One card per number; the catalog is seeded once and
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Card {
    pub id: CardId,
    pub number: u32,
    pub penalty: u32,
}

impl Card {
    pub fn numbered(number: u32) -> Self {
        Self {
            id: CardId(number),
            number,
            penalty: penalty_for(number),
        }
    }
}

/// Bonuses stack when a number matches more than one rule (55 is worth
/// 2 + 5, for instance). Numbers matching none are worth 1.
pub fn penalty_for(number: u32) -> u32 {
    let mut value = 0;
    if number % 10 == 5 {
        value += 2;
    }
    if number % 10 == 0 {
        value += 3;
    }
    if number % 11 == 0 {
        value += 5;
    }
    if value == 0 {
        value = 1;
    }
    value
}

pub fn full_deck(max_card_number: u32) -> Vec<Card> {
    (1..=max_card_number).map(Card::numbered).collect()
}
