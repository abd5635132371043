use crate::{Card, CardId, GameId, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player's undealt-but-unplayed cards for one game. Order carries no
/// meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hand {
    pub game: GameId,
    pub player: PlayerId,
    pub cards: Vec<Card>,
}

impl Hand {
    pub fn new(game: GameId, player: PlayerId) -> Self {
        Self {
            game,
            player,
            cards: Vec::new(),
        }
    }

    pub fn take(&mut self, id: CardId) -> Option<Card> {
        let index = self.cards.iter().position(|card| card.id == id)?;
        Some(self.cards.remove(index))
    }
}

/// Penalty pile. Grows monotonically until the game ends; its value is
/// the player's score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heap {
    pub game: GameId,
    pub player: PlayerId,
    pub cards: Vec<Card>,
}

impl Heap {
    pub fn new(game: GameId, player: PlayerId) -> Self {
        Self {
            game,
            player,
            cards: Vec::new(),
        }
    }

    pub fn value(&self) -> u32 {
        self.cards.iter().map(|card| card.penalty).sum()
    }
}

/// Board stack. Seeded with one card at setup and reset to one card on
/// every sweep, so it is never empty; only the last card constrains the
/// next placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub game: GameId,
    pub cards: Vec<Card>,
}

impl Column {
    pub fn new(id: ColumnId, game: GameId, seed: Card) -> Self {
        Self {
            id,
            game,
            cards: vec![seed],
        }
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn value(&self) -> u32 {
        self.cards.iter().map(|card| card.penalty).sum()
    }

    /// Empties the column and restarts it from `card`, returning the
    /// swept contents.
    pub fn replace_with(&mut self, card: Card) -> Vec<Card> {
        std::mem::replace(&mut self.cards, vec![card])
    }
}

/// A card a player has committed for the current round, awaiting
/// placement. At most one per (game, player).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingSelection {
    pub game: GameId,
    pub player: PlayerId,
    pub card: Card,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: u32) -> Card {
        Card::numbered(number)
    }

    #[test]
    fn hand_take_removes_only_the_requested_card() {
        let mut hand = Hand::new(GameId(1), PlayerId(1));
        hand.cards = vec![card(3), card(8), card(20)];
        let taken = hand.take(CardId(8)).unwrap();
        assert_eq!(taken.number, 8);
        assert_eq!(hand.cards.len(), 2);
        assert!(hand.take(CardId(8)).is_none());
    }

    #[test]
    fn column_replace_returns_previous_contents() {
        let mut column = Column::new(ColumnId(1), GameId(1), card(10));
        column.cards.push(card(12));
        let swept = column.replace_with(card(4));
        assert_eq!(swept.len(), 2);
        assert_eq!(column.cards.len(), 1);
        assert_eq!(column.top().unwrap().number, 4);
    }

    #[test]
    fn values_sum_penalties() {
        let mut heap = Heap::new(GameId(1), PlayerId(1));
        heap.cards = vec![card(5), card(20), card(55)];
        assert_eq!(heap.value(), 2 + 3 + 7);
        let mut column = Column::new(ColumnId(1), GameId(1), card(11));
        column.cards.push(card(1));
        assert_eq!(column.value(), 6);
    }
}
