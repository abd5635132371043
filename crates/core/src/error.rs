use crate::{CardId, ColumnId, GameId, GameStatus, PlayerId};
use thiserror::Error;

/// Coarse taxonomy for boundary layers that map outcomes to transport
/// statuses. "Column choice required" is deliberately absent: it is a
/// `Placement` result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PreconditionFailed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("game {0} does not exist")]
    GameNotFound(GameId),
    #[error("player {0} does not exist")]
    PlayerNotFound(PlayerId),
    #[error("column {0} does not exist")]
    ColumnNotFound(ColumnId),
    #[error("card {0} does not exist")]
    CardNotFound(CardId),
    #[error("player {0} has no hand in this game")]
    HandNotFound(PlayerId),
    #[error("player {0} has no heap in this game")]
    HeapNotFound(PlayerId),
    #[error("player {0} has no pending selection")]
    SelectionNotFound(PlayerId),
    #[error("player {0} is not the game owner")]
    NotOwner(PlayerId),
    #[error("player {0} is not in the game")]
    NotMember(PlayerId),
    #[error("player {0} is already in the game")]
    AlreadyMember(PlayerId),
    #[error("game already has {0} players")]
    GameFull(usize),
    #[error("game is {actual:?}, operation requires {expected:?}")]
    WrongStatus {
        expected: GameStatus,
        actual: GameStatus,
    },
    #[error("cannot start a game with less than 2 players")]
    NotEnoughPlayers,
    #[error("card catalog is too small for this table")]
    NotEnoughCards,
    #[error("a bot cannot own a game")]
    BotOwnerForbidden,
    #[error("player {0} is not a bot")]
    NotABot(PlayerId),
    #[error("there is no other non-bot player to take ownership")]
    NoSuccessor,
    #[error("player {0} has already chosen a card")]
    AlreadySelected(PlayerId),
    #[error("cannot choose a card while the turn is being resolved")]
    SelectionsClosed,
    #[error("bots have already chosen their cards")]
    BotsAlreadyChosen,
    #[error("player {0} has no cards left")]
    EmptyHand(PlayerId),
    #[error("card {0} is not in the player's hand")]
    CardNotInHand(CardId),
    #[error("no card to place")]
    NoCardToPlace,
    #[error("player {0} does not need to choose a column")]
    NoColumnChoice(PlayerId),
    #[error("player {0} hasn't chosen a card yet")]
    NoSelectionYet(PlayerId),
    #[error("only the owner or an admin can delete a game")]
    DeleteForbidden(PlayerId),
    #[error("player name {0:?} is already taken")]
    NameTaken(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::GameNotFound(_)
            | GameError::PlayerNotFound(_)
            | GameError::ColumnNotFound(_)
            | GameError::CardNotFound(_)
            | GameError::HandNotFound(_)
            | GameError::HeapNotFound(_)
            | GameError::SelectionNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::PreconditionFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_split_lookup_failures_from_rule_failures() {
        assert_eq!(GameError::GameNotFound(GameId(1)).kind(), ErrorKind::NotFound);
        assert_eq!(
            GameError::SelectionNotFound(PlayerId(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GameError::NotOwner(PlayerId(1)).kind(),
            ErrorKind::PreconditionFailed
        );
        assert_eq!(
            GameError::NoCardToPlace.kind(),
            ErrorKind::PreconditionFailed
        );
    }
}
