use crate::{GameError, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(pub u32);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Forward-only: Created -> Started -> Finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameStatus {
    Created,
    Started,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub status: GameStatus,
    pub owner: PlayerId,
    /// In join order; ownership falls to the earliest-joined non-bot.
    pub members: Vec<PlayerId>,
    pub resolving_turn: bool,
    pub bots_have_chosen: bool,
}

impl Game {
    pub fn new(id: GameId, owner: PlayerId) -> Self {
        Self {
            id,
            status: GameStatus::Created,
            owner,
            members: vec![owner],
            resolving_turn: false,
            bots_have_chosen: false,
        }
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    pub fn check_owner(&self, player: PlayerId) -> Result<(), GameError> {
        if self.owner != player {
            return Err(GameError::NotOwner(player));
        }
        Ok(())
    }

    pub fn check_status(&self, expected: GameStatus) -> Result<(), GameError> {
        if self.status != expected {
            return Err(GameError::WrongStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    pub fn check_member(&self, player: PlayerId) -> Result<(), GameError> {
        if !self.is_member(player) {
            return Err(GameError::NotMember(player));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_has_owner_as_sole_member() {
        let game = Game::new(GameId(1), PlayerId(9));
        assert_eq!(game.status, GameStatus::Created);
        assert_eq!(game.members, vec![PlayerId(9)]);
        assert!(!game.resolving_turn);
        assert!(!game.bots_have_chosen);
        assert!(game.check_owner(PlayerId(9)).is_ok());
        assert!(game.check_owner(PlayerId(2)).is_err());
    }

    #[test]
    fn check_status_reports_actual() {
        let game = Game::new(GameId(1), PlayerId(1));
        let err = game.check_status(GameStatus::Started).unwrap_err();
        assert_eq!(
            err,
            GameError::WrongStatus {
                expected: GameStatus::Started,
                actual: GameStatus::Created,
            }
        );
    }
}
