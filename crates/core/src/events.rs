use crate::{CardId, ColumnId, GameId, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    GameCreated {
        game: GameId,
        owner: PlayerId,
    },
    PlayerJoined {
        game: GameId,
        player: PlayerId,
    },
    PlayerLeft {
        game: GameId,
        player: PlayerId,
    },
    OwnerChanged {
        game: GameId,
        owner: PlayerId,
    },
    GameStarted {
        game: GameId,
        members: usize,
    },
    // No card id here: a choice stays hidden until the round closes.
    CardChosen {
        game: GameId,
        player: PlayerId,
    },
    BotsChose {
        game: GameId,
        count: usize,
    },
    CardPlaced {
        game: GameId,
        player: PlayerId,
        card: CardId,
        column: ColumnId,
    },
    ColumnSwept {
        game: GameId,
        player: PlayerId,
        column: ColumnId,
        penalty: u32,
    },
    ColumnChosen {
        game: GameId,
        player: PlayerId,
        column: ColumnId,
    },
    TurnResolved {
        game: GameId,
    },
    GameFinished {
        game: GameId,
    },
    GameDeleted {
        game: GameId,
    },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }
}
