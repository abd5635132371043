use crate::{
    Card, CardId, Column, ColumnId, Event, EventBus, Game, GameConfig, GameError, GameId,
    GameStatus, Hand, Heap, PendingSelection, Player, PlayerId, RngState, Role, Store,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a placement step. `ColumnChoiceRequired` is a legitimate
/// paused state: the affected player must call `choose_column` before
/// resolution can continue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Placement {
    Placed {
        player: PlayerId,
        card: CardId,
        column: ColumnId,
        swept: Vec<Card>,
    },
    ColumnChoiceRequired {
        player: PlayerId,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    pub player: Player,
    pub has_chosen_card: bool,
    pub needs_to_choose_column: bool,
}

/// The column whose top card has the largest number still below the
/// candidate, i.e. the minimal positive gap. Pure over the column states.
pub fn find_suitable_column<'a>(columns: &[&'a Column], number: u32) -> Option<&'a Column> {
    let mut best: Option<(&Column, u32)> = None;
    for column in columns {
        let top = match column.top() {
            Some(card) => card.number,
            None => continue,
        };
        if top >= number {
            continue;
        }
        let gap = number - top;
        if best.map_or(true, |(_, smallest)| gap < smallest) {
            best = Some((column, gap));
        }
    }
    best.map(|(column, _)| column)
}

/// Runs every public operation as one check-then-mutate unit against the
/// store it owns. Callers provide mutual exclusion per operation (the
/// exclusive borrow is the transaction scope).
pub struct Engine<S: Store> {
    pub store: S,
    pub config: GameConfig,
    pub rng: RngState,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, config: GameConfig, rng: RngState) -> Self {
        Self { store, config, rng }
    }

    // -- players -----------------------------------------------------------

    pub fn register_player(&mut self, name: &str, role: Role) -> Result<PlayerId, GameError> {
        if self.player_by_name(name).is_some() {
            return Err(GameError::NameTaken(name.to_string()));
        }
        let id = self.store.alloc_player_id();
        self.store.put_player(Player::new(id, name, role));
        Ok(id)
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.store.player(id).ok_or(GameError::PlayerNotFound(id))
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.store
            .players()
            .into_iter()
            .find(|player| player.name == name)
    }

    pub fn players(&self) -> Vec<&Player> {
        self.store.players()
    }

    /// Seeded bots not yet sitting at this table, in id order.
    pub fn available_bots(&self, game_id: GameId) -> Result<Vec<&Player>, GameError> {
        let game = self.game(game_id)?;
        Ok(self
            .store
            .players()
            .into_iter()
            .filter(|player| player.is_bot() && !game.is_member(player.id))
            .collect())
    }

    // -- lifecycle ---------------------------------------------------------

    pub fn game(&self, id: GameId) -> Result<&Game, GameError> {
        self.store.game(id).ok_or(GameError::GameNotFound(id))
    }

    fn game_mut(&mut self, id: GameId) -> Result<&mut Game, GameError> {
        self.store.game_mut(id).ok_or(GameError::GameNotFound(id))
    }

    pub fn games(&self) -> Vec<&Game> {
        self.store.games()
    }

    pub fn create_game(
        &mut self,
        owner: PlayerId,
        events: &mut EventBus,
    ) -> Result<GameId, GameError> {
        if self.player(owner)?.is_bot() {
            return Err(GameError::BotOwnerForbidden);
        }
        let id = self.store.alloc_game_id();
        self.store.put_game(Game::new(id, owner));
        events.push(Event::GameCreated { game: id, owner });
        Ok(id)
    }

    pub fn delete_game(
        &mut self,
        game_id: GameId,
        requester: PlayerId,
        events: &mut EventBus,
    ) -> Result<(), GameError> {
        let role = self.player(requester)?.role;
        let game = self.game(game_id)?;
        if game.owner != requester && role != Role::Admin {
            return Err(GameError::DeleteForbidden(requester));
        }
        self.store.remove_game(game_id);
        events.push(Event::GameDeleted { game: game_id });
        Ok(())
    }

    pub fn add_member(
        &mut self,
        game_id: GameId,
        player_id: PlayerId,
        events: &mut EventBus,
    ) -> Result<(), GameError> {
        self.player(player_id)?;
        let max_players = self.config.max_player_number;
        let game = self.game_mut(game_id)?;
        game.check_status(GameStatus::Created)?;
        if game.is_member(player_id) {
            return Err(GameError::AlreadyMember(player_id));
        }
        if game.members.len() >= max_players {
            return Err(GameError::GameFull(max_players));
        }
        game.members.push(player_id);
        events.push(Event::PlayerJoined {
            game: game_id,
            player: player_id,
        });
        Ok(())
    }

    pub fn add_bot(
        &mut self,
        game_id: GameId,
        bot_id: PlayerId,
        requester: PlayerId,
        events: &mut EventBus,
    ) -> Result<(), GameError> {
        self.game(game_id)?.check_owner(requester)?;
        if !self.player(bot_id)?.is_bot() {
            return Err(GameError::NotABot(bot_id));
        }
        self.add_member(game_id, bot_id, events)
    }

    pub fn remove_member(
        &mut self,
        game_id: GameId,
        player_id: PlayerId,
        events: &mut EventBus,
    ) -> Result<(), GameError> {
        let game = self.game(game_id)?;
        game.check_member(player_id)?;
        let successor = if game.owner == player_id {
            let next = game
                .members
                .iter()
                .copied()
                .filter(|&member| member != player_id)
                .find(|&member| {
                    self.store
                        .player(member)
                        .map_or(false, |player| !player.is_bot())
                });
            match next {
                Some(member) => Some(member),
                None => return Err(GameError::NoSuccessor),
            }
        } else {
            None
        };
        self.store.remove_hand(game_id, player_id);
        self.store.remove_heap(game_id, player_id);
        self.store.remove_selection(game_id, player_id);
        let game = self.game_mut(game_id)?;
        game.members.retain(|&member| member != player_id);
        if let Some(owner) = successor {
            game.owner = owner;
            events.push(Event::OwnerChanged {
                game: game_id,
                owner,
            });
        }
        events.push(Event::PlayerLeft {
            game: game_id,
            player: player_id,
        });
        Ok(())
    }

    /// Deals every member a hand and an empty heap, seeds the board
    /// columns from the same shrinking deck, and starts the game.
    pub fn setup(
        &mut self,
        game_id: GameId,
        requester: PlayerId,
        events: &mut EventBus,
    ) -> Result<(), GameError> {
        let game = self.game(game_id)?;
        game.check_owner(requester)?;
        game.check_status(GameStatus::Created)?;
        if game.members.len() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }
        let members = game.members.clone();
        let mut deck: Vec<Card> = self.store.cards().into_iter().copied().collect();
        if deck.len() < self.config.cards_needed(members.len()) {
            return Err(GameError::NotEnoughCards);
        }
        for &member in &members {
            let mut hand = Hand::new(game_id, member);
            for _ in 0..self.config.hand_size {
                hand.cards.push(draw(&mut deck, &mut self.rng));
            }
            self.store.put_hand(hand);
            self.store.put_heap(Heap::new(game_id, member));
        }
        for _ in 0..self.config.board_size {
            let seed = draw(&mut deck, &mut self.rng);
            let id = self.store.alloc_column_id();
            self.store.put_column(Column::new(id, game_id, seed));
        }
        let game = self.game_mut(game_id)?;
        game.status = GameStatus::Started;
        events.push(Event::GameStarted {
            game: game_id,
            members: members.len(),
        });
        Ok(())
    }

    // -- selection phase ---------------------------------------------------

    /// Commits one card from the player's hand for this round. `None`
    /// picks uniformly at random. Closes the round once every member has
    /// committed.
    pub fn choose_card(
        &mut self,
        game_id: GameId,
        player_id: PlayerId,
        card_id: Option<CardId>,
        events: &mut EventBus,
    ) -> Result<Card, GameError> {
        let game = self.game(game_id)?;
        game.check_status(GameStatus::Started)?;
        game.check_member(player_id)?;
        if game.resolving_turn {
            return Err(GameError::SelectionsClosed);
        }
        if self.store.selection(game_id, player_id).is_some() {
            return Err(GameError::AlreadySelected(player_id));
        }
        let member_count = game.members.len();
        let hand = self
            .store
            .hand_mut(game_id, player_id)
            .ok_or(GameError::HandNotFound(player_id))?;
        if hand.cards.is_empty() {
            return Err(GameError::EmptyHand(player_id));
        }
        let card = match card_id {
            Some(id) => hand.take(id).ok_or(GameError::CardNotInHand(id))?,
            None => {
                let index = self.rng.index(hand.cards.len());
                hand.cards.remove(index)
            }
        };
        self.store.put_selection(PendingSelection {
            game: game_id,
            player: player_id,
            card,
        });
        events.push(Event::CardChosen {
            game: game_id,
            player: player_id,
        });
        if self.store.selections(game_id).len() == member_count {
            self.game_mut(game_id)?.resolving_turn = true;
        }
        Ok(card)
    }

    /// Random-chooses for every bot still lacking a selection. Owner
    /// only, once per round.
    pub fn fill_bot_selections(
        &mut self,
        game_id: GameId,
        requester: PlayerId,
        events: &mut EventBus,
    ) -> Result<usize, GameError> {
        let game = self.game(game_id)?;
        game.check_owner(requester)?;
        game.check_status(GameStatus::Started)?;
        if game.resolving_turn {
            return Err(GameError::SelectionsClosed);
        }
        if game.bots_have_chosen {
            return Err(GameError::BotsAlreadyChosen);
        }
        let bots: Vec<PlayerId> = game
            .members
            .iter()
            .copied()
            .filter(|&member| {
                self.store
                    .player(member)
                    .map_or(false, |player| player.is_bot())
            })
            .collect();
        let mut chosen = 0;
        for bot in bots {
            if self.store.selection(game_id, bot).is_none() {
                self.choose_card(game_id, bot, None, events)?;
                chosen += 1;
            }
        }
        self.game_mut(game_id)?.bots_have_chosen = true;
        events.push(Event::BotsChose {
            game: game_id,
            count: chosen,
        });
        Ok(chosen)
    }

    // -- resolution --------------------------------------------------------

    /// Resolves the globally lowest-numbered pending selection. Owner
    /// only; resolution always proceeds smallest-number-first across all
    /// players.
    pub fn place_next_card(
        &mut self,
        game_id: GameId,
        requester: PlayerId,
        events: &mut EventBus,
    ) -> Result<Placement, GameError> {
        let game = self.game(game_id)?;
        game.check_owner(requester)?;
        game.check_status(GameStatus::Started)?;
        if !game.resolving_turn {
            return Err(GameError::NoCardToPlace);
        }
        let next = self
            .store
            .selections(game_id)
            .into_iter()
            .min_by_key(|selection| selection.card.number)
            .map(|selection| (selection.player, selection.card));
        let (player_id, card) = match next {
            Some(found) => found,
            None => return Err(GameError::NoCardToPlace),
        };
        let role = self.player(player_id)?.role;
        let columns = self.store.columns(game_id);
        let suitable = find_suitable_column(&columns, card.number)
            .map(|column| (column.id, column.cards.len() >= self.config.column_card_size));
        let (column_id, sweep) = match suitable {
            Some((id, full)) => (id, full),
            None if role == Role::Bot => {
                let id = self.lowest_value_column(game_id)?;
                (id, true)
            }
            // A human has to pick the column; nothing mutates here.
            None => return Ok(Placement::ColumnChoiceRequired { player: player_id }),
        };
        let swept = if sweep {
            self.sweep_column(game_id, column_id, player_id, card, events)?
        } else {
            let column = self
                .store
                .column_mut(column_id)
                .ok_or(GameError::ColumnNotFound(column_id))?;
            column.cards.push(card);
            Vec::new()
        };
        self.store.remove_selection(game_id, player_id);
        events.push(Event::CardPlaced {
            game: game_id,
            player: player_id,
            card: card.id,
            column: column_id,
        });
        self.update_status(game_id, events)?;
        Ok(Placement::Placed {
            player: player_id,
            card: card.id,
            column: column_id,
            swept,
        })
    }

    /// Manual replacement for a blocked human selection: sweep the chosen
    /// column into the player's heap and restart it from the pending card.
    pub fn choose_column(
        &mut self,
        game_id: GameId,
        player_id: PlayerId,
        column_id: ColumnId,
        events: &mut EventBus,
    ) -> Result<Placement, GameError> {
        if !self.needs_column_choice(game_id, player_id)? {
            return Err(GameError::NoColumnChoice(player_id));
        }
        let column = self
            .store
            .column(column_id)
            .ok_or(GameError::ColumnNotFound(column_id))?;
        if column.game != game_id {
            return Err(GameError::ColumnNotFound(column_id));
        }
        let card = self
            .store
            .selection(game_id, player_id)
            .ok_or(GameError::SelectionNotFound(player_id))?
            .card;
        let swept = self.sweep_column(game_id, column_id, player_id, card, events)?;
        self.store.remove_selection(game_id, player_id);
        events.push(Event::ColumnChosen {
            game: game_id,
            player: player_id,
            column: column_id,
        });
        self.update_status(game_id, events)?;
        Ok(Placement::Placed {
            player: player_id,
            card: card.id,
            column: column_id,
            swept,
        })
    }

    /// True iff the player's pending selection is blocked (no suitable
    /// column) and no lower-numbered selection is still pending, so the
    /// smallest-number-first order is preserved.
    pub fn needs_column_choice(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<bool, GameError> {
        let game = self.game(game_id)?;
        game.check_status(GameStatus::Started)?;
        game.check_member(player_id)?;
        let selection = match self.store.selection(game_id, player_id) {
            Some(selection) => selection,
            None => return Ok(false),
        };
        let columns = self.store.columns(game_id);
        if find_suitable_column(&columns, selection.card.number).is_some() {
            return Ok(false);
        }
        let lower_pending = self
            .store
            .selections(game_id)
            .into_iter()
            .any(|other| other.card.number < selection.card.number);
        Ok(!lower_pending)
    }

    // -- views -------------------------------------------------------------

    /// Until every member has committed, a player sees only their own
    /// selection (an error if they have none yet). Once the round closes
    /// everyone sees everything.
    pub fn visible_selections(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<Vec<PendingSelection>, GameError> {
        let game = self.game(game_id)?;
        game.check_status(GameStatus::Started)?;
        game.check_member(player_id)?;
        let selections = self.store.selections(game_id);
        let all_chosen = selections.len() == game.members.len();
        if !game.resolving_turn && !all_chosen {
            let own = selections
                .into_iter()
                .find(|selection| selection.player == player_id)
                .ok_or(GameError::NoSelectionYet(player_id))?;
            return Ok(vec![*own]);
        }
        Ok(selections.into_iter().copied().collect())
    }

    /// Live scores; empty until the game has started.
    pub fn results(&self, game_id: GameId) -> Result<BTreeMap<PlayerId, u32>, GameError> {
        let game = self.game(game_id)?;
        let mut results = BTreeMap::new();
        if game.status == GameStatus::Created {
            return Ok(results);
        }
        for &member in &game.members {
            let value = self
                .store
                .heap(game_id, member)
                .map_or(0, |heap| heap.value());
            results.insert(member, value);
        }
        Ok(results)
    }

    pub fn columns(&self, game_id: GameId) -> Result<Vec<&Column>, GameError> {
        self.game(game_id)?;
        Ok(self.store.columns(game_id))
    }

    pub fn hand(&self, game_id: GameId, player_id: PlayerId) -> Result<&Hand, GameError> {
        self.game(game_id)?.check_member(player_id)?;
        self.store
            .hand(game_id, player_id)
            .ok_or(GameError::HandNotFound(player_id))
    }

    pub fn heap(&self, game_id: GameId, player_id: PlayerId) -> Result<&Heap, GameError> {
        self.game(game_id)?.check_member(player_id)?;
        self.store
            .heap(game_id, player_id)
            .ok_or(GameError::HeapNotFound(player_id))
    }

    pub fn player_status(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<PlayerStatus, GameError> {
        let game = self.game(game_id)?;
        game.check_member(player_id)?;
        let player = self.player(player_id)?.clone();
        let has_chosen_card = self.store.selection(game_id, player_id).is_some();
        let needs_to_choose_column = if game.status == GameStatus::Started {
            self.needs_column_choice(game_id, player_id)?
        } else {
            false
        };
        Ok(PlayerStatus {
            player,
            has_chosen_card,
            needs_to_choose_column,
        })
    }

    /// Whether a `place_next_card` call from this requester would make
    /// progress right now.
    pub fn can_place_card(&self, game_id: GameId, requester: PlayerId) -> Result<bool, GameError> {
        let game = self.game(game_id)?;
        game.check_owner(requester)?;
        if game.status != GameStatus::Started || !game.resolving_turn {
            return Ok(false);
        }
        let next = self
            .store
            .selections(game_id)
            .into_iter()
            .min_by_key(|selection| selection.card.number);
        let selection = match next {
            Some(selection) => selection,
            None => return Ok(false),
        };
        if self.player(selection.player)?.is_bot() {
            return Ok(true);
        }
        Ok(!self.needs_column_choice(game_id, selection.player)?)
    }

    pub fn can_choose_cards_for_bots(
        &self,
        game_id: GameId,
        requester: PlayerId,
    ) -> Result<bool, GameError> {
        let game = self.game(game_id)?;
        game.check_owner(requester)?;
        if game.status != GameStatus::Started || game.resolving_turn || game.bots_have_chosen {
            return Ok(false);
        }
        let missing = game.members.iter().any(|&member| {
            self.store
                .player(member)
                .map_or(false, |player| player.is_bot())
                && self.store.selection(game_id, member).is_none()
        });
        Ok(missing)
    }

    // -- internals ---------------------------------------------------------

    /// The single sweep primitive: move the column's cards into the new
    /// owner's heap and restart the column from `replacement`.
    fn sweep_column(
        &mut self,
        game_id: GameId,
        column_id: ColumnId,
        new_owner: PlayerId,
        replacement: Card,
        events: &mut EventBus,
    ) -> Result<Vec<Card>, GameError> {
        let column = self
            .store
            .column_mut(column_id)
            .ok_or(GameError::ColumnNotFound(column_id))?;
        let swept = column.replace_with(replacement);
        let penalty = swept.iter().map(|card| card.penalty).sum();
        let heap = self
            .store
            .heap_mut(game_id, new_owner)
            .ok_or(GameError::HeapNotFound(new_owner))?;
        heap.cards.extend(swept.iter().copied());
        events.push(Event::ColumnSwept {
            game: game_id,
            player: new_owner,
            column: column_id,
            penalty,
        });
        Ok(swept)
    }

    /// Bot fallback target: the column worth the least, ties broken by
    /// coin flip.
    fn lowest_value_column(&mut self, game_id: GameId) -> Result<ColumnId, GameError> {
        let values: Vec<(ColumnId, u32)> = self
            .store
            .columns(game_id)
            .into_iter()
            .map(|column| (column.id, column.value()))
            .collect();
        let mut best: Option<(ColumnId, u32)> = None;
        for (id, value) in values {
            match best {
                None => best = Some((id, value)),
                Some((_, lowest)) if value < lowest => best = Some((id, value)),
                Some((_, lowest)) if value == lowest && self.rng.chance() => {
                    best = Some((id, value))
                }
                _ => {}
            }
        }
        best.map(|(id, _)| id)
            .ok_or(GameError::NoCardToPlace)
    }

    /// Clears the round flags once the last selection resolves, and ends
    /// the game when every hand has run dry.
    fn update_status(&mut self, game_id: GameId, events: &mut EventBus) -> Result<(), GameError> {
        if !self.store.selections(game_id).is_empty() {
            return Ok(());
        }
        let members = self.game(game_id)?.members.clone();
        let game = self.game_mut(game_id)?;
        game.resolving_turn = false;
        game.bots_have_chosen = false;
        events.push(Event::TurnResolved { game: game_id });
        let all_hands_empty = members.iter().all(|&member| {
            self.store
                .hand(game_id, member)
                .map_or(true, |hand| hand.cards.is_empty())
        });
        if all_hands_empty {
            self.game_mut(game_id)?.status = GameStatus::Finished;
            events.push(Event::GameFinished { game: game_id });
        }
        Ok(())
    }
}

fn draw(deck: &mut Vec<Card>, rng: &mut RngState) -> Card {
    let index = rng.index(deck.len());
    deck.remove(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(id: u32, numbers: &[u32]) -> Column {
        let mut cards = numbers.iter().map(|&n| Card::numbered(n));
        let mut column = Column::new(
            ColumnId(id),
            GameId(1),
            cards.next().expect("seed card"),
        );
        column.cards.extend(cards);
        column
    }

    #[test]
    fn suitable_column_takes_the_smallest_positive_gap() {
        let a = column(1, &[2]);
        let b = column(2, &[3]);
        let c = column(3, &[9]);
        let columns = vec![&a, &b, &c];
        let found = find_suitable_column(&columns, 7).expect("column");
        assert_eq!(found.id, ColumnId(2));
    }

    #[test]
    fn suitable_column_ignores_higher_tops() {
        let a = column(1, &[10]);
        let b = column(2, &[20]);
        let columns = vec![&a, &b];
        assert!(find_suitable_column(&columns, 5).is_none());
    }

    #[test]
    fn suitable_column_uses_the_last_card_only() {
        let a = column(1, &[1, 9]);
        let b = column(2, &[6]);
        let columns = vec![&a, &b];
        // 9 is closer to 8 than 6 is, but 9 is not below 8.
        let found = find_suitable_column(&columns, 8).expect("column");
        assert_eq!(found.id, ColumnId(2));
    }
}
