use crate::{
    Card, CardId, Column, ColumnId, Game, GameId, Hand, Heap, PendingSelection, Player, PlayerId,
};
use std::collections::BTreeMap;

/// Persistence seam the engine runs against. Implementations must hand
/// back per-game collections in a stable order (id / join order) so a
/// seeded run replays identically, and must cascade per-game state when
/// a game or player goes away.
pub trait Store {
    // card catalog
    fn put_card(&mut self, card: Card);
    fn card(&self, id: CardId) -> Option<&Card>;
    fn cards(&self) -> Vec<&Card>;
    fn card_count(&self) -> usize;

    // players
    fn alloc_player_id(&mut self) -> PlayerId;
    fn put_player(&mut self, player: Player);
    fn player(&self, id: PlayerId) -> Option<&Player>;
    fn players(&self) -> Vec<&Player>;
    fn remove_player(&mut self, id: PlayerId) -> Option<Player>;

    // games
    fn alloc_game_id(&mut self) -> GameId;
    fn put_game(&mut self, game: Game);
    fn game(&self, id: GameId) -> Option<&Game>;
    fn game_mut(&mut self, id: GameId) -> Option<&mut Game>;
    fn games(&self) -> Vec<&Game>;
    fn remove_game(&mut self, id: GameId) -> Option<Game>;

    // hands
    fn put_hand(&mut self, hand: Hand);
    fn hand(&self, game: GameId, player: PlayerId) -> Option<&Hand>;
    fn hand_mut(&mut self, game: GameId, player: PlayerId) -> Option<&mut Hand>;
    fn remove_hand(&mut self, game: GameId, player: PlayerId) -> Option<Hand>;

    // heaps
    fn put_heap(&mut self, heap: Heap);
    fn heap(&self, game: GameId, player: PlayerId) -> Option<&Heap>;
    fn heap_mut(&mut self, game: GameId, player: PlayerId) -> Option<&mut Heap>;
    fn remove_heap(&mut self, game: GameId, player: PlayerId) -> Option<Heap>;

    // columns
    fn alloc_column_id(&mut self) -> ColumnId;
    fn put_column(&mut self, column: Column);
    fn column(&self, id: ColumnId) -> Option<&Column>;
    fn column_mut(&mut self, id: ColumnId) -> Option<&mut Column>;
    fn columns(&self, game: GameId) -> Vec<&Column>;

    // pending selections
    fn put_selection(&mut self, selection: PendingSelection);
    fn selection(&self, game: GameId, player: PlayerId) -> Option<&PendingSelection>;
    fn selections(&self, game: GameId) -> Vec<&PendingSelection>;
    fn remove_selection(&mut self, game: GameId, player: PlayerId) -> Option<PendingSelection>;
}

/// In-process store. BTreeMaps keep iteration deterministic, which the
/// seeded-randomness guarantees depend on.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: BTreeMap<CardId, Card>,
    players: BTreeMap<PlayerId, Player>,
    games: BTreeMap<GameId, Game>,
    hands: BTreeMap<(GameId, PlayerId), Hand>,
    heaps: BTreeMap<(GameId, PlayerId), Heap>,
    columns: BTreeMap<ColumnId, Column>,
    selections: BTreeMap<(GameId, PlayerId), PendingSelection>,
    next_player: u32,
    next_game: u32,
    next_column: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn put_card(&mut self, card: Card) {
        self.cards.insert(card.id, card);
    }

    fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    fn cards(&self) -> Vec<&Card> {
        self.cards.values().collect()
    }

    fn card_count(&self) -> usize {
        self.cards.len()
    }

    fn alloc_player_id(&mut self) -> PlayerId {
        self.next_player += 1;
        PlayerId(self.next_player)
    }

    fn put_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    fn players(&self) -> Vec<&Player> {
        self.players.values().collect()
    }

    fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.hands.retain(|&(_, player), _| player != id);
        self.heaps.retain(|&(_, player), _| player != id);
        self.selections.retain(|&(_, player), _| player != id);
        self.players.remove(&id)
    }

    fn alloc_game_id(&mut self) -> GameId {
        self.next_game += 1;
        GameId(self.next_game)
    }

    fn put_game(&mut self, game: Game) {
        self.games.insert(game.id, game);
    }

    fn game(&self, id: GameId) -> Option<&Game> {
        self.games.get(&id)
    }

    fn game_mut(&mut self, id: GameId) -> Option<&mut Game> {
        self.games.get_mut(&id)
    }

    fn games(&self) -> Vec<&Game> {
        self.games.values().collect()
    }

    fn remove_game(&mut self, id: GameId) -> Option<Game> {
        self.hands.retain(|&(game, _), _| game != id);
        self.heaps.retain(|&(game, _), _| game != id);
        self.selections.retain(|&(game, _), _| game != id);
        self.columns.retain(|_, column| column.game != id);
        self.games.remove(&id)
    }

    fn put_hand(&mut self, hand: Hand) {
        self.hands.insert((hand.game, hand.player), hand);
    }

    fn hand(&self, game: GameId, player: PlayerId) -> Option<&Hand> {
        self.hands.get(&(game, player))
    }

    fn hand_mut(&mut self, game: GameId, player: PlayerId) -> Option<&mut Hand> {
        self.hands.get_mut(&(game, player))
    }

    fn remove_hand(&mut self, game: GameId, player: PlayerId) -> Option<Hand> {
        self.hands.remove(&(game, player))
    }

    fn put_heap(&mut self, heap: Heap) {
        self.heaps.insert((heap.game, heap.player), heap);
    }

    fn heap(&self, game: GameId, player: PlayerId) -> Option<&Heap> {
        self.heaps.get(&(game, player))
    }

    fn heap_mut(&mut self, game: GameId, player: PlayerId) -> Option<&mut Heap> {
        self.heaps.get_mut(&(game, player))
    }

    fn remove_heap(&mut self, game: GameId, player: PlayerId) -> Option<Heap> {
        self.heaps.remove(&(game, player))
    }

    fn alloc_column_id(&mut self) -> ColumnId {
        self.next_column += 1;
        ColumnId(self.next_column)
    }

    fn put_column(&mut self, column: Column) {
        self.columns.insert(column.id, column);
    }

    fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(&id)
    }

    fn column_mut(&mut self, id: ColumnId) -> Option<&mut Column> {
        self.columns.get_mut(&id)
    }

    fn columns(&self, game: GameId) -> Vec<&Column> {
        self.columns
            .values()
            .filter(|column| column.game == game)
            .collect()
    }

    fn put_selection(&mut self, selection: PendingSelection) {
        self.selections
            .insert((selection.game, selection.player), selection);
    }

    fn selection(&self, game: GameId, player: PlayerId) -> Option<&PendingSelection> {
        self.selections.get(&(game, player))
    }

    fn selections(&self, game: GameId) -> Vec<&PendingSelection> {
        self.selections
            .values()
            .filter(|selection| selection.game == game)
            .collect()
    }

    fn remove_selection(&mut self, game: GameId, player: PlayerId) -> Option<PendingSelection> {
        self.selections.remove(&(game, player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn removing_a_game_cascades_its_state() {
        let mut store = MemoryStore::new();
        let game_id = store.alloc_game_id();
        let other_id = store.alloc_game_id();
        let player = store.alloc_player_id();
        store.put_player(Player::new(player, "ada", Role::Human));
        store.put_game(Game::new(game_id, player));
        store.put_game(Game::new(other_id, player));
        store.put_hand(Hand::new(game_id, player));
        store.put_hand(Hand::new(other_id, player));
        store.put_heap(Heap::new(game_id, player));
        let column_id = store.alloc_column_id();
        store.put_column(Column::new(column_id, game_id, Card::numbered(1)));
        store.put_selection(PendingSelection {
            game: game_id,
            player,
            card: Card::numbered(2),
        });

        store.remove_game(game_id);

        assert!(store.game(game_id).is_none());
        assert!(store.hand(game_id, player).is_none());
        assert!(store.heap(game_id, player).is_none());
        assert!(store.column(column_id).is_none());
        assert!(store.selection(game_id, player).is_none());
        // unrelated game untouched
        assert!(store.game(other_id).is_some());
        assert!(store.hand(other_id, player).is_some());
    }

    #[test]
    fn removing_a_player_cascades_across_games() {
        let mut store = MemoryStore::new();
        let game_a = store.alloc_game_id();
        let game_b = store.alloc_game_id();
        let player = store.alloc_player_id();
        store.put_player(Player::new(player, "bot", Role::Bot));
        store.put_hand(Hand::new(game_a, player));
        store.put_heap(Heap::new(game_b, player));
        store.put_selection(PendingSelection {
            game: game_b,
            player,
            card: Card::numbered(3),
        });

        store.remove_player(player);

        assert!(store.player(player).is_none());
        assert!(store.hand(game_a, player).is_none());
        assert!(store.heap(game_b, player).is_none());
        assert!(store.selection(game_b, player).is_none());
    }

    #[test]
    fn columns_filter_by_game_in_id_order() {
        let mut store = MemoryStore::new();
        let game_a = store.alloc_game_id();
        let game_b = store.alloc_game_id();
        for game in [game_a, game_b, game_a] {
            let id = store.alloc_column_id();
            store.put_column(Column::new(id, game, Card::numbered(id.0)));
        }
        let columns = store.columns(game_a);
        assert_eq!(columns.len(), 2);
        assert!(columns[0].id < columns[1].id);
    }
}
