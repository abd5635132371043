//! Configuration loading and store seeding.

use anyhow::Context;
use sixtakes_core::{full_deck, GameConfig, Player, PlayerId, Role, Store};
use std::fs;
use std::path::Path;

pub const DEFAULT_ADMIN_NAME: &str = "admin";

/// Reads a `GameConfig` from a JSON file. A missing file means the
/// default table; every field in the file is optional.
pub fn load_game_config(path: &Path) -> anyhow::Result<GameConfig> {
    if !path.exists() {
        return Ok(GameConfig::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(config)
}

/// Seeds the card catalog once: one card per number in
/// `1..=max_card_number`. Returns how many cards were inserted.
pub fn seed_cards<S: Store>(store: &mut S, config: &GameConfig) -> usize {
    if store.card_count() > 0 {
        return 0;
    }
    let deck = full_deck(config.max_card_number);
    let count = deck.len();
    for card in deck {
        store.put_card(card);
    }
    count
}

pub fn seed_admin<S: Store>(store: &mut S, name: &str) -> PlayerId {
    if let Some(existing) = store.players().into_iter().find(|player| player.name == name) {
        return existing.id;
    }
    let id = store.alloc_player_id();
    store.put_player(Player::new(id, name, Role::Admin));
    id
}

pub fn seed_bots<S: Store>(store: &mut S, config: &GameConfig) -> Vec<PlayerId> {
    let mut ids = Vec::new();
    for name in &config.bot_names {
        let existing = store
            .players()
            .into_iter()
            .find(|player| player.name == *name)
            .map(|player| player.id);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = store.alloc_player_id();
                store.put_player(Player::new(id, name.clone(), Role::Bot));
                id
            }
        };
        ids.push(id);
    }
    ids
}

/// Full bootstrap: catalog, admin player, bot roster. Safe to call on
/// every startup. Returns the admin's id.
pub fn populate<S: Store>(store: &mut S, config: &GameConfig) -> PlayerId {
    seed_cards(store, config);
    let admin = seed_admin(store, DEFAULT_ADMIN_NAME);
    seed_bots(store, config);
    admin
}
