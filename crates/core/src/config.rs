use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_hand_size")]
    pub hand_size: usize,
    #[serde(default = "default_board_size")]
    pub board_size: usize,
    #[serde(default = "default_max_player_number")]
    pub max_player_number: usize,
    #[serde(default = "default_column_card_size")]
    pub column_card_size: usize,
    #[serde(default = "default_max_card_number")]
    pub max_card_number: u32,
    #[serde(default = "default_bot_names")]
    pub bot_names: Vec<String>,
}

fn default_hand_size() -> usize {
    10
}

fn default_board_size() -> usize {
    4
}

fn default_max_player_number() -> usize {
    6
}

fn default_column_card_size() -> usize {
    5
}

fn default_max_card_number() -> u32 {
    104
}

fn default_bot_names() -> Vec<String> {
    ["Azrael", "Valdamar", "Lüdwig", "Seelöwe", "Gallù"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hand_size: default_hand_size(),
            board_size: default_board_size(),
            max_player_number: default_max_player_number(),
            column_card_size: default_column_card_size(),
            max_card_number: default_max_card_number(),
            bot_names: default_bot_names(),
        }
    }
}

impl GameConfig {
    /// Cards a full table consumes at setup: one hand per seat plus one
    /// seed card per column.
    pub fn cards_needed(&self, members: usize) -> usize {
        members * self.hand_size + self.board_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_table() {
        let config = GameConfig::default();
        assert_eq!(config.hand_size, 10);
        assert_eq!(config.board_size, 4);
        assert_eq!(config.max_player_number, 6);
        assert_eq!(config.column_card_size, 5);
        assert_eq!(config.max_card_number, 104);
        assert_eq!(config.bot_names.len(), 5);
    }

    #[test]
    fn full_table_fits_in_the_deck() {
        let config = GameConfig::default();
        assert!(config.cards_needed(config.max_player_number) <= config.max_card_number as usize);
    }
}
