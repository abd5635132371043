use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Bot,
    Human,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Bot, Role::Human, Role::Admin];

    pub fn id(self) -> &'static str {
        match self {
            Role::Bot => "bot",
            Role::Human => "human",
            Role::Admin => "admin",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|role| role.id() == value)
    }
}

/// Role never changes once a player is registered; it drives who may
/// own games and whose column choices the engine resolves automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub active: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            active: true,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.role, Role::Bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id("wizard"), None);
    }
}
