use serde::Serialize;

use crate::rules::Rules;

/// A seat in a room: identity plus lobby/game flags.
///
/// Retained across disconnects so a client-supplied `id` can reconnect
/// into the same seat; see `Room::add_player`.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub is_seated: bool,
    pub is_connected: bool,
    pub is_eliminated: bool,
    pub lives: u32,
    pub bonus_progress: [u32; 26],
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rules: &Rules) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_seated: false,
            is_connected: true,
            is_eliminated: false,
            lives: rules.starting_lives,
            bonus_progress: rules.bonus_template,
        }
    }

    /// Resets per-game fields back to a fresh lobby seat, keeping identity
    /// and connection/seating flags. Called when a room returns to Lobby
    /// after the end-of-game grace period.
    pub fn reset_for_lobby(&mut self, rules: &Rules) {
        self.is_eliminated = false;
        self.lives = rules.starting_lives;
        self.bonus_progress = rules.bonus_template;
    }

    /// Decrements the quota for `ch`; if every quota reaches zero, caps a
    /// life gain at `rules.max_lives` and resets the vector to the
    /// template. Non-letters are ignored. Returns whether a life was
    /// awarded this call.
    pub fn try_bonus_letter(&mut self, ch: char, rules: &Rules) -> bool {
        let Some(idx) = letter_index(ch) else {
            return false;
        };
        if self.bonus_progress[idx] == 0 {
            return false;
        }
        self.bonus_progress[idx] -= 1;
        if self.bonus_progress.iter().all(|&c| c == 0) {
            self.lives = (self.lives + 1).min(rules.max_lives);
            self.bonus_progress = rules.bonus_template;
            true
        } else {
            false
        }
    }

    pub fn to_room_view(&self) -> RoomPlayerView {
        RoomPlayerView {
            id: self.id.clone(),
            name: self.name.clone(),
            is_seated: self.is_seated,
            is_connected: self.is_connected,
        }
    }

    pub fn to_game_view(&self, rules: &Rules) -> GamePlayerView {
        GamePlayerView {
            id: self.id.clone(),
            name: self.name.clone(),
            lives: self.lives,
            is_eliminated: self.is_eliminated,
            is_connected: self.is_connected,
            bonus_progress: BonusProgressView {
                remaining: self.bonus_progress,
                total: rules.bonus_template,
            },
        }
    }
}

fn letter_index(ch: char) -> Option<usize> {
    let lower = ch.to_ascii_lowercase();
    if lower.is_ascii_lowercase() {
        Some(lower as usize - 'a' as usize)
    } else {
        None
    }
}

/// Lobby-facing snapshot broadcast in `players-updated`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayerView {
    pub id: String,
    pub name: String,
    pub is_seated: bool,
    pub is_connected: bool,
}

/// In-game snapshot broadcast in `game-started` / `turn-started`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePlayerView {
    pub id: String,
    pub name: String,
    pub lives: u32,
    pub is_eliminated: bool,
    pub is_connected: bool,
    pub bonus_progress: BonusProgressView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusProgressView {
    pub remaining: [u32; 26],
    pub total: [u32; 26],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_bonus_letter_ignores_non_letters() {
        let rules = Rules::default();
        let mut player = Player::new("p1", "Alice", &rules);
        assert!(!player.try_bonus_letter('7', &rules));
        assert_eq!(player.bonus_progress, rules.bonus_template);
    }

    #[test]
    fn try_bonus_letter_awards_life_when_template_exhausted() {
        let mut rules = Rules::default();
        rules.bonus_template = [1; 26];
        rules.max_lives = 3;
        rules.starting_lives = 1;
        let mut player = Player::new("p1", "Alice", &rules);

        for ch in 'a'..='y' {
            assert!(!player.try_bonus_letter(ch, &rules));
        }
        assert!(player.try_bonus_letter('z', &rules));
        assert_eq!(player.lives, 2);
        assert_eq!(player.bonus_progress, rules.bonus_template);
    }

    #[test]
    fn try_bonus_letter_caps_at_max_lives() {
        let mut rules = Rules::default();
        rules.bonus_template = [0; 26];
        rules.bonus_template[0] = 1; // only 'a' required
        rules.max_lives = 1;
        rules.starting_lives = 1;
        let mut player = Player::new("p1", "Alice", &rules);

        assert!(player.try_bonus_letter('a', &rules));
        assert_eq!(player.lives, 1);
    }

    #[test]
    fn inert_letter_below_zero_never_decrements() {
        let mut rules = Rules::default();
        rules.bonus_template[1] = 0; // 'b' inert
        let mut player = Player::new("p1", "Alice", &rules);
        assert!(!player.try_bonus_letter('b', &rules));
        assert_eq!(player.bonus_progress[1], 0);
    }
}
