//! In-progress game state: the slice of a `Room` that only exists while
//! `state ∈ {Countdown, Active, Ended}`.

use std::collections::HashSet;

use crate::player::Player;
use crate::rules::Rules;

pub mod rules_service;

pub use rules_service::GameRulesService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Active,
    Ended,
}

/// Mutable per-game state, snapshotted from seated/connected players at
/// `startGame` time. `players` is a private copy distinct from the room's
/// lobby roster so elimination/life changes here never race lobby reads.
#[derive(Debug, Clone)]
pub struct Game {
    pub room_code: String,
    pub players: Vec<Player>,
    pub current_turn_index: usize,
    pub fragment: String,
    pub used_words: HashSet<String>,
    pub bomb_deadline_ms: i64,
    pub bomb_duration_ms: u64,
    pub state: GameState,
    pub rules: Rules,
    /// Player ids in the order they were eliminated, oldest first. Not
    /// part of any outbound event (spec.md's event list has no
    /// final-standings event) but retained so an embedding application can
    /// build a full ranking table from `final_standings()` if it wants one.
    pub elimination_order: Vec<String>,
}

/// One row of a post-game ranking: `rank` 1 is the winner. Eliminated
/// players are ranked below any survivor, most-recently-eliminated first,
/// mirroring the teacher's elimination-recency ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsRow {
    pub rank: usize,
    pub player_id: String,
}

impl Game {
    /// Records `player_id` as eliminated, in order. A no-op if already
    /// recorded (disconnect-then-bomb-fire double-bookkeeping safety).
    pub fn record_elimination(&mut self, player_id: &str) {
        if !self.elimination_order.iter().any(|id| id == player_id) {
            self.elimination_order.push(player_id.to_string());
        }
    }

    /// Full post-game ranking: any still-active player(s) first (rank 1),
    /// then eliminated players most-recently-eliminated first.
    pub fn final_standings(&self) -> Vec<StandingsRow> {
        let mut rows = Vec::with_capacity(self.players.len());
        let mut rank = 1;
        for player in self.active_players() {
            rows.push(StandingsRow {
                rank,
                player_id: player.id.clone(),
            });
            rank += 1;
        }
        for player_id in self.elimination_order.iter().rev() {
            rows.push(StandingsRow {
                rank,
                player_id: player_id.clone(),
            });
            rank += 1;
        }
        rows
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_turn_index)
    }

    pub fn current_player_mut(&mut self) -> Option<&mut Player> {
        self.players.get_mut(self.current_turn_index)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.is_eliminated)
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Advances `current_turn_index` to the next non-eliminated,
    /// non-disconnected player, wrapping modulo player count. Returns
    /// `false` (treat the game as ended) when no candidate exists.
    pub fn advance_turn(&mut self) -> bool {
        let len = self.players.len();
        if len == 0 {
            return false;
        }
        for step in 1..=len {
            let idx = (self.current_turn_index + step) % len;
            let candidate = &self.players[idx];
            if !candidate.is_eliminated && candidate.is_connected {
                self.current_turn_index = idx;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_with(players: Vec<Player>) -> Game {
        let rules = Rules::default();
        Game {
            room_code: "ABCD".into(),
            players,
            current_turn_index: 0,
            fragment: "ar".into(),
            used_words: HashSet::new(),
            bomb_deadline_ms: 0,
            bomb_duration_ms: 10_000,
            state: GameState::Active,
            rules,
            elimination_order: Vec::new(),
        }
    }

    #[test]
    fn final_standings_ranks_survivor_first_then_most_recent_elimination() {
        let rules = Rules::default();
        let mut alice = Player::new("alice", "Alice", &rules);
        let mut bob = Player::new("bob", "Bob", &rules);
        let carol = Player::new("carol", "Carol", &rules);
        alice.is_eliminated = true;
        bob.is_eliminated = true;

        let mut game = game_with(vec![alice, bob, carol]);
        game.record_elimination("alice");
        game.record_elimination("bob");
        game.record_elimination("alice"); // duplicate record is a no-op

        let standings = game.final_standings();
        assert_eq!(
            standings,
            vec![
                StandingsRow { rank: 1, player_id: "carol".into() },
                StandingsRow { rank: 2, player_id: "bob".into() },
                StandingsRow { rank: 3, player_id: "alice".into() },
            ]
        );
    }

    #[test]
    fn advance_turn_skips_eliminated_and_disconnected() {
        let rules = Rules::default();
        let mut alice = Player::new("alice", "Alice", &rules);
        let mut bob = Player::new("bob", "Bob", &rules);
        let carol = Player::new("carol", "Carol", &rules);
        bob.is_eliminated = true;
        alice.is_connected = true;

        let mut game = game_with(vec![alice, bob, carol]);
        assert!(game.advance_turn());
        assert_eq!(game.current_player().unwrap().id, "carol");
    }

    #[test]
    fn advance_turn_returns_false_when_no_candidate() {
        let rules = Rules::default();
        let mut alice = Player::new("alice", "Alice", &rules);
        alice.is_eliminated = true;
        let mut game = game_with(vec![alice]);
        assert!(!game.advance_turn());
    }
}
