use crate::game::Game;
use crate::player::{Player, RoomPlayerView};
use crate::rules::Rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Lobby,
    Countdown,
    Active,
    Ended,
}

/// A room's lobby-and-game state: membership, seating, leadership, rules,
/// and (while a game is running) the `Game` snapshot.
///
/// `game` is `Some` iff `state` is `Countdown`, `Active`, or `Ended`; the
/// invariant is enforced by the methods below, never by callers reaching
/// into the fields directly.
pub struct Room {
    pub code: String,
    pub rules: Rules,
    pub players: Vec<Player>,
    pub leader_id: Option<String>,
    pub state: RoomState,
    pub game: Option<Game>,
}

impl Room {
    pub fn new(code: impl Into<String>, rules: Rules) -> Self {
        Self {
            code: code.into(),
            rules,
            players: Vec::new(),
            leader_id: None,
            state: RoomState::Lobby,
            game: None,
        }
    }

    /// Idempotent on `id`: a present-and-disconnected player reconnects
    /// (seat/lives/bonus preserved if a game is active); an absent one is
    /// appended as a fresh, unseated, connected lobby seat.
    pub fn add_player(&mut self, id: &str, name: &str) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.is_connected = true;
            player.name = name.to_string();
        } else {
            self.players.push(Player::new(id, name, &self.rules));
        }
        self.recompute_leader();
    }

    /// In Lobby, removes the player outright. In an active game, the
    /// default disconnect-during-game policy (see `disconnect`) marks them
    /// eliminated rather than dropping them, so this method is Lobby-only;
    /// callers in Active/Countdown should use `disconnect`.
    pub fn remove_player(&mut self, id: &str) {
        self.players.retain(|p| p.id != id);
        self.recompute_leader();
    }

    pub fn set_seated(&mut self, id: &str, seated: bool) -> bool {
        if self.state != RoomState::Lobby {
            return false;
        }
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(player) => {
                player.is_seated = seated;
                true
            }
            None => false,
        }
    }

    pub fn update_rules(&mut self, rules: Rules) {
        self.rules = rules;
    }

    pub fn seated_connected_players(&self) -> Vec<Player> {
        self.players
            .iter()
            .filter(|p| p.is_seated && p.is_connected)
            .cloned()
            .collect()
    }

    /// The earliest-joined still-connected player, or `None`. Recomputed
    /// on every membership change rather than cached across mutations.
    pub fn recompute_leader(&mut self) {
        self.leader_id = self
            .players
            .iter()
            .find(|p| p.is_connected)
            .map(|p| p.id.clone());
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn player_views(&self) -> Vec<RoomPlayerView> {
        self.players.iter().map(Player::to_room_view).collect()
    }
}
