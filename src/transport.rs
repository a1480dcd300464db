use async_trait::async_trait;
use serde::Serialize;

use crate::player::{GamePlayerView, RoomPlayerView};
use crate::rules::Rules;

/// Abstract message sink the engine broadcasts through. The real websocket
/// transport (connection registry, per-socket framing, `onConnect`/
/// `onCommand`/`onDisconnect` wiring) is an external collaborator and out
/// of scope for this crate; this trait is the seam it implements.
///
/// Modeled on the `broadcast`/fire-and-forget helpers the lobby websocket
/// layer uses: delivery is best-effort and must never block or fail a
/// room mutation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Emits an event to every socket subscribed to `room_code`.
    async fn broadcast(&self, room_code: &str, event: &OutboundEvent);

    /// Emits an event to a single player's socket, if connected.
    async fn send_to(&self, player_id: &str, event: &OutboundEvent);
}

/// Outbound events in the wire shape clients receive. `RoomPlayerView`
/// and `GamePlayerView` are the only mutable-state snapshots ever handed
/// outside a room's actor.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundEvent {
    PlayersUpdated {
        leader_id: Option<String>,
        players: Vec<RoomPlayerView>,
    },
    RoomRulesUpdated {
        room_code: String,
        rules: Rules,
    },
    GameCountdownStarted {
        deadline: i64,
    },
    GameStarted {
        room_code: String,
        fragment: String,
        bomb_duration: u64,
        current_player: Option<String>,
        leader_id: Option<String>,
        players: Vec<GamePlayerView>,
    },
    TurnStarted {
        player_id: Option<String>,
        fragment: String,
        bomb_duration: u64,
        players: Vec<GamePlayerView>,
    },
    WordAccepted {
        player_id: String,
        word: String,
    },
    PlayerUpdated {
        player_id: String,
        lives: u32,
    },
    PlayerTypingUpdate {
        player_id: String,
        input: String,
    },
    GameEnded {
        winner_id: Option<String>,
    },
}

/// An in-memory `Transport` double used by tests: records every broadcast
/// and direct send instead of touching a socket, the way the teacher's
/// test suite spins up an in-process manager instead of a real network
/// stack where it can. Kept in the main build (not `cfg(test)`-gated) so
/// integration tests under `tests/` can use it as an external consumer of
/// this crate.
pub mod test_double {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone)]
    pub enum Recorded {
        Broadcast { room_code: String, event: OutboundEvent },
        SendTo { player_id: String, event: OutboundEvent },
    }

    #[derive(Default)]
    pub struct RecordingTransport {
        pub events: Mutex<Vec<Recorded>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn broadcast(&self, room_code: &str, event: &OutboundEvent) {
            self.events.lock().await.push(Recorded::Broadcast {
                room_code: room_code.to_string(),
                event: event.clone(),
            });
        }

        async fn send_to(&self, player_id: &str, event: &OutboundEvent) {
            self.events.lock().await.push(Recorded::SendTo {
                player_id: player_id.to_string(),
                event: event.clone(),
            });
        }
    }

    impl RecordingTransport {
        pub async fn broadcasts(&self) -> Vec<(String, OutboundEvent)> {
            self.events
                .lock()
                .await
                .iter()
                .filter_map(|r| match r {
                    Recorded::Broadcast { room_code, event } => {
                        Some((room_code.clone(), event.clone()))
                    }
                    _ => None,
                })
                .collect()
        }
    }
}
