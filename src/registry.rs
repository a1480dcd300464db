//! Room registry (C8): creates, looks up, and destroys rooms.
//!
//! Grounded in `arcforge-room`'s `RoomManager` (`create_room`/`join_room`/
//! `destroy_room`, cloned handles so callers never hold the registry lock
//! across an awaited room operation) rather than the teacher's own
//! `AppState.active_games` map, since the teacher indexes per-game engines
//! by lobby UUID behind a single `Mutex<HashMap<..>>` with no code
//! allocator; this crate's rooms are looked up by a short human-typed
//! code and must be collision-checked at creation time, which the
//! arcforge shape models directly.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::dictionary::Dictionary;
use crate::engine::{spawn_room, RoomHandle, RoomSnapshot, SubmitOutcome};
use crate::error::EngineError;
use crate::room_code::RoomCodeGenerator;
use crate::rules::Rules;
use crate::transport::Transport;

/// Owns the code -> room-actor-handle mapping and the shared, process-wide
/// collaborators (dictionary, config, transport) every room is spawned
/// with.
///
/// Reads (`handle_for`) take the map's read lock only long enough to clone
/// a `RoomHandle` (an `Arc`-backed `mpsc::Sender` clone), so the lock is
/// never held across an `.await` on room-actor work, matching the
/// concurrency model's "reads may be lock-free via an immutable snapshot;
/// writes serialize" description as closely as a `RwLock<HashMap<_>>`
/// allows.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomHandle>>,
    code_gen: Mutex<RoomCodeGenerator>,
    dictionary: Arc<Dictionary>,
    config: Arc<EngineConfig>,
    transport: Arc<dyn Transport>,
}

impl RoomRegistry {
    pub fn new(
        dictionary: Arc<Dictionary>,
        config: Arc<EngineConfig>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, EngineError> {
        let code_gen =
            RoomCodeGenerator::thread_rng(&config.room_code_alphabet, config.room_code_length)?;
        Ok(Self {
            rooms: RwLock::new(HashMap::new()),
            code_gen: Mutex::new(code_gen),
            dictionary,
            config,
            transport,
        })
    }

    /// Test/embedding hook: builds a registry around an already-constructed
    /// `RoomCodeGenerator`, so callers can inject a scripted RNG the way
    /// scenario 6 (room-code collision retry) requires.
    pub fn with_code_generator(
        code_gen: RoomCodeGenerator,
        dictionary: Arc<Dictionary>,
        config: Arc<EngineConfig>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            code_gen: Mutex::new(code_gen),
            dictionary,
            config,
            transport,
        }
    }

    /// Allocates a unique room code, retrying up to
    /// `config.room_code_retry_limit` times on collision, then spawns a
    /// fresh room actor under that code.
    pub async fn create_room(&self) -> Result<String, EngineError> {
        for _ in 0..self.config.room_code_retry_limit {
            let code = {
                let mut gen = self.code_gen.lock().await;
                gen.generate()
            };

            let mut rooms = self.rooms.write().await;
            if rooms.contains_key(&code) {
                continue;
            }
            let handle = spawn_room(
                code.clone(),
                self.config.default_rules.clone(),
                self.dictionary.clone(),
                self.config.clone(),
                self.transport.clone(),
            );
            rooms.insert(code.clone(), handle);
            info!(room_code = %code, "room created");
            return Ok(code);
        }
        Err(EngineError::RoomCodeSpaceExhausted)
    }

    async fn handle_for(&self, code: &str) -> Result<RoomHandle, EngineError> {
        self.rooms
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or(EngineError::RoomNotFound)
    }

    pub async fn join_room(
        &self,
        code: &str,
        player_id: String,
        name: String,
    ) -> Result<(), EngineError> {
        self.handle_for(code).await?.join(player_id, name).await
    }

    pub async fn leave_room(&self, code: &str, player_id: String) -> Result<(), EngineError> {
        let handle = self.handle_for(code).await?;
        handle.leave(player_id).await?;
        self.reap_if_empty(code, &handle).await;
        Ok(())
    }

    pub async fn set_seated(
        &self,
        code: &str,
        player_id: String,
        seated: bool,
    ) -> Result<(), EngineError> {
        self.handle_for(code)
            .await?
            .set_seated(player_id, seated)
            .await
    }

    pub async fn update_rules(
        &self,
        code: &str,
        player_id: String,
        rules: Rules,
    ) -> Result<(), EngineError> {
        self.handle_for(code).await?.update_rules(player_id, rules).await
    }

    pub async fn start_game(&self, code: &str, player_id: String) -> Result<(), EngineError> {
        self.handle_for(code).await?.start_game(player_id).await
    }

    pub async fn submit_word(
        &self,
        code: &str,
        player_id: String,
        word: String,
    ) -> Result<SubmitOutcome, EngineError> {
        self.handle_for(code).await?.submit_word(player_id, word).await
    }

    /// Fire-and-forget: pure pass-through events never wait on a reply.
    pub async fn player_typing(
        &self,
        code: &str,
        player_id: String,
        input: String,
    ) -> Result<(), EngineError> {
        self.handle_for(code).await?.player_typing(player_id, input)
    }

    pub async fn disconnect(&self, code: &str, player_id: String) -> Result<(), EngineError> {
        let handle = self.handle_for(code).await?;
        handle.disconnect(player_id)?;
        self.reap_if_empty(code, &handle).await;
        Ok(())
    }

    /// Evicts `code` if the room has emptied out and has no game running:
    /// the "last player leaves and no game active" trigger from the
    /// registry's eviction policy. The idle-TTL trigger is a separate,
    /// periodic fallback (`reap_idle`) for rooms that empty out without a
    /// `leave`/`disconnect` ever completing (e.g. a crashed client whose
    /// socket never reports a clean disconnect).
    async fn reap_if_empty(&self, code: &str, handle: &RoomHandle) {
        let Ok(snapshot) = handle.snapshot().await else {
            return;
        };
        if snapshot.player_count == 0 && snapshot.is_lobby {
            self.destroy_room(code).await;
        }
    }

    /// Cancels the room's timers, drops its actor handle, and removes it
    /// from the registry. Idempotent: destroying an already-absent code is
    /// a no-op.
    pub async fn destroy_room(&self, code: &str) {
        let removed = self.rooms.write().await.remove(code);
        if let Some(handle) = removed {
            handle.shutdown();
            info!(room_code = %code, "room destroyed");
        }
    }

    /// Periodic idle-TTL sweep: destroys any still-registered room that is
    /// empty and in `Lobby`. Intended to be called on an interval by the
    /// embedding application (this crate owns no scheduler of its own,
    /// since spawning a background `tokio::spawn` loop from a library
    /// constructor would run even in tests that never want one).
    pub async fn reap_idle(&self) {
        let codes: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        for code in codes {
            let Ok(handle) = self.handle_for(&code).await else {
                continue;
            };
            match handle.snapshot().await {
                Ok(snapshot) if snapshot.player_count == 0 && snapshot.is_lobby => {
                    self.destroy_room(&code).await;
                }
                Ok(_) => {}
                Err(_) => {
                    warn!(room_code = %code, "idle sweep found a dead room handle, evicting");
                    self.destroy_room(&code).await;
                }
            }
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn room_exists(&self, code: &str) -> bool {
        self.rooms.read().await.contains_key(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_double::RecordingTransport;
    use std::sync::{Arc as StdArc, Mutex as StdMutex};

    fn env(dictionary_words: &[&str]) -> (Arc<Dictionary>, Arc<EngineConfig>, Arc<RecordingTransport>) {
        let dictionary = Arc::new(Dictionary::from_words(dictionary_words.iter().copied(), true));
        let config = Arc::new(EngineConfig::default());
        let transport = Arc::new(RecordingTransport::default());
        (dictionary, config, transport)
    }

    #[tokio::test]
    async fn create_room_allocates_a_code_and_registers_it() {
        let (dictionary, config, transport) = env(&["car", "art"]);
        let registry = RoomRegistry::new(dictionary, config, transport).unwrap();
        let code = registry.create_room().await.unwrap();
        assert!(registry.room_exists(&code).await);
    }

    /// Scenario 6: a generator scripted to draw "AAAA" twice then "AAAB".
    /// The first `create-room` call succeeds immediately with "AAAA"; the
    /// second collides on "AAAA", retries, and lands on the distinct code
    /// "AAAB".
    #[tokio::test]
    async fn create_room_retries_past_a_collision() {
        let (dictionary, config, transport) = env(&["car", "art"]);

        // Two-letter alphabet: a draw < 0.5 selects 'A', >= 0.5 selects
        // 'B'. Twelve draws cover "AAAA", then a colliding "AAAA", then
        // the resolving "AAAB".
        let draws: Vec<f64> = vec![
            0.0, 0.0, 0.0, 0.0, // call 1 -> "AAAA"
            0.0, 0.0, 0.0, 0.0, // call 2, attempt 1 -> "AAAA" (collides)
            0.0, 0.0, 0.0, 0.9, // call 2, attempt 2 -> "AAAB"
        ];
        let draws = StdArc::new(StdMutex::new(draws.into_iter()));
        let rng: Box<dyn FnMut() -> f64 + Send> =
            Box::new(move || draws.lock().unwrap().next().expect("script exhausted"));
        let code_gen = RoomCodeGenerator::new("AB", 4, rng).unwrap();
        let registry = RoomRegistry::with_code_generator(code_gen, dictionary, config, transport);

        let first = registry.create_room().await.unwrap();
        let second = registry.create_room().await.unwrap();

        assert_eq!(first, "AAAA");
        assert_eq!(second, "AAAB");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn leave_room_destroys_an_emptied_lobby() {
        let (dictionary, config, transport) = env(&["car", "art"]);
        let registry = RoomRegistry::new(dictionary, config, transport).unwrap();
        let code = registry.create_room().await.unwrap();
        registry
            .join_room(&code, "alice".into(), "Alice".into())
            .await
            .unwrap();
        registry.leave_room(&code, "alice".into()).await.unwrap();
        assert!(!registry.room_exists(&code).await);
    }

    #[tokio::test]
    async fn join_room_fails_for_unknown_code() {
        let (dictionary, config, transport) = env(&["car", "art"]);
        let registry = RoomRegistry::new(dictionary, config, transport).unwrap();
        let err = registry
            .join_room("ZZZZ", "alice".into(), "Alice".into())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::RoomNotFound);
    }
}
