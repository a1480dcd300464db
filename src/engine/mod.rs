//! Per-room actor (C7): owns mutable game state and drives time.
//!
//! Every mutation and every timer callback is dispatched through a single
//! bounded `mpsc` command channel, the single-writer-per-room model from
//! the concurrency design, grounded in `arcforge-room`'s `RoomActor`
//! shape rather than the teacher's own `Arc<RwLock<_>> + Notify` pattern,
//! since the spec explicitly calls for a command channel.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::dictionary::Dictionary;
use crate::error::EngineError;
use crate::game::{Game, GameRulesService, GameState};
use crate::player::GamePlayerView;
use crate::room::{Room, RoomState};
use crate::rules::Rules;
use crate::transport::{OutboundEvent, Transport};

/// Result of a word submission, carried back through the reply channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Countdown,
    Bomb,
    Grace,
}

/// A point-in-time view of a room, used by the registry's idle reaper and
/// by tests; never mutable, never leaked out of the actor's own loop.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub code: String,
    pub player_count: usize,
    pub is_lobby: bool,
}

enum RoomCommand {
    Join {
        player_id: String,
        name: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Leave {
        player_id: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    SetSeated {
        player_id: String,
        seated: bool,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    UpdateRules {
        player_id: String,
        rules: Rules,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    StartGame {
        player_id: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    SubmitWord {
        player_id: String,
        word: String,
        reply: oneshot::Sender<Result<SubmitOutcome, EngineError>>,
    },
    PlayerTyping {
        player_id: String,
        input: String,
    },
    Disconnect {
        player_id: String,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    TimerFired {
        kind: TimerKind,
        generation: u64,
    },
    Shutdown,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn map_send_err<T>(err: mpsc::error::TrySendError<T>) -> EngineError {
    match err {
        mpsc::error::TrySendError::Full(_) => EngineError::Busy,
        mpsc::error::TrySendError::Closed(_) => EngineError::RoomNotFound,
    }
}

/// Cheap-to-clone handle used by the registry to talk to a room's actor.
#[derive(Clone)]
pub struct RoomHandle {
    code: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &str {
        &self.code
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> RoomCommand,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender.try_send(build(reply_tx)).map_err(map_send_err)?;
        reply_rx.await.map_err(|_| EngineError::RoomNotFound)?
    }

    pub async fn join(&self, player_id: String, name: String) -> Result<(), EngineError> {
        self.call(|reply| RoomCommand::Join {
            player_id,
            name,
            reply,
        })
        .await
    }

    pub async fn leave(&self, player_id: String) -> Result<(), EngineError> {
        self.call(|reply| RoomCommand::Leave { player_id, reply })
            .await
    }

    pub async fn set_seated(&self, player_id: String, seated: bool) -> Result<(), EngineError> {
        self.call(|reply| RoomCommand::SetSeated {
            player_id,
            seated,
            reply,
        })
        .await
    }

    pub async fn update_rules(&self, player_id: String, rules: Rules) -> Result<(), EngineError> {
        self.call(|reply| RoomCommand::UpdateRules {
            player_id,
            rules,
            reply,
        })
        .await
    }

    pub async fn start_game(&self, player_id: String) -> Result<(), EngineError> {
        self.call(|reply| RoomCommand::StartGame { player_id, reply })
            .await
    }

    pub async fn submit_word(
        &self,
        player_id: String,
        word: String,
    ) -> Result<SubmitOutcome, EngineError> {
        self.call(|reply| RoomCommand::SubmitWord {
            player_id,
            word,
            reply,
        })
        .await
    }

    pub fn player_typing(&self, player_id: String, input: String) -> Result<(), EngineError> {
        self.sender
            .try_send(RoomCommand::PlayerTyping { player_id, input })
            .map_err(map_send_err)
    }

    pub fn disconnect(&self, player_id: String) -> Result<(), EngineError> {
        self.sender
            .try_send(RoomCommand::Disconnect { player_id })
            .map_err(map_send_err)
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .try_send(RoomCommand::Snapshot { reply: reply_tx })
            .map_err(map_send_err)?;
        reply_rx.await.map_err(|_| EngineError::RoomNotFound)
    }

    pub fn shutdown(&self) {
        let _ = self.sender.try_send(RoomCommand::Shutdown);
    }
}

struct RoomActor {
    room: Room,
    dictionary: Arc<Dictionary>,
    config: Arc<EngineConfig>,
    transport: Arc<dyn Transport>,
    generation: u64,
    self_tx: mpsc::Sender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room_code = %self.room.code, "room actor started");
        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    name,
                    reply,
                } => {
                    let result = self.handle_join(&player_id, &name).await;
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let result = self.handle_player_left(&player_id).await;
                    let _ = reply.send(result);
                }
                RoomCommand::SetSeated {
                    player_id,
                    seated,
                    reply,
                } => {
                    let result = self.handle_set_seated(&player_id, seated).await;
                    let _ = reply.send(result);
                }
                RoomCommand::UpdateRules {
                    player_id,
                    rules,
                    reply,
                } => {
                    let result = self.handle_update_rules(&player_id, rules).await;
                    let _ = reply.send(result);
                }
                RoomCommand::StartGame { player_id, reply } => {
                    let result = self.handle_start_game(&player_id).await;
                    let _ = reply.send(result);
                }
                RoomCommand::SubmitWord {
                    player_id,
                    word,
                    reply,
                } => {
                    let result = self.handle_submit_word(&player_id, &word).await;
                    let _ = reply.send(result);
                }
                RoomCommand::PlayerTyping { player_id, input } => {
                    self.handle_player_typing(&player_id, &input).await;
                }
                RoomCommand::Disconnect { player_id } => {
                    let _ = self.handle_player_left(&player_id).await;
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                RoomCommand::TimerFired { kind, generation } => {
                    self.handle_timer_fired(kind, generation).await;
                }
                RoomCommand::Shutdown => {
                    info!(room_code = %self.room.code, "room actor shutting down");
                    break;
                }
            }
        }
        info!(room_code = %self.room.code, "room actor stopped");
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.room.code.clone(),
            player_count: self.room.players.len(),
            is_lobby: self.room.state == RoomState::Lobby,
        }
    }

    fn schedule_timer(&self, kind: TimerKind, delay: Duration, generation: u64) {
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.try_send(RoomCommand::TimerFired { kind, generation });
        });
    }

    async fn broadcast_players_updated(&self) {
        let event = OutboundEvent::PlayersUpdated {
            leader_id: self.room.leader_id.clone(),
            players: self.room.player_views(),
        };
        self.transport.broadcast(&self.room.code, &event).await;
    }

    async fn handle_join(&mut self, player_id: &str, name: &str) -> Result<(), EngineError> {
        self.room.add_player(player_id, name);
        self.broadcast_players_updated().await;
        Ok(())
    }

    /// Shared by the `leave-room` command and transport disconnects: both
    /// follow the same state-dependent removal policy (§4.4/§4.6).
    async fn handle_player_left(&mut self, player_id: &str) -> Result<(), EngineError> {
        match self.room.state {
            RoomState::Lobby => {
                self.room.remove_player(player_id);
                self.broadcast_players_updated().await;
            }
            RoomState::Countdown | RoomState::Active => {
                let was_current = self
                    .room
                    .game
                    .as_ref()
                    .and_then(|g| g.current_player())
                    .map(|p| p.id == player_id)
                    .unwrap_or(false);

                if let Some(player) = self.room.player_mut(player_id) {
                    player.is_connected = false;
                }
                if let Some(game) = self.room.game.as_mut() {
                    if let Some(player) = game.player_mut(player_id) {
                        player.is_connected = false;
                        player.is_eliminated = true;
                        player.lives = 0;
                    }
                    game.record_elimination(player_id);
                }
                self.room.recompute_leader();
                self.broadcast_players_updated().await;
                self.transport
                    .broadcast(
                        &self.room.code,
                        &OutboundEvent::PlayerUpdated {
                            player_id: player_id.to_string(),
                            lives: 0,
                        },
                    )
                    .await;

                if self.check_game_over().await {
                    return Ok(());
                }
                if was_current {
                    if self.room.state == RoomState::Active {
                        self.advance_turn_after_disconnect().await;
                    } else {
                        // Countdown hasn't fired yet: move the turn pointer
                        // past the now-eliminated player but don't start the
                        // active turn loop early. `fire_countdown` is the
                        // only place that flips state to Active and emits
                        // `game-started`; resampling/broadcasting here would
                        // race it and desync the generation counter.
                        if let Some(game) = self.room.game.as_mut() {
                            game.advance_turn();
                        }
                    }
                }
            }
            RoomState::Ended => {}
        }
        Ok(())
    }

    async fn handle_set_seated(&mut self, player_id: &str, seated: bool) -> Result<(), EngineError> {
        if self.room.state != RoomState::Lobby {
            return Err(EngineError::IllegalState(
                "set-player-seated only valid in Lobby".into(),
            ));
        }
        if !self.room.set_seated(player_id, seated) {
            return Err(EngineError::RoomNotFound);
        }
        self.broadcast_players_updated().await;
        Ok(())
    }

    async fn handle_update_rules(&mut self, player_id: &str, rules: Rules) -> Result<(), EngineError> {
        if self.room.state != RoomState::Lobby {
            return Err(EngineError::IllegalState(
                "update-room-rules only valid in Lobby".into(),
            ));
        }
        if self.room.leader_id.as_deref() != Some(player_id) {
            return Err(EngineError::NotAuthorized(
                "only the leader may update rules".into(),
            ));
        }
        rules.validate()?;
        self.room.update_rules(rules.clone());
        self.transport
            .broadcast(
                &self.room.code,
                &OutboundEvent::RoomRulesUpdated {
                    room_code: self.room.code.clone(),
                    rules,
                },
            )
            .await;
        Ok(())
    }

    async fn handle_player_typing(&mut self, player_id: &str, input: &str) {
        if self.room.state != RoomState::Active {
            return;
        }
        let is_current = self
            .room
            .game
            .as_ref()
            .and_then(|g| g.current_player())
            .map(|p| p.id == player_id)
            .unwrap_or(false);
        if !is_current {
            return;
        }
        self.transport
            .broadcast(
                &self.room.code,
                &OutboundEvent::PlayerTypingUpdate {
                    player_id: player_id.to_string(),
                    input: input.to_string(),
                },
            )
            .await;
    }

    async fn handle_start_game(&mut self, player_id: &str) -> Result<(), EngineError> {
        if self.room.state != RoomState::Lobby {
            return Err(EngineError::IllegalState(
                "start-game only valid in Lobby".into(),
            ));
        }
        if self.room.leader_id.as_deref() != Some(player_id) {
            return Err(EngineError::NotAuthorized(
                "only the leader may start the game".into(),
            ));
        }
        let seated = self.room.seated_connected_players();
        if seated.len() < 2 {
            return Err(EngineError::IllegalState(
                "need at least 2 seated and connected players to start".into(),
            ));
        }

        let mut rng = rand::rng();
        let fragment = self
            .dictionary
            .sample_fragment(self.room.rules.min_words_per_prompt, &mut rng)?;
        let bomb_duration_ms = (self.room.rules.min_turn_duration as u64)
            .max(self.config.initial_bomb_seconds as u64)
            * 1000;

        let rules = self.room.rules.clone();
        let players = seated
            .into_iter()
            .map(|mut p| {
                p.lives = rules.starting_lives;
                p.bonus_progress = rules.bonus_template;
                p.is_eliminated = false;
                p
            })
            .collect();

        self.room.game = Some(Game {
            room_code: self.room.code.clone(),
            players,
            current_turn_index: 0,
            fragment,
            used_words: HashSet::new(),
            bomb_deadline_ms: 0,
            bomb_duration_ms,
            state: GameState::Active,
            rules,
            elimination_order: Vec::new(),
        });
        self.room.state = RoomState::Countdown;
        self.generation += 1;
        let generation = self.generation;

        let deadline = now_ms() + self.config.countdown_ms;
        self.transport
            .broadcast(&self.room.code, &OutboundEvent::GameCountdownStarted { deadline })
            .await;
        self.schedule_timer(
            TimerKind::Countdown,
            Duration::from_millis(self.config.countdown_ms.max(0) as u64),
            generation,
        );
        Ok(())
    }

    async fn handle_submit_word(
        &mut self,
        player_id: &str,
        word: &str,
    ) -> Result<SubmitOutcome, EngineError> {
        if self.room.state != RoomState::Active {
            return Err(EngineError::IllegalState(
                "submit-word only valid while a game is active".into(),
            ));
        }
        let Some(game) = self.room.game.as_ref() else {
            return Err(EngineError::IllegalState("no active game".into()));
        };

        let service = GameRulesService::new(&self.dictionary);
        if let Err(reason) = service.validate_submission(game, player_id, word) {
            return Ok(SubmitOutcome::Rejected(reason));
        }

        let decay = self.config.bomb_decay_factor;
        let Some(game) = self.room.game.as_mut() else {
            error!(room_code = %self.room.code, "active game vanished mid-submission");
            return Err(EngineError::IllegalState("no active game".into()));
        };
        let awarded = service.apply_accepted_word(game, player_id, word, decay);

        let accepted_word = word.trim().to_lowercase();
        self.transport
            .broadcast(
                &self.room.code,
                &OutboundEvent::WordAccepted {
                    player_id: player_id.to_string(),
                    word: accepted_word,
                },
            )
            .await;

        if awarded {
            let lives = self
                .room
                .game
                .as_ref()
                .and_then(|g| g.players.iter().find(|p| p.id == player_id))
                .map(|p| p.lives)
                .unwrap_or(0);
            self.transport
                .broadcast(
                    &self.room.code,
                    &OutboundEvent::PlayerUpdated {
                        player_id: player_id.to_string(),
                        lives,
                    },
                )
                .await;
        }

        self.generation += 1;
        let generation = self.generation;
        let Some(advanced) = self.room.game.as_mut().map(|game| game.advance_turn()) else {
            error!(room_code = %self.room.code, "active game vanished before turn advance");
            return Ok(SubmitOutcome::Accepted);
        };
        if !advanced {
            self.check_game_over().await;
            return Ok(SubmitOutcome::Accepted);
        }

        self.resample_and_broadcast_turn(generation).await;
        Ok(SubmitOutcome::Accepted)
    }

    /// Picks a new fragment, resets the bomb deadline, broadcasts
    /// `turn-started`, and reschedules the bomb timer under `generation`.
    async fn resample_and_broadcast_turn(&mut self, generation: u64) {
        let rules = self.room.rules.clone();
        let dictionary = self.dictionary.clone();
        let mut rng = rand::rng();
        let sampled = dictionary.sample_fragment(rules.min_words_per_prompt, &mut rng);

        let Some(game) = self.room.game.as_mut() else {
            error!(room_code = %self.room.code, "active game vanished before turn resample");
            return;
        };
        let (current, fragment, bomb_duration, players) = {
            if let Ok(fragment) = sampled {
                game.fragment = fragment;
            } else {
                warn!(room_code = %self.room.code, "fragment resample failed, keeping previous fragment");
            }
            game.bomb_deadline_ms = now_ms() + game.bomb_duration_ms as i64;
            let players: Vec<GamePlayerView> =
                game.players.iter().map(|p| p.to_game_view(&rules)).collect();
            (
                game.current_player().map(|p| p.id.clone()),
                game.fragment.clone(),
                game.bomb_duration_ms,
                players,
            )
        };

        self.transport
            .broadcast(
                &self.room.code,
                &OutboundEvent::TurnStarted {
                    player_id: current,
                    fragment,
                    bomb_duration,
                    players,
                },
            )
            .await;
        self.schedule_timer(TimerKind::Bomb, Duration::from_millis(bomb_duration), generation);
    }

    async fn advance_turn_after_disconnect(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let advanced = match self.room.game.as_mut() {
            Some(game) => game.advance_turn(),
            None => false,
        };
        if advanced {
            self.resample_and_broadcast_turn(generation).await;
        } else {
            self.check_game_over().await;
        }
    }

    async fn check_game_over(&mut self) -> bool {
        let Some(game) = self.room.game.as_ref() else {
            return false;
        };
        if game.active_count() > 1 {
            return false;
        }
        let winner_id = game.active_players().next().map(|p| p.id.clone());
        self.end_game(winner_id).await;
        true
    }

    async fn end_game(&mut self, winner_id: Option<String>) {
        if let Some(game) = self.room.game.as_mut() {
            game.state = GameState::Ended;
        }
        self.room.state = RoomState::Ended;
        self.generation += 1;
        let generation = self.generation;
        self.transport
            .broadcast(&self.room.code, &OutboundEvent::GameEnded { winner_id })
            .await;
        self.schedule_timer(
            TimerKind::Grace,
            Duration::from_millis(self.config.end_game_grace_ms.max(0) as u64),
            generation,
        );
    }

    async fn handle_timer_fired(&mut self, kind: TimerKind, generation: u64) {
        if generation != self.generation {
            debug!(room_code = %self.room.code, ?kind, "stale timer generation discarded");
            return;
        }
        match kind {
            TimerKind::Countdown => self.fire_countdown().await,
            TimerKind::Bomb => self.fire_bomb().await,
            TimerKind::Grace => self.fire_grace().await,
        }
    }

    async fn fire_countdown(&mut self) {
        self.room.state = RoomState::Active;
        self.generation += 1;
        let generation = self.generation;

        let rules = self.room.rules.clone();
        let (fragment, bomb_duration, current, players) = {
            let Some(game) = self.room.game.as_mut() else {
                return;
            };
            game.bomb_deadline_ms = now_ms() + game.bomb_duration_ms as i64;
            let players: Vec<GamePlayerView> =
                game.players.iter().map(|p| p.to_game_view(&rules)).collect();
            (
                game.fragment.clone(),
                game.bomb_duration_ms,
                game.current_player().map(|p| p.id.clone()),
                players,
            )
        };

        self.transport
            .broadcast(
                &self.room.code,
                &OutboundEvent::GameStarted {
                    room_code: self.room.code.clone(),
                    fragment,
                    bomb_duration,
                    current_player: current,
                    leader_id: self.room.leader_id.clone(),
                    players,
                },
            )
            .await;
        self.schedule_timer(TimerKind::Bomb, Duration::from_millis(bomb_duration), generation);
    }

    async fn fire_bomb(&mut self) {
        let Some(current_id) = self
            .room
            .game
            .as_ref()
            .and_then(|g| g.current_player())
            .map(|p| p.id.clone())
        else {
            return;
        };

        let Some(game) = self.room.game.as_mut() else {
            error!(room_code = %self.room.code, "active game vanished on bomb fire");
            return;
        };
        let Some(player) = game.player_mut(&current_id) else {
            error!(room_code = %self.room.code, player_id = %current_id, "current player vanished on bomb fire");
            return;
        };
        let lives_after = {
            player.lives = player.lives.saturating_sub(1);
            let eliminated = player.lives == 0;
            if eliminated {
                player.is_eliminated = true;
            }
            let lives = player.lives;
            if eliminated {
                game.record_elimination(&current_id);
            }
            lives
        };
        self.transport
            .broadcast(
                &self.room.code,
                &OutboundEvent::PlayerUpdated {
                    player_id: current_id,
                    lives: lives_after,
                },
            )
            .await;

        if self.check_game_over().await {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let Some(advanced) = self.room.game.as_mut().map(|game| game.advance_turn()) else {
            error!(room_code = %self.room.code, "active game vanished before post-bomb turn advance");
            return;
        };
        if advanced {
            self.resample_and_broadcast_turn(generation).await;
        } else {
            self.check_game_over().await;
        }
    }

    async fn fire_grace(&mut self) {
        let rules = self.room.rules.clone();
        for player in self.room.players.iter_mut() {
            player.reset_for_lobby(&rules);
        }
        self.room.game = None;
        self.room.state = RoomState::Lobby;
        self.room.recompute_leader();
        self.broadcast_players_updated().await;
    }
}

/// Spawns a room actor and returns a handle to it.
pub fn spawn_room(
    code: String,
    rules: Rules,
    dictionary: Arc<Dictionary>,
    config: Arc<EngineConfig>,
    transport: Arc<dyn Transport>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.room_command_channel_capacity);
    let actor = RoomActor {
        room: Room::new(code.clone(), rules),
        dictionary,
        config,
        transport,
        generation: 0,
        self_tx: tx.clone(),
        receiver: rx,
    };
    tokio::spawn(actor.run());
    RoomHandle { code, sender: tx }
}
