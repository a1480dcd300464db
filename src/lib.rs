//! Room-and-game orchestration core for a realtime word-elimination game.
//!
//! This crate is the room lifecycle state machine, per-room game engine,
//! word-submission validation pipeline, bonus-letter mechanic, dictionary
//! service, and room-code allocator described in the engine's design
//! documents. The websocket transport, HTTP probes, client UI, and
//! dictionary file provisioning are external collaborators: this crate
//! consumes a [`transport::Transport`] for broadcasting typed events and a
//! [`dictionary::Dictionary`] for word validity and fragment sampling.
//!
//! An embedding application typically builds its [`Dictionary`] with
//! [`Dictionary::from_config`], which dispatches on
//! [`EngineConfig::dictionary_mode`](config::DictionaryMode), then wraps it
//! in an `Arc` shared across every [`RoomRegistry`].

pub mod commands;
pub mod config;
pub mod dictionary;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod game;
pub mod player;
pub mod registry;
pub mod room;
pub mod room_code;
pub mod rules;
pub mod transport;

pub use config::EngineConfig;
pub use dictionary::Dictionary;
pub use engine::{RoomHandle, RoomSnapshot, SubmitOutcome};
pub use error::EngineError;
pub use registry::RoomRegistry;
pub use room::{Room, RoomState};
pub use rules::Rules;
pub use transport::{OutboundEvent, Transport};

/// Loads a `.env` file into the process environment, if one is present.
/// Mirrors the teacher's own `dotenvy::dotenv().ok()` call at startup;
/// unlike the teacher this crate has no required environment variables;
/// [`EngineConfig::from_env`] falls back to sane defaults for everything,
/// so calling this is optional and purely a convenience for an embedding
/// application that wants `.env`-driven configuration.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}
