use std::path::PathBuf;

use crate::rules::Rules;

/// Where the dictionary loads its word list from.
///
/// Resolves the spec's "is this a test environment" ambiguity into an
/// explicit flag rather than sniffing `$APP_ENV` the way the lobby layer
/// sniffs `RUST_ENV` elsewhere in this codebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictionaryMode {
    File(PathBuf),
    Fallback,
}

/// Process-wide tunables for room and game behavior.
///
/// Analogous to `AppState`'s `AppConfig`, but carries no database or queue
/// credentials: this engine has no external services to dial.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_rules: Rules,
    pub room_code_alphabet: String,
    pub room_code_length: usize,
    pub room_code_retry_limit: u32,
    pub countdown_ms: i64,
    pub initial_bomb_seconds: u32,
    pub bomb_decay_factor: f64,
    pub end_game_grace_ms: i64,
    pub room_command_channel_capacity: usize,
    pub room_idle_ttl_secs: u64,
    pub dictionary_mode: DictionaryMode,
    /// Enables the dictionary's deterministic `"aa"` fallback fragment when
    /// no fragment in the corpus meets a sampling threshold.
    pub dictionary_test_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_rules: Rules::default(),
            room_code_alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string(),
            room_code_length: 4,
            room_code_retry_limit: 100,
            countdown_ms: 3_000,
            initial_bomb_seconds: 10,
            bomb_decay_factor: 0.97,
            end_game_grace_ms: 3_000,
            room_command_channel_capacity: 1024,
            room_idle_ttl_secs: 600,
            dictionary_mode: DictionaryMode::Fallback,
            dictionary_test_mode: false,
        }
    }
}

impl EngineConfig {
    /// Loads overrides from the environment, falling back to defaults for
    /// anything unset. Unlike `AppState::new`, nothing here is required;
    /// this crate has no mandatory external dependency to fail fast on.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DICTIONARY_PATH") {
            config.dictionary_mode = DictionaryMode::File(PathBuf::from(path));
        }
        if let Ok(alphabet) = std::env::var("ROOM_CODE_ALPHABET") {
            if !alphabet.is_empty() {
                config.room_code_alphabet = alphabet;
            }
        }
        if let Ok(len) = std::env::var("ROOM_CODE_LENGTH") {
            if let Ok(len) = len.parse() {
                config.room_code_length = len;
            }
        }
        if let Ok(cap) = std::env::var("ROOM_COMMAND_CHANNEL_CAPACITY") {
            if let Ok(cap) = cap.parse() {
                config.room_command_channel_capacity = cap;
            }
        }

        config
    }
}
