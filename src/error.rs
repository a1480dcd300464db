use thiserror::Error;

/// Top-level error type for the room-and-game engine.
///
/// Every variant maps to one of the error kinds in the engine's error
/// taxonomy; `code()` gives the stable string an ack or log line can key
/// off of, the way `GameError::code()` does for the lobby layer this crate
/// grew out of.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Room not found")]
    RoomNotFound,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Room code space exhausted")]
    RoomCodeSpaceExhausted,

    #[error("Dictionary is empty")]
    DictionaryEmpty,

    #[error("Room is busy")]
    Busy,
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidPayload(_) => "INVALID_PAYLOAD",
            EngineError::RoomNotFound => "ROOM_NOT_FOUND",
            EngineError::NotAuthorized(_) => "NOT_AUTHORIZED",
            EngineError::IllegalState(_) => "ILLEGAL_STATE",
            EngineError::SubmissionRejected(_) => "SUBMISSION_REJECTED",
            EngineError::RoomCodeSpaceExhausted => "ROOM_CODE_SPACE_EXHAUSTED",
            EngineError::DictionaryEmpty => "DICTIONARY_EMPTY",
            EngineError::Busy => "BUSY",
        }
    }
}
