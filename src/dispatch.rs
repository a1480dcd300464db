//! Glue between the untrusted inbound commands (`commands::InboundCommand`)
//! and the `RoomRegistry`: the command-ack shapes an external `Transport`
//! hands back to the originating socket (§6.2).
//!
//! Kept separate from `commands::parse` (pure payload parsing) and from
//! `RoomRegistry` (room lifecycle) so each stays testable in isolation,
//! the same separation the teacher draws between its websocket payload
//! parsers and `lobby::engine`'s room operations.

use serde::Serialize;

use crate::commands::InboundCommand;
use crate::engine::SubmitOutcome;
use crate::error::EngineError;
use crate::registry::RoomRegistry;

/// The shape every inbound command eventually acks back with. `code` is
/// only populated for `create-room`; `client_action_id` round-trips
/// `submit-word`'s optional id so the client can correlate the ack with
/// its own optimistic UI state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_action_id: Option<String>,
}

impl CommandAck {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            code: None,
            client_action_id: None,
        }
    }

    fn ok_with_code(code: String) -> Self {
        Self {
            success: true,
            error: None,
            code: Some(code),
            client_action_id: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            code: None,
            client_action_id: None,
        }
    }
}

impl From<EngineError> for CommandAck {
    fn from(err: EngineError) -> Self {
        CommandAck::err(err.to_string())
    }
}

/// Parses and dispatches one inbound transport event. Invalid payloads
/// never reach here: `commands::parse` returning `None` is the caller's
/// cue to ack `"Invalid payload."` directly without touching this
/// function, per §6.2's "no state change on schema violation" rule.
pub async fn dispatch(registry: &RoomRegistry, command: InboundCommand) -> CommandAck {
    match command {
        InboundCommand::CreateRoom => match registry.create_room().await {
            Ok(code) => CommandAck::ok_with_code(code),
            Err(err) => err.into(),
        },
        InboundCommand::JoinRoom {
            room_code,
            player_id,
            name,
        } => match registry.join_room(&room_code, player_id, name).await {
            Ok(()) => CommandAck::ok(),
            Err(err) => err.into(),
        },
        InboundCommand::LeaveRoom {
            room_code,
            player_id,
        } => match registry.leave_room(&room_code, player_id).await {
            Ok(()) => CommandAck::ok(),
            Err(err) => err.into(),
        },
        InboundCommand::SetPlayerSeated {
            room_code,
            player_id,
            seated,
        } => match registry.set_seated(&room_code, player_id, seated).await {
            Ok(()) => CommandAck::ok(),
            Err(err) => err.into(),
        },
        InboundCommand::UpdateRoomRules {
            room_code,
            player_id,
            rules,
        } => match registry.update_rules(&room_code, player_id, rules).await {
            Ok(()) => CommandAck::ok(),
            Err(err) => err.into(),
        },
        InboundCommand::StartGame {
            room_code,
            player_id,
        } => match registry.start_game(&room_code, player_id).await {
            Ok(()) => CommandAck::ok(),
            Err(err) => err.into(),
        },
        InboundCommand::PlayerTyping {
            room_code,
            player_id,
            input,
        } => match registry.player_typing(&room_code, player_id, input).await {
            Ok(()) => CommandAck::ok(),
            Err(err) => err.into(),
        },
        InboundCommand::SubmitWord {
            room_code,
            player_id,
            word,
            client_action_id,
        } => {
            let mut ack = match registry.submit_word(&room_code, player_id, word).await {
                Ok(SubmitOutcome::Accepted) => CommandAck::ok(),
                Ok(SubmitOutcome::Rejected(reason)) => CommandAck::err(reason),
                Err(err) => err.into(),
            };
            ack.client_action_id = client_action_id;
            ack
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::dictionary::Dictionary;
    use crate::transport::test_double::RecordingTransport;
    use std::sync::Arc;

    fn registry() -> RoomRegistry {
        let dictionary = Arc::new(Dictionary::from_words(vec!["car", "art"].into_iter(), true));
        let config = Arc::new(EngineConfig::default());
        let transport = Arc::new(RecordingTransport::default());
        RoomRegistry::new(dictionary, config, transport).unwrap()
    }

    #[tokio::test]
    async fn create_room_ack_carries_code() {
        let registry = registry();
        let ack = dispatch(&registry, InboundCommand::CreateRoom).await;
        assert!(ack.success);
        assert!(ack.code.is_some());
    }

    #[tokio::test]
    async fn join_unknown_room_acks_failure() {
        let registry = registry();
        let ack = dispatch(
            &registry,
            InboundCommand::JoinRoom {
                room_code: "ZZZZ".into(),
                player_id: "alice".into(),
                name: "Alice".into(),
            },
        )
        .await;
        assert!(!ack.success);
        assert!(ack.error.is_some());
    }

    #[tokio::test]
    async fn submit_word_ack_round_trips_client_action_id() {
        let registry = registry();
        let code = registry.create_room().await.unwrap();
        registry
            .join_room(&code, "alice".into(), "Alice".into())
            .await
            .unwrap();

        let ack = dispatch(
            &registry,
            InboundCommand::SubmitWord {
                room_code: code,
                player_id: "alice".into(),
                word: "car".into(),
                client_action_id: Some("action-1".into()),
            },
        )
        .await;
        // Not their turn yet (no game active): rejection still carries the
        // client action id back.
        assert!(!ack.success);
        assert_eq!(ack.client_action_id.as_deref(), Some("action-1"));
    }
}
