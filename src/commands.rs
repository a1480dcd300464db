use serde::Deserialize;
use serde_json::Value;

use crate::rules::Rules;

/// Typed inbound commands, one per `onCommand` event name the abstract
/// transport delivers. Parsers are pure and return `None` on any schema
/// violation (no "trust the shape" paths), so the caller can immediately
/// ack `{success:false, error:"Invalid payload."}` without touching room
/// state, per the error design.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    CreateRoom,
    JoinRoom {
        room_code: String,
        player_id: String,
        name: String,
    },
    LeaveRoom {
        room_code: String,
        player_id: String,
    },
    SetPlayerSeated {
        room_code: String,
        player_id: String,
        seated: bool,
    },
    UpdateRoomRules {
        room_code: String,
        player_id: String,
        rules: Rules,
    },
    StartGame {
        room_code: String,
        player_id: String,
    },
    PlayerTyping {
        room_code: String,
        player_id: String,
        input: String,
    },
    SubmitWord {
        room_code: String,
        player_id: String,
        word: String,
        client_action_id: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRoomPayload {
    room_code: String,
    player_id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveRoomPayload {
    room_code: String,
    player_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetPlayerSeatedPayload {
    room_code: String,
    player_id: String,
    seated: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRoomRulesPayload {
    room_code: String,
    player_id: String,
    rules: Rules,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartGamePayload {
    room_code: String,
    player_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerTypingPayload {
    room_code: String,
    player_id: String,
    input: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitWordPayload {
    room_code: String,
    player_id: String,
    word: String,
    #[serde(default)]
    client_action_id: Option<String>,
}

/// Parses an inbound command by its transport-level event name. Returns
/// `None` if `event_name` is unrecognized or `payload` doesn't match the
/// expected schema.
pub fn parse(event_name: &str, payload: Value) -> Option<InboundCommand> {
    match event_name {
        "create-room" => Some(InboundCommand::CreateRoom),
        "join-room" => {
            let p: JoinRoomPayload = serde_json::from_value(payload).ok()?;
            Some(InboundCommand::JoinRoom {
                room_code: p.room_code,
                player_id: p.player_id,
                name: p.name,
            })
        }
        "leave-room" => {
            let p: LeaveRoomPayload = serde_json::from_value(payload).ok()?;
            Some(InboundCommand::LeaveRoom {
                room_code: p.room_code,
                player_id: p.player_id,
            })
        }
        "set-player-seated" => {
            let p: SetPlayerSeatedPayload = serde_json::from_value(payload).ok()?;
            Some(InboundCommand::SetPlayerSeated {
                room_code: p.room_code,
                player_id: p.player_id,
                seated: p.seated,
            })
        }
        "update-room-rules" => {
            let p: UpdateRoomRulesPayload = serde_json::from_value(payload).ok()?;
            Some(InboundCommand::UpdateRoomRules {
                room_code: p.room_code,
                player_id: p.player_id,
                rules: p.rules,
            })
        }
        "start-game" => {
            let p: StartGamePayload = serde_json::from_value(payload).ok()?;
            Some(InboundCommand::StartGame {
                room_code: p.room_code,
                player_id: p.player_id,
            })
        }
        "player-typing" => {
            let p: PlayerTypingPayload = serde_json::from_value(payload).ok()?;
            Some(InboundCommand::PlayerTyping {
                room_code: p.room_code,
                player_id: p.player_id,
                input: p.input,
            })
        }
        "submit-word" => {
            let p: SubmitWordPayload = serde_json::from_value(payload).ok()?;
            Some(InboundCommand::SubmitWord {
                room_code: p.room_code,
                player_id: p.player_id,
                word: p.word,
                client_action_id: p.client_action_id,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_join_room() {
        let cmd = parse(
            "join-room",
            json!({"roomCode": "ABCD", "playerId": "alice", "name": "Alice"}),
        );
        assert_eq!(
            cmd,
            Some(InboundCommand::JoinRoom {
                room_code: "ABCD".into(),
                player_id: "alice".into(),
                name: "Alice".into(),
            })
        );
    }

    #[test]
    fn rejects_malformed_payload() {
        assert_eq!(parse("join-room", json!({"roomCode": "ABCD"})), None);
    }

    #[test]
    fn rejects_unknown_command() {
        assert_eq!(parse("not-a-command", json!({})), None);
    }

    #[test]
    fn submit_word_client_action_id_is_optional() {
        let cmd = parse(
            "submit-word",
            json!({"roomCode": "ABCD", "playerId": "alice", "word": "car"}),
        );
        assert_eq!(
            cmd,
            Some(InboundCommand::SubmitWord {
                room_code: "ABCD".into(),
                player_id: "alice".into(),
                word: "car".into(),
                client_action_id: None,
            })
        );
    }
}
