use serde::Serialize;

use domain::{Message, MessageKind, Participant};

/// 参与者对外表示，`last_seen` 为 Unix 毫秒。
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantDto {
    pub name: String,
    #[serde(rename = "lastSeen")]
    pub last_seen: i64,
}

impl From<Participant> for ParticipantDto {
    fn from(participant: Participant) -> Self {
        Self {
            name: participant.name.to_string(),
            last_seen: (participant.last_seen.unix_timestamp_nanos() / 1_000_000) as i64,
        }
    }
}

/// 消息对外表示，`type` 沿用对外协议的字段名。
#[derive(Debug, Clone, Serialize)]
pub struct MessageDto {
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.to_string(),
            from: message.from.to_string(),
            to: message.to.to_string(),
            text: message.text,
            kind: message.kind,
            time: message.time,
        }
    }
}
