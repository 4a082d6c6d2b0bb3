use crate::sanitize::sanitize;
use crate::validation::{Violation, Violations};
use crate::value_objects::{MessageId, MessageKind, ParticipantName};

/// 已持久化的消息。
///
/// `time` 是写入时刻的秒级展示字符串，检索顺序由存储层的
/// 插入序列决定，与该字段无关。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub from: ParticipantName,
    pub to: ParticipantName,
    pub text: String,
    pub kind: MessageKind,
    pub time: String,
}

impl Message {
    /// 消息只能由其作者改动或删除。
    pub fn is_owned_by(&self, caller: &ParticipantName) -> bool {
        &self.from == caller
    }

    /// 对 `viewer` 可见：自己发的、发给自己的、公开聊天、或广播。
    pub fn is_visible_to(&self, viewer: &ParticipantName) -> bool {
        &self.from == viewer
            || &self.to == viewer
            || self.kind == MessageKind::Chat
            || self.to.is_broadcast()
    }
}

/// 待插入的消息，标识由存储层分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: ParticipantName,
    pub to: ParticipantName,
    pub text: String,
    pub kind: MessageKind,
    pub time: String,
}

impl NewMessage {
    /// 系统合成的进出房间状态消息，始终广播。
    pub fn status(from: ParticipantName, text: impl Into<String>, time: String) -> Self {
        Self {
            from,
            to: ParticipantName::broadcast(),
            text: text.into(),
            kind: MessageKind::Status,
            time,
        }
    }
}

/// 编辑消息时可替换的字段。作者与写入时间不可转移。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUpdate {
    pub to: ParticipantName,
    pub text: String,
    pub kind: MessageKind,
}

/// 客户端提交的原始消息字段，校验前未净化。
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

/// 校验通过、全部字段已净化的草稿。
#[derive(Debug, Clone)]
pub struct ValidDraft {
    pub from: ParticipantName,
    pub to: ParticipantName,
    pub text: String,
    pub kind: MessageKind,
}

impl MessageDraft {
    /// 净化并校验全部字段，收集所有违规项后一次返回。
    pub fn validate(self) -> Result<ValidDraft, Violations> {
        let mut violations = Violations::new();

        let from = match ParticipantName::parse(&self.from, "from") {
            Ok(name) => Some(name),
            Err(violation) => {
                violations.push(violation);
                None
            }
        };
        let to = match ParticipantName::parse(&self.to, "to") {
            Ok(name) => Some(name),
            Err(violation) => {
                violations.push(violation);
                None
            }
        };

        let text = sanitize(&self.text);
        if text.is_empty() {
            violations.push(Violation::new("text", "不能为空"));
        }

        violations.into_result()?;

        // 违规列表为空时上面的字段必然都解析成功
        match (from, to) {
            (Some(from), Some(to)) => Ok(ValidDraft {
                from,
                to,
                text,
                kind: self.kind,
            }),
            _ => unreachable!("violations were empty"),
        }
    }
}
