use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::sanitize::sanitize;
use crate::validation::Violation;

/// 统一的时间戳类型。
pub type Timestamp = OffsetDateTime;

/// 广播哨兵收件人，对所有人可见。
pub const BROADCAST: &str = "Todos";

/// 展示用时间格式，秒级精度，不参与排序。
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

/// 把时间戳格式化为 `HH:mm:ss` 展示字符串。
pub fn display_time(at: Timestamp) -> String {
    at.format(TIME_FORMAT).unwrap_or_default()
}

/// 消息唯一标识，由存储层在插入时分配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<MessageId> for Uuid {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

/// 消息类别。`Status` 由系统在进出房间时生成。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Chat,
    Private,
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Chat => "chat",
            MessageKind::Private => "private",
            MessageKind::Status => "status",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 净化后的参与者名称。房间内唯一，大小写敏感。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantName(String);

impl ParticipantName {
    /// 净化并校验名称；空名称返回对应字段的违规项。
    pub fn parse(value: &str, field: &'static str) -> Result<Self, Violation> {
        let value = sanitize(value);
        if value.is_empty() {
            return Err(Violation::new(field, "不能为空"));
        }
        Ok(Self(value))
    }

    /// 广播哨兵收件人。
    pub fn broadcast() -> Self {
        Self(BROADCAST.to_owned())
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == BROADCAST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parse_sanitizes_and_trims() {
        let name = ParticipantName::parse("  <i>Ana</i> ", "name").unwrap();
        assert_eq!(name.as_str(), "Ana");
    }

    #[test]
    fn parse_rejects_empty_after_sanitization() {
        let err = ParticipantName::parse("<br>", "name").unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn display_time_has_second_resolution() {
        let at = datetime!(2023-04-05 07:08:09 UTC);
        assert_eq!(display_time(at), "07:08:09");
    }
}
