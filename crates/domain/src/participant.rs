use crate::value_objects::{ParticipantName, Timestamp};

/// 房间参与者。`last_seen` 由心跳刷新，清理任务据此判定活跃度。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: ParticipantName,
    pub last_seen: Timestamp,
}

impl Participant {
    pub fn new(name: ParticipantName, last_seen: Timestamp) -> Self {
        Self { name, last_seen }
    }

    /// 在 `cutoff` 之前最后一次活跃即视为过期。
    pub fn is_stale(&self, cutoff: Timestamp) -> bool {
        self.last_seen < cutoff
    }
}
