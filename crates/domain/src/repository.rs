//! 仓储抽象
//!
//! 存储是唯一的共享可变资源，单条插入/更新/删除的原子性由
//! 具体实现保证；名称唯一性最终以存储层的唯一约束兜底。

use async_trait::async_trait;

use crate::errors::RepositoryResult;
use crate::message::{Message, MessageUpdate, NewMessage};
use crate::participant::Participant;
use crate::value_objects::{MessageId, ParticipantName, Timestamp};

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// 插入新参与者；名称已存在时返回 `Conflict`。
    async fn insert(&self, participant: Participant) -> RepositoryResult<()>;

    async fn find_by_name(&self, name: &ParticipantName) -> RepositoryResult<Option<Participant>>;

    /// 刷新 `last_seen`，返回命中的行数，用于区分"不存在"与存储错误。
    async fn update_last_seen(
        &self,
        name: &ParticipantName,
        at: Timestamp,
    ) -> RepositoryResult<u64>;

    /// 按存储顺序返回全部参与者。
    async fn list(&self) -> RepositoryResult<Vec<Participant>>;

    /// `last_seen` 早于 `cutoff` 的全部参与者。
    async fn find_stale(&self, cutoff: Timestamp) -> RepositoryResult<Vec<Participant>>;

    /// 删除 `last_seen` 早于 `cutoff` 的参与者，返回删除数量。
    async fn delete_stale(&self, cutoff: Timestamp) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 插入消息并返回存储层分配的标识。
    async fn insert(&self, message: NewMessage) -> RepositoryResult<MessageId>;

    /// 批量插入，用于清理任务的离场消息。
    async fn insert_many(&self, messages: Vec<NewMessage>) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>>;

    /// 对 `viewer` 可见的消息，按插入序列从新到旧；
    /// `limit` 为空表示不限制。
    async fn find_visible(
        &self,
        viewer: &ParticipantName,
        limit: Option<i64>,
    ) -> RepositoryResult<Vec<Message>>;

    /// 替换可变字段，消息不存在时返回 `NotFound`。
    async fn update(&self, id: MessageId, fields: MessageUpdate) -> RepositoryResult<()>;

    async fn delete(&self, id: MessageId) -> RepositoryResult<()>;
}
