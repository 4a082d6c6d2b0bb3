//! 内存仓储实现
//!
//! 用于测试与本地运行。单条操作的原子性由写锁保证，
//! 名称唯一性在持锁的检查-插入中强制执行。

use tokio::sync::RwLock;
use uuid::Uuid;

use async_trait::async_trait;
use domain::{
    Message, MessageId, MessageRepository, MessageUpdate, NewMessage, Participant,
    ParticipantName, ParticipantRepository, RepositoryError, RepositoryResult, Timestamp,
};

/// 参与者的内存仓储，保持插入顺序。
#[derive(Debug, Default)]
pub struct MemoryParticipantRepository {
    rows: RwLock<Vec<Participant>>,
}

impl MemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryParticipantRepository {
    async fn insert(&self, participant: Participant) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.name == participant.name) {
            return Err(RepositoryError::Conflict);
        }
        rows.push(participant);
        Ok(())
    }

    async fn find_by_name(&self, name: &ParticipantName) -> RepositoryResult<Option<Participant>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| &row.name == name).cloned())
    }

    async fn update_last_seen(
        &self,
        name: &ParticipantName,
        at: Timestamp,
    ) -> RepositoryResult<u64> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|row| &row.name == name) {
            Some(row) => {
                row.last_seen = at;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list(&self) -> RepositoryResult<Vec<Participant>> {
        let rows = self.rows.read().await;
        Ok(rows.clone())
    }

    async fn find_stale(&self, cutoff: Timestamp) -> RepositoryResult<Vec<Participant>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| row.is_stale(cutoff))
            .cloned()
            .collect())
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> RepositoryResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !row.is_stale(cutoff));
        Ok((before - rows.len()) as u64)
    }
}

/// 消息的内存仓储，向量顺序即插入序列。
#[derive(Debug, Default)]
pub struct MemoryMessageRepository {
    rows: RwLock<Vec<Message>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部消息，按插入顺序。测试断言用。
    pub async fn all(&self) -> Vec<Message> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn insert(&self, message: NewMessage) -> RepositoryResult<MessageId> {
        let id = MessageId::new(Uuid::new_v4());
        let mut rows = self.rows.write().await;
        rows.push(Message {
            id,
            from: message.from,
            to: message.to,
            text: message.text,
            kind: message.kind,
            time: message.time,
        });
        Ok(id)
    }

    async fn insert_many(&self, messages: Vec<NewMessage>) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        for message in messages {
            rows.push(Message {
                id: MessageId::new(Uuid::new_v4()),
                from: message.from,
                to: message.to,
                text: message.text,
                kind: message.kind,
                time: message.time,
            });
        }
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn find_visible(
        &self,
        viewer: &ParticipantName,
        limit: Option<i64>,
    ) -> RepositoryResult<Vec<Message>> {
        let rows = self.rows.read().await;
        let visible = rows.iter().rev().filter(|row| row.is_visible_to(viewer));

        let collected = match limit {
            Some(limit) => visible.take(limit as usize).cloned().collect(),
            None => visible.cloned().collect(),
        };
        Ok(collected)
    }

    async fn update(&self, id: MessageId, fields: MessageUpdate) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.to = fields.to;
        row.text = fields.text;
        row.kind = fields.kind;
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        let position = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(RepositoryError::NotFound)?;
        rows.remove(position);
        Ok(())
    }
}
