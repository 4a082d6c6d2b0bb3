//! PostgreSQL 仓储实现
//!
//! 消息检索顺序由 `seq`（插入序列）决定，与展示用的
//! `time_label` 无关。

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use domain::{
    Message, MessageId, MessageKind, MessageRepository, MessageUpdate, NewMessage, Participant,
    ParticipantName, ParticipantRepository, RepositoryError, RepositoryResult, Timestamp,
    BROADCAST,
};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

fn kind_from_str(value: &str) -> RepositoryResult<MessageKind> {
    match value {
        "chat" => Ok(MessageKind::Chat),
        "private" => Ok(MessageKind::Private),
        "status" => Ok(MessageKind::Status),
        other => Err(invalid_data(format!("unknown message kind: {other}"))),
    }
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    name: String,
    last_seen: OffsetDateTime,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = RepositoryError;

    fn try_from(value: ParticipantRecord) -> Result<Self, Self::Error> {
        let name = ParticipantName::parse(&value.name, "name")
            .map_err(|err| invalid_data(err.to_string()))?;
        Ok(Participant::new(name, value.last_seen))
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sender: String,
    recipient: String,
    text: String,
    kind: String,
    time_label: String,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let from = ParticipantName::parse(&value.sender, "from")
            .map_err(|err| invalid_data(err.to_string()))?;
        let to = ParticipantName::parse(&value.recipient, "to")
            .map_err(|err| invalid_data(err.to_string()))?;
        Ok(Message {
            id: MessageId::from(value.id),
            from,
            to,
            text: value.text,
            kind: kind_from_str(&value.kind)?,
            time: value.time_label,
        })
    }
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn insert(&self, participant: Participant) -> RepositoryResult<()> {
        sqlx::query("INSERT INTO participants (name, last_seen) VALUES ($1, $2)")
            .bind(participant.name.as_str())
            .bind(participant.last_seen)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find_by_name(&self, name: &ParticipantName) -> RepositoryResult<Option<Participant>> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_seen FROM participants WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Participant::try_from).transpose()
    }

    async fn update_last_seen(
        &self,
        name: &ParticipantName,
        at: Timestamp,
    ) -> RepositoryResult<u64> {
        let result = sqlx::query("UPDATE participants SET last_seen = $2 WHERE name = $1")
            .bind(name.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn list(&self) -> RepositoryResult<Vec<Participant>> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_seen FROM participants",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn find_stale(&self, cutoff: Timestamp) -> RepositoryResult<Vec<Participant>> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_seen FROM participants WHERE last_seen < $1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM participants WHERE last_seen < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: NewMessage) -> RepositoryResult<MessageId> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender, recipient, text, kind, time_label)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(message.from.as_str())
        .bind(message.to.as_str())
        .bind(&message.text)
        .bind(message.kind.as_str())
        .bind(&message.time)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(MessageId::from(id))
    }

    async fn insert_many(&self, messages: Vec<NewMessage>) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        for message in messages {
            sqlx::query(
                r#"
                INSERT INTO messages (id, sender, recipient, text, kind, time_label)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(message.from.as_str())
            .bind(message.to.as_str())
            .bind(&message.text)
            .bind(message.kind.as_str())
            .bind(&message.time)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, sender, recipient, text, kind, time_label FROM messages WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn find_visible(
        &self,
        viewer: &ParticipantName,
        limit: Option<i64>,
    ) -> RepositoryResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender, recipient, text, kind, time_label
            FROM messages
            WHERE sender = $1 OR recipient = $1 OR kind = 'chat' OR recipient = $2
            ORDER BY seq DESC
            LIMIT $3
            "#,
        )
        .bind(viewer.as_str())
        .bind(BROADCAST)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn update(&self, id: MessageId, fields: MessageUpdate) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE messages SET recipient = $2, text = $3, kind = $4 WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .bind(fields.to.as_str())
        .bind(&fields.text)
        .bind(fields.kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
