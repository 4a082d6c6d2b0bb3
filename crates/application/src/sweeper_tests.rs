//! 清理任务单元测试
//!
//! 用 `ManualClock` 单步驱动 tick，不依赖真实等待。

#[cfg(test)]
mod sweeper_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use time::macros::datetime;

    use domain::{
        Message, MessageId, MessageKind, MessageRepository, MessageUpdate, NewMessage,
        Participant, ParticipantName, ParticipantRepository, RepositoryError, RepositoryResult,
        Timestamp,
    };

    use crate::clock::{Clock, ManualClock};
    use crate::memory::{MemoryMessageRepository, MemoryParticipantRepository};
    use crate::sweeper::{PresenceSweeper, SweeperConfig, SweeperDependencies, LEAVE_TEXT};

    fn start_time() -> Timestamp {
        datetime!(2023-01-01 12:00:00 UTC)
    }

    fn config() -> SweeperConfig {
        SweeperConfig {
            interval: Duration::from_secs(1),
            threshold: Duration::from_secs(10),
        }
    }

    struct Fixture {
        participants: Arc<MemoryParticipantRepository>,
        messages: Arc<MemoryMessageRepository>,
        clock: Arc<ManualClock>,
        sweeper: PresenceSweeper,
    }

    fn fixture() -> Fixture {
        let participants = Arc::new(MemoryParticipantRepository::new());
        let messages = Arc::new(MemoryMessageRepository::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let sweeper = PresenceSweeper::new(
            SweeperDependencies {
                participants: participants.clone(),
                messages: messages.clone(),
                clock: clock.clone(),
            },
            config(),
        );
        Fixture {
            participants,
            messages,
            clock,
            sweeper,
        }
    }

    async fn seed(fixture: &Fixture, name: &str, last_seen: Timestamp) {
        let name = ParticipantName::parse(name, "name").unwrap();
        fixture
            .participants
            .insert(Participant::new(name, last_seen))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn tick_evicts_stale_and_records_departure() {
        let fixture = fixture();
        seed(&fixture, "Ana", start_time()).await;

        fixture.clock.advance(Duration::from_secs(11));
        let removed = fixture.sweeper.tick().await.unwrap();
        assert_eq!(removed, 1);

        assert!(fixture.participants.list().await.unwrap().is_empty());

        let messages = fixture.messages.all().await;
        assert_eq!(messages.len(), 1);
        let departure = &messages[0];
        assert_eq!(departure.from.as_str(), "Ana");
        assert!(departure.to.is_broadcast());
        assert_eq!(departure.kind, MessageKind::Status);
        assert_eq!(departure.text, LEAVE_TEXT);
    }

    #[tokio::test]
    async fn tick_without_stale_participants_writes_nothing() {
        let fixture = fixture();
        seed(&fixture, "Ana", start_time()).await;

        fixture.clock.advance(Duration::from_secs(5));
        let removed = fixture.sweeper.tick().await.unwrap();

        assert_eq!(removed, 0);
        assert!(fixture.messages.all().await.is_empty());
        assert_eq!(fixture.participants.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tick_keeps_recently_active_participants() {
        let fixture = fixture();
        seed(&fixture, "Ana", start_time()).await;
        fixture.clock.advance(Duration::from_secs(11));
        seed(&fixture, "Bob", fixture.clock.now()).await;

        let removed = fixture.sweeper.tick().await.unwrap();
        assert_eq!(removed, 1);

        let remaining = fixture.participants.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name.as_str(), "Bob");

        let messages = fixture.messages.all().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from.as_str(), "Ana");
    }

    /// 记录仓储调用顺序的包装，用于断言离场消息先于删除。
    type OpLog = Arc<Mutex<Vec<&'static str>>>;

    struct RecordingParticipants {
        inner: Arc<MemoryParticipantRepository>,
        log: OpLog,
    }

    #[async_trait]
    impl ParticipantRepository for RecordingParticipants {
        async fn insert(&self, participant: Participant) -> RepositoryResult<()> {
            self.inner.insert(participant).await
        }

        async fn find_by_name(
            &self,
            name: &ParticipantName,
        ) -> RepositoryResult<Option<Participant>> {
            self.inner.find_by_name(name).await
        }

        async fn update_last_seen(
            &self,
            name: &ParticipantName,
            at: Timestamp,
        ) -> RepositoryResult<u64> {
            self.inner.update_last_seen(name, at).await
        }

        async fn list(&self) -> RepositoryResult<Vec<Participant>> {
            self.inner.list().await
        }

        async fn find_stale(&self, cutoff: Timestamp) -> RepositoryResult<Vec<Participant>> {
            self.log.lock().unwrap().push("find_stale");
            self.inner.find_stale(cutoff).await
        }

        async fn delete_stale(&self, cutoff: Timestamp) -> RepositoryResult<u64> {
            self.log.lock().unwrap().push("delete_stale");
            self.inner.delete_stale(cutoff).await
        }
    }

    struct RecordingMessages {
        inner: Arc<MemoryMessageRepository>,
        log: OpLog,
        fail_next_batch: Mutex<bool>,
    }

    #[async_trait]
    impl MessageRepository for RecordingMessages {
        async fn insert(&self, message: NewMessage) -> RepositoryResult<MessageId> {
            self.inner.insert(message).await
        }

        async fn insert_many(&self, messages: Vec<NewMessage>) -> RepositoryResult<()> {
            self.log.lock().unwrap().push("insert_many");
            {
                let mut fail = self.fail_next_batch.lock().unwrap();
                if *fail {
                    *fail = false;
                    return Err(RepositoryError::storage("connection reset"));
                }
            }
            self.inner.insert_many(messages).await
        }

        async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
            self.inner.find_by_id(id).await
        }

        async fn find_visible(
            &self,
            viewer: &ParticipantName,
            limit: Option<i64>,
        ) -> RepositoryResult<Vec<Message>> {
            self.inner.find_visible(viewer, limit).await
        }

        async fn update(&self, id: MessageId, fields: MessageUpdate) -> RepositoryResult<()> {
            self.inner.update(id, fields).await
        }

        async fn delete(&self, id: MessageId) -> RepositoryResult<()> {
            self.inner.delete(id).await
        }
    }

    fn recording_fixture(fail_first_batch: bool) -> (Fixture, OpLog) {
        let log: OpLog = Arc::new(Mutex::new(Vec::new()));
        let participants = Arc::new(MemoryParticipantRepository::new());
        let messages = Arc::new(MemoryMessageRepository::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let sweeper = PresenceSweeper::new(
            SweeperDependencies {
                participants: Arc::new(RecordingParticipants {
                    inner: participants.clone(),
                    log: log.clone(),
                }),
                messages: Arc::new(RecordingMessages {
                    inner: messages.clone(),
                    log: log.clone(),
                    fail_next_batch: Mutex::new(fail_first_batch),
                }),
                clock: clock.clone(),
            },
            config(),
        );
        (
            Fixture {
                participants,
                messages,
                clock,
                sweeper,
            },
            log,
        )
    }

    #[tokio::test]
    async fn departure_message_precedes_participant_deletion() {
        let (fixture, log) = recording_fixture(false);
        seed(&fixture, "Ana", start_time()).await;

        fixture.clock.advance(Duration::from_secs(11));
        fixture.sweeper.tick().await.unwrap();

        let ops = log.lock().unwrap().clone();
        assert_eq!(ops, vec!["find_stale", "insert_many", "delete_stale"]);
    }

    #[tokio::test]
    async fn failed_tick_is_abandoned_and_next_tick_retries() {
        let (fixture, _log) = recording_fixture(true);
        seed(&fixture, "Ana", start_time()).await;
        fixture.clock.advance(Duration::from_secs(11));

        // 第一轮：批量写入失败，参与者原样保留
        assert!(fixture.sweeper.tick().await.is_err());
        assert_eq!(fixture.participants.list().await.unwrap().len(), 1);

        // 第二轮重新评估同样的过期条件并完成清理
        let removed = fixture.sweeper.tick().await.unwrap();
        assert_eq!(removed, 1);
        assert!(fixture.participants.list().await.unwrap().is_empty());
        assert_eq!(fixture.messages.all().await.len(), 1);
    }
}
