//! 参与者服务单元测试
//!
//! 覆盖注册唯一性、入场消息、心跳刷新和部分失败上报。

#[cfg(test)]
mod participant_service_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use time::macros::datetime;

    use domain::{
        Message, MessageId, MessageKind, MessageRepository, MessageUpdate, NewMessage,
        ParticipantName, ParticipantRepository, RepositoryError, RepositoryResult,
    };

    use crate::clock::{Clock, ManualClock};
    use crate::error::ApplicationError;
    use crate::memory::{MemoryMessageRepository, MemoryParticipantRepository};
    use crate::services::{ParticipantService, ParticipantServiceDependencies};

    fn start_time() -> domain::Timestamp {
        datetime!(2023-01-01 12:00:00 UTC)
    }

    struct Fixture {
        participants: Arc<MemoryParticipantRepository>,
        messages: Arc<MemoryMessageRepository>,
        clock: Arc<ManualClock>,
        service: ParticipantService,
    }

    fn fixture() -> Fixture {
        let participants = Arc::new(MemoryParticipantRepository::new());
        let messages = Arc::new(MemoryMessageRepository::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let service = ParticipantService::new(ParticipantServiceDependencies {
            participants: participants.clone(),
            messages: messages.clone(),
            clock: clock.clone(),
        });
        Fixture {
            participants,
            messages,
            clock,
            service,
        }
    }

    #[tokio::test]
    async fn register_creates_participant_and_join_message() {
        let fixture = fixture();

        fixture.service.register("Ana").await.unwrap();

        let name = ParticipantName::parse("Ana", "name").unwrap();
        let stored = fixture.participants.find_by_name(&name).await.unwrap();
        assert_eq!(stored.unwrap().last_seen, start_time());

        let messages = fixture.messages.all().await;
        assert_eq!(messages.len(), 1);
        let join = &messages[0];
        assert_eq!(join.from.as_str(), "Ana");
        assert!(join.to.is_broadcast());
        assert_eq!(join.kind, MessageKind::Status);
        assert_eq!(join.time, "12:00:00");
    }

    #[tokio::test]
    async fn register_duplicate_name_conflicts() {
        let fixture = fixture();

        fixture.service.register("Ana").await.unwrap();
        let err = fixture.service.register("Ana").await.unwrap_err();

        assert!(matches!(err, ApplicationError::NameTaken(_)));
    }

    #[tokio::test]
    async fn register_compares_sanitized_names() {
        let fixture = fixture();

        fixture.service.register("<b>Ana</b>").await.unwrap();
        let err = fixture.service.register("Ana").await.unwrap_err();

        assert!(matches!(err, ApplicationError::NameTaken(_)));
    }

    #[tokio::test]
    async fn register_rejects_empty_name() {
        let fixture = fixture();

        let err = fixture.service.register("  <br> ").await.unwrap_err();

        assert!(matches!(err, ApplicationError::Validation(_)));
        assert!(fixture.messages.all().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_register_yields_one_success_one_conflict() {
        let fixture = fixture();
        let service = Arc::new(fixture.service);

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.register("Ana").await })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move { service.register("Ana").await })
        };

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(ApplicationError::NameTaken(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn heartbeat_refreshes_last_seen() {
        let fixture = fixture();
        fixture.service.register("Ana").await.unwrap();

        fixture.clock.advance(std::time::Duration::from_secs(5));
        fixture.service.heartbeat("Ana").await.unwrap();

        let name = ParticipantName::parse("Ana", "name").unwrap();
        let stored = fixture
            .participants
            .find_by_name(&name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_seen, fixture.clock.now());
    }

    #[tokio::test]
    async fn heartbeat_unknown_participant_is_not_found() {
        let fixture = fixture();
        fixture.service.register("Ana").await.unwrap();

        let err = fixture.service.heartbeat("Bob").await.unwrap_err();

        assert!(matches!(err, ApplicationError::ParticipantNotFound(_)));
    }

    #[tokio::test]
    async fn list_returns_participants_in_storage_order() {
        let fixture = fixture();
        fixture.service.register("Ana").await.unwrap();
        fixture.service.register("Bob").await.unwrap();

        let participants = fixture.service.list().await.unwrap();
        let names: Vec<_> = participants
            .iter()
            .map(|participant| participant.name.as_str().to_owned())
            .collect();
        assert_eq!(names, vec!["Ana", "Bob"]);
    }

    /// 所有写入都失败的消息仓储，用于模拟入场消息落库失败。
    struct FailingMessageRepository;

    #[async_trait]
    impl MessageRepository for FailingMessageRepository {
        async fn insert(&self, _message: NewMessage) -> RepositoryResult<MessageId> {
            Err(RepositoryError::storage("disk full"))
        }

        async fn insert_many(&self, _messages: Vec<NewMessage>) -> RepositoryResult<()> {
            Err(RepositoryError::storage("disk full"))
        }

        async fn find_by_id(&self, _id: MessageId) -> RepositoryResult<Option<Message>> {
            Ok(None)
        }

        async fn find_visible(
            &self,
            _viewer: &ParticipantName,
            _limit: Option<i64>,
        ) -> RepositoryResult<Vec<Message>> {
            Ok(Vec::new())
        }

        async fn update(&self, _id: MessageId, _fields: MessageUpdate) -> RepositoryResult<()> {
            Err(RepositoryError::storage("disk full"))
        }

        async fn delete(&self, _id: MessageId) -> RepositoryResult<()> {
            Err(RepositoryError::storage("disk full"))
        }
    }

    #[tokio::test]
    async fn register_reports_partial_failure_when_join_message_fails() {
        let participants = Arc::new(MemoryParticipantRepository::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let service = ParticipantService::new(ParticipantServiceDependencies {
            participants: participants.clone(),
            messages: Arc::new(FailingMessageRepository),
            clock,
        });

        let err = service.register("Ana").await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::PartialFailure {
                operation: "register",
                ..
            }
        ));

        // 参与者已经提交，失败必须显式上报而不是静默
        let name = ParticipantName::parse("Ana", "name").unwrap();
        assert!(participants.find_by_name(&name).await.unwrap().is_some());
    }
}
