//! 参与者注册与活跃度跟踪
//!
//! 强制名称唯一，维护 `last_seen`，并在注册成功时让消息仓储
//! 记录一条入场状态消息。

use std::sync::Arc;

use tracing::{error, info};

use domain::{
    display_time, MessageRepository, NewMessage, Participant, ParticipantName,
    ParticipantRepository, RepositoryError,
};

use crate::{clock::Clock, error::ApplicationError};

/// 入场状态消息正文。
pub const JOIN_TEXT: &str = "entra na sala...";

pub struct ParticipantServiceDependencies {
    pub participants: Arc<dyn ParticipantRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct ParticipantService {
    deps: ParticipantServiceDependencies,
}

impl ParticipantService {
    pub fn new(deps: ParticipantServiceDependencies) -> Self {
        Self { deps }
    }

    /// 注册新参与者。
    ///
    /// 先做检查-插入，存储层的唯一约束作为并发注册时的兜底：
    /// 两个并发的同名注册恰好一个成功、一个冲突。
    /// 参与者记录与入场消息都落库后才算成功；入场消息写失败
    /// 时参与者已提交，以 `PartialFailure` 上报，不静默留下
    /// 孤儿记录。
    pub async fn register(&self, name: &str) -> Result<(), ApplicationError> {
        let name = ParticipantName::parse(name, "name")
            .map_err(|violation| ApplicationError::Validation(violation.into()))?;

        if self.deps.participants.find_by_name(&name).await?.is_some() {
            return Err(ApplicationError::NameTaken(name));
        }

        let now = self.deps.clock.now();
        match self
            .deps
            .participants
            .insert(Participant::new(name.clone(), now))
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::Conflict) => return Err(ApplicationError::NameTaken(name)),
            Err(other) => return Err(other.into()),
        }

        let join = NewMessage::status(name.clone(), JOIN_TEXT, display_time(now));
        if let Err(cause) = self.deps.messages.insert(join).await {
            error!(
                name = %name,
                error = %cause,
                "partial_failure: 参与者已写入，入场消息写入失败"
            );
            return Err(ApplicationError::PartialFailure {
                operation: "register",
                cause,
            });
        }

        info!(name = %name, "参与者注册成功");
        Ok(())
    }

    /// 心跳：刷新 `last_seen`。
    ///
    /// 通过命中行数区分"参与者不存在"与存储错误；被清理后的
    /// 名称不会被心跳隐式复活，需要重新注册。
    pub async fn heartbeat(&self, name: &str) -> Result<(), ApplicationError> {
        let name = ParticipantName::parse(name, "user")
            .map_err(|violation| ApplicationError::Validation(violation.into()))?;

        let matched = self
            .deps
            .participants
            .update_last_seen(&name, self.deps.clock.now())
            .await?;
        if matched == 0 {
            return Err(ApplicationError::ParticipantNotFound(name));
        }
        Ok(())
    }

    /// 按存储顺序返回全部参与者，顺序无语义。
    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        Ok(self.deps.participants.list().await?)
    }

    /// 消息服务用来校验作者身份，不产生任何写入。
    pub async fn exists(&self, name: &ParticipantName) -> Result<bool, ApplicationError> {
        Ok(self.deps.participants.find_by_name(name).await?.is_some())
    }
}
