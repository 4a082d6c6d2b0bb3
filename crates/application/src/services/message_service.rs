//! 消息发布、检索与作者权限
//!
//! 发布前通过注册表校验作者身份；检索按可见性过滤并从新到旧
//! 分页；编辑和删除只允许作者本人。

use std::sync::Arc;

use domain::{
    display_time, Message, MessageDraft, MessageId, MessageKind, MessageRepository, MessageUpdate,
    NewMessage, ParticipantName, Violation,
};

use crate::{clock::Clock, error::ApplicationError, services::ParticipantService};

#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub caller: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

pub struct MessageServiceDependencies {
    pub registry: Arc<ParticipantService>,
    pub messages: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发布消息，返回存储层分配的标识。
    ///
    /// 作者必须是当前注册的参与者；`time` 为写入时刻的秒级
    /// 展示字符串，不参与排序。
    pub async fn post(&self, request: PostMessageRequest) -> Result<MessageId, ApplicationError> {
        let draft = MessageDraft {
            from: request.from,
            to: request.to,
            text: request.text,
            kind: request.kind,
        };
        let valid = draft.validate().map_err(ApplicationError::Validation)?;

        if !self.deps.registry.exists(&valid.from).await? {
            return Err(ApplicationError::UnknownAuthor(valid.from));
        }

        let time = display_time(self.deps.clock.now());
        let id = self
            .deps
            .messages
            .insert(NewMessage {
                from: valid.from,
                to: valid.to,
                text: valid.text,
                kind: valid.kind,
                time,
            })
            .await?;
        Ok(id)
    }

    /// 对 `viewer` 可见的消息，按插入序列从新到旧。
    ///
    /// `limit` 必须为正数，缺省表示不限制；截断发生在最新的
    /// 一端。
    pub async fn list(
        &self,
        viewer: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let viewer = ParticipantName::parse(viewer, "user")
            .map_err(|violation| ApplicationError::Validation(violation.into()))?;

        if let Some(limit) = limit {
            if limit <= 0 {
                return Err(ApplicationError::Validation(
                    Violation::new("limit", "必须是正整数").into(),
                ));
            }
        }

        Ok(self.deps.messages.find_visible(&viewer, limit).await?)
    }

    /// 删除消息，只有作者本人允许。
    pub async fn remove(&self, id: MessageId, caller: &str) -> Result<(), ApplicationError> {
        let caller = ParticipantName::parse(caller, "user")
            .map_err(|violation| ApplicationError::Validation(violation.into()))?;

        let message = self
            .deps
            .messages
            .find_by_id(id)
            .await?
            .ok_or(ApplicationError::MessageNotFound)?;
        if !message.is_owned_by(&caller) {
            return Err(ApplicationError::NotMessageOwner);
        }

        self.deps.messages.delete(id).await?;
        Ok(())
    }

    /// 编辑消息的可变字段。
    ///
    /// 以调用者身份重新校验全部字段（作者不可转移），调用者
    /// 必须仍是注册参与者；只替换 `to`/`text`/`kind`，写入
    /// 时间保持原样。
    pub async fn edit(
        &self,
        id: MessageId,
        request: EditMessageRequest,
    ) -> Result<(), ApplicationError> {
        let draft = MessageDraft {
            from: request.caller,
            to: request.to,
            text: request.text,
            kind: request.kind,
        };
        let valid = draft.validate().map_err(ApplicationError::Validation)?;

        if !self.deps.registry.exists(&valid.from).await? {
            return Err(ApplicationError::UnknownAuthor(valid.from));
        }

        let message = self
            .deps
            .messages
            .find_by_id(id)
            .await?
            .ok_or(ApplicationError::MessageNotFound)?;
        if !message.is_owned_by(&valid.from) {
            return Err(ApplicationError::NotMessageOwner);
        }

        self.deps
            .messages
            .update(
                id,
                MessageUpdate {
                    to: valid.to,
                    text: valid.text,
                    kind: valid.kind,
                },
            )
            .await?;
        Ok(())
    }
}
