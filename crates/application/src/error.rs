use domain::{ParticipantName, RepositoryError, Violations};
use thiserror::Error;

/// 应用层错误分类。
///
/// 领域错误在边界处映射为稳定的结果值；存储错误记入日志后
/// 以通用失败上浮，绝不静默吞掉。任何操作都不自动重试。
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 输入不合法，携带全部字段违规项
    #[error("校验失败: {0}")]
    Validation(Violations),

    /// 参与者名称已被占用
    #[error("名称已被占用: {0}")]
    NameTaken(ParticipantName),

    /// 参与者不存在（心跳目标或未注册调用者）
    #[error("参与者不存在: {0}")]
    ParticipantNotFound(ParticipantName),

    /// 消息不存在
    #[error("消息不存在")]
    MessageNotFound,

    /// 只有作者本人可以改动或删除消息
    #[error("不是消息作者")]
    NotMessageOwner,

    /// 发送方当前未注册
    #[error("发送者未注册: {0}")]
    UnknownAuthor(ParticipantName),

    /// 底层存储失败
    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    /// 多步操作中前一步已提交、后一步失败。
    /// 需要单独记录，便于运维核对遗留记录。
    #[error("部分失败: {operation}: {cause}")]
    PartialFailure {
        operation: &'static str,
        #[source]
        cause: RepositoryError,
    },
}

impl From<Violations> for ApplicationError {
    fn from(violations: Violations) -> Self {
        ApplicationError::Validation(violations)
    }
}
