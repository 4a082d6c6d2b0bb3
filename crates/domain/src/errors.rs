//! 领域模型错误定义

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// 记录不存在
    #[error("记录不存在")]
    NotFound,
    /// 唯一约束冲突
    #[error("唯一约束冲突")]
    Conflict,
    /// 底层存储失败
    #[error("存储错误: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 仓储层结果类型
pub type RepositoryResult<T> = Result<T, RepositoryError>;
