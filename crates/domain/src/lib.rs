//! 聊天室核心领域模型
//!
//! 包含参与者、消息两个实体，以及校验、净化和仓储抽象。

pub mod errors;
pub mod message;
pub mod participant;
pub mod repository;
pub mod sanitize;
pub mod validation;
pub mod value_objects;

pub use errors::{RepositoryError, RepositoryResult};
pub use message::{Message, MessageDraft, MessageUpdate, NewMessage, ValidDraft};
pub use participant::Participant;
pub use repository::{MessageRepository, ParticipantRepository};
pub use sanitize::sanitize;
pub use validation::{Violation, Violations};
pub use value_objects::{display_time, MessageId, MessageKind, ParticipantName, Timestamp, BROADCAST};
