//! 应用层实现。
//!
//! 围绕领域模型的用例服务：参与者注册与心跳、消息的发布/检索/
//! 编辑/删除，以及周期性清理不活跃参与者的后台任务。
//! 时间通过 `Clock` 抽象注入，测试中无需真实等待。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod services;
pub mod sweeper;

mod sweeper_tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{MessageDto, ParticipantDto};
pub use error::ApplicationError;
pub use memory::{MemoryMessageRepository, MemoryParticipantRepository};
pub use services::{
    EditMessageRequest, MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, PostMessageRequest,
};
pub use sweeper::{PresenceSweeper, SweeperConfig, SweeperDependencies};
