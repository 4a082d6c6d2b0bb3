//! 基础设施层。
//!
//! PostgreSQL 仓储实现：单条写入的原子性由数据库保证，
//! 参与者名称唯一性由表上的唯一约束兜底。

pub mod db;
pub mod repository;

pub use db::create_pg_pool;
pub use repository::{PgMessageRepository, PgParticipantRepository};
