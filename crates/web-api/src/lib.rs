//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务。
//! 调用者身份来自 `User` 请求头（承载式显示名，核心范围内
//! 没有更强的认证）。

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
