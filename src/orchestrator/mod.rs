//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! server (HTTP 请求)
//!     ↓
//! orchestrator::VerificationOrchestrator (一个请求)
//!     ↓
//! workflow::AutomationSession (一次门户查询)
//!     ↓
//! browser (基础设施：可控浏览器)
//! ```
//!
//! 只有编排层持有浏览器实例；会话只借用页面。

pub mod verification;

pub use verification::{RetryPolicy, VerificationOrchestrator};
