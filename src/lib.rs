//! # CENSITE Verifier
//!
//! 根据 DNI 和性别计算 CUIT，并自动查询 ANSES CENSITE 门户，
//! 判断能否开具"Certificación Negativa"（无医保登记证明）。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure / Browser）
//! - `browser/` - 可控浏览器能力（trait）及 chromiumoxide 实现
//! - `infrastructure/` - `JsExecutor`，唯一的 page owner，提供 eval() 与元素查询
//!
//! ### ② 业务能力层（Services）
//! - `services::checksum` - CUIT 校验位计算（纯函数）
//! - `services::classifier` - 结果页分类（纯函数）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次门户查询的状态机
//! - `SessionCtx` - 上下文封装（会话编号 + 尝试次数 + CUIT）
//! - `Locator` - 门户元素定位
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 计算 CUIT、运行会话、分类、保证释放浏览器
//!
//! ### ⑤ 接口层（Server）
//! - `server/` - axum 路由，`POST /api/consultar`

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{BrowserLauncher, ChromiumLauncher, PortalBrowser, PortalPage};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Gender, NationalId, TaxIdentifier, VerificationRequest, VerificationResult};
pub use orchestrator::VerificationOrchestrator;
pub use server::{router, serve, AppState};
pub use services::checksum::compute;
pub use services::classifier::classify;
pub use workflow::{AutomationSession, SessionState};
