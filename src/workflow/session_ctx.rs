//! 会话上下文
//!
//! 封装"这是第几个会话、第几次尝试、在查哪个 CUIT"这一信息，
//! 在会话的每一步之间显式传递。

use std::fmt::Display;

use crate::models::TaxIdentifier;

/// 会话上下文
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 会话编号（仅用于日志）
    pub session_id: u64,

    /// 当前尝试次数（从1开始）
    pub attempt: u32,

    /// 正在核验的 CUIT
    pub cuit: TaxIdentifier,
}

impl SessionCtx {
    pub fn new(session_id: u64, attempt: u32, cuit: TaxIdentifier) -> Self {
        Self {
            session_id,
            attempt,
            cuit,
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 #{} 尝试#{} CUIT#{}]",
            self.session_id, self.attempt, self.cuit
        )
    }
}
