//! 核验编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **计算 CUIT**：在任何网络交互之前完成 DNI 校验
//! 2. **资源管理**：每次尝试启动一个独占的浏览器，结束时无论成功失败都释放
//! 3. **并发控制**：使用 Semaphore 限制同时运行的浏览器数量
//! 4. **重试**：门户不可用时按指数退避重试
//! 5. **分类**：把会话产出的原始内容交给分类服务

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::browser::{BrowserGuard, BrowserLauncher, PortalBrowser};
use crate::config::Config;
use crate::error::{AppResult, AutomationError};
use crate::models::{Gender, VerificationRequest, VerificationResult};
use crate::services::classifier;
use crate::workflow::{AutomationSession, Locator, RawExtraction, SessionCtx, SessionTimeouts};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// 第 `attempt` 次失败后的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// 核验编排器
pub struct VerificationOrchestrator<L: BrowserLauncher> {
    launcher: L,
    locator: Locator,
    timeouts: SessionTimeouts,
    portal_url: String,
    retry: RetryPolicy,
    permits: Semaphore,
    next_session_id: AtomicU64,
}

impl<L: BrowserLauncher> VerificationOrchestrator<L> {
    pub fn new(launcher: L, config: &Config) -> Self {
        Self {
            launcher,
            locator: config.locator.clone(),
            timeouts: config.session_timeouts(),
            portal_url: config.portal_url.clone(),
            retry: RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                base_backoff: Duration::from_millis(config.retry_backoff_ms),
            },
            permits: Semaphore::new(config.max_concurrent_sessions.max(1)),
            next_session_id: AtomicU64::new(1),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// 从原始 DNI 开始的完整核验，DNI 无效时不会启动浏览器
    pub async fn verify_dni(&self, dni: &str, gender: Gender) -> AppResult<VerificationResult> {
        let request = VerificationRequest::new(dni, gender)?;
        self.verify(&request).await
    }

    /// 核验一个已计算好 CUIT 的请求
    pub async fn verify(&self, request: &VerificationRequest) -> AppResult<VerificationResult> {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let mut attempt = 1;

        loop {
            let ctx = SessionCtx::new(session_id, attempt, request.cuit.clone());

            match self.run_once(ctx.clone()).await {
                Ok(raw) => {
                    let result = classifier::classify(&raw.content, &raw.name);
                    info!(
                        "{} ✅ 核验完成: 可开具={} 原因数={}",
                        ctx,
                        result.eligible,
                        result.reasons.len()
                    );
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "{} ⚠️ 门户不可用，{} ms 后重试 ({}/{}): {}",
                        ctx,
                        delay.as_millis(),
                        attempt,
                        self.retry.max_attempts,
                        e
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("{} ❌ 核验失败: {}", ctx, e);
                    return Err(e.into());
                }
            }
        }
    }

    /// 一次尝试：启动浏览器 → 运行会话 → 释放浏览器
    async fn run_once(&self, ctx: SessionCtx) -> Result<RawExtraction, AutomationError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AutomationError::BrowserLaunch(e.to_string()))?;

        let browser = match timeout(self.timeouts.navigation, self.launcher.launch()).await {
            Ok(Ok(browser)) => browser,
            Ok(Err(e)) => return Err(AutomationError::BrowserLaunch(format!("{:#}", e))),
            Err(_) => return Err(AutomationError::BrowserLaunch("启动超时".to_string())),
        };
        let mut guard = BrowserGuard::new(browser);

        let outcome = async {
            let page = guard
                .browser_mut()
                .new_page()
                .await
                .map_err(|e| AutomationError::BrowserLaunch(format!("{:#}", e)))?;
            let mut session = AutomationSession::new(
                ctx,
                self.locator.clone(),
                self.timeouts,
                self.portal_url.clone(),
            );
            session.run(&page).await
        }
        .await;

        guard.release().await;
        outcome
    }
}
