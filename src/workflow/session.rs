//! 门户自动化会话 - 流程层
//!
//! 核心职责：定义"一次门户查询"的完整步骤
//!
//! 状态顺序：
//! ```text
//! Init → NavigatingPortal → AwaitingFormReady → FillingFields → Submitting
//!      → AwaitingNavigationResult → ExtractingContent → Closed
//! ```
//! 任何中间状态失败都进入 `Failed`，随后总是进入 `Closed`。
//! 每一步依赖上一步在页面上的效果，严格顺序执行；
//! 每个依赖远程门户的等待都有独立的超时。
//!
//! 提交前给首页文档打标记，点击与等待导航同时发起；标记消失才算进入结果页，
//! 避免在回传尚未开始时把首页当成结果页读取。

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::browser::PortalPage;
use crate::error::AutomationError;
use crate::models::NAME_UNAVAILABLE;
use crate::utils::logging::truncate_text;
use crate::workflow::locator::{FieldRole, Locator};
use crate::workflow::session_ctx::SessionCtx;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    NavigatingPortal,
    AwaitingFormReady,
    FillingFields,
    Submitting,
    AwaitingNavigationResult,
    ExtractingContent,
    Failed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Init => "Init",
            SessionState::NavigatingPortal => "NavigatingPortal",
            SessionState::AwaitingFormReady => "AwaitingFormReady",
            SessionState::FillingFields => "FillingFields",
            SessionState::Submitting => "Submitting",
            SessionState::AwaitingNavigationResult => "AwaitingNavigationResult",
            SessionState::ExtractingContent => "ExtractingContent",
            SessionState::Failed => "Failed",
            SessionState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// 各步骤的超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// 打开门户首页
    pub navigation: Duration,
    /// 等待表单出现；填写和点击也使用该上限
    pub form_ready: Duration,
    /// 点击后等待结果页
    pub result: Duration,
    /// 读取结果页内容
    pub extraction: Duration,
    /// 轮询表单是否就绪的间隔
    pub poll_interval: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            form_ready: Duration::from_secs(15),
            result: Duration::from_secs(30),
            extraction: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// 从结果页提取的原始内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtraction {
    /// 结果页完整 HTML
    pub content: String,
    /// 姓名，找不到时为占位值
    pub name: String,
}

/// 门户自动化会话
///
/// - 只处理一个 CUIT
/// - 不持有浏览器，页面由调用方借给 `run`
/// - 不做分类，只产出原始内容
pub struct AutomationSession {
    ctx: SessionCtx,
    locator: Locator,
    timeouts: SessionTimeouts,
    portal_url: String,
    state: SessionState,
    history: Vec<SessionState>,
}

impl AutomationSession {
    pub fn new(
        ctx: SessionCtx,
        locator: Locator,
        timeouts: SessionTimeouts,
        portal_url: impl Into<String>,
    ) -> Self {
        Self {
            ctx,
            locator,
            timeouts,
            portal_url: portal_url.into(),
            state: SessionState::Init,
            history: vec![SessionState::Init],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 经历过的所有状态
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// 执行完整会话，结束时状态总是 `Closed`
    pub async fn run<P: PortalPage>(&mut self, page: &P) -> Result<RawExtraction, AutomationError> {
        info!("{} 🔍 开始查询门户", self.ctx);

        let outcome = self.drive(page).await;
        match &outcome {
            Ok(_) => info!("{} ✓ 结果页读取完成", self.ctx),
            Err(e) => {
                warn!("{} ❌ 会话失败: {}", self.ctx, e);
                self.transition(SessionState::Failed);
            }
        }
        self.transition(SessionState::Closed);

        outcome
    }

    async fn drive<P: PortalPage>(&mut self, page: &P) -> Result<RawExtraction, AutomationError> {
        // ========== 打开门户 ==========
        self.transition(SessionState::NavigatingPortal);
        self.bounded(self.timeouts.navigation, page.goto(&self.portal_url))
            .await?;

        // ========== 等待表单 ==========
        self.transition(SessionState::AwaitingFormReady);
        self.bounded(self.timeouts.form_ready, self.wait_form_ready(page))
            .await?;

        // ========== 填写 CUIT 三段 ==========
        self.transition(SessionState::FillingFields);
        let (prefix, document, check_digit) = self.ctx.cuit.form_parts();
        for (role, value) in [
            (FieldRole::CuitPrefix, prefix),
            (FieldRole::CuitDocument, document),
            (FieldRole::CuitCheckDigit, check_digit),
        ] {
            debug!("{} 填写 {:?} = {}", self.ctx, role, value);
            self.bounded(
                self.timeouts.form_ready,
                page.type_into(self.locator.selector(role), &value),
            )
            .await?;
        }

        // ========== 提交 ==========
        self.transition(SessionState::Submitting);
        self.bounded(self.timeouts.form_ready, page.tag_document())
            .await?;

        self.transition(SessionState::AwaitingNavigationResult);
        self.bounded(self.timeouts.result, self.submit_and_settle(page))
            .await?;

        // ========== 读取结果 ==========
        self.transition(SessionState::ExtractingContent);
        let content = self.read_content(page).await?;
        let name = self.read_name(page).await;

        Ok(RawExtraction { content, name })
    }

    /// 轮询直到三个输入框都存在
    async fn wait_form_ready<P: PortalPage>(&self, page: &P) -> anyhow::Result<()> {
        loop {
            let mut ready = true;
            for role in FieldRole::FORM_FIELDS {
                if !page.exists(self.locator.selector(role)).await? {
                    debug!("{} 输入框 {:?} 尚未出现", self.ctx, role);
                    ready = false;
                    break;
                }
            }
            if ready {
                return Ok(());
            }
            sleep(self.timeouts.poll_interval).await;
        }
    }

    /// 点击提交并同时等待导航，然后轮询直到打过标记的首页被结果页替换
    async fn submit_and_settle<P: PortalPage>(&self, page: &P) -> anyhow::Result<()> {
        let button = self.locator.selector(FieldRole::VerifyButton);
        tokio::try_join!(page.wait_for_navigation(), page.click(button))?;

        loop {
            match page.document_tagged().await {
                Ok(false) => return Ok(()),
                Ok(true) => debug!("{} 结果页尚未加载", self.ctx),
                // 跳转过程中执行上下文可能已被销毁
                Err(e) => debug!("{} 检查结果页失败: {:#}", self.ctx, e),
            }
            sleep(self.timeouts.poll_interval).await;
        }
    }

    async fn read_content<P: PortalPage>(&self, page: &P) -> Result<String, AutomationError> {
        let content = match timeout(self.timeouts.extraction, page.content()).await {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => return Err(AutomationError::ExtractionFailed(format!("{:#}", e))),
            Err(_) => {
                return Err(AutomationError::ExtractionFailed(format!(
                    "读取超时 ({} ms)",
                    self.timeouts.extraction.as_millis()
                )))
            }
        };

        if content.trim().is_empty() {
            return Err(AutomationError::ExtractionFailed("结果页为空".to_string()));
        }

        debug!("{} 结果页预览: {}", self.ctx, truncate_text(&content, 200));
        Ok(content)
    }

    /// 姓名读取失败不影响结果
    async fn read_name<P: PortalPage>(&self, page: &P) -> String {
        let selector = self.locator.selector(FieldRole::HolderName);
        match timeout(self.timeouts.extraction, page.inner_text(selector)).await {
            Ok(Ok(Some(name))) if !name.trim().is_empty() => name.trim().to_string(),
            Ok(Ok(_)) => {
                debug!("{} 未找到姓名 ({})", self.ctx, selector);
                NAME_UNAVAILABLE.to_string()
            }
            Ok(Err(e)) => {
                debug!("{} 读取姓名失败: {}", self.ctx, e);
                NAME_UNAVAILABLE.to_string()
            }
            Err(_) => {
                debug!("{} 读取姓名超时", self.ctx);
                NAME_UNAVAILABLE.to_string()
            }
        }
    }

    /// 带超时执行一个远程步骤，超时或出错都映射为门户不可用
    async fn bounded<T>(
        &self,
        limit: Duration,
        step: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, AutomationError> {
        match timeout(limit, step).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.remote_unavailable(format!("{:#}", e))),
            Err(_) => Err(self.remote_unavailable(format!("超时 ({} ms)", limit.as_millis()))),
        }
    }

    fn remote_unavailable(&self, cause: String) -> AutomationError {
        AutomationError::RemoteUnavailable {
            state: self.state,
            cause,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("{} 状态: {} → {}", self.ctx, self.state, next);
        self.state = next;
        self.history.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeLauncher, PortalScript};
    use crate::browser::{BrowserLauncher, PortalBrowser};
    use crate::models::TaxIdentifier;

    fn fast_timeouts() -> SessionTimeouts {
        SessionTimeouts {
            navigation: Duration::from_millis(50),
            form_ready: Duration::from_millis(50),
            result: Duration::from_millis(50),
            extraction: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn session(timeouts: SessionTimeouts) -> AutomationSession {
        let cuit = TaxIdentifier::parse("20123456786").unwrap();
        AutomationSession::new(
            SessionCtx::new(1, 1, cuit),
            Locator::default(),
            timeouts,
            "https://portal.test/censite/index.aspx",
        )
    }

    async fn run_with_timeouts(
        launcher: &FakeLauncher,
        timeouts: SessionTimeouts,
    ) -> (AutomationSession, Result<RawExtraction, AutomationError>) {
        let mut browser = launcher.launch().await.unwrap();
        let page = browser.new_page().await.unwrap();
        let mut session = session(timeouts);
        let result = session.run(&page).await;
        (session, result)
    }

    async fn run_with(launcher: &FakeLauncher) -> (AutomationSession, Result<RawExtraction, AutomationError>) {
        run_with_timeouts(launcher, fast_timeouts()).await
    }

    #[tokio::test]
    async fn test_happy_path_visits_every_state() {
        let launcher = FakeLauncher::new(PortalScript::eligible());
        let (session, result) = run_with(&launcher).await;

        let raw = result.unwrap();
        assert_eq!(raw.name, "PEREZ JUAN");
        assert!(raw.content.contains("Es posible emitir"));
        assert_eq!(
            session.history(),
            &[
                SessionState::Init,
                SessionState::NavigatingPortal,
                SessionState::AwaitingFormReady,
                SessionState::FillingFields,
                SessionState::Submitting,
                SessionState::AwaitingNavigationResult,
                SessionState::ExtractingContent,
                SessionState::Closed,
            ]
        );

        let locator = Locator::default();
        assert_eq!(
            launcher.typed(),
            vec![
                (locator.cuit_prefix.clone(), "20".to_string()),
                (locator.cuit_document.clone(), "12345678".to_string()),
                (locator.cuit_check_digit.clone(), "6".to_string()),
            ]
        );
        assert_eq!(launcher.clicks(), vec![locator.verify_button]);
    }

    #[tokio::test]
    async fn test_form_never_ready_is_remote_unavailable() {
        let mut script = PortalScript::eligible();
        script.form_ready = false;
        let launcher = FakeLauncher::new(script);
        let (session, result) = run_with(&launcher).await;

        assert!(matches!(
            result,
            Err(AutomationError::RemoteUnavailable {
                state: SessionState::AwaitingFormReady,
                ..
            })
        ));
        assert!(launcher.typed().is_empty());
        assert_eq!(
            &session.history()[session.history().len() - 2..],
            &[SessionState::Failed, SessionState::Closed]
        );
    }

    #[tokio::test]
    async fn test_navigation_hang_times_out() {
        let mut script = PortalScript::eligible();
        script.navigation_hangs_for = 1;
        let launcher = FakeLauncher::new(script);
        let (session, result) = run_with(&launcher).await;

        match result {
            Err(AutomationError::RemoteUnavailable { state, cause }) => {
                assert_eq!(state, SessionState::AwaitingNavigationResult);
                assert!(cause.contains("50 ms"), "{}", cause);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_waits_for_postback_that_starts_after_click() {
        let mut script = PortalScript::eligible();
        script.postback = Some(Duration::from_millis(30));
        let launcher = FakeLauncher::new(script);
        let timeouts = SessionTimeouts {
            result: Duration::from_secs(2),
            ..fast_timeouts()
        };
        let (_, result) = run_with_timeouts(&launcher, timeouts).await;

        let raw = result.unwrap();
        assert!(raw.content.contains("Es posible emitir"), "{}", raw.content);
        assert!(!raw.content.contains("txtCuitPre"));
        assert_eq!(raw.name, "PEREZ JUAN");
    }

    #[tokio::test]
    async fn test_click_without_postback_never_reads_landing_form() {
        let mut script = PortalScript::eligible();
        script.postback = None;
        let launcher = FakeLauncher::new(script);
        let (session, result) = run_with(&launcher).await;

        assert!(matches!(
            result,
            Err(AutomationError::RemoteUnavailable {
                state: SessionState::AwaitingNavigationResult,
                ..
            })
        ));
        assert_eq!(launcher.clicks().len(), 1);
        assert!(!session.history().contains(&SessionState::ExtractingContent));
    }

    #[tokio::test]
    async fn test_unreachable_portal() {
        let mut script = PortalScript::eligible();
        script.goto_fails = true;
        let launcher = FakeLauncher::new(script);
        let (_, result) = run_with(&launcher).await;

        match result {
            Err(AutomationError::RemoteUnavailable { state, cause }) => {
                assert_eq!(state, SessionState::NavigatingPortal);
                assert!(cause.contains("ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreadable_content_is_extraction_failure() {
        let mut script = PortalScript::eligible();
        script.content = None;
        let launcher = FakeLauncher::new(script);
        let (_, result) = run_with(&launcher).await;
        assert!(matches!(result, Err(AutomationError::ExtractionFailed(_))));

        let launcher = FakeLauncher::new(PortalScript::with_content("   "));
        let (_, result) = run_with(&launcher).await;
        assert!(matches!(result, Err(AutomationError::ExtractionFailed(_))));
    }

    #[tokio::test]
    async fn test_missing_name_uses_placeholder() {
        let mut script = PortalScript::eligible();
        script.name = None;
        let launcher = FakeLauncher::new(script);
        let (_, result) = run_with(&launcher).await;
        assert_eq!(result.unwrap().name, NAME_UNAVAILABLE);
    }
}
