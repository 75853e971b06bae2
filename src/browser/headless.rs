//! chromiumoxide 实现的可控浏览器
//!
//! 每次 `launch` 启动一个独立的 Chromium 进程，使用独立的临时用户目录，
//! 会话之间不共享任何浏览器状态。

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Context, Result};
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::browser::driver::{BrowserLauncher, PortalBrowser, PortalPage};
use crate::config::Config;
use crate::infrastructure::JsExecutor;

/// 提交前写入旧文档的 window 属性名
const DOCUMENT_TAG: &str = "__censiteSubmitted";

/// Chromium 启动器
#[derive(Debug)]
pub struct ChromiumLauncher {
    chrome_executable: Option<PathBuf>,
    headless: bool,
    user_agent: String,
    launched: AtomicU64,
}

impl ChromiumLauncher {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.as_ref().map(PathBuf::from),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            launched: AtomicU64::new(0),
        }
    }

    fn profile_dir(&self) -> PathBuf {
        let n = self.launched.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("censite-verifier-{}-{}", std::process::id(), n))
    }
}

impl BrowserLauncher for ChromiumLauncher {
    type Browser = ChromiumBrowser;

    async fn launch(&self) -> Result<ChromiumBrowser> {
        info!("🚀 启动无头浏览器...");
        let profile_dir = self.profile_dir();
        debug!("浏览器用户目录: {}", profile_dir.display());

        let mut builder = BrowserConfig::builder();
        builder = if self.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .user_data_dir(&profile_dir)
            .args(vec![
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                format!("--user-agent={}", self.user_agent),
            ])
            .build()
            .map_err(|e| {
                error!("配置无头浏览器失败: {}", e);
                anyhow!("配置无头浏览器失败: {}", e)
            })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            anyhow!("启动无头浏览器失败: {}", e)
        })?;
        debug!("无头浏览器启动成功");

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(ChromiumBrowser {
            browser: Some(browser),
            handler_task,
            profile_dir,
        })
    }
}

/// 一个会话独占的 Chromium 进程
pub struct ChromiumBrowser {
    browser: Option<Browser>,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl PortalBrowser for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn new_page(&mut self) -> Result<ChromiumPage> {
        let browser = self.browser.as_ref().context("浏览器已关闭")?;
        let page = browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            anyhow!("创建页面失败: {}", e)
        })?;
        Ok(ChromiumPage {
            executor: JsExecutor::new(page),
        })
    }

    async fn close(&mut self) -> Result<()> {
        // 关闭完成前不交出 browser，取消后 kill 仍能结束进程
        if let Some(browser) = self.browser.as_mut() {
            browser.close().await.context("关闭浏览器失败")?;
            if let Err(e) = browser.wait().await {
                debug!("等待浏览器进程退出失败: {}", e);
            }
        }
        self.browser = None;
        self.handler_task.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            debug!("清理浏览器用户目录失败: {}", e);
        }
        Ok(())
    }

    fn kill(&mut self) {
        // Browser 的子进程在 drop 时被结束
        self.browser.take();
        self.handler_task.abort();
        let _ = std::fs::remove_dir_all(&self.profile_dir);
    }
}

/// Chromium 页面
pub struct ChromiumPage {
    executor: JsExecutor,
}

impl PortalPage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.executor
            .page()
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        debug!("已导航到: {}", url);
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        self.executor.element_exists(selector).await
    }

    async fn type_into(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .executor
            .page()
            .find_element(selector)
            .await
            .with_context(|| format!("找不到输入框 {}", selector))?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.executor
            .page()
            .find_element(selector)
            .await
            .with_context(|| format!("找不到按钮 {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        self.executor.page().wait_for_navigation().await?;
        Ok(())
    }

    async fn tag_document(&self) -> Result<()> {
        self.executor.set_window_flag(DOCUMENT_TAG).await
    }

    async fn document_tagged(&self) -> Result<bool> {
        self.executor.window_flag(DOCUMENT_TAG).await
    }

    async fn content(&self) -> Result<String> {
        Ok(self.executor.page().content().await?)
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        let text = self.executor.element_text(selector).await?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}
