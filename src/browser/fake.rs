//! 测试用的假浏览器，按脚本模拟门户的各种行为
//!
//! 与真实浏览器一样，`wait_for_navigation` 在页面未处于导航状态时立即返回；
//! 结果页只有在点击之后经过 `postback` 时长才会真正加载。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};

use crate::browser::driver::{BrowserLauncher, PortalBrowser, PortalPage};

/// 点击提交之前的门户首页
pub const FORM_PAGE: &str = r#"<html><body><form>
    <input name="ctl00$txtCuitPre"><input name="ctl00$txtCuitDoc"><input name="ctl00$txtCuitDV">
    <input type="submit" name="ctl00$btnVerificar" value="Verificar">
</form></body></html>"#;

/// 门户行为脚本
#[derive(Debug, Clone)]
pub struct PortalScript {
    pub fail_launch: bool,
    pub goto_fails: bool,
    pub form_ready: bool,
    /// 前 N 次尝试在等待导航时挂起
    pub navigation_hangs_for: usize,
    /// 点击后多久加载结果页，`None` 表示点击没有引起跳转
    pub postback: Option<Duration>,
    /// 关闭浏览器永远不返回
    pub close_hangs: bool,
    /// 结果页内容，`None` 表示读取内容失败
    pub content: Option<String>,
    pub name: Option<String>,
}

impl PortalScript {
    pub fn eligible() -> Self {
        Self::with_content(
            "<html><body><span>Es posible emitir la Certificación Negativa</span></body></html>",
        )
    }

    pub fn with_content(content: &str) -> Self {
        Self {
            fail_launch: false,
            goto_fails: false,
            form_ready: true,
            navigation_hangs_for: 0,
            postback: Some(Duration::ZERO),
            close_hangs: false,
            content: Some(content.to_string()),
            name: Some("PEREZ JUAN".to_string()),
        }
    }
}

#[derive(Default)]
struct Counters {
    launches: AtomicUsize,
    releases: AtomicUsize,
    kills: AtomicUsize,
    typed: Mutex<Vec<(String, String)>>,
    clicks: Mutex<Vec<String>>,
}

pub struct FakeLauncher {
    script: PortalScript,
    counters: Arc<Counters>,
}

impl FakeLauncher {
    pub fn new(script: PortalScript) -> Self {
        Self {
            script,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn launches(&self) -> usize {
        self.counters.launches.load(Ordering::SeqCst)
    }

    /// 被释放（正常关闭或强制结束）的浏览器数量
    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.counters.kills.load(Ordering::SeqCst)
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.counters.typed.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.counters.clicks.lock().unwrap().clone()
    }
}

impl BrowserLauncher for FakeLauncher {
    type Browser = FakeBrowser;

    async fn launch(&self) -> Result<FakeBrowser> {
        let attempt = self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_launch {
            bail!("无法启动浏览器进程");
        }
        Ok(FakeBrowser {
            script: self.script.clone(),
            hang: attempt < self.script.navigation_hangs_for,
            counters: self.counters.clone(),
            released: false,
        })
    }
}

pub struct FakeBrowser {
    script: PortalScript,
    hang: bool,
    counters: Arc<Counters>,
    released: bool,
}

impl FakeBrowser {
    fn mark_released(&mut self) {
        if !self.released {
            self.released = true;
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl PortalBrowser for FakeBrowser {
    type Page = FakePage;

    async fn new_page(&mut self) -> Result<FakePage> {
        Ok(FakePage {
            script: self.script.clone(),
            hang: self.hang,
            counters: self.counters.clone(),
            clicked_at: Mutex::new(None),
            tagged: AtomicBool::new(false),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if self.script.close_hangs {
            std::future::pending::<()>().await;
        }
        self.mark_released();
        Ok(())
    }

    fn kill(&mut self) {
        self.counters.kills.fetch_add(1, Ordering::SeqCst);
        self.mark_released();
    }
}

pub struct FakePage {
    script: PortalScript,
    hang: bool,
    counters: Arc<Counters>,
    clicked_at: Mutex<Option<Instant>>,
    tagged: AtomicBool,
}

impl FakePage {
    /// 结果页是否已经加载
    fn result_loaded(&self) -> bool {
        match (*self.clicked_at.lock().unwrap(), self.script.postback) {
            (Some(clicked), Some(delay)) => clicked.elapsed() >= delay,
            _ => false,
        }
    }
}

impl PortalPage for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        if self.script.goto_fails {
            bail!("net::ERR_NAME_NOT_RESOLVED at {}", url);
        }
        Ok(())
    }

    async fn exists(&self, _selector: &str) -> Result<bool> {
        Ok(self.script.form_ready)
    }

    async fn type_into(&self, selector: &str, value: &str) -> Result<()> {
        self.counters
            .typed
            .lock()
            .unwrap()
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.counters.clicks.lock().unwrap().push(selector.to_string());
        *self.clicked_at.lock().unwrap() = Some(Instant::now());
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn tag_document(&self) -> Result<()> {
        self.tagged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn document_tagged(&self) -> Result<bool> {
        Ok(self.tagged.load(Ordering::SeqCst) && !self.result_loaded())
    }

    async fn content(&self) -> Result<String> {
        if !self.result_loaded() {
            return Ok(FORM_PAGE.to_string());
        }
        self.script
            .content
            .clone()
            .ok_or_else(|| anyhow!("Target closed"))
    }

    async fn inner_text(&self, _selector: &str) -> Result<Option<String>> {
        if !self.result_loaded() {
            return Ok(None);
        }
        Ok(self.script.name.clone())
    }
}
