use tracing::{debug, warn};

use crate::browser::driver::PortalBrowser;

/// 浏览器资源守卫
///
/// 正常路径调用 [`BrowserGuard::release`] 关闭浏览器；
/// 如果持有者的 future 被取消或提前返回，Drop 会强制结束浏览器。
/// 无论哪条路径，浏览器都只会被释放一次。
pub struct BrowserGuard<B: PortalBrowser> {
    browser: B,
    released: bool,
}

impl<B: PortalBrowser> BrowserGuard<B> {
    pub fn new(browser: B) -> Self {
        Self {
            browser,
            released: false,
        }
    }

    pub fn browser_mut(&mut self) -> &mut B {
        &mut self.browser
    }

    /// 关闭浏览器，关闭失败时强制结束
    ///
    /// `close` 返回之前守卫仍视为未释放：关闭过程中 future 被取消时，
    /// Drop 会接手强制结束。
    pub async fn release(mut self) {
        match self.browser.close().await {
            Ok(()) => debug!("浏览器已关闭"),
            Err(e) => {
                warn!("关闭浏览器失败，强制结束: {}", e);
                self.browser.kill();
            }
        }
        self.released = true;
    }
}

impl<B: PortalBrowser> Drop for BrowserGuard<B> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            warn!("⚠️ 会话未正常结束，强制结束浏览器");
            self.browser.kill();
        }
    }
}
