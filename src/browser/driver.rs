//! 可控浏览器能力
//!
//! 会话流程只依赖这里的三个 trait，不直接依赖 chromiumoxide，
//! 测试中可以用假的实现替换真实浏览器。

use std::future::Future;

use anyhow::Result;

/// 单个页面能提供的操作，元素一律用 CSS 选择器寻址
pub trait PortalPage: Send + Sync {
    /// 导航到指定 URL 并等待加载完成
    fn goto(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// 页面中当前是否存在匹配的元素
    fn exists(&self, selector: &str) -> impl Future<Output = Result<bool>> + Send;

    /// 聚焦元素并逐字输入
    fn type_into(&self, selector: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// 点击元素
    fn click(&self, selector: &str) -> impl Future<Output = Result<()>> + Send;

    /// 等待当前导航完成；页面未在导航时可能立即返回
    fn wait_for_navigation(&self) -> impl Future<Output = Result<()>> + Send;

    /// 给当前文档打标记，新文档加载后标记消失
    fn tag_document(&self) -> impl Future<Output = Result<()>> + Send;

    /// 当前文档是否仍是打过标记的那一个
    fn document_tagged(&self) -> impl Future<Output = Result<bool>> + Send;

    /// 页面完整 HTML
    fn content(&self) -> impl Future<Output = Result<String>> + Send;

    /// 元素的可见文本，元素不存在时返回 `None`
    fn inner_text(&self, selector: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// 一个已启动的浏览器实例
pub trait PortalBrowser: Send {
    type Page: PortalPage;

    /// 打开一个空白页面
    fn new_page(&mut self) -> impl Future<Output = Result<Self::Page>> + Send;

    /// 正常关闭浏览器
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// 同步强制结束浏览器，用于 Drop 路径
    fn kill(&mut self);
}

/// 浏览器启动器，每次调用都得到一个独占的新实例
pub trait BrowserLauncher: Send + Sync + 'static {
    type Browser: PortalBrowser;

    fn launch(&self) -> impl Future<Output = Result<Self::Browser>> + Send;
}
