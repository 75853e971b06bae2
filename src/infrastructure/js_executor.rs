//! JS 执行器 - 基础设施层
//!
//! 持有会话独占的 page，页面查询一律通过 JS 完成

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 只认识 CSS 选择器，不认识 CUIT 或门户字段
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 原生 page，用于导航、点击和输入
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let js_code = js_code.into();
        let result = self
            .page
            .evaluate(js_code.clone())
            .await
            .with_context(|| format!("执行 JS 失败: {}", js_code))?;
        Ok(result.into_value()?)
    }

    /// 执行并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let value = self.eval(js_code).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 页面中是否存在匹配选择器的元素
    pub async fn element_exists(&self, selector: &str) -> Result<bool> {
        let js = format!(
            "document.querySelector({}) !== null",
            js_string_literal(selector)?
        );
        self.eval_as(js).await
    }

    /// 在 window 上设置标记，页面跳转后随旧文档一起消失
    pub async fn set_window_flag(&self, flag: &str) -> Result<()> {
        let js = format!("window[{}] = true; true", js_string_literal(flag)?);
        self.eval(js).await?;
        Ok(())
    }

    pub async fn window_flag(&self, flag: &str) -> Result<bool> {
        let js = format!("window[{}] === true", js_string_literal(flag)?);
        self.eval_as(js).await
    }

    /// 元素的 innerText，元素不存在时为空串
    pub async fn element_text(&self, selector: &str) -> Result<String> {
        // null 无法反序列化为 String，所以在页面内兜底
        let js = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : ''; }})()",
            js_string_literal(selector)?
        );
        self.eval_as(js).await
    }
}

/// 把任意字符串转成安全的 JS 字符串字面量
pub fn js_string_literal(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
