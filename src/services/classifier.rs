//! 结果分类服务 - 业务能力层
//!
//! 把门户结果页的原始 HTML 转换为结构化的 [`VerificationResult`]

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::models::{VerificationResult, NAME_UNAVAILABLE};

/// 门户表示"可以开具证明"的原文
pub const ELIGIBLE_MARKER: &str = "Es posible emitir la Certificación";

/// 不可开具但页面上没有任何红色提示时使用的原因
pub const FALLBACK_REASON: &str = "Registra movimientos en ANSES";

/// 门户用来显示错误/警告的节点
const ERROR_NODE_SELECTOR: &str = r#"span[style*="color:Red"], .rojo, font[color="Red"]"#;

/// 容忍页面中的多余空白和 &nbsp;，大小写必须一致（避免匹配 "No es posible ..."）
const ELIGIBLE_MARKER_PATTERN: &str =
    r"Es(?:\s|&nbsp;|\u{a0})+posible(?:\s|&nbsp;|\u{a0})+emitir(?:\s|&nbsp;|\u{a0})+la(?:\s|&nbsp;|\u{a0})+Certificaci(?:ó|&oacute;)n";

/// 长度不超过该值的文本视为噪音
const MIN_REASON_CHARS: usize = 5;

/// 对结果页进行分类
///
/// # 参数
/// - `raw_content`: 结果页完整 HTML
/// - `name`: 从页面提取的姓名，可能为空
pub fn classify(raw_content: &str, name: &str) -> VerificationResult {
    let name = match name.trim() {
        "" => NAME_UNAVAILABLE.to_string(),
        trimmed => trimmed.to_string(),
    };

    if contains_marker(raw_content) {
        debug!("结果页包含可开具标记");
        return VerificationResult::eligible(name);
    }

    let mut reasons = extract_reasons(raw_content);
    if reasons.is_empty() {
        debug!("结果页没有可用的错误提示，使用默认原因");
        reasons.push(FALLBACK_REASON.to_string());
    }

    VerificationResult::ineligible(name, reasons)
}

/// 检查页面是否包含可开具标记
fn contains_marker(raw_content: &str) -> bool {
    match Regex::new(ELIGIBLE_MARKER_PATTERN) {
        Ok(re) => re.is_match(raw_content),
        Err(e) => {
            warn!("标记正则无效，退回精确匹配: {}", e);
            raw_content.contains(ELIGIBLE_MARKER)
        }
    }
}

/// 提取红色错误提示，保持页面顺序，重复的提示原样保留
fn extract_reasons(raw_content: &str) -> Vec<String> {
    let selector = match Selector::parse(ERROR_NODE_SELECTOR) {
        Ok(selector) => selector,
        Err(e) => {
            warn!("错误节点选择器无效: {:?}", e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(raw_content);
    let mut reasons: Vec<String> = Vec::new();

    for element in document.select(&selector) {
        let text = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");

        if text.chars().count() > MIN_REASON_CHARS {
            reasons.push(text);
        }
    }

    reasons
}
