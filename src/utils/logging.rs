/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - CENSITE 核验服务 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 门户地址: {}", config.portal_url);
    info!("📊 最大并发浏览器数: {}", config.max_concurrent_sessions);
    info!(
        "⏱️ 超时: 导航 {} ms / 表单 {} ms / 结果 {} ms",
        config.navigation_timeout_ms, config.form_ready_timeout_ms, config.result_timeout_ms
    );
    info!("🔁 最多尝试次数: {}", config.max_attempts);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
