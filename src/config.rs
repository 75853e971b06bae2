use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::workflow::{Locator, SessionTimeouts};

/// 程序配置
///
/// 加载顺序：默认值 → `CONFIG_FILE` 指向的 TOML 文件 → 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 监听端口
    pub port: u16,
    /// 门户首页
    pub portal_url: String,
    /// 浏览器 User-Agent，门户会拒绝明显的自动化流量
    pub user_agent: String,
    /// Chrome 可执行文件，缺省时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    /// 是否无头运行
    pub headless: bool,
    // --- 会话超时（毫秒） ---
    pub navigation_timeout_ms: u64,
    pub form_ready_timeout_ms: u64,
    pub result_timeout_ms: u64,
    pub extraction_timeout_ms: u64,
    pub poll_interval_ms: u64,
    // --- 重试 ---
    /// 每个请求最多尝试的会话次数（含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待，之后每次翻倍
    pub retry_backoff_ms: u64,
    /// 同时运行的浏览器数量上限
    pub max_concurrent_sessions: usize,
    /// 门户元素选择器
    pub locator: Locator,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            portal_url: "https://servicioswww.anses.gob.ar/censite/index.aspx".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
            chrome_executable: None,
            headless: true,
            navigation_timeout_ms: 30_000,
            form_ready_timeout_ms: 15_000,
            result_timeout_ms: 30_000,
            extraction_timeout_ms: 10_000,
            poll_interval_ms: 250,
            max_attempts: 2,
            retry_backoff_ms: 1_000,
            max_concurrent_sessions: 4,
            locator: Locator::default(),
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件，未出现的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 完整加载：配置文件（如有）再叠加环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(path.trim())?,
            _ => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            port: env_parse("PORT")?.unwrap_or(self.port),
            portal_url: std::env::var("PORTAL_URL").unwrap_or(self.portal_url),
            user_agent: std::env::var("PORTAL_USER_AGENT").unwrap_or(self.user_agent),
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            headless: env_parse("BROWSER_HEADLESS")?.unwrap_or(self.headless),
            navigation_timeout_ms: env_parse("NAVIGATION_TIMEOUT_MS")?
                .unwrap_or(self.navigation_timeout_ms),
            form_ready_timeout_ms: env_parse("FORM_READY_TIMEOUT_MS")?
                .unwrap_or(self.form_ready_timeout_ms),
            result_timeout_ms: env_parse("RESULT_TIMEOUT_MS")?.unwrap_or(self.result_timeout_ms),
            extraction_timeout_ms: env_parse("EXTRACTION_TIMEOUT_MS")?
                .unwrap_or(self.extraction_timeout_ms),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS")?.unwrap_or(self.poll_interval_ms),
            max_attempts: env_parse("MAX_ATTEMPTS")?.unwrap_or(self.max_attempts),
            retry_backoff_ms: env_parse("RETRY_BACKOFF_MS")?.unwrap_or(self.retry_backoff_ms),
            max_concurrent_sessions: env_parse("MAX_CONCURRENT_SESSIONS")?
                .unwrap_or(self.max_concurrent_sessions),
            locator: self.locator,
        })
    }

    /// 会话各步骤的超时
    pub fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            navigation: Duration::from_millis(self.navigation_timeout_ms),
            form_ready: Duration::from_millis(self.form_ready_timeout_ms),
            result: Duration::from_millis(self.result_timeout_ms),
            extraction: Duration::from_millis(self.extraction_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// 读取并解析环境变量；未设置时返回 `None`，无法解析时报错
fn env_parse<T: FromStr>(var_name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        Err(_) => Ok(None),
    }
}
