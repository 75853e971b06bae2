use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::workflow::SessionState;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验错误（DNI / CUIT 格式）
    #[error("参数校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 校验位无法确定
    #[error("校验位计算失败: {0}")]
    Checksum(#[from] ChecksumError),
    /// 自动化会话错误
    #[error("自动化会话失败: {0}")]
    Automation(#[from] AutomationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 输入校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// DNI 长度不是 8 位
    #[error("DNI 必须恰好 8 位数字 (实际长度: {len})")]
    DniLength { len: usize },
    /// DNI 含有非数字字符
    #[error("DNI 只能包含数字: {value}")]
    DniNotNumeric { value: String },
    /// CUIT 格式错误
    #[error("CUIT 格式错误: {value}")]
    MalformedCuit { value: String },
    /// CUIT 前缀不在允许的集合中
    #[error("CUIT 前缀 {prefix} 不在允许的集合中")]
    UnknownPrefix { prefix: u8 },
    /// CUIT 校验位不匹配
    #[error("CUIT {value} 的校验位错误 (期望 {expected})")]
    CheckDigitMismatch { value: String, expected: u8 },
    /// 请求体或查询参数无法解析
    #[error("请求格式错误: {reason}")]
    MalformedRequest { reason: String },
}

/// 校验位错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    /// 所有候选前缀都只能得到 10，无法得到一位校验位
    #[error("DNI {dni} 的所有候选前缀 {candidates:?} 均无法得到有效校验位")]
    Unresolved { dni: String, candidates: Vec<u8> },
}

/// 自动化会话错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomationError {
    /// 浏览器启动或创建页面失败
    #[error("浏览器启动失败: {0}")]
    BrowserLaunch(String),
    /// 远程门户超时或不可达
    #[error("远程门户不可用 (阶段: {state}): {cause}")]
    RemoteUnavailable { state: SessionState, cause: String },
    /// 结果页面无法读取
    #[error("结果页面内容提取失败: {0}")]
    ExtractionFailed(String),
}

impl AutomationError {
    /// 是否值得重试（门户抖动是最常见的失败原因）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutomationError::BrowserLaunch(_) | AutomationError::RemoteUnavailable { .. }
        )
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl AppError {
    /// HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Checksum(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Automation(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给调用方的错误描述
    ///
    /// 自动化错误的底层原因只写入日志，不透传给调用方。
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(ValidationError::DniLength { .. })
            | AppError::Validation(ValidationError::DniNotNumeric { .. }) => {
                "El DNI debe contener exactamente 8 dígitos".to_string()
            }
            AppError::Validation(ValidationError::MalformedRequest { .. }) => {
                "Solicitud inválida: se requieren dni y gender".to_string()
            }
            AppError::Validation(_) => "El CUIT informado no es válido".to_string(),
            AppError::Checksum(_) => {
                "No se pudo determinar el dígito verificador del CUIT".to_string()
            }
            AppError::Automation(_) | AppError::Config(_) => {
                "Error al procesar en ANSES".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("❌ 请求处理失败: {}", self);
        } else {
            warn!("⚠️ 请求被拒绝: {}", self);
        }
        let body = json!({
            "ok": false,
            "error": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
