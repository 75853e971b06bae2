//! 请求提取
//!
//! axum 默认的拒绝响应是纯文本；这里统一转换为 `{ ok: false, error }`。

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::{AppError, ValidationError};

/// 解析 JSON 请求体，失败时转换为校验错误
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(value)| value).map_err(|err| {
        ValidationError::MalformedRequest {
            reason: err.body_text(),
        }
        .into()
    })
}

/// 解析查询参数，失败时转换为校验错误
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result.map(|Query(value)| value).map_err(|err| {
        ValidationError::MalformedRequest {
            reason: err.body_text(),
        }
        .into()
    })
}
