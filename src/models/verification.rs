//! 核验请求与核验结果

use serde::Serialize;

use crate::error::AppResult;
use crate::models::cuit::{Gender, NationalId, TaxIdentifier};
use crate::services::checksum;

/// 无法读取姓名时使用的占位值
pub const NAME_UNAVAILABLE: &str = "Nombre no disponible";

/// 发送给门户表单的核验请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub cuit: TaxIdentifier,
    pub dni: NationalId,
    pub gender: Gender,
}

impl VerificationRequest {
    /// 校验 DNI 并计算 CUIT，在任何网络交互之前完成
    pub fn new(dni: &str, gender: Gender) -> AppResult<Self> {
        let dni = NationalId::parse(dni)?;
        let cuit = checksum::compute_for(&dni, gender)?;
        Ok(Self { cuit, dni, gender })
    }

    /// 表单三个字段：(前缀, DNI, 校验位)
    pub fn form_parts(&self) -> (String, String, String) {
        self.cuit.form_parts()
    }
}

/// 核验结果
///
/// 只表示分类完成的情况；失败由 [`crate::error::AppError`] 表示
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// 是否完成了分类
    pub ok: bool,
    /// 门户返回的姓名
    pub name: String,
    /// 是否可以开具证明
    pub eligible: bool,
    /// 不能开具时的原因，按页面顺序
    pub reasons: Vec<String>,
}

impl VerificationResult {
    pub fn eligible(name: impl Into<String>) -> Self {
        Self {
            ok: true,
            name: name.into(),
            eligible: true,
            reasons: Vec::new(),
        }
    }

    pub fn ineligible(name: impl Into<String>, reasons: Vec<String>) -> Self {
        Self {
            ok: true,
            name: name.into(),
            eligible: false,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ValidationError};

    #[test]
    fn test_request_computes_cuit() {
        let request = VerificationRequest::new("12345678", Gender::Male).unwrap();
        assert_eq!(request.cuit.to_string(), "20123456786");
        assert_eq!(
            request.form_parts(),
            ("20".to_string(), "12345678".to_string(), "6".to_string())
        );
    }

    #[test]
    fn test_request_rejects_short_dni() {
        let err = VerificationRequest::new("1234567", Gender::Female).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::DniLength { len: 7 })
        ));
    }

    #[test]
    fn test_result_serializes_without_error_field() {
        let value = serde_json::to_value(VerificationResult::ineligible(
            "GOMEZ ANA",
            vec!["Registra aportes".to_string()],
        ))
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ok": true,
                "name": "GOMEZ ANA",
                "eligible": false,
                "reasons": ["Registra aportes"],
            })
        );
    }
}
