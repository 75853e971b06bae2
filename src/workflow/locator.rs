//! 门户元素定位
//!
//! 门户页面由 ASP.NET 生成，控件的 name/id 带有会变化的容器前缀，
//! 所以统一按属性后缀匹配。门户改版时只需要修改这里（或配置文件中的 `[locator]`）。

use serde::Deserialize;

/// 门户页面上的逻辑角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// CUIT 前缀输入框
    CuitPrefix,
    /// CUIT 中间 DNI 输入框
    CuitDocument,
    /// CUIT 校验位输入框
    CuitCheckDigit,
    /// "Verificar" 按钮
    VerifyButton,
    /// 结果页上的姓名
    HolderName,
}

impl FieldRole {
    /// 表单就绪前必须存在的三个输入框
    pub const FORM_FIELDS: [FieldRole; 3] = [
        FieldRole::CuitPrefix,
        FieldRole::CuitDocument,
        FieldRole::CuitCheckDigit,
    ];
}

/// 角色到 CSS 选择器的映射
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Locator {
    pub cuit_prefix: String,
    pub cuit_document: String,
    pub cuit_check_digit: String,
    pub verify_button: String,
    pub holder_name: String,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            cuit_prefix: r#"[name$="txtCuitPre"]"#.to_string(),
            cuit_document: r#"[name$="txtCuitDoc"]"#.to_string(),
            cuit_check_digit: r#"[name$="txtCuitDV"]"#.to_string(),
            verify_button: r#"[name$="btnVerificar"]"#.to_string(),
            holder_name: r#"[id$="lblNombre"]"#.to_string(),
        }
    }
}

impl Locator {
    pub fn selector(&self, role: FieldRole) -> &str {
        match role {
            FieldRole::CuitPrefix => &self.cuit_prefix,
            FieldRole::CuitDocument => &self.cuit_document,
            FieldRole::CuitCheckDigit => &self.cuit_check_digit,
            FieldRole::VerifyButton => &self.verify_button,
            FieldRole::HolderName => &self.holder_name,
        }
    }
}
