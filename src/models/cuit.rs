//! DNI / 性别 / CUIT 数据模型

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ValidationError;
use crate::services::checksum;

/// DNI 的固定位数
pub const DNI_LEN: usize = 8;

/// CUIT 的固定位数
pub const CUIT_LEN: usize = 11;

/// 国民身份证号（DNI），恰好 8 位数字
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NationalId(String);

impl NationalId {
    /// 解析并校验 DNI，空白也算非数字字符
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::DniNotNumeric {
                value: value.to_string(),
            });
        }
        if value.len() != DNI_LEN {
            return Err(ValidationError::DniLength { len: value.len() });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 按顺序返回每一位数字
    pub fn digits(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.chars().filter_map(|c| c.to_digit(10))
    }
}

impl FromStr for NationalId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 性别代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// 男 ("M")
    Male,
    /// 女（以及所有非 "M" 的代码）
    Female,
}

impl Gender {
    /// 从前端传来的代码解析，非 "M" 一律视为女性
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("M") {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    /// 获取代码
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    /// 首选 CUIT 前缀
    pub fn primary_prefix(self) -> u8 {
        match self {
            Gender::Male => 20,
            Gender::Female => 27,
        }
    }
}

/// 税号（CUIT）：前缀 + DNI + 校验位
///
/// 只能通过 [`checksum::compute`] 或 [`TaxIdentifier::parse`] 构造，
/// 因此持有的校验位总是与前缀和 DNI 一致。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxIdentifier {
    prefix: u8,
    document: NationalId,
    check_digit: u8,
}

impl TaxIdentifier {
    pub(crate) fn new(prefix: u8, document: NationalId, check_digit: u8) -> Self {
        Self {
            prefix,
            document,
            check_digit,
        }
    }

    /// 解析 11 位 CUIT（也接受 `20-12345678-6` 形式），并重新校验校验位
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let digits = strip_dashes(raw);
        if digits.len() != CUIT_LEN || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::MalformedCuit {
                value: raw.to_string(),
            });
        }

        let prefix: u8 = digits[..2]
            .parse()
            .map_err(|_| ValidationError::MalformedCuit {
                value: raw.to_string(),
            })?;
        if !checksum::KNOWN_PREFIXES.contains(&prefix) {
            return Err(ValidationError::UnknownPrefix { prefix });
        }

        let document = NationalId::parse(&digits[2..10])?;
        let given = digits[10..]
            .parse::<u8>()
            .map_err(|_| ValidationError::MalformedCuit {
                value: raw.to_string(),
            })?;

        match checksum::check_digit(prefix, &document) {
            Some(expected) if expected == given => Ok(Self::new(prefix, document, given)),
            Some(expected) => Err(ValidationError::CheckDigitMismatch {
                value: raw.to_string(),
                expected,
            }),
            // 该前缀本身无法产生一位校验位
            None => Err(ValidationError::MalformedCuit {
                value: raw.to_string(),
            }),
        }
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn document(&self) -> &NationalId {
        &self.document
    }

    pub fn check_digit(&self) -> u8 {
        self.check_digit
    }

    /// 门户表单的三个字段：(前缀, DNI, 校验位)
    pub fn form_parts(&self) -> (String, String, String) {
        (
            format!("{:02}", self.prefix),
            self.document.to_string(),
            self.check_digit.to_string(),
        )
    }
}

/// 只在 `XX-XXXXXXXX-X` 的两个固定位置去掉连字符，其他形式原样返回
fn strip_dashes(raw: &str) -> String {
    let bytes = raw.as_bytes();
    if bytes.len() == CUIT_LEN + 2 && bytes[2] == b'-' && bytes[11] == b'-' {
        format!("{}{}{}", &raw[..2], &raw[3..11], &raw[12..])
    } else {
        raw.to_string()
    }
}

impl FromStr for TaxIdentifier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for TaxIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{}{}", self.prefix, self.document, self.check_digit)
    }
}

impl Serialize for TaxIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
