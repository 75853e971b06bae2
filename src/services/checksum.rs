//! CUIT 校验位计算 - 业务能力层
//!
//! 模 11 加权求和：把 `前缀 ++ DNI` 从右往左逐位乘以循环权重 `[2,3,4,5,6,7]`，
//! `11 - (和 mod 11)` 即为校验位。结果为 11 时校验位取 0；结果为 10 时该前缀
//! 无法得到一位校验位，改用下一个候选前缀。

use tracing::debug;

use crate::error::{AppResult, ChecksumError};
use crate::models::cuit::{Gender, NationalId, TaxIdentifier};

/// 循环权重
const WEIGHTS: [u32; 6] = [2, 3, 4, 5, 6, 7];

/// 首选前缀被拒绝时使用的前缀
pub const FALLBACK_PREFIX: u8 = 23;

/// 所有合法的个人 CUIT 前缀
pub const KNOWN_PREFIXES: [u8; 3] = [20, 23, 27];

/// 候选前缀，按尝试顺序排列
pub fn candidate_prefixes(gender: Gender) -> [u8; 2] {
    [gender.primary_prefix(), FALLBACK_PREFIX]
}

/// 计算指定前缀下的校验位，该前缀无法得到一位校验位时返回 `None`
pub fn check_digit(prefix: u8, document: &NationalId) -> Option<u8> {
    let digits: Vec<u32> = [u32::from(prefix / 10), u32::from(prefix % 10)]
        .into_iter()
        .chain(document.digits())
        .collect();

    let sum: u32 = digits
        .iter()
        .rev()
        .zip(WEIGHTS.iter().cycle())
        .map(|(digit, weight)| digit * weight)
        .sum();

    match 11 - (sum % 11) {
        11 => Some(0),
        10 => None,
        digit => Some(digit as u8),
    }
}

/// 依次尝试候选前缀，返回第一个能得到校验位的 CUIT
pub fn resolve(document: &NationalId, candidates: &[u8]) -> Result<TaxIdentifier, ChecksumError> {
    for &prefix in candidates {
        match check_digit(prefix, document) {
            Some(digit) => {
                debug!("DNI {} 使用前缀 {} 得到校验位 {}", document, prefix, digit);
                return Ok(TaxIdentifier::new(prefix, document.clone(), digit));
            }
            None => debug!("DNI {} 的前缀 {} 被拒绝，尝试下一个", document, prefix),
        }
    }

    Err(ChecksumError::Unresolved {
        dni: document.to_string(),
        candidates: candidates.to_vec(),
    })
}

/// 从已校验的 DNI 计算 CUIT
pub fn compute_for(document: &NationalId, gender: Gender) -> AppResult<TaxIdentifier> {
    Ok(resolve(document, &candidate_prefixes(gender))?)
}

/// 从原始 DNI 字符串计算 CUIT
///
/// DNI 不是恰好 8 位数字时返回校验错误；所有候选前缀都被拒绝时返回
/// [`ChecksumError::Unresolved`]，绝不猜测校验位。
pub fn compute(dni: &str, gender: Gender) -> AppResult<TaxIdentifier> {
    let document = NationalId::parse(dni)?;
    compute_for(&document, gender)
}
