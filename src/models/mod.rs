pub mod cuit;
pub mod verification;

pub use cuit::{Gender, NationalId, TaxIdentifier};
pub use verification::{VerificationRequest, VerificationResult, NAME_UNAVAILABLE};
