pub mod locator;
pub mod session;
pub mod session_ctx;

pub use locator::{FieldRole, Locator};
pub use session::{AutomationSession, RawExtraction, SessionState, SessionTimeouts};
pub use session_ctx::SessionCtx;
