pub mod driver;
pub mod guard;
pub mod headless;

#[cfg(test)]
pub(crate) mod fake;

pub use driver::{BrowserLauncher, PortalBrowser, PortalPage};
pub use guard::BrowserGuard;
pub use headless::{ChromiumBrowser, ChromiumLauncher, ChromiumPage};
