//! Browser engine integration
//!
//! Handles launching and controlling a single Chrome/Chromium instance and
//! handing out isolated browsing sessions (one CDP browser context per visit).

mod driver;
mod errors;

pub use driver::{BrowserDriver, BrowserSession, SessionProvider};
pub use errors::BrowserError;
