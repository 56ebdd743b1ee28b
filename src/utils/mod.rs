//! Utility modules

pub mod errors;
pub mod logging;
pub mod time;

pub use errors::{HishoError, Result};
