//! Common types shared by the session workspace crates

mod clock;
mod error;

pub use clock::now_millis;
pub use error::{Error, Result};
