//! Type definitions

pub mod messages;
pub mod tariff;

pub use messages::*;
pub use tariff::*;
