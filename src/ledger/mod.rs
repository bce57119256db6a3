//! Ledger module containing the token and its transfer patterns

pub mod core;
pub mod transfer;

pub use self::core::*;
