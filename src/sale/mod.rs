//! Token sale: fixed-price exchange of custodied ledger balance

pub mod core;
pub mod snapshot;

pub use self::core::*;
pub use snapshot::*;
