//! Currency denominations for sale prices and payments

pub mod currency;

pub use currency::*;
