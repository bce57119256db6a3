//! # DApp Token Core
//!
//! A fungible token ledger with delegated spending, and a fixed-price sale
//! that exchanges a custodied pool of tokens for currency until its
//! administrator ends it.
//!
//! ## Features
//!
//! - **Ledger**: balances, allowances, `transfer` / `approve` / `transfer_from`
//! - **Sale**: exact-payment purchases from the sale's own inventory, admin-only close
//! - **Event log**: append-only `Transfer`, `Approval` and `Sell` entries keyed by receipt
//! - **Atomic commits**: every operation is one all-or-nothing write batch
//! - **Storage abstraction**: backend-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use dapp_token_core::{deploy, utils::MemoryStorage, Address, DeploymentConfig};
//!
//! # async fn run() -> dapp_token_core::TokenResult<()> {
//! let creator = Address::derive(b"creator");
//! let mut deployment = deploy(&DeploymentConfig::default(), creator, MemoryStorage::new()).await?;
//!
//! let buyer = Address::derive(b"buyer");
//! let price = deployment.sale.token_price();
//! deployment.sale.buy_tokens(buyer, 10, 10 * price).await?;
//! assert_eq!(deployment.token.balance_of(&buyer).await?, 10);
//! assert_eq!(deployment.sale.tokens_sold().await?, 10);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod deploy;
pub mod ledger;
pub mod sale;
pub mod traits;
pub mod types;
pub mod units;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use deploy::*;
pub use ledger::{ConservationReport, Token};
pub use sale::{progress_percent, Sale, SaleRecord, SaleSnapshot, SaleSummary};
pub use traits::*;
pub use types::*;
pub use units::*;

// Re-export the write-batch patterns for convenience
pub use ledger::transfer as patterns;
