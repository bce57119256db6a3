//! Fixed-price sale of a custodied pool of ledger balance

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{transfer, Token};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_address, validate_positive_amount};

/// Closing figures recorded when the administrator ends the sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSummary {
    /// Tokens sold over the life of the sale
    pub tokens_sold: Balance,
    /// Unsold inventory transferred back to the administrator
    pub tokens_returned: Balance,
    /// Custodied payments released to the administrator
    pub funds_released: Balance,
    pub receipt_id: Uuid,
    pub ended_at: NaiveDateTime,
}

/// Sale state kept in storage, keyed by the sale address
///
/// Every handle on the sale reads and updates the same record, in the same
/// batch as the inventory it moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub admin: Address,
    pub unit_price: Balance,
    /// Tokens sold so far; reset to zero when the sale ends
    pub tokens_sold: Balance,
    /// Payments held in custody; reset to zero when released
    pub funds_raised: Balance,
    /// Set once the administrator ends the sale
    pub summary: Option<SaleSummary>,
}

impl SaleRecord {
    pub fn new(admin: Address, unit_price: Balance) -> Self {
        Self {
            admin,
            unit_price,
            tokens_sold: 0,
            funds_raised: 0,
            summary: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.summary.is_none()
    }
}

/// Sells the sale account's ledger balance at a fixed unit price
///
/// Inventory is whatever the sale's own address holds on the ledger; seeding
/// it is a plain transfer performed by the administrator. Handles are cheap
/// to clone and all of them act on the same stored sale.
#[derive(Debug, Clone)]
pub struct Sale<S: TokenStorage> {
    address: Address,
    token: Token<S>,
    admin: Address,
    unit_price: Balance,
}

impl<S: TokenStorage + Clone> Sale<S> {
    /// Open a sale at `address` for `token`, administered by `admin`
    pub async fn create(
        address: Address,
        mut token: Token<S>,
        admin: Address,
        unit_price: Balance,
    ) -> TokenResult<Self> {
        validate_address(&address, "Sale address")?;
        validate_address(&admin, "Sale administrator")?;
        validate_positive_amount(unit_price, "Token price")?;
        if address == token.address() {
            return Err(TokenError::Validation(
                "Sale address cannot be the token address".to_string(),
            ));
        }

        token
            .commit(WriteBatch::new().op(LedgerOp::OpenSale {
                sale: address,
                admin,
                unit_price,
            }))
            .await?;

        info!(
            "Opened sale {} for token {} at {} wei per token, admin {}",
            address,
            token.address(),
            unit_price,
            admin
        );

        Ok(Self {
            address,
            token,
            admin,
            unit_price,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address of the ledger the inventory is held on
    pub fn token_contract(&self) -> Address {
        self.token.address()
    }

    pub fn token(&self) -> &Token<S> {
        &self.token
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Price of one token in base currency units; unchanged after the sale ends
    pub fn token_price(&self) -> Balance {
        self.unit_price
    }

    /// The stored sale record
    pub async fn record(&self) -> TokenResult<SaleRecord> {
        self.token
            .sale_record(&self.address)
            .await?
            .ok_or_else(|| TokenError::Storage(format!("no record for sale {}", self.address)))
    }

    /// Tokens sold so far; zero once the sale has ended
    pub async fn tokens_sold(&self) -> TokenResult<Balance> {
        Ok(self.record().await?.tokens_sold)
    }

    /// Payments held in custody, released to the administrator at the end
    pub async fn funds_raised(&self) -> TokenResult<Balance> {
        Ok(self.record().await?.funds_raised)
    }

    pub async fn is_active(&self) -> TokenResult<bool> {
        Ok(self.record().await?.is_active())
    }

    /// Closing figures, once the sale has ended
    pub async fn summary(&self) -> TokenResult<Option<SaleSummary>> {
        Ok(self.record().await?.summary)
    }

    /// Inventory still for sale
    pub async fn tokens_available(&self) -> TokenResult<Balance> {
        self.token.balance_of(&self.address).await
    }

    /// Sell `amount` tokens to `buyer` against an attached payment of `value`
    ///
    /// The payment must equal `amount * token_price()` exactly.
    pub async fn buy_tokens(
        &mut self,
        buyer: Address,
        amount: Balance,
        value: Balance,
    ) -> TokenResult<Receipt> {
        if !self.is_active().await? {
            return Err(TokenError::SaleClosed);
        }

        let expected = amount
            .checked_mul(self.unit_price)
            .ok_or_else(|| TokenError::Overflow(format!("price of {} tokens", amount)))?;
        if value != expected {
            return Err(TokenError::IncorrectPayment {
                expected,
                received: value,
            });
        }

        let available = self.tokens_available().await?;
        if available < amount {
            return Err(TokenError::InsufficientInventory {
                available,
                requested: amount,
            });
        }

        // The record update fails the whole batch if the sale closed meanwhile.
        let batch = WriteBatch::new()
            .op(LedgerOp::RecordPurchase {
                sale: self.address,
                tokens: amount,
                funds: value,
            })
            .merge(transfer::transfer(self.address, buyer, amount))
            .event(Event::Sell { buyer, amount });
        let sale_address = self.address;
        let receipt = self.token.commit(batch).await.map_err(|e| match e {
            // Another handle drained the inventory after it was read
            TokenError::InsufficientBalance {
                account,
                available,
                required,
            } if account == sale_address => TokenError::InsufficientInventory {
                available,
                requested: required,
            },
            other => other,
        })?;

        debug!("Sold {} tokens to {} for {} wei", amount, buyer, value);
        Ok(receipt)
    }

    /// Close the sale, returning unsold inventory and custodied funds to the admin
    pub async fn end_sale(&mut self, caller: Address) -> TokenResult<SaleSummary> {
        if caller != self.admin {
            warn!("Rejected end of sale {} requested by {}", self.address, caller);
            return Err(TokenError::Unauthorized(caller));
        }
        if !self.is_active().await? {
            return Err(TokenError::SaleClosed);
        }

        let remaining = self.tokens_available().await?;
        let batch = WriteBatch::new()
            .op(LedgerOp::CloseSale {
                sale: self.address,
                tokens_returned: remaining,
            })
            .merge(transfer::transfer(self.address, self.admin, remaining));
        self.token.commit(batch).await?;

        let summary = self.summary().await?.ok_or_else(|| {
            TokenError::Storage(format!("sale {} closed without a summary", self.address))
        })?;

        info!(
            "Ended sale {}: {} sold, {} returned and {} wei released to {}",
            self.address,
            summary.tokens_sold,
            summary.tokens_returned,
            summary.funds_released,
            self.admin
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::utils::memory_storage::MemoryStorage;

    fn account(label: &str) -> Address {
        Address::derive(label.as_bytes())
    }

    async fn seeded_sale(inventory: Balance) -> Sale<MemoryStorage> {
        let admin = account("admin");
        let mut token = Token::create(
            account("token"),
            &TokenConfig::default(),
            admin,
            MemoryStorage::new(),
        )
        .await
        .unwrap();
        token.transfer(admin, account("sale"), inventory).await.unwrap();
        Sale::create(account("sale"), token, admin, 10).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_validates_parameters() {
        let sale = seeded_sale(0).await;
        let token = sale.token().clone();

        assert!(matches!(
            Sale::create(account("other sale"), token.clone(), account("admin"), 0).await,
            Err(TokenError::Validation(_))
        ));
        assert!(matches!(
            Sale::create(token.address(), token.clone(), account("admin"), 1).await,
            Err(TokenError::Validation(_))
        ));
        assert!(matches!(
            Sale::create(account("other sale"), token.clone(), Address::zero(), 1).await,
            Err(TokenError::Validation(_))
        ));
        // The address already carries a sale record.
        assert!(matches!(
            Sale::create(account("sale"), token, account("admin"), 1).await,
            Err(TokenError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_buy_emits_transfer_and_sell() {
        let mut sale = seeded_sale(100).await;
        let buyer = account("buyer");

        let receipt = sale.buy_tokens(buyer, 3, 30).await.unwrap();

        assert_eq!(
            receipt.events,
            vec![
                Event::Transfer {
                    from: account("sale"),
                    to: buyer,
                    value: 3
                },
                Event::Sell { buyer, amount: 3 },
            ]
        );
        assert_eq!(sale.tokens_sold().await.unwrap(), 3);
        assert_eq!(sale.funds_raised().await.unwrap(), 30);
        assert_eq!(sale.tokens_available().await.unwrap(), 97);
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected() {
        let mut sale = seeded_sale(100).await;
        let err = sale.buy_tokens(account("buyer"), 1, 11).await.unwrap_err();
        assert_eq!(
            err,
            TokenError::IncorrectPayment {
                expected: 10,
                received: 11
            }
        );
        assert_eq!(sale.funds_raised().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_buying_beyond_inventory_fails() {
        let mut sale = seeded_sale(5).await;
        let err = sale.buy_tokens(account("buyer"), 6, 60).await.unwrap_err();
        assert_eq!(
            err,
            TokenError::InsufficientInventory {
                available: 5,
                requested: 6
            }
        );
        assert_eq!(sale.tokens_sold().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_price_overflow_is_reported() {
        let mut sale = seeded_sale(5).await;
        let err = sale
            .buy_tokens(account("buyer"), Balance::MAX, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Overflow(_)));
    }

    #[tokio::test]
    async fn test_inventory_drained_by_another_handle() {
        let mut sale = seeded_sale(10).await;
        let mut first = sale.clone();

        first.buy_tokens(account("first"), 10, 100).await.unwrap();
        let err = sale.buy_tokens(account("second"), 10, 100).await.unwrap_err();
        assert!(matches!(
            err,
            TokenError::InsufficientInventory { available: 0, .. }
        ));
        assert_eq!(sale.tokens_sold().await.unwrap(), 10);
        assert_eq!(sale.funds_raised().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_end_sale_twice() {
        let mut sale = seeded_sale(10).await;
        sale.buy_tokens(account("buyer"), 2, 20).await.unwrap();

        let summary = sale.end_sale(account("admin")).await.unwrap();
        assert_eq!(summary.tokens_sold, 2);
        assert_eq!(summary.tokens_returned, 8);
        assert_eq!(summary.funds_released, 20);
        assert_eq!(sale.summary().await.unwrap(), Some(summary));
        assert_eq!(sale.tokens_sold().await.unwrap(), 0);
        assert_eq!(sale.funds_raised().await.unwrap(), 0);
        assert_eq!(sale.token_price(), 10);

        assert_eq!(
            sale.end_sale(account("admin")).await.unwrap_err(),
            TokenError::SaleClosed
        );
        assert_eq!(
            sale.end_sale(account("buyer")).await.unwrap_err(),
            TokenError::Unauthorized(account("buyer"))
        );
    }

    #[tokio::test]
    async fn test_handles_share_sale_state() {
        let mut sale = seeded_sale(100).await;
        let mut other = sale.clone();
        let admin = account("admin");

        other.buy_tokens(account("buyer"), 5, 50).await.unwrap();
        assert_eq!(sale.tokens_sold().await.unwrap(), 5);

        let summary = sale.end_sale(admin).await.unwrap();
        assert_eq!(summary.tokens_sold, 5);
        assert_eq!(summary.funds_released, 50);
        assert_eq!(summary.tokens_returned, 95);
        assert!(!other.is_active().await.unwrap());
        assert_eq!(other.summary().await.unwrap(), Some(summary));

        // Fresh inventory does not reopen the sale for any handle.
        let mut token = sale.token().clone();
        token.transfer(admin, sale.address(), 100).await.unwrap();
        assert_eq!(
            other.buy_tokens(account("buyer"), 2, 20).await.unwrap_err(),
            TokenError::SaleClosed
        );
        assert_eq!(
            other.end_sale(admin).await.unwrap_err(),
            TokenError::SaleClosed
        );
        assert_eq!(other.tokens_available().await.unwrap(), 100);
        assert_eq!(token.balance_of(&account("buyer")).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_closed_record_rejects_stale_purchase() {
        let sale = seeded_sale(10).await;
        let mut token = sale.token().clone();

        // A purchase planned before the sale closed.
        let stale = WriteBatch::new()
            .op(LedgerOp::RecordPurchase {
                sale: sale.address(),
                tokens: 1,
                funds: 10,
            })
            .merge(transfer::transfer(sale.address(), account("buyer"), 1));

        sale.clone().end_sale(account("admin")).await.unwrap();
        assert_eq!(token.commit(stale).await.unwrap_err(), TokenError::SaleClosed);
        assert_eq!(token.balance_of(&account("buyer")).await.unwrap(), 0);
    }
}
