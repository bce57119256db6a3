//! The token ledger: balances, allowances and the transfer operations

use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::ledger::transfer;
use crate::sale::SaleRecord;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_address;

/// Fungible token with ERC20-style bookkeeping
///
/// Cloning a token yields another handle on the same storage.
#[derive(Debug, Clone)]
pub struct Token<S: TokenStorage> {
    address: Address,
    metadata: TokenMetadata,
    storage: S,
}

impl<S: TokenStorage + Clone> Token<S> {
    /// Create the ledger at `address`, crediting the entire supply to `creator`
    ///
    /// The storage must not already hold balances.
    pub async fn create(
        address: Address,
        config: &TokenConfig,
        creator: Address,
        mut storage: S,
    ) -> TokenResult<Self> {
        config.validate()?;
        validate_address(&creator, "Token creator")?;

        if !storage.list_balances().await?.is_empty() {
            return Err(TokenError::Validation(
                "Storage already holds a ledger".to_string(),
            ));
        }

        storage
            .commit(transfer::genesis(creator, config.total_supply))
            .await?;

        info!(
            "Created token {} ({}) at {} with supply {} held by {}",
            config.name, config.symbol, address, config.total_supply, creator
        );

        Ok(Self {
            address,
            metadata: config.metadata(),
            storage,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn standard(&self) -> &str {
        &self.metadata.standard
    }

    pub fn total_supply(&self) -> Balance {
        self.metadata.total_supply
    }

    /// Balance of `account`; unknown accounts hold zero
    pub async fn balance_of(&self, account: &Address) -> TokenResult<Balance> {
        self.storage.balance(account).await
    }

    /// Remaining amount `spender` may move out of `owner`'s balance
    pub async fn allowance(&self, owner: &Address, spender: &Address) -> TokenResult<Balance> {
        self.storage.allowance(owner, spender).await
    }

    /// Move `value` of the caller's balance to `to`
    pub async fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        value: Balance,
    ) -> TokenResult<Receipt> {
        let batch = self.plan_transfer(caller, to, value).await?;
        let receipt = self.storage.commit(batch).await?;
        debug!("Transfer {} -> {}: {}", caller, to, value);
        Ok(receipt)
    }

    /// Set the caller's allowance for `spender` to exactly `value`
    pub async fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        value: Balance,
    ) -> TokenResult<Receipt> {
        let receipt = self
            .storage
            .commit(transfer::approval(caller, spender, value))
            .await?;
        debug!("Approval {} -> {}: {}", caller, spender, value);
        Ok(receipt)
    }

    /// Move `value` from `owner` to `to` on the caller's allowance
    ///
    /// The owner's balance is checked before the allowance.
    pub async fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        to: Address,
        value: Balance,
    ) -> TokenResult<Receipt> {
        self.ensure_balance(&owner, value).await?;

        let allowed = self.storage.allowance(&owner, &caller).await?;
        if allowed < value {
            return Err(TokenError::InsufficientAllowance {
                owner,
                spender: caller,
                available: allowed,
                required: value,
            });
        }

        let receipt = self
            .storage
            .commit(transfer::delegated_transfer(caller, owner, to, value))
            .await?;
        debug!(
            "Delegated transfer by {}: {} -> {}: {}",
            caller, owner, to, value
        );
        Ok(receipt)
    }

    /// The append-only event log
    pub async fn events(&self) -> TokenResult<Vec<LogEntry>> {
        self.storage.events().await
    }

    /// Log entries belonging to one receipt
    pub async fn receipt_events(&self, receipt_id: &Uuid) -> TokenResult<Vec<LogEntry>> {
        self.storage.receipt_events(receipt_id).await
    }

    /// Compare the sum of all balances with the fixed supply
    pub async fn check_conservation(&self) -> TokenResult<ConservationReport> {
        let balances = self.storage.list_balances().await?;
        let sum_of_balances = balances
            .iter()
            .try_fold(0 as Balance, |sum, (_, balance)| sum.checked_add(*balance))
            .ok_or_else(|| TokenError::Overflow("sum of balances".to_string()))?;

        Ok(ConservationReport {
            total_supply: self.metadata.total_supply,
            sum_of_balances,
            holders: balances.len(),
            is_conserved: sum_of_balances == self.metadata.total_supply,
        })
    }

    /// Validate and build a plain transfer without committing it
    pub(crate) async fn plan_transfer(
        &self,
        from: Address,
        to: Address,
        value: Balance,
    ) -> TokenResult<WriteBatch> {
        self.ensure_balance(&from, value).await?;
        Ok(transfer::transfer(from, to, value))
    }

    /// Commit a batch assembled by a collaborator such as the sale
    pub(crate) async fn commit(&mut self, batch: WriteBatch) -> TokenResult<Receipt> {
        self.storage.commit(batch).await
    }

    /// Stored record of the sale at `sale`
    pub(crate) async fn sale_record(&self, sale: &Address) -> TokenResult<Option<SaleRecord>> {
        self.storage.sale(sale).await
    }

    async fn ensure_balance(&self, account: &Address, value: Balance) -> TokenResult<()> {
        let available = self.storage.balance(account).await?;
        if available < value {
            return Err(TokenError::InsufficientBalance {
                account: *account,
                available,
                required: value,
            });
        }
        Ok(())
    }
}

/// Result of comparing the balances against the supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationReport {
    pub total_supply: Balance,
    pub sum_of_balances: Balance,
    /// Accounts holding a non-zero balance
    pub holders: usize,
    pub is_conserved: bool,
}
