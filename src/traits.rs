//! Traits for storage abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sale::SaleRecord;
use crate::types::*;

/// A single ledger mutation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    /// Remove `amount` from `account`; fails if the balance would go negative
    Debit { account: Address, amount: Balance },
    /// Add `amount` to `account`
    Credit { account: Address, amount: Balance },
    /// Overwrite the allowance `owner` granted `spender`
    SetAllowance {
        owner: Address,
        spender: Address,
        amount: Balance,
    },
    /// Consume `amount` of the allowance; fails if the allowance is smaller
    SpendAllowance {
        owner: Address,
        spender: Address,
        amount: Balance,
    },
    /// Register a sale record; fails if one already exists at `sale`
    OpenSale {
        sale: Address,
        admin: Address,
        unit_price: Balance,
    },
    /// Count a purchase against an open sale
    RecordPurchase {
        sale: Address,
        tokens: Balance,
        funds: Balance,
    },
    /// Close an open sale, capturing its figures in the summary
    CloseSale {
        sale: Address,
        tokens_returned: Balance,
    },
}

/// Ordered set of mutations and the events they emit, applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBatch {
    pub ops: Vec<LedgerOp>,
    pub events: Vec<Event>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, op: LedgerOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    /// Append another batch after this one
    pub fn merge(mut self, other: WriteBatch) -> Self {
        self.ops.extend(other.ops);
        self.events.extend(other.events);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.events.is_empty()
    }
}

/// Storage abstraction for the token ledger
///
/// Implementations must apply [`TokenStorage::commit`] atomically and
/// serialized with every other commit against the same state: each debit and
/// allowance spend is re-validated at commit time, so handles that planned
/// against stale reads can never overdraw an account.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Balance of an account, zero if never referenced
    async fn balance(&self, account: &Address) -> TokenResult<Balance>;

    /// Remaining allowance `owner` granted `spender`, zero if never set
    async fn allowance(&self, owner: &Address, spender: &Address) -> TokenResult<Balance>;

    /// All accounts with a non-zero balance
    async fn list_balances(&self) -> TokenResult<Vec<(Address, Balance)>>;

    /// Record of the sale at `sale`, if one was opened
    async fn sale(&self, sale: &Address) -> TokenResult<Option<SaleRecord>>;

    /// Apply a batch atomically and append its events to the log
    async fn commit(&mut self, batch: WriteBatch) -> TokenResult<Receipt>;

    /// The whole event log in commit order
    async fn events(&self) -> TokenResult<Vec<LogEntry>>;

    /// Log entries produced by one receipt
    async fn receipt_events(&self, receipt_id: &Uuid) -> TokenResult<Vec<LogEntry>>;
}
