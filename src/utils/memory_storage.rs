//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::sale::{SaleRecord, SaleSummary};
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct MemoryState {
    balances: HashMap<Address, Balance>,
    allowances: HashMap<(Address, Address), Balance>,
    sales: HashMap<Address, SaleRecord>,
    log: Vec<LogEntry>,
}

/// Entries touched by a batch, staged before anything is written
#[derive(Default)]
struct Staged {
    balances: HashMap<Address, Balance>,
    allowances: HashMap<(Address, Address), Balance>,
    sales: HashMap<Address, SaleRecord>,
}

/// In-memory storage implementation for testing and development
///
/// Clones share the same state, so a token handle and the sale built on it
/// see each other's writes.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> TokenResult<()> {
        let mut state = self.write()?;
        *state = MemoryState::default();
        Ok(())
    }

    fn read(&self) -> TokenResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| TokenError::Storage("ledger state lock poisoned".to_string()))
    }

    fn write(&self) -> TokenResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| TokenError::Storage("ledger state lock poisoned".to_string()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Open sale record for `sale`, staged from `state` on first touch
fn open_sale<'a>(
    state: &MemoryState,
    sales: &'a mut HashMap<Address, SaleRecord>,
    sale: &Address,
) -> TokenResult<&'a mut SaleRecord> {
    if !sales.contains_key(sale) {
        let record = state
            .sales
            .get(sale)
            .cloned()
            .ok_or_else(|| TokenError::Validation(format!("No sale opened at {}", sale)))?;
        sales.insert(*sale, record);
    }
    let record = sales
        .get_mut(sale)
        .ok_or_else(|| TokenError::Storage(format!("sale {} not staged", sale)))?;
    if !record.is_active() {
        return Err(TokenError::SaleClosed);
    }
    Ok(record)
}

/// Stage every op of `batch` against `state` without touching it
fn stage(
    state: &MemoryState,
    batch: &WriteBatch,
    receipt_id: Uuid,
    committed_at: NaiveDateTime,
) -> TokenResult<Staged> {
    let mut staged = Staged::default();
    let Staged {
        balances,
        allowances,
        sales,
    } = &mut staged;

    for op in &batch.ops {
        match op {
            LedgerOp::Debit { account, amount } => {
                let current = *balances
                    .entry(*account)
                    .or_insert_with(|| state.balances.get(account).copied().unwrap_or(0));
                let updated = current.checked_sub(*amount).ok_or(
                    TokenError::InsufficientBalance {
                        account: *account,
                        available: current,
                        required: *amount,
                    },
                )?;
                balances.insert(*account, updated);
            }
            LedgerOp::Credit { account, amount } => {
                let current = *balances
                    .entry(*account)
                    .or_insert_with(|| state.balances.get(account).copied().unwrap_or(0));
                let updated = current.checked_add(*amount).ok_or_else(|| {
                    TokenError::Overflow(format!("balance of {} exceeds u128", account))
                })?;
                balances.insert(*account, updated);
            }
            LedgerOp::SetAllowance {
                owner,
                spender,
                amount,
            } => {
                allowances.insert((*owner, *spender), *amount);
            }
            LedgerOp::SpendAllowance {
                owner,
                spender,
                amount,
            } => {
                let key = (*owner, *spender);
                let current = *allowances
                    .entry(key)
                    .or_insert_with(|| state.allowances.get(&key).copied().unwrap_or(0));
                let updated = current.checked_sub(*amount).ok_or(
                    TokenError::InsufficientAllowance {
                        owner: *owner,
                        spender: *spender,
                        available: current,
                        required: *amount,
                    },
                )?;
                allowances.insert(key, updated);
            }
            LedgerOp::OpenSale {
                sale,
                admin,
                unit_price,
            } => {
                if state.sales.contains_key(sale) || sales.contains_key(sale) {
                    return Err(TokenError::Validation(format!(
                        "A sale is already open at {}",
                        sale
                    )));
                }
                sales.insert(*sale, SaleRecord::new(*admin, *unit_price));
            }
            LedgerOp::RecordPurchase { sale, tokens, funds } => {
                let record = open_sale(state, sales, sale)?;
                record.tokens_sold = record
                    .tokens_sold
                    .checked_add(*tokens)
                    .ok_or_else(|| TokenError::Overflow("tokens sold".to_string()))?;
                record.funds_raised = record
                    .funds_raised
                    .checked_add(*funds)
                    .ok_or_else(|| TokenError::Overflow("funds raised".to_string()))?;
            }
            LedgerOp::CloseSale {
                sale,
                tokens_returned,
            } => {
                let record = open_sale(state, sales, sale)?;
                record.summary = Some(SaleSummary {
                    tokens_sold: record.tokens_sold,
                    tokens_returned: *tokens_returned,
                    funds_released: record.funds_raised,
                    receipt_id,
                    ended_at: committed_at,
                });
                record.tokens_sold = 0;
                record.funds_raised = 0;
            }
        }
    }

    Ok(staged)
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    async fn balance(&self, account: &Address) -> TokenResult<Balance> {
        Ok(self.read()?.balances.get(account).copied().unwrap_or(0))
    }

    async fn allowance(&self, owner: &Address, spender: &Address) -> TokenResult<Balance> {
        Ok(self
            .read()?
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0))
    }

    async fn list_balances(&self) -> TokenResult<Vec<(Address, Balance)>> {
        let state = self.read()?;
        let mut balances: Vec<(Address, Balance)> = state
            .balances
            .iter()
            .filter(|(_, balance)| **balance > 0)
            .map(|(account, balance)| (*account, *balance))
            .collect();
        balances.sort();
        Ok(balances)
    }

    async fn sale(&self, sale: &Address) -> TokenResult<Option<SaleRecord>> {
        Ok(self.read()?.sales.get(sale).cloned())
    }

    async fn commit(&mut self, batch: WriteBatch) -> TokenResult<Receipt> {
        // Validation and application happen under one write guard.
        let receipt_id = Uuid::new_v4();
        let committed_at = chrono::Utc::now().naive_utc();

        let mut state = self.write()?;
        let staged = stage(&state, &batch, receipt_id, committed_at)?;

        state.balances.extend(staged.balances);
        state.allowances.extend(staged.allowances);
        state.sales.extend(staged.sales);

        let receipt = Receipt {
            id: receipt_id,
            events: batch.events,
            committed_at,
        };
        for event in &receipt.events {
            let sequence = state.log.len() as u64;
            state.log.push(LogEntry {
                sequence,
                receipt_id: receipt.id,
                event: event.clone(),
                recorded_at: receipt.committed_at,
            });
        }

        Ok(receipt)
    }

    async fn events(&self) -> TokenResult<Vec<LogEntry>> {
        Ok(self.read()?.log.clone())
    }

    async fn receipt_events(&self, receipt_id: &Uuid) -> TokenResult<Vec<LogEntry>> {
        Ok(self
            .read()?
            .log
            .iter()
            .filter(|entry| &entry.receipt_id == receipt_id)
            .cloned()
            .collect())
    }
}
