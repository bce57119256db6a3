//! Write-batch patterns for the ledger's state changes

use crate::traits::*;
use crate::types::*;

/// Mint the whole supply to the creator; no event, as at construction
pub fn genesis(creator: Address, total_supply: Balance) -> WriteBatch {
    WriteBatch::new().op(LedgerOp::Credit {
        account: creator,
        amount: total_supply,
    })
}

/// Move `value` from `from` to `to` and emit `Transfer`
pub fn transfer(from: Address, to: Address, value: Balance) -> WriteBatch {
    WriteBatch::new()
        .op(LedgerOp::Debit {
            account: from,
            amount: value,
        })
        .op(LedgerOp::Credit {
            account: to,
            amount: value,
        })
        .event(Event::Transfer { from, to, value })
}

/// Overwrite the allowance and emit `Approval`
pub fn approval(owner: Address, spender: Address, value: Balance) -> WriteBatch {
    WriteBatch::new()
        .op(LedgerOp::SetAllowance {
            owner,
            spender,
            amount: value,
        })
        .event(Event::Approval {
            owner,
            spender,
            value,
        })
}

/// `spender` moves `value` of `owner`'s balance to `to`, consuming allowance
pub fn delegated_transfer(
    spender: Address,
    owner: Address,
    to: Address,
    value: Balance,
) -> WriteBatch {
    transfer(owner, to, value).op(LedgerOp::SpendAllowance {
        owner,
        spender,
        amount: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegated_transfer_spends_allowance_after_moving_balance() {
        let owner = Address::derive(b"owner");
        let spender = Address::derive(b"spender");
        let to = Address::derive(b"to");

        let batch = delegated_transfer(spender, owner, to, 7);

        assert_eq!(batch.ops.len(), 3);
        assert_eq!(
            batch.ops[0],
            LedgerOp::Debit {
                account: owner,
                amount: 7
            }
        );
        assert_eq!(
            batch.ops[2],
            LedgerOp::SpendAllowance {
                owner,
                spender,
                amount: 7
            }
        );
        // The event names the owner, not the spender
        assert_eq!(
            batch.events,
            vec![Event::Transfer {
                from: owner,
                to,
                value: 7
            }]
        );
    }

    #[test]
    fn test_genesis_emits_nothing() {
        let batch = genesis(Address::derive(b"creator"), 1_000);
        assert!(batch.events.is_empty());
        assert_eq!(batch.ops.len(), 1);
    }
}
