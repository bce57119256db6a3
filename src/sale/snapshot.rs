//! Read model polled by clients to render the sale page

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};

use crate::sale::Sale;
use crate::traits::*;
use crate::types::*;
use crate::units::{format_units, Unit};

/// Everything a client shows about the sale for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleSnapshot {
    pub account: Address,
    pub account_balance: Balance,
    pub token_price: Balance,
    /// Token price rendered in ether, e.g. "0.001"
    pub token_price_ether: String,
    pub tokens_sold: Balance,
    pub tokens_available: Balance,
    /// Percentage of the offered tokens already sold, two decimals
    pub progress_percent: BigDecimal,
    /// `progress_percent` as shown to the user, e.g. "0.00" or "33.33"
    pub progress_display: String,
    pub is_active: bool,
}

/// `sold / (sold + available) * 100`, rounded half-up to two decimals
pub fn progress_percent(tokens_sold: Balance, tokens_available: Balance) -> BigDecimal {
    let sold = decimal(tokens_sold);
    let offered = &sold + decimal(tokens_available);
    if offered == BigDecimal::from(0) {
        return BigDecimal::from(0).with_scale(2);
    }
    (sold * BigDecimal::from(100) / offered).with_scale_round(2, RoundingMode::HalfUp)
}

/// Render a non-negative percentage with exactly two decimals
fn two_decimals(value: &BigDecimal) -> String {
    let (hundredths, _) = value
        .with_scale_round(2, RoundingMode::HalfUp)
        .into_bigint_and_exponent();
    let digits = format!("{:0>3}", hundredths.to_string());
    let (whole, fraction) = digits.split_at(digits.len() - 2);
    format!("{}.{}", whole, fraction)
}

fn decimal(value: Balance) -> BigDecimal {
    BigDecimal::new(BigInt::from(value), 0)
}

impl<S: TokenStorage + Clone> Sale<S> {
    /// Collect the sale figures and `account`'s token balance
    pub async fn snapshot(&self, account: &Address) -> TokenResult<SaleSnapshot> {
        let account_balance = self.token().balance_of(account).await?;
        let tokens_available = self.tokens_available().await?;
        let record = self.record().await?;
        let progress = progress_percent(record.tokens_sold, tokens_available);

        Ok(SaleSnapshot {
            account: *account,
            account_balance,
            token_price: self.token_price(),
            token_price_ether: format_units(self.token_price(), Unit::Ether),
            tokens_sold: record.tokens_sold,
            tokens_available,
            progress_display: two_decimals(&progress),
            progress_percent: progress,
            is_active: record.is_active(),
        })
    }
}
