//! Construction parameters for the token and the sale

use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::units::{to_wei, Unit};
use crate::utils::validation::*;

/// Parameters the ledger is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub standard: String,
    pub total_supply: Balance,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "DApp Token".to_string(),
            symbol: "DAPP".to_string(),
            standard: "DApp Token v1.0".to_string(),
            total_supply: 1_000_000,
        }
    }
}

impl TokenConfig {
    pub fn validate(&self) -> TokenResult<()> {
        validate_token_name(&self.name)?;
        validate_token_symbol(&self.symbol)?;
        if self.standard.trim().is_empty() {
            return Err(TokenError::Validation(
                "Token standard cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn metadata(&self) -> TokenMetadata {
        TokenMetadata {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            standard: self.standard.clone(),
            total_supply: self.total_supply,
        }
    }
}

/// Parameters the sale is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleConfig {
    /// Price of one token as a decimal amount of `price_unit`
    pub token_price: String,
    pub price_unit: Unit,
    /// Share of the total supply seeded into the sale at deployment
    pub inventory_percent: u8,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            token_price: "0.001".to_string(),
            price_unit: Unit::Ether,
            inventory_percent: 75,
        }
    }
}

impl SaleConfig {
    /// Token price in base currency units
    pub fn unit_price(&self) -> TokenResult<Balance> {
        let price = to_wei(&self.token_price, self.price_unit)?;
        validate_positive_amount(price, "Token price")?;
        Ok(price)
    }

    /// Number of tokens to seed out of `total_supply`
    pub fn inventory(&self, total_supply: Balance) -> TokenResult<Balance> {
        validate_percent(self.inventory_percent, "Sale inventory")?;
        let scaled = total_supply
            .checked_mul(Balance::from(self.inventory_percent))
            .ok_or_else(|| TokenError::Overflow("sale inventory".to_string()))?;
        Ok(scaled / 100)
    }

    pub fn validate(&self) -> TokenResult<()> {
        self.unit_price()?;
        validate_percent(self.inventory_percent, "Sale inventory")
    }
}

/// Full deployment description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub token: TokenConfig,
    pub sale: SaleConfig,
}

impl DeploymentConfig {
    /// Parse and validate a JSON document; absent fields take their defaults
    pub fn from_json(json: &str) -> TokenResult<Self> {
        let config: DeploymentConfig = serde_json::from_str(json)
            .map_err(|e| TokenError::Validation(format!("Invalid deployment config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TokenResult<()> {
        self.token.validate()?;
        self.sale.validate()
    }
}
