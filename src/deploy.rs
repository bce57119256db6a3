//! Deployment: create the token and the sale, then seed the sale's inventory

use log::info;

use crate::config::DeploymentConfig;
use crate::ledger::Token;
use crate::sale::Sale;
use crate::traits::*;
use crate::types::*;

/// Handles produced by [`deploy`]; both share one storage
#[derive(Debug, Clone)]
pub struct Deployment<S: TokenStorage> {
    pub token: Token<S>,
    pub sale: Sale<S>,
    pub creator: Address,
    /// Receipt of the creator's transfer into the sale
    pub seed_receipt: Receipt,
}

/// Deploy the token and the sale for `creator` on an empty `storage`
///
/// Contract addresses are derived from the creator with nonces 0 (token) and
/// 1 (sale). The creator administers the sale and seeds it with
/// `inventory_percent` of the supply.
pub async fn deploy<S: TokenStorage + Clone>(
    config: &DeploymentConfig,
    creator: Address,
    storage: S,
) -> TokenResult<Deployment<S>> {
    config.validate()?;

    let mut token = Token::create(
        Address::contract(&creator, 0),
        &config.token,
        creator,
        storage,
    )
    .await?;

    let sale = Sale::create(
        Address::contract(&creator, 1),
        token.clone(),
        creator,
        config.sale.unit_price()?,
    )
    .await?;

    let inventory = config.sale.inventory(token.total_supply())?;
    let seed_receipt = token.transfer(creator, sale.address(), inventory).await?;
    info!("Seeded sale {} with {} tokens", sale.address(), inventory);

    Ok(Deployment {
        token,
        sale,
        creator,
        seed_receipt,
    })
}
