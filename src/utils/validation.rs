//! Validation utilities

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: Balance, what: &str) -> TokenResult<()> {
    if amount == 0 {
        Err(TokenError::Validation(format!("{} must be positive", what)))
    } else {
        Ok(())
    }
}

/// Validate a token name
pub fn validate_token_name(name: &str) -> TokenResult<()> {
    if name.trim().is_empty() {
        return Err(TokenError::Validation(
            "Token name cannot be empty".to_string(),
        ));
    }

    if name.len() > 64 {
        return Err(TokenError::Validation(
            "Token name cannot exceed 64 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a token symbol
pub fn validate_token_symbol(symbol: &str) -> TokenResult<()> {
    if symbol.is_empty() {
        return Err(TokenError::Validation(
            "Token symbol cannot be empty".to_string(),
        ));
    }

    if symbol.len() > 11 {
        return Err(TokenError::Validation(
            "Token symbol cannot exceed 11 characters".to_string(),
        ));
    }

    // Symbols are shown verbatim by clients
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TokenError::Validation(
            "Token symbol can only contain ASCII letters and digits".to_string(),
        ));
    }

    Ok(())
}

/// Validate a percentage in the inclusive range 0..=100
pub fn validate_percent(percent: u8, what: &str) -> TokenResult<()> {
    if percent > 100 {
        return Err(TokenError::Validation(format!(
            "{} cannot exceed 100%, got {}%",
            what, percent
        )));
    }
    Ok(())
}

/// Validate that an identity is not the zero address
pub fn validate_address(address: &Address, what: &str) -> TokenResult<()> {
    if address.is_zero() {
        return Err(TokenError::Validation(format!(
            "{} cannot be the zero address",
            what
        )));
    }
    Ok(())
}
