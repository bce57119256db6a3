//! Core types and data structures for the token ledger and sale

use chrono::NaiveDateTime;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Token amounts and currency values, in indivisible base units
pub type Balance = u128;

pub const ADDRESS_SIZE: usize = 20;

/// Opaque fixed-length account identity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    pub const fn zero() -> Self {
        Address::new([0; ADDRESS_SIZE])
    }

    /// Derive an address from arbitrary seed bytes (last 20 bytes of Keccak-256)
    pub fn derive(seed: &[u8]) -> Self {
        let digest = Keccak256::digest(seed);
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&digest[digest.len() - ADDRESS_SIZE..]);
        Address(bytes)
    }

    /// Deterministic address of the `nonce`-th contract created by `deployer`
    pub fn contract(deployer: &Address, nonce: u64) -> Self {
        let mut seed = Vec::with_capacity(ADDRESS_SIZE + 8);
        seed.extend_from_slice(deployer.as_bytes());
        seed.extend_from_slice(&nonce.to_be_bytes());
        Address::derive(&seed)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_SIZE]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| TokenError::Validation(format!("Invalid address '{}': {}", s, e)))?;
        let bytes: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| {
            TokenError::Validation(format!(
                "Invalid address '{}': expected {} bytes",
                s, ADDRESS_SIZE
            ))
        })?;
        Ok(Address::new(bytes))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(SerdeError::custom)
    }
}

/// Static token metadata fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    /// Free-form standard/version string, e.g. "DApp Token v1.0"
    pub standard: String,
    pub total_supply: Balance,
}

/// Notifications produced by successful state changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Ledger balance moved from one account to another
    Transfer {
        from: Address,
        to: Address,
        value: Balance,
    },
    /// Delegated-spend budget set by `owner` for `spender`
    Approval {
        owner: Address,
        spender: Address,
        value: Balance,
    },
    /// Tokens bought from the sale
    Sell { buyer: Address, amount: Balance },
}

impl Event {
    /// Event name as shown to clients
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::Sell { .. } => "Sell",
        }
    }
}

/// Outcome of one committed state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Correlates the receipt with its entries in the event log
    pub id: Uuid,
    /// Events emitted by the change, in emission order
    pub events: Vec<Event>,
    pub committed_at: NaiveDateTime,
}

impl Receipt {
    /// Events of the given kind, e.g. `receipt.events_named("Sell")`
    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.name() == name)
    }
}

/// Entry of the append-only event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log, starting at zero
    pub sequence: u64,
    pub receipt_id: Uuid,
    pub event: Event,
    pub recorded_at: NaiveDateTime,
}

/// Errors that can occur in ledger and sale operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Insufficient balance on {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: Address,
        available: Balance,
        required: Balance,
    },
    #[error("Insufficient allowance for {spender} on {owner}: available {available}, required {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: Balance,
        required: Balance,
    },
    #[error("Insufficient sale inventory: available {available}, requested {requested}")]
    InsufficientInventory {
        available: Balance,
        requested: Balance,
    },
    #[error("Incorrect payment: expected {expected}, received {received}")]
    IncorrectPayment { expected: Balance, received: Balance },
    #[error("Unauthorized caller: {0}")]
    Unauthorized(Address),
    #[error("Sale has ended")]
    SaleClosed,
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for ledger and sale operations
pub type TokenResult<T> = Result<T, TokenError>;
