//! Wallet and holding records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::error::Notice;

/// Symbol used for the chain's native asset.
pub const NATIVE_SYMBOL: &str = "ETH";
pub const NATIVE_NAME: &str = "Ethereum";

/// A chain account address in normalized (lowercase, `0x`-prefixed) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(input: &str) -> Result<Self, Notice> {
        let trimmed = input.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| Notice::InvalidAddress(input.to_string()))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Notice::InvalidAddress(input.to_string()));
        }

        Ok(Address(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened `0x1234…abcd` form for tables.
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = Notice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Notice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type WalletId = u64;

/// A single asset position inside a wallet.
///
/// Value is never stored; it is always `balance * price` so a later price
/// update can't drift away from the balance it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub balance: f64,
    pub price: f64,
    pub is_native: bool,
}

impl Holding {
    pub fn native(balance: f64, price: f64) -> Self {
        Holding {
            symbol: NATIVE_SYMBOL.to_string(),
            name: NATIVE_NAME.to_string(),
            balance: non_negative(balance),
            price: non_negative(price),
            is_native: true,
        }
    }

    pub fn token(symbol: &str, name: &str, balance: f64, price: f64) -> Self {
        Holding {
            symbol: symbol.to_string(),
            name: name.to_string(),
            balance: non_negative(balance),
            price: non_negative(price),
            is_native: false,
        }
    }

    pub fn value(&self) -> f64 {
        self.value_at(self.price)
    }

    pub fn value_at(&self, price: f64) -> f64 {
        non_negative(self.balance * non_negative(price))
    }
}

/// Clamps NaN, infinities and negatives to zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A saved wallet as supplied by the wallet store.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: WalletId,
    pub owner: String,
    pub address: Address,
    pub label: Option<String>,
    pub resolved_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub holdings: Vec<Holding>,
}

impl Wallet {
    /// Label, then resolved name, then the shortened address.
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .or_else(|| self.resolved_name.clone())
            .unwrap_or_else(|| self.address.short())
    }
}

/// A wallet tracking request that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWallet {
    pub owner: String,
    pub address: Address,
    pub label: Option<String>,
}
