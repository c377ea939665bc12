//! Wallet models: what the registry streams and what the UI displays.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CurrencyCode;

/// A wallet as reported by the wallet registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub currency_code: CurrencyCode,
    /// Human-readable currency name (e.g. "Bitcoin").
    pub currency_name: String,
    /// Balance in the currency's display unit.
    pub balance: Decimal,
}

impl WalletSnapshot {
    pub fn new(
        currency_code: impl Into<CurrencyCode>,
        currency_name: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        Self {
            currency_code: currency_code.into(),
            currency_name: currency_name.into(),
            balance,
        }
    }
}

/// Sync progress for a single wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub currency_code: CurrencyCode,
    /// Completion in `0.0..=1.0`.
    pub percent_complete: f32,
    /// Milliseconds since the epoch the chain is synced through.
    pub timestamp: i64,
    pub is_syncing: bool,
}

/// Display model of a wallet on the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub currency_name: String,
    pub currency_code: CurrencyCode,
    pub fiat_price_per_unit: Decimal,
    pub balance: Decimal,
    pub fiat_balance: Decimal,
    pub sync_progress: f32,
    pub syncing_through_millis: i64,
    /// 24h price change in percent.
    pub price_change: Decimal,
}
