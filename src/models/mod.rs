//! Shared models for the home screen effect loop.
//!
//! Contains the [`Effect`] commands the UI sends in, the [`Event`] facts the
//! handler sends out, and the value types both of them carry.

pub mod notification;
pub mod prompt;
pub mod wallet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use notification::InAppNotification;
pub use prompt::PromptId;
pub use wallet::{SyncState, Wallet, WalletSnapshot};

/// Currency ticker used as the unique key of a wallet (e.g. `"btc"`).
pub type CurrencyCode = String;

/// Commands requesting work from the effect handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start tracking the wallet list, balances and sync progress.
    LoadWallets,
    /// Pick the next prompt to show, if any.
    LoadPrompt,
    /// Decide whether the buy bell should be shown.
    LoadBuyBellState,
    /// Look for a pending in-app notification.
    CheckInAppNotification,
    /// Decide whether the buy and sell menu button should be shown.
    CheckBuySellVisibility,
    /// Record that the app was opened from a push notification.
    RecordPushOpened { campaign_id: String },
}

/// Facts emitted by the effect handler to the output sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The full wallet list, rebuilt from the registry.
    WalletsAdded { wallets: Vec<Wallet> },
    /// A wallet's balance or its fiat valuation changed.
    WalletBalanceUpdated {
        currency_code: CurrencyCode,
        balance: Decimal,
        fiat_balance: Decimal,
        fiat_price_per_unit: Decimal,
        price_change: Decimal,
    },
    /// A wallet reported sync progress.
    WalletSyncProgressUpdated {
        currency_code: CurrencyCode,
        progress: f32,
        sync_through_millis: i64,
        is_syncing: bool,
    },
    /// The prompt to show, `None` when nothing is due.
    PromptLoaded { id: Option<PromptId> },
    BuyBellNeededLoaded { needed: bool },
    InAppNotificationProvided { notification: InAppNotification },
    ShowBuyAndSell { show: bool },
}

impl Event {
    /// Returns the currency code for per-wallet events.
    pub fn currency_code(&self) -> Option<&str> {
        match self {
            Event::WalletBalanceUpdated { currency_code, .. }
            | Event::WalletSyncProgressUpdated { currency_code, .. } => Some(currency_code),
            _ => None,
        }
    }
}
