//! Fiat valuation of wallets at the moment an event is built.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::models::{Event, Wallet, WalletSnapshot};
use crate::sources::{Preferences, RatesRepository};

/// Looks up rates in the user's preferred fiat currency.
#[derive(Clone)]
pub(crate) struct Pricing {
    rates: Arc<dyn RatesRepository>,
    preferences: Arc<dyn Preferences>,
}

impl Pricing {
    pub(crate) fn new(rates: Arc<dyn RatesRepository>, preferences: Arc<dyn Preferences>) -> Self {
        Self { rates, preferences }
    }

    fn to_fiat(&self, amount: Decimal, currency_code: &str) -> Decimal {
        let fiat_iso = self.preferences.preferred_fiat_iso();
        self.rates
            .fiat_for_crypto(amount, currency_code, &fiat_iso)
            .unwrap_or(Decimal::ZERO)
    }

    /// Display model with sync fields zeroed; sync events fill them in.
    pub(crate) fn wallet(&self, snapshot: &WalletSnapshot) -> Wallet {
        let code = &snapshot.currency_code;
        Wallet {
            currency_name: snapshot.currency_name.clone(),
            currency_code: code.clone(),
            fiat_price_per_unit: self.to_fiat(Decimal::ONE, code),
            balance: snapshot.balance,
            fiat_balance: self.to_fiat(snapshot.balance, code),
            sync_progress: 0.0,
            syncing_through_millis: 0,
            price_change: self.rates.price_change_percent(code),
        }
    }

    pub(crate) fn wallets(&self, snapshots: &[WalletSnapshot]) -> Vec<Wallet> {
        snapshots.iter().map(|s| self.wallet(s)).collect()
    }

    pub(crate) fn balance_updated(&self, currency_code: &str, balance: Decimal) -> Event {
        Event::WalletBalanceUpdated {
            currency_code: currency_code.to_string(),
            balance,
            fiat_balance: self.to_fiat(balance, currency_code),
            fiat_price_per_unit: self.to_fiat(Decimal::ONE, currency_code),
            price_change: self.rates.price_change_percent(currency_code),
        }
    }
}
