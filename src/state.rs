//! Home screen state folded from handler events.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{CurrencyCode, Event, InAppNotification, PromptId, Wallet};

/// What the home screen shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeState {
    /// Wallets keyed by currency code.
    pub wallets: BTreeMap<CurrencyCode, Wallet>,
    pub prompt: Option<PromptId>,
    pub buy_bell_needed: bool,
    pub notification: Option<InAppNotification>,
    pub show_buy_and_sell: bool,
}

impl HomeState {
    /// Applies one event to the state.
    ///
    /// Balance and sync updates for wallets not yet in the list are ignored;
    /// they arrive again once the wallet list catches up.
    pub fn update(&mut self, event: Event) {
        match event {
            Event::WalletsAdded { wallets } => {
                let mut next = BTreeMap::new();
                for mut wallet in wallets {
                    // Sync progress only arrives through sync events.
                    if let Some(existing) = self.wallets.get(&wallet.currency_code) {
                        wallet.sync_progress = existing.sync_progress;
                        wallet.syncing_through_millis = existing.syncing_through_millis;
                    }
                    next.insert(wallet.currency_code.clone(), wallet);
                }
                self.wallets = next;
            }
            Event::WalletBalanceUpdated {
                currency_code,
                balance,
                fiat_balance,
                fiat_price_per_unit,
                price_change,
            } => {
                if let Some(wallet) = self.wallets.get_mut(&currency_code) {
                    wallet.balance = balance;
                    wallet.fiat_balance = fiat_balance;
                    wallet.fiat_price_per_unit = fiat_price_per_unit;
                    wallet.price_change = price_change;
                }
            }
            Event::WalletSyncProgressUpdated {
                currency_code,
                progress,
                sync_through_millis,
                ..
            } => {
                if let Some(wallet) = self.wallets.get_mut(&currency_code) {
                    wallet.sync_progress = progress;
                    wallet.syncing_through_millis = sync_through_millis;
                }
            }
            Event::PromptLoaded { id } => self.prompt = id,
            Event::BuyBellNeededLoaded { needed } => self.buy_bell_needed = needed,
            Event::InAppNotificationProvided { notification } => {
                self.notification = Some(notification);
            }
            Event::ShowBuyAndSell { show } => self.show_buy_and_sell = show,
        }
    }

    /// Sum of every wallet's fiat balance.
    pub fn total_fiat_balance(&self) -> Decimal {
        self.wallets.values().map(|w| w.fiat_balance).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wallet(code: &str, balance: Decimal, fiat_balance: Decimal) -> Wallet {
        Wallet {
            currency_name: code.to_uppercase(),
            currency_code: code.to_string(),
            fiat_price_per_unit: Decimal::ZERO,
            balance,
            fiat_balance,
            sync_progress: 0.0,
            syncing_through_millis: 0,
            price_change: Decimal::ZERO,
        }
    }

    #[test]
    fn wallets_added_replaces_list_and_keeps_sync_progress() {
        let mut state = HomeState::default();
        state.update(Event::WalletsAdded {
            wallets: vec![wallet("btc", dec!(1), dec!(100)), wallet("eth", dec!(2), dec!(10))],
        });
        state.update(Event::WalletSyncProgressUpdated {
            currency_code: "btc".to_string(),
            progress: 0.75,
            sync_through_millis: 1_700_000_000_000,
            is_syncing: true,
        });

        state.update(Event::WalletsAdded {
            wallets: vec![wallet("btc", dec!(1), dec!(120))],
        });

        assert_eq!(state.wallets.len(), 1);
        let btc = &state.wallets["btc"];
        assert_eq!(btc.sync_progress, 0.75);
        assert_eq!(btc.syncing_through_millis, 1_700_000_000_000);
        assert_eq!(btc.fiat_balance, dec!(120));
    }

    #[test]
    fn balance_update_changes_wallet_and_total() {
        let mut state = HomeState::default();
        state.update(Event::WalletsAdded {
            wallets: vec![wallet("btc", dec!(1), dec!(100)), wallet("eth", dec!(2), dec!(10))],
        });
        state.update(Event::WalletBalanceUpdated {
            currency_code: "eth".to_string(),
            balance: dec!(3),
            fiat_balance: dec!(15),
            fiat_price_per_unit: dec!(5),
            price_change: dec!(0.4),
        });

        assert_eq!(state.wallets["eth"].balance, dec!(3));
        assert_eq!(state.total_fiat_balance(), dec!(115));
    }

    #[test]
    fn updates_for_unknown_wallet_ignored() {
        let mut state = HomeState::default();
        state.update(Event::WalletBalanceUpdated {
            currency_code: "ltc".to_string(),
            balance: dec!(1),
            fiat_balance: dec!(1),
            fiat_price_per_unit: dec!(1),
            price_change: dec!(0),
        });
        assert!(state.wallets.is_empty());
        assert_eq!(state.total_fiat_balance(), Decimal::ZERO);
    }

    #[test]
    fn one_shot_events_set_flags() {
        let mut state = HomeState::default();
        state.update(Event::PromptLoaded {
            id: Some(PromptId::PaperKey),
        });
        state.update(Event::BuyBellNeededLoaded { needed: true });
        state.update(Event::ShowBuyAndSell { show: true });

        assert_eq!(state.prompt, Some(PromptId::PaperKey));
        assert!(state.buy_bell_needed);
        assert!(state.show_buy_and_sell);

        state.update(Event::PromptLoaded { id: None });
        assert_eq!(state.prompt, None);
    }
}
