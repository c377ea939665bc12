//! A full home screen session: effects in, events folded into state.

mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;

use walletpulse::EffectHandler;
use walletpulse::experiments::Experiments;
use walletpulse::models::{Effect, PromptId, SyncState, WalletSnapshot};
use walletpulse::sink;
use walletpulse::sources::memory::MemoryWalletRegistry;
use walletpulse::state::HomeState;

use common::{Setup, collect};

#[tokio::test]
async fn test_session_folds_into_home_state() {
    let registry = Arc::new(MemoryWalletRegistry::new());
    registry.add_wallet(WalletSnapshot::new("btc", "Bitcoin", dec!(0.5)));
    registry.add_wallet(WalletSnapshot::new("eth", "Ethereum", dec!(2)));
    let setup = Setup {
        experiments: Experiments {
            buy_notification: true,
            buy_sell_menu_button: true,
        },
        ..Setup::default()
    };
    let fixtures = setup.build(registry.clone());
    fixtures.rates.set_rate("btc", "USD", dec!(40000));
    fixtures.rates.set_rate("eth", "USD", dec!(2000));
    fixtures.prompts.set_next(Some(PromptId::EmailCollection));

    let (sink, mut events) = sink::channel();
    let handler = EffectHandler::new(fixtures.sources, &fixtures.hub, sink).unwrap();
    let mut state = HomeState::default();

    for effect in [
        Effect::LoadWallets,
        Effect::LoadPrompt,
        Effect::LoadBuyBellState,
        Effect::CheckBuySellVisibility,
    ] {
        handler.accept(effect);
    }
    for event in collect(&mut events).await {
        state.update(event);
    }

    assert_eq!(state.wallets.len(), 2);
    assert_eq!(state.total_fiat_balance(), dec!(24000));
    assert_eq!(state.prompt, Some(PromptId::EmailCollection));
    assert!(state.buy_bell_needed);
    assert!(state.show_buy_and_sell);

    registry.set_balance("eth", dec!(3)).unwrap();
    registry
        .set_sync_state(SyncState {
            currency_code: "btc".to_string(),
            percent_complete: 0.5,
            timestamp: 1_600_000_000_000,
            is_syncing: true,
        })
        .unwrap();
    for event in collect(&mut events).await {
        state.update(event);
    }

    assert_eq!(state.wallets["eth"].balance, dec!(3));
    assert_eq!(state.wallets["btc"].sync_progress, 0.5);
    assert_eq!(state.total_fiat_balance(), dec!(26000));

    fixtures.rates.set_rate("btc", "USD", dec!(50000));
    for event in collect(&mut events).await {
        state.update(event);
    }

    assert_eq!(state.wallets["btc"].fiat_price_per_unit, dec!(50000));
    assert_eq!(state.total_fiat_balance(), dec!(31000));

    handler.dispose();
}
