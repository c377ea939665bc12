use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info};

use walletpulse::config::{AppConfig, fetch_config};
use walletpulse::experiments::Experiments;
use walletpulse::models::{Effect, InAppNotification, PromptId, SyncState, WalletSnapshot};
use walletpulse::rates::RatesHub;
use walletpulse::sink;
use walletpulse::sources::Collaborators;
use walletpulse::sources::http::HttpImageFetcher;
use walletpulse::sources::memory::{
    MemoryNotifications, MemoryPrompts, MemoryRates, MemoryWalletRegistry, RecordingAnalytics,
    StaticBuyPolicy, StaticPreferences,
};
use walletpulse::state::HomeState;
use walletpulse::{EffectHandler, PulseError};

/// How long the event loop waits for another event before the session ends.
const QUIET_PERIOD: Duration = Duration::from_millis(250);

fn main() -> Result<(), PulseError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(app_config.runtime.worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(run(app_config))
}

async fn run(config: AppConfig) -> Result<(), PulseError> {
    let experiments = match &config.experiments_path {
        Some(path) => Experiments::load(path)?,
        None => Experiments {
            buy_notification: true,
            buy_sell_menu_button: true,
        },
    };
    let fiat = config.fiat_iso.as_str();

    let hub = Arc::new(RatesHub::new());
    let registry = Arc::new(MemoryWalletRegistry::new());
    registry.add_wallet(WalletSnapshot::new("btc", "Bitcoin", Decimal::new(5, 1)));
    registry.add_wallet(WalletSnapshot::new("eth", "Ethereum", Decimal::new(12, 0)));

    let rates = Arc::new(MemoryRates::new(Arc::clone(&hub)));
    rates.set_rate("btc", fiat, Decimal::new(42_000, 0));
    rates.set_rate("eth", fiat, Decimal::new(2_300, 0));
    rates.set_price_change("btc", Decimal::new(-125, 2));

    let prompts = Arc::new(MemoryPrompts::default());
    prompts.set_next(Some(PromptId::PaperKey));

    let notifications = Arc::new(MemoryNotifications::default());
    notifications.set(Some(InAppNotification {
        id: "welcome".to_string(),
        title: "Welcome back".to_string(),
        body: "Your wallets are syncing.".to_string(),
        cta: None,
        cta_url: None,
        image_url: None,
    }));

    let analytics = Arc::new(RecordingAnalytics::default());

    let sources = Collaborators {
        wallets: registry.clone(),
        rates: rates.clone(),
        preferences: Arc::new(StaticPreferences::new(fiat)),
        prompts,
        notifications,
        images: Arc::new(HttpImageFetcher::new(config.image_timeout)?),
        analytics: analytics.clone(),
        experiments: Arc::new(experiments),
        buy_policy: Arc::new(StaticBuyPolicy(true)),
    };

    let (sink, mut events) = sink::channel();
    let handler = EffectHandler::new(sources, &hub, sink)?;

    for effect in [
        Effect::LoadWallets,
        Effect::LoadPrompt,
        Effect::LoadBuyBellState,
        Effect::CheckInAppNotification,
        Effect::CheckBuySellVisibility,
        Effect::RecordPushOpened {
            campaign_id: "demo".to_string(),
        },
    ] {
        handler.accept(effect);
    }

    // Let the subscriptions deliver the initial state before changing it.
    tokio::time::sleep(QUIET_PERIOD).await;
    registry.set_balance("btc", Decimal::new(75, 2))?;
    registry.set_sync_state(SyncState {
        currency_code: "eth".to_string(),
        percent_complete: 0.4,
        timestamp: 1_700_000_000_000,
        is_syncing: true,
    })?;
    rates.set_rate("eth", fiat, Decimal::new(2_450, 0));

    let mut state = HomeState::default();
    let mut received = 0usize;
    while let Ok(Some(event)) = tokio::time::timeout(QUIET_PERIOD, events.recv()).await {
        debug!(event = %serde_json::to_string(&event)?, "event received");
        state.update(event);
        received += 1;
    }

    for wallet in state.wallets.values() {
        info!(
            currency_code = %wallet.currency_code,
            balance = %wallet.balance,
            fiat_balance = %wallet.fiat_balance,
            sync_progress = wallet.sync_progress,
            "wallet"
        );
    }
    info!(
        events = received,
        analytics = analytics.records().len(),
        total = %state.total_fiat_balance(),
        fiat,
        prompt = ?state.prompt,
        buy_bell = state.buy_bell_needed,
        buy_and_sell = state.show_buy_and_sell,
        "home screen ready"
    );

    handler.dispose();
    Ok(())
}
