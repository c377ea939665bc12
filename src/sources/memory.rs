//! In-process sources backed by tokio `watch` channels and plain maps.
//!
//! Used by the demo binary and the tests. The wallet registry behaves like
//! a state holder: every subscriber first sees the current value, then
//! each change. Intermediate values may be coalesced for slow subscribers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use super::{
    Analytics, BuyNotificationPolicy, ImageFetcher, NotificationRepository, Preferences,
    PromptPolicy, RatesRepository, SourceError, SourceStream, WalletRegistry,
};
use crate::models::{CurrencyCode, InAppNotification, PromptId, SyncState, WalletSnapshot};
use crate::rates::RatesHub;

struct TrackedWallet {
    wallet: watch::Sender<WalletSnapshot>,
    sync: watch::Sender<SyncState>,
}

/// Wallet registry holding its state in memory.
pub struct MemoryWalletRegistry {
    list: watch::Sender<Vec<WalletSnapshot>>,
    codes: watch::Sender<BTreeSet<CurrencyCode>>,
    tracked: RwLock<BTreeMap<CurrencyCode, TrackedWallet>>,
}

impl MemoryWalletRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            list: watch::channel(Vec::new()).0,
            codes: watch::channel(BTreeSet::new()).0,
            tracked: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds a wallet, or replaces it if the currency is already tracked.
    pub fn add_wallet(&self, snapshot: WalletSnapshot) {
        let code = snapshot.currency_code.clone();
        {
            let mut tracked = self.tracked.write();
            match tracked.get(&code) {
                Some(existing) => {
                    existing.wallet.send_replace(snapshot);
                }
                None => {
                    let sync = SyncState {
                        currency_code: code.clone(),
                        percent_complete: 0.0,
                        timestamp: 0,
                        is_syncing: false,
                    };
                    tracked.insert(
                        code.clone(),
                        TrackedWallet {
                            wallet: watch::channel(snapshot).0,
                            sync: watch::channel(sync).0,
                        },
                    );
                }
            }
        }
        debug!(currency_code = %code, "wallet added to registry");
        self.publish();
    }

    /// Stops tracking a wallet. Open subscriptions to it end.
    pub fn remove_wallet(&self, currency_code: &str) -> Option<WalletSnapshot> {
        let removed = self.tracked.write().remove(currency_code)?;
        self.publish();
        Some(removed.wallet.borrow().clone())
    }

    /// Sets the balance of a tracked wallet.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownWallet`] if the currency is not tracked.
    pub fn set_balance(&self, currency_code: &str, balance: Decimal) -> Result<(), SourceError> {
        {
            let tracked = self.tracked.read();
            let entry = tracked
                .get(currency_code)
                .ok_or_else(|| SourceError::UnknownWallet(currency_code.to_string()))?;
            entry.wallet.send_modify(|wallet| wallet.balance = balance);
        }
        self.publish();
        Ok(())
    }

    /// Publishes a new sync state for a tracked wallet.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownWallet`] if the currency is not tracked.
    pub fn set_sync_state(&self, state: SyncState) -> Result<(), SourceError> {
        let tracked = self.tracked.read();
        let entry = tracked
            .get(&state.currency_code)
            .ok_or_else(|| SourceError::UnknownWallet(state.currency_code.clone()))?;
        entry.sync.send_replace(state);
        Ok(())
    }

    /// Re-emits the list and code set from the tracked wallets.
    fn publish(&self) {
        let tracked = self.tracked.read();
        let list: Vec<WalletSnapshot> = tracked
            .values()
            .map(|entry| entry.wallet.borrow().clone())
            .collect();
        let codes: BTreeSet<CurrencyCode> = tracked.keys().cloned().collect();
        drop(tracked);

        self.list.send_replace(list);
        self.codes.send_if_modified(|current| {
            if *current == codes {
                false
            } else {
                *current = codes;
                true
            }
        });
    }
}

impl Default for MemoryWalletRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_wallet<T: Send + 'static>(currency_code: &str) -> SourceStream<T> {
    stream::once(std::future::ready(Err(SourceError::UnknownWallet(
        currency_code.to_string(),
    ))))
    .boxed()
}

impl WalletRegistry for MemoryWalletRegistry {
    fn wallets(&self) -> SourceStream<Vec<WalletSnapshot>> {
        WatchStream::new(self.list.subscribe()).map(Ok).boxed()
    }

    fn currency_codes(&self) -> SourceStream<BTreeSet<CurrencyCode>> {
        WatchStream::new(self.codes.subscribe()).map(Ok).boxed()
    }

    fn wallet(&self, currency_code: &str) -> SourceStream<WalletSnapshot> {
        match self.tracked.read().get(currency_code) {
            Some(entry) => WatchStream::new(entry.wallet.subscribe()).map(Ok).boxed(),
            None => unknown_wallet(currency_code),
        }
    }

    fn wallet_sync_state(&self, currency_code: &str) -> SourceStream<SyncState> {
        match self.tracked.read().get(currency_code) {
            Some(entry) => WatchStream::new(entry.sync.subscribe()).map(Ok).boxed(),
            None => unknown_wallet(currency_code),
        }
    }
}

/// Exchange rates held in memory. Every change notifies the [`RatesHub`].
pub struct MemoryRates {
    hub: Arc<RatesHub>,
    prices: RwLock<HashMap<(CurrencyCode, String), Decimal>>,
    changes: RwLock<HashMap<CurrencyCode, Decimal>>,
}

impl MemoryRates {
    #[must_use]
    pub fn new(hub: Arc<RatesHub>) -> Self {
        Self {
            hub,
            prices: RwLock::new(HashMap::new()),
            changes: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the price of one unit of `currency_code` in `fiat_iso`.
    pub fn set_rate(&self, currency_code: &str, fiat_iso: &str, price: Decimal) {
        self.prices
            .write()
            .insert((currency_code.to_string(), fiat_iso.to_string()), price);
        self.hub.notify();
    }

    /// Sets the 24h price change of `currency_code`, in percent.
    pub fn set_price_change(&self, currency_code: &str, percent: Decimal) {
        self.changes
            .write()
            .insert(currency_code.to_string(), percent);
        self.hub.notify();
    }
}

impl RatesRepository for MemoryRates {
    fn fiat_for_crypto(
        &self,
        amount: Decimal,
        currency_code: &str,
        fiat_iso: &str,
    ) -> Option<Decimal> {
        self.prices
            .read()
            .get(&(currency_code.to_string(), fiat_iso.to_string()))
            .map(|price| amount * price)
    }

    fn price_change_percent(&self, currency_code: &str) -> Decimal {
        self.changes
            .read()
            .get(currency_code)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Preferences with a fixed fiat currency.
#[derive(Debug, Clone)]
pub struct StaticPreferences {
    pub fiat_iso: String,
}

impl StaticPreferences {
    pub fn new(fiat_iso: impl Into<String>) -> Self {
        Self {
            fiat_iso: fiat_iso.into(),
        }
    }
}

impl Preferences for StaticPreferences {
    fn preferred_fiat_iso(&self) -> String {
        self.fiat_iso.clone()
    }
}

/// Prompt policy that returns whatever prompt was last set.
#[derive(Default)]
pub struct MemoryPrompts {
    next: Mutex<Option<PromptId>>,
}

impl MemoryPrompts {
    pub fn set_next(&self, prompt: Option<PromptId>) {
        *self.next.lock() = prompt;
    }
}

impl PromptPolicy for MemoryPrompts {
    fn next_prompt(&self) -> Option<PromptId> {
        *self.next.lock()
    }
}

/// Notification repository holding at most one pending notification.
#[derive(Default)]
pub struct MemoryNotifications {
    pending: Mutex<Option<InAppNotification>>,
}

impl MemoryNotifications {
    pub fn set(&self, notification: Option<InAppNotification>) {
        *self.pending.lock() = notification;
    }
}

impl NotificationRepository for MemoryNotifications {
    fn in_app_notification(&self) -> Option<InAppNotification> {
        self.pending.lock().clone()
    }
}

/// One analytics event as recorded by [`RecordingAnalytics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRecord {
    pub name: String,
    pub attributes: Option<HashMap<String, String>>,
}

/// Analytics sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAnalytics {
    records: Mutex<Vec<AnalyticsRecord>>,
}

impl RecordingAnalytics {
    /// Returns all recorded events, oldest first.
    pub fn records(&self) -> Vec<AnalyticsRecord> {
        self.records.lock().clone()
    }
}

impl Analytics for RecordingAnalytics {
    fn push_event(&self, name: &str, attributes: Option<&HashMap<String, String>>) {
        debug!(event = name, ?attributes, "analytics event");
        self.records.lock().push(AnalyticsRecord {
            name: name.to_string(),
            attributes: attributes.cloned(),
        });
    }
}

/// Buy notification rule with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticBuyPolicy(pub bool);

impl BuyNotificationPolicy for StaticBuyPolicy {
    fn is_buy_notification_needed(&self) -> bool {
        self.0
    }
}

/// Image fetcher with a preset outcome that records requested URLs.
pub struct PresetImageFetcher {
    succeed: bool,
    requested: Mutex<Vec<String>>,
}

impl PresetImageFetcher {
    #[must_use]
    pub fn succeeding() -> Self {
        Self {
            succeed: true,
            requested: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            succeed: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// URLs passed to [`ImageFetcher::fetch`], oldest first.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

#[async_trait::async_trait]
impl ImageFetcher for PresetImageFetcher {
    async fn fetch(&self, url: &str) -> Result<(), SourceError> {
        self.requested.lock().push(url.to_string());
        if self.succeed {
            Ok(())
        } else {
            Err(SourceError::Fetch {
                url: url.to_string(),
                reason: "preset failure".to_string(),
            })
        }
    }
}
