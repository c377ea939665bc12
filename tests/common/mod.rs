//! Shared test utilities: a scripted wallet registry and collaborator setup.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use walletpulse::experiments::Experiments;
use walletpulse::models::{CurrencyCode, Event, SyncState, WalletSnapshot};
use walletpulse::rates::RatesHub;
use walletpulse::sink::EventReceiver;
use walletpulse::sources::memory::{
    MemoryNotifications, MemoryPrompts, MemoryRates, PresetImageFetcher, RecordingAnalytics,
    StaticBuyPolicy, StaticPreferences,
};
use walletpulse::sources::{Collaborators, SourceError, SourceStream, WalletRegistry};

/// How long collectors wait for another event before giving up.
pub const QUIET: Duration = Duration::from_millis(200);

/// Registry replaying preset items. Streams stay open after their items
/// so only the handler can end a subscription.
#[derive(Default)]
pub struct ScriptedRegistry {
    lists: Vec<Vec<WalletSnapshot>>,
    codes: Option<watch::Sender<BTreeSet<CurrencyCode>>>,
    balances: HashMap<CurrencyCode, Vec<Decimal>>,
    failing: HashSet<CurrencyCode>,
    sync: HashMap<CurrencyCode, Vec<SyncState>>,
    opened: Arc<Mutex<HashMap<CurrencyCode, usize>>>,
    live: Arc<Mutex<HashMap<CurrencyCode, usize>>>,
}

/// Decrements the live subscription count of a code when dropped.
struct LiveGuard {
    code: CurrencyCode,
    live: Arc<Mutex<HashMap<CurrencyCode, usize>>>,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        if let Some(count) = self.live.lock().get_mut(&self.code) {
            *count -= 1;
        }
    }
}

impl ScriptedRegistry {
    pub fn with_lists(mut self, lists: Vec<Vec<WalletSnapshot>>) -> Self {
        self.lists = lists;
        self
    }

    pub fn with_codes(mut self, codes: &[&str]) -> Self {
        self.codes = Some(watch::channel(code_set(codes)).0);
        self
    }

    pub fn with_balances(mut self, code: &str, balances: Vec<Decimal>) -> Self {
        self.balances.insert(code.to_string(), balances);
        self
    }

    /// Makes `wallet(code)` yield an error after its preset balances.
    pub fn with_balance_failure(mut self, code: &str) -> Self {
        self.failing.insert(code.to_string());
        self
    }

    pub fn with_sync(mut self, code: &str, states: Vec<SyncState>) -> Self {
        self.sync.insert(code.to_string(), states);
        self
    }

    /// Publishes a new code set.
    pub fn set_codes(&self, codes: &[&str]) {
        if let Some(tx) = &self.codes {
            tx.send_replace(code_set(codes));
        }
    }

    /// Number of `wallet(code)` subscriptions ever opened.
    pub fn opened(&self, code: &str) -> usize {
        self.opened.lock().get(code).copied().unwrap_or(0)
    }

    /// Number of `wallet(code)` subscriptions still held by a subscriber.
    pub fn live(&self, code: &str) -> usize {
        self.live.lock().get(code).copied().unwrap_or(0)
    }

    fn track(&self, code: &str) -> LiveGuard {
        *self.opened.lock().entry(code.to_string()).or_default() += 1;
        *self.live.lock().entry(code.to_string()).or_default() += 1;
        LiveGuard {
            code: code.to_string(),
            live: Arc::clone(&self.live),
        }
    }
}

fn code_set(codes: &[&str]) -> BTreeSet<CurrencyCode> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn replay<T: Send + 'static>(items: Vec<T>) -> SourceStream<T> {
    replay_results(items.into_iter().map(Ok).collect())
}

fn replay_results<T: Send + 'static>(items: Vec<Result<T, SourceError>>) -> SourceStream<T> {
    stream::iter(items).chain(stream::pending()).boxed()
}

impl WalletRegistry for ScriptedRegistry {
    fn wallets(&self) -> SourceStream<Vec<WalletSnapshot>> {
        replay(self.lists.clone())
    }

    fn currency_codes(&self) -> SourceStream<BTreeSet<CurrencyCode>> {
        match &self.codes {
            Some(tx) => WatchStream::new(tx.subscribe()).map(Ok).boxed(),
            None => replay(Vec::new()),
        }
    }

    fn wallet(&self, currency_code: &str) -> SourceStream<WalletSnapshot> {
        let guard = self.track(currency_code);
        let mut items: Vec<Result<WalletSnapshot, SourceError>> = self
            .balances
            .get(currency_code)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|balance| {
                Ok(WalletSnapshot::new(
                    currency_code,
                    currency_code.to_uppercase(),
                    balance,
                ))
            })
            .collect();
        if self.failing.contains(currency_code) {
            items.push(Err(SourceError::Unavailable(format!(
                "{currency_code} wallet offline"
            ))));
        }
        replay_results(items)
            .map(move |item| {
                let _guard = &guard;
                item
            })
            .boxed()
    }

    fn wallet_sync_state(&self, currency_code: &str) -> SourceStream<SyncState> {
        replay(self.sync.get(currency_code).cloned().unwrap_or_default())
    }
}

/// Handles to the in-memory collaborators behind a [`Collaborators`] set.
pub struct Fixtures {
    pub sources: Collaborators,
    pub hub: Arc<RatesHub>,
    pub rates: Arc<MemoryRates>,
    pub prompts: Arc<MemoryPrompts>,
    pub notifications: Arc<MemoryNotifications>,
    pub analytics: Arc<RecordingAnalytics>,
    pub images: Arc<PresetImageFetcher>,
}

/// Knobs for [`Setup::build`].
pub struct Setup {
    pub fiat: &'static str,
    pub experiments: Experiments,
    pub buy_needed: bool,
    pub images: PresetImageFetcher,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            fiat: "USD",
            experiments: Experiments::default(),
            buy_needed: true,
            images: PresetImageFetcher::succeeding(),
        }
    }
}

impl Setup {
    pub fn build(self, wallets: Arc<dyn WalletRegistry>) -> Fixtures {
        let hub = Arc::new(RatesHub::new());
        let rates = Arc::new(MemoryRates::new(Arc::clone(&hub)));
        let prompts = Arc::new(MemoryPrompts::default());
        let notifications = Arc::new(MemoryNotifications::default());
        let analytics = Arc::new(RecordingAnalytics::default());
        let images = Arc::new(self.images);

        let sources = Collaborators {
            wallets,
            rates: rates.clone(),
            preferences: Arc::new(StaticPreferences::new(self.fiat)),
            prompts: prompts.clone(),
            notifications: notifications.clone(),
            images: images.clone(),
            analytics: analytics.clone(),
            experiments: Arc::new(self.experiments),
            buy_policy: Arc::new(StaticBuyPolicy(self.buy_needed)),
        };

        Fixtures {
            sources,
            hub,
            rates,
            prompts,
            notifications,
            analytics,
            images,
        }
    }
}

/// Receives events until none arrives for [`QUIET`].
pub async fn collect(events: &mut EventReceiver) -> Vec<Event> {
    let mut received = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(QUIET, events.recv()).await {
        received.push(event);
    }
    received
}

/// Balances of the `WalletBalanceUpdated` events for `code`, in order.
pub fn balances_for(events: &[Event], code: &str) -> Vec<Decimal> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::WalletBalanceUpdated {
                currency_code,
                balance,
                ..
            } if currency_code == code => Some(*balance),
            _ => None,
        })
        .collect()
}

pub fn sync_state(code: &str, percent_complete: f32, timestamp: i64) -> SyncState {
    SyncState {
        currency_code: code.to_string(),
        percent_complete,
        timestamp,
        is_syncing: percent_complete < 1.0,
    }
}
