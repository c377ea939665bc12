//! Collaborators the effect handler reads from.
//!
//! Each trait is a seam to a service that lives outside this crate: the
//! wallet registry, rates, preferences, prompts, notifications, image
//! fetching, analytics and experiments. [`memory`] holds in-process
//! implementations and [`http`] holds the network-backed image fetcher.

pub mod http;
pub mod memory;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures_util::stream::BoxStream;
use rust_decimal::Decimal;

use crate::models::{CurrencyCode, InAppNotification, PromptId, SyncState, WalletSnapshot};

/// Failure reported by a data source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The registry has no wallet for this currency.
    #[error("no wallet for currency {0}")]
    UnknownWallet(CurrencyCode),

    /// The source stopped producing data.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// A remote fetch failed.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// Stream of items produced by a source. Ends when the source completes.
pub type SourceStream<T> = BoxStream<'static, Result<T, SourceError>>;

/// Source of truth for the user's wallets.
pub trait WalletRegistry: Send + Sync {
    /// All wallets, re-emitted whenever the list changes.
    fn wallets(&self) -> SourceStream<Vec<WalletSnapshot>>;

    /// The set of tracked currency codes, re-emitted whenever it changes.
    fn currency_codes(&self) -> SourceStream<BTreeSet<CurrencyCode>>;

    /// A single wallet, re-emitted whenever it changes.
    fn wallet(&self, currency_code: &str) -> SourceStream<WalletSnapshot>;

    /// Sync progress of a single wallet.
    fn wallet_sync_state(&self, currency_code: &str) -> SourceStream<SyncState>;
}

/// Exchange rates between crypto and fiat currencies.
///
/// Lookups may hit local storage and are allowed to block.
pub trait RatesRepository: Send + Sync {
    /// Converts `amount` of `currency_code` into `fiat_iso`, `None` when no
    /// rate is known.
    fn fiat_for_crypto(&self, amount: Decimal, currency_code: &str, fiat_iso: &str)
    -> Option<Decimal>;

    /// 24h price change of `currency_code`, in percent.
    fn price_change_percent(&self, currency_code: &str) -> Decimal;
}

/// User preferences.
pub trait Preferences: Send + Sync {
    /// ISO 4217 code of the fiat currency balances are shown in.
    fn preferred_fiat_iso(&self) -> String;
}

/// Decides which prompt, if any, the home screen shows next.
pub trait PromptPolicy: Send + Sync {
    fn next_prompt(&self) -> Option<PromptId>;

    /// Name used when reporting the prompt to analytics.
    fn prompt_name(&self, id: PromptId) -> String {
        id.as_str().to_string()
    }
}

/// Pending in-app messages.
pub trait NotificationRepository: Send + Sync {
    fn in_app_notification(&self) -> Option<InAppNotification>;
}

/// Downloads remote images ahead of display. Single attempt, no retry.
#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<(), SourceError>;
}

/// Fire-and-forget analytics.
pub trait Analytics: Send + Sync {
    fn push_event(&self, name: &str, attributes: Option<&HashMap<String, String>>);
}

/// Remote-controlled feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Experiment {
    BuyNotification,
    BuySellMenuButton,
}

/// Reports which [`Experiment`]s are switched on.
pub trait FeatureFlags: Send + Sync {
    fn is_active(&self, experiment: Experiment) -> bool;
}

/// Domain rule deciding whether the user should be nudged to buy crypto.
pub trait BuyNotificationPolicy: Send + Sync {
    fn is_buy_notification_needed(&self) -> bool;
}

/// Everything the effect handler talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub wallets: Arc<dyn WalletRegistry>,
    pub rates: Arc<dyn RatesRepository>,
    pub preferences: Arc<dyn Preferences>,
    pub prompts: Arc<dyn PromptPolicy>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub images: Arc<dyn ImageFetcher>,
    pub analytics: Arc<dyn Analytics>,
    pub experiments: Arc<dyn FeatureFlags>,
    pub buy_policy: Arc<dyn BuyNotificationPolicy>,
}
