//! Stream reconciliation for the wallet list, balances and sync progress.
//!
//! Every function here runs as one task owned by the effect handler. The
//! per-currency functions fan out through [`KeyedTasks`], so a failing or
//! slow wallet only affects its own subscription.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::pricing::Pricing;
use super::tasks::KeyedTasks;
use crate::models::{CurrencyCode, Event, Wallet};
use crate::sink::OutputSink;
use crate::sources::WalletRegistry;

/// How long a rates refresh waits for the code set or a wallet's current value.
const REFRESH_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Emits `WalletsAdded` for every wallet list the registry publishes.
///
/// Mapping a list prices every wallet, which may block on the rates
/// repository, so it runs on the blocking pool. Only the newest list is
/// mapped: a list arriving while an older one is still being priced
/// replaces it, and the older result is discarded.
pub(crate) async fn watch_wallet_list(
    registry: Arc<dyn WalletRegistry>,
    pricing: Pricing,
    sink: Arc<OutputSink>,
) {
    let mut lists = registry.wallets();
    let mut pending: Option<JoinHandle<Vec<Wallet>>> = None;
    let mut exhausted = false;

    loop {
        tokio::select! {
            biased;

            next = lists.next(), if !exhausted => match next {
                Some(Ok(snapshots)) => {
                    if let Some(stale) = pending.take() {
                        debug!("wallet list superseded, abandoning previous mapping");
                        stale.abort();
                    }
                    let pricing = pricing.clone();
                    pending = Some(tokio::task::spawn_blocking(move || {
                        pricing.wallets(&snapshots)
                    }));
                }
                Some(Err(e)) => {
                    warn!(error = %e, "wallet list subscription failed");
                    exhausted = true;
                }
                None => exhausted = true,
            },

            mapped = async {
                match pending.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            }, if pending.is_some() => {
                pending = None;
                match mapped {
                    Ok(wallets) => {
                        debug!(wallets = wallets.len(), "wallet list mapped");
                        if !sink.accept(Event::WalletsAdded { wallets }) {
                            break;
                        }
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => error!(error = %e, "wallet list mapping panicked"),
                }
            }

            else => break,
        }
    }

    debug!("wallet list subscription ended");
}

/// Runs `track` once per currency code in the registry's code set.
///
/// Codes that leave the set have their task aborted, codes that join get a
/// new one. When the code set stream ends the tasks already running are
/// left to finish.
async fn fan_out<F, Fut>(registry: Arc<dyn WalletRegistry>, stream_name: &'static str, track: F)
where
    F: Fn(CurrencyCode) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut code_sets = registry.currency_codes();
    let mut tasks = KeyedTasks::default();

    while let Some(item) = code_sets.next().await {
        match item {
            Ok(codes) => {
                info!(stream = stream_name, currencies = codes.len(), "subscribing");
                tasks.reconcile(&codes, |code| tokio::spawn(track(code.clone())));
            }
            Err(e) => {
                warn!(stream = stream_name, error = %e, "currency code subscription failed");
                break;
            }
        }
    }

    tasks.join().await;
}

/// Emits `WalletBalanceUpdated` whenever a wallet's balance changes.
pub(crate) async fn watch_balances(
    registry: Arc<dyn WalletRegistry>,
    pricing: Pricing,
    sink: Arc<OutputSink>,
) {
    let source = Arc::clone(&registry);
    fan_out(registry, "balance", move |code| {
        track_balance(Arc::clone(&source), code, pricing.clone(), Arc::clone(&sink))
    })
    .await;
}

async fn track_balance(
    registry: Arc<dyn WalletRegistry>,
    currency_code: CurrencyCode,
    pricing: Pricing,
    sink: Arc<OutputSink>,
) {
    let mut wallet = registry.wallet(&currency_code);
    let mut last_balance: Option<Decimal> = None;

    while let Some(item) = wallet.next().await {
        match item {
            Ok(snapshot) => {
                if last_balance == Some(snapshot.balance) {
                    continue;
                }
                last_balance = Some(snapshot.balance);

                debug!(currency_code = %currency_code, balance = %snapshot.balance, "balance changed");
                let event = pricing.balance_updated(&snapshot.currency_code, snapshot.balance);
                if !sink.accept(event) {
                    return;
                }
            }
            Err(e) => {
                warn!(currency_code = %currency_code, error = %e, "balance subscription failed");
                return;
            }
        }
    }

    debug!(currency_code = %currency_code, "balance subscription ended");
}

/// Emits `WalletSyncProgressUpdated` for every sync state of every wallet.
pub(crate) async fn watch_sync_progress(registry: Arc<dyn WalletRegistry>, sink: Arc<OutputSink>) {
    let source = Arc::clone(&registry);
    fan_out(registry, "sync", move |code| {
        track_sync(Arc::clone(&source), code, Arc::clone(&sink))
    })
    .await;
}

async fn track_sync(
    registry: Arc<dyn WalletRegistry>,
    currency_code: CurrencyCode,
    sink: Arc<OutputSink>,
) {
    let mut states = registry.wallet_sync_state(&currency_code);

    while let Some(item) = states.next().await {
        match item {
            Ok(state) => {
                let event = Event::WalletSyncProgressUpdated {
                    currency_code: state.currency_code,
                    progress: state.percent_complete,
                    sync_through_millis: state.timestamp,
                    is_syncing: state.is_syncing,
                };
                if !sink.accept(event) {
                    return;
                }
            }
            Err(e) => {
                warn!(currency_code = %currency_code, error = %e, "sync subscription failed");
                return;
            }
        }
    }

    debug!(currency_code = %currency_code, "sync subscription ended");
}

/// Emits one `WalletBalanceUpdated` per wallet after a rates refresh.
///
/// Reads the code set once and then each wallet once, one after another.
/// Balances are not compared with earlier ones: the rates changed, so the
/// fiat values need refreshing even if the balance did not. A source that
/// stays silent for [`REFRESH_LOOKUP_TIMEOUT`] is skipped so the refresh
/// always ends.
pub(crate) async fn refresh_balances(
    registry: Arc<dyn WalletRegistry>,
    pricing: Pricing,
    sink: Arc<OutputSink>,
) {
    let mut code_sets = registry.currency_codes();
    let codes = match tokio::time::timeout(REFRESH_LOOKUP_TIMEOUT, code_sets.next()).await {
        Ok(Some(Ok(codes))) => codes,
        Ok(Some(Err(e))) => {
            warn!(error = %e, "rates refresh could not read currency codes");
            return;
        }
        Ok(None) => return,
        Err(_) => {
            warn!("rates refresh timed out reading currency codes");
            return;
        }
    };

    for code in codes {
        let mut wallet = registry.wallet(&code);
        match tokio::time::timeout(REFRESH_LOOKUP_TIMEOUT, wallet.next()).await {
            Ok(Some(Ok(snapshot))) => {
                let event = pricing.balance_updated(&snapshot.currency_code, snapshot.balance);
                if !sink.accept(event) {
                    return;
                }
            }
            Ok(Some(Err(e))) => {
                warn!(currency_code = %code, error = %e, "rates refresh skipped wallet");
            }
            Ok(None) => {}
            Err(_) => {
                warn!(currency_code = %code, "rates refresh timed out, skipped wallet");
            }
        }
    }

    debug!("rates refresh done");
}
