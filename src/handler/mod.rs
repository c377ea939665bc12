//! Effect handler for the wallet home screen.
//!
//! [`EffectHandler`] turns [`Effect`]s into [`Event`]s:
//! - [`wallets`] - Wallet list, balance and sync progress subscriptions
//! - [`pricing`] - Fiat valuation used when building wallet events
//! - [`tasks`] - Ownership of every task the handler starts
//!
//! The handler also listens to the [`RatesHub`] and refreshes balances
//! whenever rates change. `dispose` tears all of it down at once.

mod pricing;
mod tasks;
mod wallets;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::models::{Effect, Event};
use crate::rates::{ListenerId, RatesHub, RatesListener};
use crate::sink::OutputSink;
use crate::sources::{Collaborators, Experiment};
use pricing::Pricing;
use tasks::TaskRegistry;

/// Prefix and suffix of the analytics event sent when a prompt is shown.
const EVENT_PROMPT_PREFIX: &str = "prompt.";
const EVENT_PROMPT_SUFFIX_DISPLAYED: &str = ".displayed";

const EVENT_APP_OPEN: &str = "$app_open";
const EVENT_PUSH_NOTIFICATION_OPEN: &str = "pushNotification.open";
const ATTRIBUTE_CAMPAIGN_ID: &str = "campaign_id";

/// Buy and sell is only offered to users valuing their wallets in USD.
const BUY_SELL_FIAT_ISO: &str = "USD";

/// Routes effects to their handlers and owns every subscription they open.
///
/// Created attached to a [`RatesHub`]; holds only a weak reference to it.
/// Dropping the last `Arc` disposes the handler.
pub struct EffectHandler {
    sources: Collaborators,
    pricing: Pricing,
    sink: Arc<OutputSink>,
    tasks: TaskRegistry,
    hub: Weak<RatesHub>,
    listener: Mutex<Option<ListenerId>>,
    disposed: AtomicBool,
}

impl EffectHandler {
    /// Creates a handler running its tasks on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::NoRuntime`](crate::PulseError::NoRuntime) when
    /// called outside a tokio runtime.
    pub fn new(
        sources: Collaborators,
        hub: &Arc<RatesHub>,
        sink: OutputSink,
    ) -> crate::Result<Arc<Self>> {
        let runtime = Handle::try_current().map_err(|_| crate::PulseError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, sources, hub, sink))
    }

    /// Creates a handler running its tasks on `runtime`.
    ///
    /// The returned handler can be driven from any thread.
    #[must_use]
    pub fn with_runtime(
        runtime: Handle,
        sources: Collaborators,
        hub: &Arc<RatesHub>,
        sink: OutputSink,
    ) -> Arc<Self> {
        let pricing = Pricing::new(
            Arc::clone(&sources.rates),
            Arc::clone(&sources.preferences),
        );
        let handler = Arc::new(Self {
            sources,
            pricing,
            sink: Arc::new(sink),
            tasks: TaskRegistry::new(runtime),
            hub: Arc::downgrade(hub),
            listener: Mutex::new(None),
            disposed: AtomicBool::new(false),
        });

        let listener: Arc<dyn RatesListener> = handler.clone();
        let id = hub.attach(Arc::downgrade(&listener));
        *handler.listener.lock() = Some(id);

        info!("effect handler created");
        handler
    }

    /// Handles one effect. Never blocks on a subscription.
    ///
    /// Effects accepted after [`dispose`](Self::dispose) are ignored.
    pub fn accept(&self, effect: Effect) {
        if self.is_disposed() {
            debug!(?effect, "handler disposed, ignoring effect");
            return;
        }
        debug!(?effect, "accepting effect");

        match effect {
            Effect::LoadWallets => self.load_wallets(),
            Effect::LoadPrompt => self.load_prompt(),
            Effect::LoadBuyBellState => self.load_buy_bell_state(),
            Effect::CheckInAppNotification => self.check_in_app_notification(),
            Effect::CheckBuySellVisibility => self.check_buy_sell_visibility(),
            Effect::RecordPushOpened { campaign_id } => self.record_push_opened(campaign_id),
        }
    }

    /// Cancels every subscription, closes the output sink and detaches from
    /// the rates hub. Safe to call more than once.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.sink.close();
        self.tasks.shutdown();

        if let Some(id) = self.listener.lock().take()
            && let Some(hub) = self.hub.upgrade()
        {
            hub.detach(id);
        }

        info!("effect handler disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of subscriptions and fetches still running.
    pub fn active_tasks(&self) -> usize {
        self.tasks.active()
    }

    fn emit(&self, event: Event) {
        if !self.sink.accept(event) {
            debug!("output sink closed, event dropped");
        }
    }

    fn load_wallets(&self) {
        let registry = &self.sources.wallets;
        let sink = &self.sink;

        self.tasks.spawn(wallets::watch_wallet_list(
            Arc::clone(registry),
            self.pricing.clone(),
            Arc::clone(sink),
        ));
        self.tasks.spawn(wallets::watch_balances(
            Arc::clone(registry),
            self.pricing.clone(),
            Arc::clone(sink),
        ));
        self.tasks.spawn(wallets::watch_sync_progress(
            Arc::clone(registry),
            Arc::clone(sink),
        ));
        info!("wallet subscriptions started");
    }

    fn load_prompt(&self) {
        let prompts = &self.sources.prompts;
        let id = prompts.next_prompt();
        if let Some(id) = id {
            let name = format!(
                "{EVENT_PROMPT_PREFIX}{}{EVENT_PROMPT_SUFFIX_DISPLAYED}",
                prompts.prompt_name(id)
            );
            self.sources.analytics.push_event(&name, None);
        }
        self.emit(Event::PromptLoaded { id });
    }

    fn load_buy_bell_state(&self) {
        let needed = self
            .sources
            .experiments
            .is_active(Experiment::BuyNotification)
            && self.sources.buy_policy.is_buy_notification_needed();
        self.emit(Event::BuyBellNeededLoaded { needed });
    }

    fn check_buy_sell_visibility(&self) {
        let show = self
            .sources
            .experiments
            .is_active(Experiment::BuySellMenuButton)
            && self.sources.preferences.preferred_fiat_iso() == BUY_SELL_FIAT_ISO;
        self.emit(Event::ShowBuyAndSell { show });
    }

    /// Emits the pending notification, fetching its image first if it has
    /// one. A failed fetch drops the notification.
    fn check_in_app_notification(&self) {
        let Some(notification) = self.sources.notifications.in_app_notification() else {
            return;
        };

        let Some(url) = notification.image_url.clone() else {
            self.emit(Event::InAppNotificationProvided { notification });
            return;
        };

        let images = Arc::clone(&self.sources.images);
        let sink = Arc::clone(&self.sink);
        self.tasks.spawn(async move {
            match images.fetch(&url).await {
                Ok(()) => {
                    sink.accept(Event::InAppNotificationProvided { notification });
                }
                Err(e) => {
                    debug!(
                        notification = %notification.id,
                        error = %e,
                        "image prefetch failed, dropping notification"
                    );
                }
            }
        });
    }

    fn record_push_opened(&self, campaign_id: String) {
        let analytics = &self.sources.analytics;
        let attributes = HashMap::from([(ATTRIBUTE_CAMPAIGN_ID.to_string(), campaign_id)]);
        analytics.push_event(EVENT_APP_OPEN, Some(&attributes));
        analytics.push_event(EVENT_PUSH_NOTIFICATION_OPEN, None);
    }
}

impl RatesListener for EffectHandler {
    fn on_changed(&self) {
        if self.is_disposed() {
            return;
        }
        self.tasks.spawn(wallets::refresh_balances(
            Arc::clone(&self.sources.wallets),
            self.pricing.clone(),
            Arc::clone(&self.sink),
        ));
    }
}

impl Drop for EffectHandler {
    fn drop(&mut self) {
        self.dispose();
    }
}
