//! Effect router and stream reconciler for a wallet home screen.
//!
//! The UI sends [`Effect`](models::Effect)s to an [`EffectHandler`], which
//! queries the collaborators in [`sources`], keeps subscriptions to wallet
//! balances and sync progress alive, and sends
//! [`Event`](models::Event)s to the [`sink`]. [`state::HomeState`] folds
//! those events into what the screen shows. The [`atm`] module describes
//! the cash-code service the wallet talks to.

pub mod atm;
pub mod config;
pub mod error;
pub mod experiments;
pub mod handler;
pub mod models;
pub mod rates;
pub mod sink;
pub mod sources;
pub mod state;

pub use error::{PulseError, Result};
pub use handler::EffectHandler;
