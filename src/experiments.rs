//! Experiment switches loaded from a JSON file.

use std::path::Path;

use serde::Deserialize;

use crate::sources::{Experiment, FeatureFlags};

/// Experiment configuration, e.g. loaded from `experiments.json`.
///
/// Every switch defaults to off, so an empty object disables all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Experiments {
    /// Show the bell nudging users without funds to buy crypto.
    pub buy_notification: bool,
    /// Show the buy and sell entry in the home screen menu.
    pub buy_sell_menu_button: bool,
}

impl Experiments {
    /// Loads experiments from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::PulseError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let experiments: Self = serde_json::from_str(&contents)?;
        Ok(experiments)
    }
}

impl FeatureFlags for Experiments {
    fn is_active(&self, experiment: Experiment) -> bool {
        match experiment {
            Experiment::BuyNotification => self.buy_notification,
            Experiment::BuySellMenuButton => self.buy_sell_menu_button,
        }
    }
}
