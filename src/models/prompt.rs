//! Home screen prompts.

use serde::{Deserialize, Serialize};

/// Prompts the home screen can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptId {
    EmailCollection,
    Fingerprint,
    PaperKey,
    UpgradePin,
    RecommendRescan,
    NoPasscode,
    ShareData,
}

impl PromptId {
    /// Returns the name used in analytics events.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptId::EmailCollection => "emailCollection",
            PromptId::Fingerprint => "touchIdPrompt",
            PromptId::PaperKey => "paperKeyPrompt",
            PromptId::UpgradePin => "upgradePinPrompt",
            PromptId::RecommendRescan => "recommendRescanPrompt",
            PromptId::NoPasscode => "noPasscodePrompt",
            PromptId::ShareData => "shareDataPrompt",
        }
    }
}
