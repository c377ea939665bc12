//! In-app notification model.

use serde::{Deserialize, Serialize};

/// A message shown on top of the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InAppNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub cta: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
    /// Image shown with the message. It must be fetched before the
    /// notification is displayed.
    #[serde(default)]
    pub image_url: Option<String>,
}
