//! Intent classification trait.
//!
//! A coarse classification of the latest user message, used only to decide
//! whether to shrink context and suppress tools. The classifier itself is an
//! external service; this trait is its call contract.

use crate::error::ClassifierError;
use async_trait::async_trait;

/// The classified intent of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Casual small talk — history gets collapsed, tools get suppressed.
    Casual,
    /// Anything else; the label is kept for logging.
    Other(String),
}

impl Intent {
    /// Map a classifier label to an intent. Only `"casual"` is special.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("casual") {
            Intent::Casual
        } else {
            Intent::Other(label.to_string())
        }
    }

    pub fn is_casual(&self) -> bool {
        matches!(self, Intent::Casual)
    }
}

/// External intent classifier contract.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify a message's intent, returning the top label.
    async fn classify(&self, text: &str) -> std::result::Result<Intent, ClassifierError>;
}
