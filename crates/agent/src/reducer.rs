//! Context reduction for casual small talk.
//!
//! When the latest message classifies as casual chatter and the history has
//! grown past a threshold, the prompt is collapsed to the leading message
//! plus the last three turns. Small talk doesn't need deep context, so this
//! trims provider cost and latency; it is an optimization, never a
//! correctness requirement.

use samovar_core::error::ClassifierError;
use samovar_core::intent::{Intent, IntentClassifier};
use samovar_core::message::Message;
use std::sync::Arc;
use tracing::debug;

/// History length at or below which the classifier is never consulted.
const REDUCTION_THRESHOLD: usize = 5;

/// How many trailing messages survive a collapse (plus the leading one).
const KEEP_LAST: usize = 3;

/// Collapses long histories when the conversation is just small talk.
pub struct ContextReducer {
    classifier: Option<Arc<dyn IntentClassifier>>,
}

impl ContextReducer {
    /// A reducer with a classifier attached.
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// A reducer that never reduces (no classifier credential configured).
    pub fn disabled() -> Self {
        Self { classifier: None }
    }

    /// Classify the latest message and possibly collapse the history.
    ///
    /// Returns the (possibly reduced) sequence and the classified intent,
    /// `None` when the classifier was not consulted. Classifier failure
    /// propagates; the caller decides whether that fails the request.
    pub async fn reduce(
        &self,
        messages: Vec<Message>,
    ) -> Result<(Vec<Message>, Option<Intent>), ClassifierError> {
        if messages.len() <= REDUCTION_THRESHOLD {
            return Ok((messages, None));
        }

        let Some(classifier) = &self.classifier else {
            return Ok((messages, None));
        };

        // The newest message drives the classification; it always exists
        // past the threshold check.
        let latest = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let intent = classifier.classify(&latest).await?;

        if !intent.is_casual() {
            return Ok((messages, Some(intent)));
        }

        let tail_start = messages.len().saturating_sub(KEEP_LAST);
        let mut reduced = Vec::with_capacity(1 + KEEP_LAST);
        reduced.push(messages[0].clone());
        reduced.extend_from_slice(&messages[tail_start..]);

        debug!(
            from = messages.len(),
            to = reduced.len(),
            "Collapsed history for casual small talk"
        );
        Ok((reduced, Some(intent)))
    }
}
