//! Bounded conversation memory for Samovar.
//!
//! `ConversationStore` layers token accounting and budget eviction over a
//! raw [`StorageBackend`]. Eviction runs lazily on `read`, not eagerly on
//! `write` — a long history sits in storage at full length until somebody
//! reads it. That is a deliberate, load-bearing design choice: `read` has
//! the side effect of trimming persisted state.
//!
//! Concurrency: read-evict-write cycles on the same conversation key are
//! plain read-modify-write with no cross-task locking. Two tasks racing on
//! one key can interleave and lose a message. Known limitation, kept as-is
//! rather than silently fixed.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryBackend;
pub use sqlite::SqliteBackend;

use samovar_core::error::StoreError;
use samovar_core::message::{total_tokens, ConversationId, Message};
use samovar_core::profile::UserProfile;
use samovar_core::store::StorageBackend;
use samovar_core::token::count_tokens;
use std::sync::Arc;
use tracing::debug;

/// The conversation store: per-key ordered message history, bounded by a
/// token budget enforced on read.
pub struct ConversationStore {
    backend: Arc<dyn StorageBackend>,
    max_tokens: u64,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn StorageBackend>, max_tokens: u64) -> Self {
        Self {
            backend,
            max_tokens,
        }
    }

    /// The backend this store persists through.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Read a conversation's history, evicting oldest messages until the
    /// token total fits the budget.
    ///
    /// Eviction removes index 0 repeatedly until the total is within budget
    /// or a single message remains — the newest message is never dropped,
    /// even when it alone exceeds the budget. Any trim is persisted before
    /// the history is returned, so a second read with no intervening write
    /// returns the identical list.
    pub async fn read(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        let mut messages = self.backend.load(id).await?;

        let mut total = total_tokens(&messages);
        let mut evicted = 0usize;
        while total > self.max_tokens && messages.len() > 1 {
            let dropped = messages.remove(0);
            debug!(
                conversation = %id,
                total,
                max_tokens = self.max_tokens,
                dropped_tokens = dropped.token_count,
                "Evicting oldest message"
            );
            total = total_tokens(&messages);
            evicted += 1;
        }

        if evicted > 0 {
            self.backend.save(id, &messages).await?;
        }

        Ok(messages)
    }

    /// Append a message to a conversation.
    ///
    /// The message's `token_count` is computed here, from the exact content
    /// string, and never recomputed afterwards. The append happens after the
    /// read-trim, so a write on an over-budget history first settles the
    /// budget and then adds the new message.
    pub async fn write(&self, id: &ConversationId, mut message: Message) -> Result<(), StoreError> {
        message.token_count = count_tokens(&message.content);

        let mut messages = self.read(id).await?;
        messages.push(message);
        self.backend.save(id, &messages).await
    }

    /// Delete all messages for a conversation.
    pub async fn delete(&self, id: &ConversationId) -> Result<(), StoreError> {
        self.backend.remove(id).await
    }

    /// Fetch a cached user profile.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.backend.load_profile(user_id).await
    }

    /// Cache a user profile.
    pub async fn set_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<(), StoreError> {
        self.backend.save_profile(user_id, profile).await
    }
}
