//! SQLite backend.
//!
//! Two tables, one row per key:
//! - `conversations` — the JSON-serialized ordered message list
//! - `profiles` — the JSON-serialized cached user profile
//!
//! Each record is replaced with a single-row UPSERT, so a write is atomic
//! per key: a concurrent reader sees the old list or the new list, never a
//! partial one.

use async_trait::async_trait;
use samovar_core::error::StoreError;
use samovar_core::message::{ConversationId, Message};
use samovar_core::profile::UserProfile;
use samovar_core::store::StorageBackend;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

/// A SQLite-backed conversation/profile store.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Create a new SQLite backend from a connection string or file path.
    ///
    /// The database and tables are created automatically. Pass `":memory:"`
    /// for an in-process ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Unavailable(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let backend = Self { pool };
        backend.run_migrations().await?;
        info!("SQLite conversation store initialized at {url}");
        Ok(backend)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id       TEXT PRIMARY KEY,
                messages TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("conversations table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                profile TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("profiles table: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        let row = sqlx::query("SELECT messages FROM conversations WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let Some(row) = row else {
            return Ok(Vec::new());
        };

        let raw: String = row
            .try_get("messages")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| StoreError::CorruptRecord {
            key: id.0.clone(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, id: &ConversationId, messages: &[Message]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(messages).map_err(|e| StoreError::CorruptRecord {
            key: id.0.clone(),
            reason: e.to_string(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, messages) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET messages = excluded.messages
            "#,
        )
        .bind(&id.0)
        .bind(raw)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, id: &ConversationId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query("SELECT profile FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row
            .try_get("profile")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::CorruptRecord {
                key: user_id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        let raw = serde_json::to_string(profile).map_err(|e| StoreError::CorruptRecord {
            key: user_id.to_string(),
            reason: e.to_string(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, profile) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET profile = excluded.profile
            "#,
        )
        .bind(user_id)
        .bind(raw)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backend() -> SqliteBackend {
        SqliteBackend::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn load_missing_conversation_is_empty() {
        let backend = backend().await;
        let messages = backend.load(&ConversationId::from("C1_1")).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn save_load_roundtrip_preserves_token_counts() {
        let backend = backend().await;
        let id = ConversationId::from("C1_1");

        let mut msg = Message::user("hello");
        msg.token_count = 2;
        backend.save(&id, &[msg.clone()]).await.unwrap();

        let loaded = backend.load(&id).await.unwrap();
        assert_eq!(loaded, vec![msg]);
    }

    #[tokio::test]
    async fn save_replaces_whole_record() {
        let backend = backend().await;
        let id = ConversationId::from("C1_1");

        backend
            .save(&id, &[Message::user("a"), Message::user("b")])
            .await
            .unwrap();
        backend.save(&id, &[Message::user("b")]).await.unwrap();

        let loaded = backend.load(&id).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "b");
    }

    #[tokio::test]
    async fn remove_deletes_record() {
        let backend = backend().await;
        let id = ConversationId::from("C1_1");
        backend.save(&id, &[Message::user("a")]).await.unwrap();
        backend.remove(&id).await.unwrap();
        assert!(backend.load(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn profile_roundtrip() {
        let backend = backend().await;
        assert!(backend.load_profile("U1").await.unwrap().is_none());

        let profile = UserProfile {
            real_name: "Ada".into(),
            title: "Engineer".into(),
            team: Some(samovar_core::profile::Team {
                name: "Analytical Engines".into(),
            }),
            extra: serde_json::Map::new(),
        };
        backend.save_profile("U1", &profile).await.unwrap();
        assert_eq!(backend.load_profile("U1").await.unwrap(), Some(profile));
    }
}
