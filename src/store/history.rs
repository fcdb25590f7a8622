//! Practice history in `practice_history`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{SupabaseClient, SupabaseError};

const TABLE: &str = "practice_history";

/// Stored practice attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub difficulty: Option<String>,
    pub japanese_sentence: String,
    pub user_answer: String,
    pub correct_translation: String,
    pub rating: u8,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// New attempt for insertion
#[derive(Debug, Clone, Serialize)]
pub struct NewHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub difficulty: Option<String>,
    pub japanese_sentence: String,
    pub user_answer: String,
    pub correct_translation: String,
    pub rating: u8,
}

/// History store operations
#[derive(Clone)]
pub struct HistoryStore {
    client: SupabaseClient,
}

impl HistoryStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Record one graded attempt
    pub async fn record(&self, entry: &NewHistoryEntry) -> Result<HistoryEntry, SupabaseError> {
        self.client.insert(TABLE, entry).await
    }

    /// Most recent attempts, newest first
    pub async fn recent(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, SupabaseError> {
        let query = format!(
            "user_id=eq.{}&order=created_at.desc&limit={}",
            user_id, limit
        );
        self.client.get(TABLE, &query).await
    }
}
