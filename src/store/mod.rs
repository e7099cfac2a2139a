mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::engine::{LocationBanTable, UserPreferences};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid stored domain list: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable holder of the location ban table and per-user preferences.
pub trait PreferenceStore: Send + Sync {
    fn load_ban_table(&self) -> Result<LocationBanTable, StoreError>;

    /// Replaces the whole table; locations missing from `table` are dropped.
    fn save_ban_table(&self, table: &LocationBanTable) -> Result<(), StoreError>;

    /// Unknown users get empty preferences.
    fn load_user_preferences(&self, user_id: &str) -> Result<UserPreferences, StoreError>;

    fn save_user_preferences(
        &self,
        user_id: &str,
        preferences: &UserPreferences,
    ) -> Result<(), StoreError>;
}
