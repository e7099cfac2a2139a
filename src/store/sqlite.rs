use super::{PreferenceStore, StoreError};
use crate::db::{decode_preferences, encode_preferences, DbClient};
use crate::engine::{LocationBanTable, UserPreferences};
use std::sync::Arc;

pub struct SqliteStore {
    db: Arc<DbClient>,
}

impl SqliteStore {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db }
    }
}

impl PreferenceStore for SqliteStore {
    fn load_ban_table(&self) -> Result<LocationBanTable, StoreError> {
        Ok(self.db.get_ban_table()?)
    }

    fn save_ban_table(&self, table: &LocationBanTable) -> Result<(), StoreError> {
        Ok(self.db.replace_ban_table(table)?)
    }

    fn load_user_preferences(&self, user_id: &str) -> Result<UserPreferences, StoreError> {
        match self.db.get_user_preferences(user_id)? {
            Some((blocked, overrides)) => Ok(decode_preferences(&blocked, &overrides)?),
            None => Ok(UserPreferences::default()),
        }
    }

    fn save_user_preferences(
        &self,
        user_id: &str,
        preferences: &UserPreferences,
    ) -> Result<(), StoreError> {
        let (blocked, overrides) = encode_preferences(preferences)?;
        Ok(self
            .db
            .upsert_user_preferences(user_id, &blocked, &overrides)?)
    }
}
