use super::{PreferenceStore, StoreError};
use crate::engine::{LocationBanTable, UserPreferences};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bans: RwLock<LocationBanTable>,
    users: RwLock<HashMap<String, UserPreferences>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ban_table(table: LocationBanTable) -> Self {
        Self {
            bans: RwLock::new(table),
            users: RwLock::default(),
        }
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

impl PreferenceStore for MemoryStore {
    fn load_ban_table(&self) -> Result<LocationBanTable, StoreError> {
        Ok(self.bans.read().map_err(poisoned)?.clone())
    }

    fn save_ban_table(&self, table: &LocationBanTable) -> Result<(), StoreError> {
        *self.bans.write().map_err(poisoned)? = table.clone();
        Ok(())
    }

    fn load_user_preferences(&self, user_id: &str) -> Result<UserPreferences, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(user_id).cloned().unwrap_or_default())
    }

    fn save_user_preferences(
        &self,
        user_id: &str,
        preferences: &UserPreferences,
    ) -> Result<(), StoreError> {
        self.users
            .write()
            .map_err(poisoned)?
            .insert(user_id.to_string(), preferences.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_are_isolated() {
        let store = MemoryStore::new();
        let prefs = UserPreferences {
            user_blocked_domains: vec!["a.com".to_string()].into(),
            ..Default::default()
        };
        store.save_user_preferences("alice", &prefs).unwrap();

        assert_eq!(store.load_user_preferences("alice").unwrap(), prefs);
        assert_eq!(
            store.load_user_preferences("bob").unwrap(),
            UserPreferences::default()
        );
    }

    #[test]
    fn test_ban_table_is_replaced_wholesale() {
        let mut table = LocationBanTable::new();
        table.insert("US".into(), vec!["a.com".to_string()].into());
        let store = MemoryStore::with_ban_table(table);

        let mut next = LocationBanTable::new();
        next.insert("UK".into(), vec!["b.com".to_string()].into());
        store.save_ban_table(&next).unwrap();

        assert_eq!(store.load_ban_table().unwrap(), next);
    }
}
