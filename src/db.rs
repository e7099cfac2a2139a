use crate::engine::{DomainList, LocationBanTable, UserPreferences};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

pub struct DbClient {
    db_path: String,
    conn: Mutex<Connection>,
}

impl DbClient {
    pub fn new(db_path: String) -> Result<Self> {
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS banned_websites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                domain TEXT NOT NULL,
                location TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                UNIQUE(domain, location)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_preferences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL UNIQUE,
                blocked_domains TEXT NOT NULL DEFAULT '[]',
                override_domains TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_banned_location ON banned_websites(location)",
            [],
        )?;

        info!("SQLite database initialized at {}", self.db_path);
        Ok(())
    }

    pub fn get_ban_table(&self) -> Result<LocationBanTable> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT location, domain FROM banned_websites ORDER BY location, position, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut table = LocationBanTable::new();
        for row in rows {
            let (location, domain) = row?;
            table.entry(location).or_default().push(domain);
        }
        Ok(table)
    }

    /// Rewrites the ban table in one transaction. Rows that survive keep
    /// their original `created_at`.
    pub fn replace_ban_table(&self, table: &LocationBanTable) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = unix_now();

        let existing: Vec<(i64, String, String)> = {
            let mut stmt = tx.prepare_cached("SELECT id, location, domain FROM banned_websites")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
            rows.collect::<Result<_>>()?
        };

        let wanted: HashSet<(&str, &str)> = table
            .iter()
            .flat_map(|(location, domains)| domains.iter().map(move |d| (location.as_str(), d)))
            .collect();

        {
            let mut delete = tx.prepare_cached("DELETE FROM banned_websites WHERE id = ?1")?;
            for (id, location, domain) in &existing {
                if !wanted.contains(&(location.as_str(), domain.as_str())) {
                    delete.execute(params![id])?;
                }
            }

            let mut upsert = tx.prepare_cached(
                "INSERT INTO banned_websites (domain, location, position, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(domain, location) DO UPDATE SET position = excluded.position",
            )?;
            for (location, domains) in table {
                for (position, domain) in domains.iter().enumerate() {
                    upsert.execute(params![domain, location, position as i64, now])?;
                }
            }
        }

        tx.commit()
    }

    /// Returns the stored lists as raw JSON, or None for an unknown user.
    pub fn get_user_preferences(&self, user_id: &str) -> Result<Option<(String, String)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT blocked_domains, override_domains FROM user_preferences WHERE user_id = ?1",
        )?;
        let row = stmt
            .query_row(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;
        Ok(row)
    }

    pub fn upsert_user_preferences(
        &self,
        user_id: &str,
        blocked_json: &str,
        override_json: &str,
    ) -> Result<()> {
        let conn = self.conn();
        conn.prepare_cached(
            "INSERT INTO user_preferences (user_id, blocked_domains, override_domains, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                blocked_domains = excluded.blocked_domains,
                override_domains = excluded.override_domains",
        )?
        .execute(params![user_id, blocked_json, override_json, unix_now()])?;
        Ok(())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Encodes preferences into the two JSON columns of `user_preferences`.
pub fn encode_preferences(
    preferences: &UserPreferences,
) -> serde_json::Result<(String, String)> {
    Ok((
        serde_json::to_string(&preferences.user_blocked_domains)?,
        serde_json::to_string(&preferences.override_domains)?,
    ))
}

pub fn decode_preferences(blocked: &str, overrides: &str) -> serde_json::Result<UserPreferences> {
    Ok(UserPreferences {
        user_blocked_domains: serde_json::from_str::<DomainList>(blocked)?,
        override_domains: serde_json::from_str::<DomainList>(overrides)?,
    })
}
