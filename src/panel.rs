//! Preferences panel logic: a local mirror of the blocked-domain state plus
//! the edit operations and list display state.
//!
//! The mirror is only ever replaced wholesale, and only after the bridge has
//! confirmed the write. A failed write leaves it exactly as it was.

use crate::bridge::{BridgeError, MessageBridge};
use crate::config::PanelConfig;
use crate::domain::normalize_domain;
use crate::engine::{ActiveBlockedState, DomainList, UserPreferences};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Applied,
    /// Empty or redundant input; nothing was sent.
    Skipped,
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("failed to save changes: {0}")]
    Bridge(#[from] BridgeError),
}

pub struct PreferencesPanel {
    bridge: Arc<dyn MessageBridge>,
    state: ActiveBlockedState,
    search_query: String,
    current_page: usize,
    page_size: usize,
}

/// Splits comma-separated input into a normalized, deduplicated list.
/// Empty entries are dropped.
pub fn parse_domain_csv(csv: &str) -> DomainList {
    csv.split(',').filter_map(normalize_domain).collect()
}

impl PreferencesPanel {
    pub fn new(bridge: Arc<dyn MessageBridge>, config: &PanelConfig) -> Self {
        Self {
            bridge,
            state: ActiveBlockedState::default(),
            search_query: String::new(),
            current_page: 1,
            page_size: config.page_size.max(1),
        }
    }

    /// Replaces the mirror with the store's current state.
    pub async fn load(&mut self) -> Result<(), PanelError> {
        self.state = self.bridge.get_blocked_domains().await?;
        debug!(
            "Loaded state for location '{}': {} banned, {} blocked, {} overridden",
            self.state.location,
            self.state.banned_domains.len(),
            self.state.user_blocked_domains.len(),
            self.state.override_domains.len()
        );
        Ok(())
    }

    pub fn state(&self) -> &ActiveBlockedState {
        &self.state
    }

    pub async fn add_blocked_domain(&mut self, domain: &str) -> Result<Edit, PanelError> {
        let Some(domain) = normalize_domain(domain) else {
            return Ok(Edit::Skipped);
        };
        let mut preferences = self.state.preferences();
        if !preferences.user_blocked_domains.push(domain) {
            return Ok(Edit::Skipped);
        }
        self.write_preferences(preferences).await
    }

    pub async fn toggle_override(&mut self, domain: &str) -> Result<Edit, PanelError> {
        let Some(domain) = normalize_domain(domain) else {
            return Ok(Edit::Skipped);
        };
        let mut preferences = self.state.preferences();
        if !preferences.override_domains.remove(&domain) {
            preferences.override_domains.push(domain);
        }
        self.write_preferences(preferences).await
    }

    pub async fn remove_user_block(&mut self, domain: &str) -> Result<Edit, PanelError> {
        let Some(domain) = normalize_domain(domain) else {
            return Ok(Edit::Skipped);
        };
        let mut preferences = self.state.preferences();
        if !preferences.user_blocked_domains.remove(&domain) {
            return Ok(Edit::Skipped);
        }
        self.write_preferences(preferences).await
    }

    /// Replaces the ban list for `location` with the domains in
    /// `domains_csv` and writes the whole table.
    pub async fn update_location_bans(
        &mut self,
        location: &str,
        domains_csv: &str,
    ) -> Result<Edit, PanelError> {
        let location = location.trim();
        if location.is_empty() || domains_csv.trim().is_empty() {
            return Ok(Edit::Skipped);
        }
        let domains = parse_domain_csv(domains_csv);
        if domains.is_empty() {
            return Ok(Edit::Skipped);
        }

        let mut table = self.state.full_banned_list.clone();
        table.insert(location.to_string(), domains);

        self.bridge.update_banned_domains(table.clone()).await?;
        info!("Updated ban list for location '{}'", location);

        // bannedDomains only changes when the edited location is the active one
        self.state = self.state.with_ban_table(table);
        Ok(Edit::Applied)
    }

    async fn write_preferences(&mut self, preferences: UserPreferences) -> Result<Edit, PanelError> {
        self.bridge
            .update_user_preferences(
                preferences.user_blocked_domains.clone(),
                preferences.override_domains.clone(),
            )
            .await?;
        self.state = self.state.with_preferences(preferences);
        Ok(Edit::Applied)
    }

    pub fn is_overridden(&self, domain: &str) -> bool {
        self.state.override_domains.contains(domain)
    }

    // Display

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Does not reset the current page.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    fn matches_query<'a>(&self, domains: &'a DomainList) -> Vec<&'a str> {
        let query = self.search_query.to_lowercase();
        domains
            .iter()
            .filter(|d| d.to_lowercase().contains(&query))
            .collect()
    }

    pub fn filtered_banned_domains(&self) -> Vec<&str> {
        self.matches_query(&self.state.banned_domains)
    }

    pub fn filtered_user_blocked_domains(&self) -> Vec<&str> {
        self.matches_query(&self.state.user_blocked_domains)
    }

    /// The current page of the filtered location ban list. Empty when the
    /// page lies past the end of the list.
    pub fn visible_banned_domains(&self) -> Vec<&str> {
        let start = (self.current_page - 1) * self.page_size;
        self.filtered_banned_domains()
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.filtered_banned_domains().len().div_ceil(self.page_size)
    }

    pub fn next_page(&mut self) {
        self.current_page = (self.current_page + 1).min(self.total_pages()).max(1);
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }

    pub fn reset_page(&mut self) {
        self.current_page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain_csv() {
        let list = parse_domain_csv("a.com, b.com , c.com");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a.com", "b.com", "c.com"]);

        let list = parse_domain_csv(" , WWW.A.com,,a.com, ");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a.com"]);

        assert!(parse_domain_csv(",,").is_empty());
    }
}
