use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An insertion-ordered list of normalized domains.
///
/// Lookups are exact-match. Pushing a domain that is already present is a
/// no-op, so duplicate add requests never show up twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DomainList(Vec<String>);

impl DomainList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, domain: &str) -> bool {
        !domain.is_empty() && self.0.iter().any(|d| d == domain)
    }

    /// Appends `domain` unless it is empty or already present.
    /// Returns whether the list changed.
    pub fn push(&mut self, domain: impl Into<String>) -> bool {
        let domain = domain.into();
        if domain.is_empty() || self.contains(&domain) {
            return false;
        }
        self.0.push(domain);
        true
    }

    /// Returns whether anything was removed.
    pub fn remove(&mut self, domain: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|d| d != domain);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for DomainList {
    fn from(domains: Vec<String>) -> Self {
        domains.into_iter().collect()
    }
}

impl From<DomainList> for Vec<String> {
    fn from(list: DomainList) -> Self {
        list.0
    }
}

impl<S: Into<String>> FromIterator<S> for DomainList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = DomainList::new();
        for domain in iter {
            list.push(domain);
        }
        list
    }
}

impl<'a> IntoIterator for &'a DomainList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Location identifier -> banned domains for that location.
pub type LocationBanTable = BTreeMap<String, DomainList>;

/// Drops locations whose list is empty. A location with no bans is stored as
/// no rows, so it is not kept as a key either.
pub fn prune_ban_table(table: LocationBanTable) -> LocationBanTable {
    table.into_iter().filter(|(_, domains)| !domains.is_empty()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub user_blocked_domains: DomainList,
    #[serde(default)]
    pub override_domains: DomainList,
}

/// Everything a filter pass or the preferences panel needs, as served by
/// `GET_BLOCKED_DOMAINS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBlockedState {
    #[serde(default)]
    pub banned_domains: DomainList,
    #[serde(default)]
    pub user_blocked_domains: DomainList,
    #[serde(default)]
    pub override_domains: DomainList,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub full_banned_list: LocationBanTable,
}

impl ActiveBlockedState {
    /// Builds the view for `location`; `banned_domains` is always taken from
    /// `full_banned_list`.
    pub fn derive(
        location: impl Into<String>,
        full_banned_list: LocationBanTable,
        preferences: UserPreferences,
    ) -> Self {
        let location = location.into();
        let banned_domains = full_banned_list
            .get(&location)
            .cloned()
            .unwrap_or_default();
        Self {
            banned_domains,
            user_blocked_domains: preferences.user_blocked_domains,
            override_domains: preferences.override_domains,
            location,
            full_banned_list,
        }
    }

    pub fn preferences(&self) -> UserPreferences {
        UserPreferences {
            user_blocked_domains: self.user_blocked_domains.clone(),
            override_domains: self.override_domains.clone(),
        }
    }

    pub fn with_preferences(&self, preferences: UserPreferences) -> Self {
        Self {
            user_blocked_domains: preferences.user_blocked_domains,
            override_domains: preferences.override_domains,
            ..self.clone()
        }
    }

    /// Replaces the ban table and re-derives `banned_domains` from it.
    pub fn with_ban_table(&self, full_banned_list: LocationBanTable) -> Self {
        Self::derive(self.location.clone(), full_banned_list, self.preferences())
    }
}
