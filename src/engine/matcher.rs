use super::state::ActiveBlockedState;
use super::traits::{BlockSource, DomainMatcher};
use rustc_hash::{FxHashMap, FxHashSet};

/// The filtering decision on a single normalized domain.
///
/// Overrides win over both the location ban list and the user's own list.
pub fn should_remove(domain: &str, state: &ActiveBlockedState) -> bool {
    (state.banned_domains.contains(domain) || state.user_blocked_domains.contains(domain))
        && !state.override_domains.contains(domain)
}

/// Hashed snapshot of an `ActiveBlockedState`, built once per scan.
#[derive(Debug, Default)]
pub struct HashedMatcher {
    // Map domain -> list that blocks it
    blocked: FxHashMap<Box<str>, BlockSource>,
    overrides: FxHashSet<Box<str>>,
}

impl HashedMatcher {
    pub fn from_state(state: &ActiveBlockedState) -> Self {
        let mut blocked = FxHashMap::default();
        for domain in state.user_blocked_domains.iter() {
            blocked.insert(domain.into(), BlockSource::User);
        }
        // Location bans are reported first when a domain is on both lists
        for domain in state.banned_domains.iter() {
            blocked.insert(domain.into(), BlockSource::Location);
        }

        let overrides = state.override_domains.iter().map(Box::<str>::from).collect();

        Self { blocked, overrides }
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

impl DomainMatcher for HashedMatcher {
    fn check(&self, domain: &str) -> Option<BlockSource> {
        if domain.is_empty() || self.overrides.contains(domain) {
            return None;
        }
        self.blocked.get(domain).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{LocationBanTable, UserPreferences};

    fn state(banned: &[&str], user: &[&str], overrides: &[&str]) -> ActiveBlockedState {
        let mut table = LocationBanTable::new();
        table.insert("US".into(), banned.iter().copied().collect());
        ActiveBlockedState::derive(
            "US",
            table,
            UserPreferences {
                user_blocked_domains: user.iter().copied().collect(),
                override_domains: overrides.iter().copied().collect(),
            },
        )
    }

    #[test]
    fn test_should_remove_logic() {
        let s = state(&["ads.example.com"], &["tracker.net"], &[]);

        assert!(should_remove("ads.example.com", &s));
        assert!(should_remove("tracker.net", &s));
        assert!(!should_remove("safe.com", &s));
        // Exact match only, no suffix matching
        assert!(!should_remove("sub.ads.example.com", &s));
        assert!(!should_remove("example.com", &s));
        assert!(!should_remove("", &s));
    }

    #[test]
    fn test_override_wins_everywhere() {
        let s = state(&["both.com", "loc.com"], &["both.com", "user.com"], &[
            "both.com", "loc.com", "user.com",
        ]);
        for d in ["both.com", "loc.com", "user.com"] {
            assert!(!should_remove(d, &s), "{d} is overridden");
        }
    }

    #[test]
    fn test_membership_equivalence_without_override() {
        let s = state(&["a.com", "b.com"], &["b.com", "c.com"], &["z.com"]);
        for d in ["a.com", "b.com", "c.com", "d.com", "z.com"] {
            let expected = !s.override_domains.contains(d)
                && (s.banned_domains.contains(d) || s.user_blocked_domains.contains(d));
            assert_eq!(should_remove(d, &s), expected, "{d}");
        }
    }

    #[test]
    fn test_hashed_matcher_agrees_with_should_remove() {
        let s = state(&["a.com", "both.com"], &["both.com", "u.com", "o.com"], &["o.com"]);
        let matcher = HashedMatcher::from_state(&s);

        for d in ["a.com", "both.com", "u.com", "o.com", "free.com", ""] {
            assert_eq!(matcher.check(d).is_some(), should_remove(d, &s), "{d}");
        }
        assert_eq!(matcher.check("a.com"), Some(BlockSource::Location));
        assert_eq!(matcher.check("u.com"), Some(BlockSource::User));
        assert_eq!(matcher.check("both.com"), Some(BlockSource::Location));
        assert_eq!(matcher.len(), 4);
    }
}
