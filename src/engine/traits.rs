use serde::Serialize;

/// Which list caused a domain to be filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockSource {
    Location,
    User,
}

/// The "Hot Path" check run once per result during a scan.
pub trait DomainMatcher: Send + Sync {
    /// Returns Some(source) if the domain should be removed, None if kept.
    fn check(&self, domain: &str) -> Option<BlockSource>;
}
