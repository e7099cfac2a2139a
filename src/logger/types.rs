use crate::engine::BlockSource;
use serde::Serialize;

/// The outcome for one result container during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct FilterLogEntry {
    pub node: String,
    pub href: Option<String>,
    pub domain: Option<String>,
    pub action: FilterAction,
    /// Why a link could not be processed.
    pub error: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum FilterAction {
    Kept,
    Removed(BlockSource),
    MissingLink,
    Malformed,
}

pub trait FilterLogSink: Send + Sync {
    fn log(&self, entry: &FilterLogEntry);
}
