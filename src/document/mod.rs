//! The host document, as far as the result scanner is concerned.
//!
//! Selectors are full CSS selectors as parsed by `scraper`; node ids are the
//! `ego_tree` ids of the backing tree.

mod memory;

pub use ego_tree::NodeId;
pub use memory::MemoryDocument;
pub use scraper::Selector;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid selector '{selector}': {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Parses a CSS selector list, keeping the input around for error reports.
pub fn parse_selector(input: &str) -> Result<Selector, SelectorError> {
    Selector::parse(input).map_err(|e| SelectorError {
        selector: input.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Added,
    Removed,
}

/// One child-list change in the connected tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub node: NodeId,
    pub parent: NodeId,
}

pub trait Document: Send {
    /// Base for resolving relative link targets.
    fn base_url(&self) -> Option<&Url>;

    /// Every connected element matching `selector`, in document order.
    fn query_all(&self, selector: &Selector) -> Vec<NodeId>;

    /// First descendant of `scope` matching `selector`.
    fn query_first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Detaches `node` from its parent. Returns false if it was not connected.
    fn detach(&mut self, node: NodeId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_accepts_combinators() {
        assert!(parse_selector("div.g > a[href]").is_ok());
        assert!(parse_selector("#search .tF2Cxc a:not([href^='/'])").is_ok());
    }

    #[test]
    fn test_parse_selector_reports_input() {
        let err = parse_selector("div >").unwrap_err();
        assert_eq!(err.selector, "div >");
        assert!(parse_selector("").is_err());
    }
}
