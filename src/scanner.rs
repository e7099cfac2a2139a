use crate::bridge::{BridgeError, MessageBridge};
use crate::config::FilterConfig;
use crate::document::{parse_selector, Document, NodeId, Selector, SelectorError};
use crate::domain::resolve_link;
use crate::engine::{DomainMatcher, HashedMatcher};
use crate::logger::{FilterAction, FilterLogEntry, FilterLogger};
use crate::stats::StatsCollector;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub examined: usize,
    pub removed: usize,
    pub missing_link: usize,
    pub malformed: usize,
}

/// Removes result containers whose primary link points at a filtered domain.
pub struct ResultScanner {
    bridge: Arc<dyn MessageBridge>,
    result_selector: Selector,
    link_selector: Selector,
    logger: Arc<FilterLogger>,
    stats: Arc<StatsCollector>,
}

impl ResultScanner {
    pub fn new(
        bridge: Arc<dyn MessageBridge>,
        config: &FilterConfig,
        logger: Arc<FilterLogger>,
        stats: Arc<StatsCollector>,
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            bridge,
            result_selector: parse_selector(&config.result_selector)?,
            link_selector: parse_selector(&config.link_selector)?,
            logger,
            stats,
        })
    }

    /// Fetches a fresh state snapshot, then filters the document.
    ///
    /// The document is only locked once the snapshot has arrived. If the
    /// bridge fails nothing is removed.
    pub async fn scan<D: Document>(&self, document: &Mutex<D>) -> Result<ScanReport, BridgeError> {
        let state = match self.bridge.get_blocked_domains().await {
            Ok(state) => state,
            Err(e) => {
                self.stats.inc_failed_scan();
                return Err(e);
            }
        };
        let matcher = HashedMatcher::from_state(&state);

        let mut document = document.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.filter(&mut *document, &matcher))
    }

    /// Applies `matcher` to every result container currently in `document`.
    pub fn filter<D: Document + ?Sized>(
        &self,
        document: &mut D,
        matcher: &dyn DomainMatcher,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        for container in document.query_all(&self.result_selector) {
            report.examined += 1;
            let entry = self.filter_one(document, container, matcher, &mut report);
            self.logger.log(entry);
        }

        self.stats.record_scan(&report);
        debug!(
            "Scan complete: {} examined, {} removed",
            report.examined, report.removed
        );
        report
    }

    fn filter_one<D: Document + ?Sized>(
        &self,
        document: &mut D,
        container: NodeId,
        matcher: &dyn DomainMatcher,
        report: &mut ScanReport,
    ) -> FilterLogEntry {
        let mut entry = FilterLogEntry {
            node: format!("{container:?}"),
            href: None,
            domain: None,
            action: FilterAction::MissingLink,
            error: None,
        };

        let href = document
            .query_first_within(container, &self.link_selector)
            .and_then(|link| document.attribute(link, "href"))
            .map(str::to_string);
        let Some(href) = href else {
            report.missing_link += 1;
            return entry;
        };

        let domain = match resolve_link(&href, document.base_url()) {
            Ok(domain) => domain,
            Err(e) => {
                report.malformed += 1;
                entry.href = Some(href);
                entry.action = FilterAction::Malformed;
                entry.error = Some(e.to_string());
                return entry;
            }
        };

        entry.action = match matcher.check(&domain) {
            Some(source) => {
                // A container nested in one already removed this pass is gone
                if document.detach(container) {
                    report.removed += 1;
                    self.stats.inc_removed_by_source(source);
                }
                FilterAction::Removed(source)
            }
            None => FilterAction::Kept,
        };
        entry.href = Some(href);
        entry.domain = Some(domain);
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::StoreBridge;
    use crate::config::{FilterConfig, LoggingConfig};
    use crate::document::MemoryDocument;
    use crate::engine::{ActiveBlockedState, BlockSource, LocationBanTable, UserPreferences};
    use crate::logger::MemoryLogSink;
    use crate::store::MemoryStore;
    use std::collections::VecDeque;
    use std::sync::RwLock;

    fn scanner_with_log(
        banned: &[&str],
        user: &[&str],
    ) -> (ResultScanner, Arc<RwLock<VecDeque<FilterLogEntry>>>) {
        let mut table = LocationBanTable::new();
        table.insert("US".into(), banned.iter().copied().collect());
        let store = Arc::new(MemoryStore::with_ban_table(table));
        let prefs = UserPreferences {
            user_blocked_domains: user.iter().copied().collect(),
            ..Default::default()
        };
        crate::store::PreferenceStore::save_user_preferences(&*store, "me", &prefs).unwrap();

        let sink = MemoryLogSink::new(100);
        let buffer = sink.clone_buffer();
        let logger = FilterLogger::new(&LoggingConfig::default(), vec![Box::new(sink)]);
        let scanner = ResultScanner::new(
            Arc::new(StoreBridge::new(store, "me", "US")),
            &FilterConfig::default(),
            logger,
            StatsCollector::new(),
        )
        .unwrap();
        (scanner, buffer)
    }

    #[tokio::test]
    async fn test_removes_blocked_and_logs_each_container() {
        let (scanner, log) = scanner_with_log(&["ads.example.com"], &["tracker.net"]);
        let mut doc = MemoryDocument::new();
        doc.append_result("g", Some("https://ads.example.com/buy"));
        doc.append_result("tF2Cxc", Some("https://www.tracker.net/"));
        doc.append_result("g", Some("https://safe.com"));
        doc.append_result("g", None);
        doc.append_result("g", Some("http://[::1"));
        let doc = Mutex::new(doc);

        let report = scanner.scan(&doc).await.unwrap();
        assert_eq!(
            report,
            ScanReport {
                examined: 5,
                removed: 2,
                missing_link: 1,
                malformed: 1
            }
        );

        let actions: Vec<_> = log.read().unwrap().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                FilterAction::Removed(BlockSource::Location),
                FilterAction::Removed(BlockSource::User),
                FilterAction::Kept,
                FilterAction::MissingLink,
                FilterAction::Malformed,
            ]
        );

        // The parse error travels with the entry; the scanner itself stays quiet
        let malformed = log.read().unwrap()[4].clone();
        assert_eq!(malformed.href.as_deref(), Some("http://[::1"));
        assert!(malformed.error.unwrap().contains("invalid url"));

        let snap = scanner.stats.get_snapshot();
        assert_eq!(snap.removed_by_location, 1);
        assert_eq!(snap.removed_by_user, 1);
    }

    #[test]
    fn test_nested_containers_are_counted_once() {
        let (scanner, _log) = scanner_with_log(&[], &[]);
        let mut doc = MemoryDocument::parse(
            r#"<div class="g"><div class="tF2Cxc"><a href="https://bad.com">bad</a></div></div>"#,
        );
        let inner = doc.query_all(&parse_selector(".tF2Cxc").unwrap())[0];

        let state = ActiveBlockedState {
            user_blocked_domains: vec!["bad.com".to_string()].into(),
            ..Default::default()
        };
        let report = scanner.filter(&mut doc, &HashedMatcher::from_state(&state));

        assert_eq!(report.examined, 2);
        assert_eq!(report.removed, 1);
        assert!(!doc.is_connected(inner));
    }

    #[test]
    fn test_relative_links_resolve_against_base() {
        let (scanner, _log) = scanner_with_log(&[], &[]);
        let mut doc = MemoryDocument::new()
            .with_base_url(url::Url::parse("https://www.google.com/search?q=x").unwrap());
        doc.append_result("g", Some("/url?q=https://safe.com"));

        let state = ActiveBlockedState {
            user_blocked_domains: vec!["google.com".to_string()].into(),
            ..Default::default()
        };
        let report = scanner.filter(&mut doc, &HashedMatcher::from_state(&state));
        assert_eq!(report.removed, 1);
    }
}
