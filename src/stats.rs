use crate::engine::BlockSource;
use crate::scanner::ScanReport;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct StatsCollector {
    scans: AtomicU64,
    failed_scans: AtomicU64,
    examined: AtomicU64,
    removed_by_location: AtomicU64,
    removed_by_user: AtomicU64,
    missing_link: AtomicU64,
    malformed: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub scans: u64,
    pub failed_scans: u64,
    pub examined: u64,
    pub removed: u64,
    pub removed_by_location: u64,
    pub removed_by_user: u64,
    pub missing_link: u64,
    pub malformed: u64,
}

impl StatsCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_failed_scan(&self) {
        self.failed_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_removed_by_source(&self, source: BlockSource) {
        let counter = match source {
            BlockSource::Location => &self.removed_by_location,
            BlockSource::User => &self.removed_by_user,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan(&self, report: &ScanReport) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.examined
            .fetch_add(report.examined as u64, Ordering::Relaxed);
        self.missing_link
            .fetch_add(report.missing_link as u64, Ordering::Relaxed);
        self.malformed
            .fetch_add(report.malformed as u64, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> StatsSnapshot {
        let removed_by_location = self.removed_by_location.load(Ordering::Relaxed);
        let removed_by_user = self.removed_by_user.load(Ordering::Relaxed);
        StatsSnapshot {
            scans: self.scans.load(Ordering::Relaxed),
            failed_scans: self.failed_scans.load(Ordering::Relaxed),
            examined: self.examined.load(Ordering::Relaxed),
            removed: removed_by_location + removed_by_user,
            removed_by_location,
            removed_by_user,
            missing_link: self.missing_link.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let s = self.get_snapshot();
        info!(
            "STATS DUMP: Scans: {} ({} failed), Examined: {}, Removed: {} ({:.1}%) [location: {}, user: {}], NoLink: {}, Malformed: {}",
            s.scans,
            s.failed_scans,
            s.examined,
            s.removed,
            if s.examined > 0 {
                (s.removed as f64 / s.examined as f64) * 100.0
            } else {
                0.0
            },
            s.removed_by_location,
            s.removed_by_user,
            s.missing_link,
            s.malformed
        );
    }
}
