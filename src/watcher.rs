use crate::document::{Document, MutationKind, MutationRecord};
use crate::scanner::ResultScanner;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Re-runs the scanner after every batch of document mutations.
///
/// Removal batches caused by the scanner itself trigger one more pass that
/// finds nothing left to remove, so the loop settles on its own.
pub struct MutationWatcher<D> {
    scanner: Arc<ResultScanner>,
    document: Arc<Mutex<D>>,
}

impl<D: Document + 'static> MutationWatcher<D> {
    pub fn new(scanner: Arc<ResultScanner>, document: Arc<Mutex<D>>) -> Self {
        Self { scanner, document }
    }

    pub fn spawn(self, records: UnboundedReceiver<MutationRecord>) -> JoinHandle<usize> {
        tokio::spawn(self.run(records))
    }

    /// Scans once, then once per batch until the record channel closes.
    /// Returns the number of scans started.
    pub async fn run(self, mut records: UnboundedReceiver<MutationRecord>) -> usize {
        let mut scans = 1;
        self.rescan().await;

        while let Some(first) = records.recv().await {
            let mut added = usize::from(first.kind == MutationKind::Added);
            let mut total = 1;
            while let Ok(record) = records.try_recv() {
                added += usize::from(record.kind == MutationKind::Added);
                total += 1;
            }
            debug!("Mutation batch: {} records ({} added)", total, added);

            scans += 1;
            self.rescan().await;
        }

        info!("Document observer closed after {} scans.", scans);
        scans
    }

    async fn rescan(&self) {
        match self.scanner.scan(&*self.document).await {
            Ok(report) if report.removed > 0 => {
                info!("Removed {} blocked result(s)", report.removed)
            }
            Ok(_) => {}
            Err(e) => error!("Scan failed: {}", e),
        }
    }
}
