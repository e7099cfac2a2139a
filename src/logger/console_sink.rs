use crate::config::LoggingConfig;
use crate::logger::types::{FilterAction, FilterLogEntry, FilterLogSink};
use tracing::{info, warn};

pub struct ConsoleLogSink {
    config: LoggingConfig,
}

impl ConsoleLogSink {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    fn should_log(&self, action: FilterAction) -> bool {
        match action {
            FilterAction::Removed(_) => self.config.log_removed,
            FilterAction::Malformed => true,
            FilterAction::Kept | FilterAction::MissingLink => self.config.log_kept,
        }
    }
}

impl FilterLogSink for ConsoleLogSink {
    fn log(&self, entry: &FilterLogEntry) {
        if !self.config.enable || !self.should_log(entry.action) {
            return;
        }

        if self.config.format == "json" {
            info!(
                target: "result_filter",
                node = %entry.node,
                href = ?entry.href,
                domain = ?entry.domain,
                action = ?entry.action,
                error = ?entry.error
            );
            return;
        }

        let domain = entry.domain.as_deref().unwrap_or("-");
        match entry.action {
            FilterAction::Removed(source) => {
                info!("{} {} -> removed ({:?} list)", entry.node, domain, source)
            }
            FilterAction::Kept => info!("{} {} -> kept", entry.node, domain),
            FilterAction::MissingLink => info!("{} -> skipped, no link", entry.node),
            FilterAction::Malformed => warn!(
                "{} -> skipped, malformed link {:?}: {}",
                entry.node,
                entry.href.as_deref().unwrap_or_default(),
                entry.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
