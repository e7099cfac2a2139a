pub mod console_sink;
pub mod memory_sink;
pub mod types;

pub use self::console_sink::ConsoleLogSink;
pub use self::memory_sink::MemoryLogSink;
pub use self::types::{FilterAction, FilterLogEntry, FilterLogSink};

use crate::config::LoggingConfig;
use std::sync::Arc;
use tracing::warn;

/// Fans each filter decision out to the configured sinks.
pub struct FilterLogger {
    sinks: Vec<Box<dyn FilterLogSink>>,
}

impl FilterLogger {
    pub fn new(config: &LoggingConfig, extra_sinks: Vec<Box<dyn FilterLogSink>>) -> Arc<Self> {
        let mut sinks: Vec<Box<dyn FilterLogSink>> = Vec::new();

        for sink_type in &config.filter_log_sinks {
            match sink_type.as_str() {
                "console" => sinks.push(Box::new(ConsoleLogSink::new(config.clone()))),
                // The caller builds memory sinks so it can keep the buffer handle
                "memory" => {}
                other => warn!("Unknown filter log sink type: {}", other),
            }
        }
        sinks.extend(extra_sinks);

        Arc::new(Self { sinks })
    }

    /// A logger with no sinks.
    pub fn disabled() -> Arc<Self> {
        Arc::new(Self { sinks: Vec::new() })
    }

    pub fn log(&self, entry: FilterLogEntry) {
        for sink in &self.sinks {
            sink.log(&entry);
        }
    }
}
