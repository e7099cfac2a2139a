use super::{FilterLogEntry, FilterLogSink};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Keeps the most recent entries for display.
pub struct MemoryLogSink {
    buffer: Arc<RwLock<VecDeque<FilterLogEntry>>>,
    capacity: usize,
}

impl MemoryLogSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn get_recent(&self) -> Vec<FilterLogEntry> {
        match self.buffer.read() {
            Ok(buffer) => buffer.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    // Allow sharing the buffer with whoever renders it
    pub fn clone_buffer(&self) -> Arc<RwLock<VecDeque<FilterLogEntry>>> {
        self.buffer.clone()
    }
}

impl FilterLogSink for MemoryLogSink {
    fn log(&self, entry: &FilterLogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut buffer = self.buffer.write().unwrap_or_else(|e| e.into_inner());
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(entry.clone());
    }
}
