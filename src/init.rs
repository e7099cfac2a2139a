//! Initialization helpers for the application startup.

use crate::config::{Config, LoggingConfig};
use crate::db::DbClient;
use crate::domain::normalize_domain;
use crate::engine::{prune_ban_table, DomainList, LocationBanTable};
use crate::logger::{FilterLogEntry, FilterLogSink, FilterLogger, MemoryLogSink};
use crate::store::{MemoryStore, PreferenceStore, SqliteStore};
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Opens the configured preference store.
pub fn init_store(config: &Config) -> Result<Arc<dyn PreferenceStore>> {
    match config.store.backend.as_str() {
        "sqlite" => {
            let client = DbClient::new(config.store.sqlite_path.clone())
                .with_context(|| format!("Failed to open {}", config.store.sqlite_path))?;
            client
                .initialize()
                .context("Failed to initialize SQLite database")?;
            info!("Using SQLite preference store.");
            Ok(Arc::new(SqliteStore::new(Arc::new(client))))
        }
        _ => {
            info!("Using in-memory preference store.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Writes `seed` to the store if the store has no ban table yet.
/// Returns whether anything was written.
pub fn seed_ban_table(store: &dyn PreferenceStore, seed: &LocationBanTable) -> Result<bool> {
    if seed.is_empty() || !store.load_ban_table()?.is_empty() {
        return Ok(false);
    }

    let table = prune_ban_table(
        seed.iter()
            .map(|(location, domains)| {
                let domains: DomainList = domains.iter().filter_map(normalize_domain).collect();
                (location.clone(), domains)
            })
            .collect(),
    );
    if table.is_empty() {
        return Ok(false);
    }

    store.save_ban_table(&table)?;
    info!("Seeded ban table with {} location(s)", table.len());
    Ok(true)
}

/// Builds the filter logger. When the `memory` sink is configured, also
/// returns its buffer so the caller can display recent decisions.
pub fn init_filter_logger(
    config: &LoggingConfig,
) -> (
    Arc<FilterLogger>,
    Option<Arc<RwLock<VecDeque<FilterLogEntry>>>>,
) {
    let mut extra_sinks: Vec<Box<dyn FilterLogSink>> = Vec::new();
    let mut buffer = None;

    if config.filter_log_sinks.iter().any(|s| s == "memory") {
        let sink = MemoryLogSink::new(config.memory_capacity);
        buffer = Some(sink.clone_buffer());
        extra_sinks.push(Box::new(sink));
    }

    (FilterLogger::new(config, extra_sinks), buffer)
}
