//! Removes search results that point at blocked domains.
//!
//! A [`scanner::ResultScanner`] filters a [`document::Document`] against the
//! state served over a [`bridge::MessageBridge`]; a [`watcher::MutationWatcher`]
//! re-applies it as the page changes, and a [`panel::PreferencesPanel`]
//! edits the lists behind it.

pub mod bridge;
pub mod config;
pub mod db;
pub mod document;
pub mod domain;
pub mod engine;
pub mod init;
pub mod logger;
pub mod panel;
pub mod scanner;
pub mod stats;
pub mod store;
pub mod watcher;
