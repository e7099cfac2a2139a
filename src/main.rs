use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use serp_filter::bridge::{MessageBridge, StoreBridge};
use serp_filter::config::Config;
use serp_filter::document::{parse_selector, MemoryDocument};
use serp_filter::domain::normalize_url;
use serp_filter::engine::{DomainMatcher, HashedMatcher};
use serp_filter::init::{init_filter_logger, init_store, seed_ban_table, setup_logging};
use serp_filter::panel::{Edit, PreferencesPanel};
use serp_filter::scanner::ResultScanner;
use serp_filter::stats::StatsCollector;

/// Search result domain filter.
#[derive(Parser)]
#[command(name = "serp-filter")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the active location's bans and the user's own lists
    Show {
        /// Case-insensitive substring filter
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Add a domain to the user's block list
    Block { domain: String },
    /// Remove a domain from the user's block list
    Unblock { domain: String },
    /// Toggle the override for a domain
    Override { domain: String },
    /// Replace a location's ban list with comma-separated domains
    Ban { location: String, domains: String },
    /// Report whether a result linking to URL would be removed
    Check { url: String },
    /// Filter search results and print the surviving links
    Scan {
        /// Result URLs to wrap in synthetic result containers
        urls: Vec<String>,
        /// Saved results page to filter instead of URLs
        #[arg(long)]
        html: Option<PathBuf>,
        /// Base URL for resolving relative links in the page
        #[arg(long)]
        base: Option<url::Url>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load Config
    let config_exists = cli.config.exists();
    let config = if config_exists {
        Config::load(&cli.config).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config.logging);
    if !config_exists {
        info!("Config file not found, using defaults.");
    }

    // 3. Open Store & Bridge
    let store = init_store(&config)?;
    seed_ban_table(store.as_ref(), &config.seed)?;
    let bridge: Arc<dyn MessageBridge> = Arc::new(StoreBridge::new(
        store,
        config.user_id.clone(),
        config.location.clone(),
    ));

    match cli.command {
        Commands::Check { url } => check(bridge.as_ref(), &url).await,
        Commands::Scan { urls, html, base } => {
            scan(&config, bridge, &urls, html.as_deref(), base).await
        }
        command => edit(&config, bridge, command).await,
    }
}

async fn check(bridge: &dyn MessageBridge, url: &str) -> Result<()> {
    let domain = normalize_url(url)?;
    let state = bridge.get_blocked_domains().await?;
    match HashedMatcher::from_state(&state).check(&domain) {
        Some(source) => println!("{domain}: remove ({source:?} list)"),
        None if state.override_domains.contains(&domain) => println!("{domain}: keep (overridden)"),
        None => println!("{domain}: keep"),
    }
    Ok(())
}

async fn scan(
    config: &Config,
    bridge: Arc<dyn MessageBridge>,
    urls: &[String],
    html: Option<&Path>,
    base: Option<url::Url>,
) -> Result<()> {
    let (logger, _) = init_filter_logger(&config.logging);
    let stats = StatsCollector::new();
    let scanner = ResultScanner::new(bridge, &config.filter, logger, stats.clone())?;

    let mut document = match html {
        Some(path) => {
            let markup = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            MemoryDocument::parse(&markup)
        }
        None => MemoryDocument::new(),
    };
    if let Some(base) = base {
        document = document.with_base_url(base);
    }
    let class = first_class(&config.filter.result_selector).unwrap_or("g");
    for url in urls {
        document.append_result(class, Some(url));
    }
    let document = Mutex::new(document);

    scanner.scan(&document).await?;
    stats.log_summary();

    let link = parse_selector(&config.filter.link_selector)?;
    let document = document.into_inner().unwrap_or_else(|e| e.into_inner());
    for href in document.hrefs(&link) {
        println!("{href}");
    }
    Ok(())
}

/// First `.class` in a selector list, used to shape synthetic results.
fn first_class(selector: &str) -> Option<&str> {
    let start = selector.find('.')? + 1;
    let rest = &selector[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    Some(&rest[..end]).filter(|c| !c.is_empty())
}

async fn edit(config: &Config, bridge: Arc<dyn MessageBridge>, command: Commands) -> Result<()> {
    let mut panel = PreferencesPanel::new(bridge, &config.panel);
    panel.load().await?;

    let outcome = match command {
        Commands::Show { query, page } => {
            panel.set_search_query(query);
            for _ in 1..page {
                panel.next_page();
            }
            print_panel(&panel);
            return Ok(());
        }
        Commands::Block { domain } => panel.add_blocked_domain(&domain).await?,
        Commands::Unblock { domain } => panel.remove_user_block(&domain).await?,
        Commands::Override { domain } => panel.toggle_override(&domain).await?,
        Commands::Ban { location, domains } => {
            panel.update_location_bans(&location, &domains).await?
        }
        Commands::Check { .. } | Commands::Scan { .. } => return Ok(()),
    };

    if outcome == Edit::Skipped {
        warn!("Nothing to change.");
    }
    print_panel(&panel);
    Ok(())
}

fn print_panel(panel: &PreferencesPanel) {
    let state = panel.state();
    println!("Location: {}", state.location);

    println!("Location-based blocked sites:");
    for domain in panel.visible_banned_domains() {
        let mark = if panel.is_overridden(domain) { "x" } else { " " };
        println!("  [{mark}] {domain}");
    }
    println!(
        "  Page {} of {}",
        panel.current_page(),
        panel.total_pages()
    );

    println!("Your blocked sites:");
    for domain in panel.filtered_user_blocked_domains() {
        println!("  {domain}");
    }

    println!("Overrides:");
    for domain in state.override_domains.iter() {
        println!("  {domain}");
    }
}
