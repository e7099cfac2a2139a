use serp_filter::bridge::{MessageBridge, StoreBridge};
use serp_filter::config::Config;
use serp_filter::engine::LocationBanTable;
use serp_filter::init::{init_store, seed_ban_table};
use serp_filter::panel::PreferencesPanel;
use serp_filter::store::PreferenceStore;
use std::sync::Arc;

fn sqlite_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.store.backend = "sqlite".to_string();
    config.store.sqlite_path = dir
        .path()
        .join("prefs.db")
        .to_string_lossy()
        .into_owned();
    config
}

#[tokio::test]
async fn test_preferences_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(&dir);

    {
        let store = init_store(&config).unwrap();
        let mut seed = LocationBanTable::new();
        seed.insert("US".into(), vec!["ads.example.com".to_string()].into());
        assert!(seed_ban_table(store.as_ref(), &seed).unwrap());

        let bridge: Arc<dyn MessageBridge> = Arc::new(StoreBridge::new(store, "me", "US"));
        let mut panel = PreferencesPanel::new(bridge, &config.panel);
        panel.load().await.unwrap();
        panel.add_blocked_domain("tracker.net").await.unwrap();
        panel.add_blocked_domain("tracker.net").await.unwrap();
        panel.toggle_override("ads.example.com").await.unwrap();
        panel
            .update_location_bans("UK", "b.co.uk, a.co.uk")
            .await
            .unwrap();
    }

    let store = init_store(&config).unwrap();
    let state = StoreBridge::new(store, "me", "UK")
        .get_blocked_domains()
        .await
        .unwrap();

    assert_eq!(
        state.banned_domains.iter().collect::<Vec<_>>(),
        vec!["b.co.uk", "a.co.uk"]
    );
    assert_eq!(state.full_banned_list["US"].len(), 1);
    assert_eq!(
        state.user_blocked_domains.iter().collect::<Vec<_>>(),
        vec!["tracker.net"]
    );
    assert!(state.override_domains.contains("ads.example.com"));
}

#[tokio::test]
async fn test_dropping_a_location_removes_its_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = init_store(&sqlite_config(&dir)).unwrap();
    let bridge = StoreBridge::new(store.clone(), "me", "US");

    let mut table = LocationBanTable::new();
    table.insert("US".into(), vec!["a.com".to_string()].into());
    table.insert("UK".into(), vec!["b.com".to_string()].into());
    bridge.update_banned_domains(table.clone()).await.unwrap();

    table.remove("UK");
    bridge.update_banned_domains(table).await.unwrap();

    let stored = store.load_ban_table().unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored.contains_key("US"));
}

#[tokio::test]
async fn test_empty_location_is_dropped_by_both_stores() {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = init_store(&sqlite_config(&dir)).unwrap();
    let memory = init_store(&Config::default()).unwrap();

    for store in [sqlite, memory] {
        let bridge = StoreBridge::new(store, "me", "UK");
        let table: LocationBanTable =
            serde_json::from_str(r#"{"US": ["a.com"], "UK": []}"#).unwrap();
        bridge.update_banned_domains(table).await.unwrap();

        let state = bridge.get_blocked_domains().await.unwrap();
        assert_eq!(
            state.full_banned_list.keys().collect::<Vec<_>>(),
            vec!["US"]
        );
        assert!(state.banned_domains.is_empty());
    }
}
