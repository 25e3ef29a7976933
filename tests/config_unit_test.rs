use crosscut_website::config::{self, Config};
use crosscut_website::error::WebsiteError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

#[test]
fn test_load_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json5");
    fs::write(
        &path,
        r#"{
            site: {
                name: "Notebook",
                author: { name: "Someone", address: ["Street 1"], email: "someone@example.com" },
            },
            canonical_host: "notes.example.com",
            legacy_hosts: ["old.example.com"],
            content_dir: "notes",
            note_extension: "markdown",
        }"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.site.name, "Notebook");
    assert_eq!(config.site.author.address, vec!["Street 1".to_string()]);
    assert_eq!(config.site.author.mailto(), "mailto:someone@example.com");
    assert_eq!(config.canonical_host, "notes.example.com");
    assert_eq!(config.legacy_hosts, vec!["old.example.com".to_string()]);
    assert_eq!(config.content_dir, PathBuf::from("notes"));
    assert_eq!(config.note_extension, "markdown");
    assert_eq!(config.site.rename.old_name, "Caterpillar");
}

#[test]
fn test_load_invalid_json5() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json5");
    fs::write(&path, "{ site: ").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, WebsiteError::ConfigParse(_)));
}

#[test]
fn test_resolve_path_prefers_explicit_path() {
    let explicit = PathBuf::from("elsewhere.json5");
    assert_eq!(
        Config::resolve_path(Some(explicit.clone())),
        Some(explicit)
    );
}

#[test]
fn test_serialized_config_round_trips() {
    let config = Config {
        analytics_endpoint: Some("https://collector.example.com/requests".to_string()),
        ..Config::default()
    };
    let text = serde_json::to_string_pretty(&config).unwrap();
    assert_eq!(Config::parse(&text).unwrap(), config);
}

/// Write a config named `name` whose roots live under `root`.
fn write_site_config(path: &Path, name: &str, root: &Path, static_dir: &Path) {
    let text = serde_json::json!({
        "site": { "name": name },
        "content_dir": root.join("content"),
        "static_dir": static_dir,
    });
    fs::write(path, text.to_string()).unwrap();
}

/// Temp dir holding `content/` and `static/` roots.
fn site_root() -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("content")).unwrap();
    fs::create_dir_all(dir.path().join("static")).unwrap();
    dir
}

#[tokio::test]
async fn test_watch_reloads_changed_config() {
    let dir = site_root();
    let path = dir.path().join("config.json5");
    let static_dir = dir.path().join("static");
    write_site_config(&path, "Before", dir.path(), &static_dir);

    let shared = Arc::new(RwLock::new(Config::load(Some(&path)).unwrap()));
    let _watcher = config::watch(&path, shared.clone()).expect("Failed to watch config");

    write_site_config(&path, "After", dir.path(), &static_dir);

    let mut reloaded = false;
    for _ in 0..50 {
        if shared.read().unwrap().site.name == "After" {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(reloaded, "configuration was not reloaded");
}

#[tokio::test]
async fn test_watch_keeps_previous_config_on_invalid_change() {
    let dir = site_root();
    let path = dir.path().join("config.json5");
    let static_dir = dir.path().join("static");
    write_site_config(&path, "Valid", dir.path(), &static_dir);

    let shared = Arc::new(RwLock::new(Config::load(Some(&path)).unwrap()));
    let _watcher = config::watch(&path, shared.clone()).expect("Failed to watch config");

    write_site_config(&path, "", dir.path(), &static_dir);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(shared.read().unwrap().site.name, "Valid");
}

#[tokio::test]
async fn test_watch_keeps_previous_config_when_static_dir_is_missing() {
    let dir = site_root();
    let path = dir.path().join("config.json5");
    let static_dir = dir.path().join("static");
    write_site_config(&path, "Valid", dir.path(), &static_dir);

    let shared = Arc::new(RwLock::new(Config::load(Some(&path)).unwrap()));
    let _watcher = config::watch(&path, shared.clone()).expect("Failed to watch config");

    write_site_config(&path, "Typo", dir.path(), &dir.path().join("typo"));
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let current = shared.read().unwrap();
    assert_eq!(current.site.name, "Valid");
    assert_eq!(current.static_dir, static_dir);
    assert!(current.check_directories().is_ok());
}
