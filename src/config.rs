use crate::error::{Result, WebsiteError};
use crate::notes::NoteDate;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use url::Url;

/// Default location of the configuration file
pub const CONFIG_FILE: &str = "config.json5";

/// Application configuration structure
///
/// Every field has a default, so a partial (or absent) configuration file
/// describes the Crosscut website.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Values shown by the page layout
    pub site: SiteConfig,
    /// Host every legacy host redirects to
    pub canonical_host: String,
    /// Retired hosts that permanently redirect to the canonical host
    pub legacy_hosts: Vec<String>,
    /// Directory holding one `YYYY-MM-DD.<ext>` file per daily note
    pub content_dir: PathBuf,
    /// File extension of daily notes
    pub note_extension: String,
    /// Directory served for every path that is not a page
    pub static_dir: PathBuf,
    /// Endpoint receiving request records; tracking is off when unset
    pub analytics_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            canonical_host: "www.crosscut.cc".to_string(),
            legacy_hosts: vec![
                "crosscut.deno.dev".to_string(),
                "capi.hannobraun.com".to_string(),
                "crosscut.cc".to_string(),
            ],
            content_dir: PathBuf::from("content/daily"),
            note_extension: "md".to_string(),
            static_dir: PathBuf::from("static"),
            analytics_endpoint: None,
        }
    }
}

/// Site-wide values used by the page layout and the daily note pages
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Name shown in the header and appended to every page title
    pub name: String,
    /// Stylesheet linked from every page
    pub stylesheet: String,
    /// Link to the project the daily notes are about
    pub project_url: String,
    /// Contact details shown in the footer
    pub author: Author,
    /// Notice shown on notes written before the project was renamed
    pub rename: RenameNotice,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Crosscut".to_string(),
            stylesheet: "/style.css".to_string(),
            project_url: "https://github.com/hannobraun/crosscut".to_string(),
            author: Author::default(),
            rename: RenameNotice::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Author {
    pub name: String,
    /// Postal address, one line per entry
    pub address: Vec<String>,
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "Hanno Braun".to_string(),
            address: vec![
                "Untere Pfarrgasse 19".to_string(),
                "64720 Michelstadt".to_string(),
                "Germany".to_string(),
            ],
            email: "hello@hannobraun.com".to_string(),
        }
    }
}

impl Author {
    /// `mailto:` link for the author's address
    #[must_use]
    pub fn mailto(&self) -> String {
        format!("mailto:{}", self.email)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RenameNotice {
    /// Notes strictly before this date get the notice
    pub cutoff: NoteDate,
    /// First note published under the current name
    pub first_post: NoteDate,
    /// Name the project had before
    pub old_name: String,
}

impl Default for RenameNotice {
    fn default() -> Self {
        let rename_date = NoteDate::parse("2024-12-25").expect("rename date is a valid note date");
        Self {
            cutoff: rename_date.clone(),
            first_post: rename_date,
            old_name: "Caterpillar".to_string(),
        }
    }
}

impl RenameNotice {
    /// Whether the note for `date` predates the rename.
    #[must_use]
    pub fn applies_to(&self, date: &NoteDate) -> bool {
        date < &self.cutoff
    }
}

impl Config {
    /// Pick the configuration file to use.
    ///
    /// An explicit path always wins. Without one, `config.json5` is used when it
    /// exists in the working directory.
    #[must_use]
    pub fn resolve_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit.or_else(|| {
            let default_path = PathBuf::from(CONFIG_FILE);
            default_path.is_file().then_some(default_path)
        })
    }

    /// Load the configuration from `path`, or use the defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::info!("No configuration file, using built-in configuration");
            return Ok(Self::default());
        };

        tracing::debug!("Loading configuration from {}", path.display());
        let config_str = fs::read_to_string(path).map_err(WebsiteError::ConfigRead)?;
        let config = Self::parse(&config_str)?;

        tracing::info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate a JSON5 configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON5 or fails validation.
    pub fn parse(config_str: &str) -> Result<Self> {
        let config: Config = json5::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that would break the site if left empty or malformed.
    ///
    /// # Errors
    ///
    /// Returns `WebsiteError::Configuration` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.site.name.trim().is_empty() {
            return Err(WebsiteError::Configuration(
                "Site name cannot be empty".to_string(),
            ));
        }

        if self.canonical_host.trim().is_empty() {
            return Err(WebsiteError::Configuration(
                "Canonical host cannot be empty".to_string(),
            ));
        }

        if self
            .legacy_hosts
            .iter()
            .any(|host| host.eq_ignore_ascii_case(&self.canonical_host))
        {
            return Err(WebsiteError::Configuration(format!(
                "Canonical host {} cannot also be a legacy host",
                self.canonical_host
            )));
        }

        if self.note_extension.trim().is_empty() {
            return Err(WebsiteError::Configuration(
                "Note extension cannot be empty".to_string(),
            ));
        }

        if let Some(endpoint) = &self.analytics_endpoint {
            match Url::parse(endpoint) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => {
                    return Err(WebsiteError::Configuration(format!(
                        "Invalid analytics endpoint: {endpoint}"
                    )))
                }
            }
        }

        Ok(())
    }

    /// Make sure the content and static roots exist.
    ///
    /// # Errors
    ///
    /// Returns `WebsiteError::Configuration` if either root is not a directory.
    pub fn check_directories(&self) -> Result<()> {
        for (label, dir) in [("Content", &self.content_dir), ("Static", &self.static_dir)] {
            if !dir.is_dir() {
                return Err(WebsiteError::Configuration(format!(
                    "{label} directory {} does not exist or is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Reload the configuration into `config` whenever the file at `path` changes.
///
/// The returned watcher stops watching when dropped. A changed file that fails
/// to load, or whose content or static root is missing, is logged and the
/// previous configuration stays in place.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn watch(path: &Path, config: Arc<RwLock<Config>>) -> Result<RecommendedWatcher> {
    let watched_path = path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Configuration watch error: {e}");
                return;
            }
        };

        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }

        let reloaded = Config::load(Some(&watched_path))
            .and_then(|new_config| new_config.check_directories().map(|()| new_config));

        match reloaded {
            Ok(new_config) => match config.write() {
                Ok(mut guard) => {
                    *guard = new_config;
                    tracing::info!("Configuration reloaded from {}", watched_path.display());
                }
                Err(_) => tracing::error!("Failed to acquire config write lock"),
            },
            Err(e) => {
                tracing::error!("Keeping previous configuration, reload failed: {e}");
            }
        }
    })?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;
    tracing::info!("Watching configuration file {}", path.display());

    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.site.name, "Crosscut");
        assert_eq!(config.canonical_host, "www.crosscut.cc");
        assert_eq!(config.legacy_hosts.len(), 3);
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let config = Config::parse(
            r#"{
                // comments are fine in JSON5
                site: { name: "Notes" },
                content_dir: "notes",
            }"#,
        )
        .unwrap();

        assert_eq!(config.site.name, "Notes");
        assert_eq!(config.site.author, Author::default());
        assert_eq!(config.content_dir, PathBuf::from("notes"));
        assert_eq!(config.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn test_parse_rejects_empty_site_name() {
        let err = Config::parse(r#"{ site: { name: "  " } }"#).unwrap_err();
        assert!(matches!(err, WebsiteError::Configuration(_)));
    }

    #[test]
    fn test_parse_rejects_bad_rename_date() {
        let err = Config::parse(r#"{ site: { rename: { cutoff: "christmas" } } }"#).unwrap_err();
        assert!(matches!(err, WebsiteError::ConfigParse(_)));
    }

    #[test]
    fn test_validate_analytics_endpoint() {
        let mut config = Config {
            analytics_endpoint: Some("not a url".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.analytics_endpoint = Some("ftp://example.com/collect".to_string());
        assert!(config.validate().is_err());

        config.analytics_endpoint = Some("https://example.com/collect".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_analytics_endpoint_is_rejected() {
        for endpoint in ["", "   "] {
            let err = Config::parse(&format!(r#"{{ analytics_endpoint: "{endpoint}" }}"#))
                .unwrap_err();
            assert!(matches!(err, WebsiteError::Configuration(_)));
        }

        let config = Config::parse("{}").unwrap();
        assert_eq!(config.analytics_endpoint, None);
    }

    #[test]
    fn test_validate_canonical_host_not_legacy() {
        let config = Config {
            canonical_host: "Crosscut.cc".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn test_load_missing_explicit_path_is_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.json5"))).unwrap_err();
        assert!(matches!(err, WebsiteError::ConfigRead(_)));
    }

    #[test]
    fn test_check_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config {
            content_dir: dir.path().to_path_buf(),
            static_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        assert!(config.check_directories().is_ok());

        config.static_dir = dir.path().join("missing");
        let err = config.check_directories().unwrap_err();
        assert!(err.to_string().contains("Static directory"));
    }

    #[test]
    fn test_rename_notice_cutoff_is_exclusive() {
        let notice = RenameNotice::default();
        assert!(notice.applies_to(&NoteDate::parse("2024-12-24").unwrap()));
        assert!(!notice.applies_to(&NoteDate::parse("2024-12-25").unwrap()));
        assert!(!notice.applies_to(&NoteDate::parse("2025-01-01").unwrap()));
    }
}
