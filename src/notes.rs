//! Daily notes on disk
//!
//! A daily note is a file named `YYYY-MM-DD.<ext>` in the content directory.
//! This module validates note dates, lists the available notes, reads a single
//! note and works out the previous/next neighbours of a note.

use crate::error::{Result, WebsiteError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

static NOTE_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));

/// Date identifying one daily note, in its canonical `YYYY-MM-DD` form.
///
/// The format is fixed-width and zero-padded, so ordering the text orders the
/// dates chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteDate(String);

impl NoteDate {
    /// Parse a note date, accepting only the strict 4-2-2 digit pattern.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        NOTE_DATE_PATTERN
            .is_match(text)
            .then(|| Self(text.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the page showing this note.
    #[must_use]
    pub fn url_path(&self) -> String {
        format!("/daily/{}", self.0)
    }

    /// File name of this note for the given extension.
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.0)
    }
}

impl fmt::Display for NoteDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteDate {
    type Err = WebsiteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| WebsiteError::from(format!("Invalid note date: {s}")))
    }
}

impl TryFrom<String> for NoteDate {
    type Error = WebsiteError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<NoteDate> for String {
    fn from(date: NoteDate) -> Self {
        date.0
    }
}

/// List the dates of all daily notes in `dir`, most recent first.
///
/// Entries whose name is not `YYYY-MM-DD.<extension>` are ignored. A directory
/// that is missing or unreadable is an error, never an empty listing.
///
/// # Errors
///
/// Returns `WebsiteError::ContentDir` if the directory cannot be read.
pub async fn list_note_dates(dir: &Path, extension: &str) -> Result<Vec<NoteDate>> {
    let content_dir_error = |source| WebsiteError::ContentDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(content_dir_error)?;
    let suffix = format!(".{extension}");
    let mut dates = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(content_dir_error)? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };

        if let Some(date) = name.strip_suffix(&suffix).and_then(NoteDate::parse) {
            dates.push(date);
        }
    }

    dates.sort();
    dates.reverse();

    debug!("Listed {} daily notes in {}", dates.len(), dir.display());
    Ok(dates)
}

/// Read the note for `date`, returning `None` if there is no such note.
///
/// Bytes that are not valid UTF-8 become replacement characters.
///
/// # Errors
///
/// Returns `WebsiteError::NoteRead` if the file exists but cannot be read.
pub async fn read_note(dir: &Path, date: &NoteDate, extension: &str) -> Result<Option<String>> {
    let path: PathBuf = dir.join(date.file_name(extension));

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No daily note at {}", path.display());
            Ok(None)
        }
        Err(source) => Err(WebsiteError::NoteRead { path, source }),
    }
}

/// Neighbours of a note within a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    /// Chronologically earlier note
    pub previous: Option<NoteDate>,
    /// Chronologically later note
    pub next: Option<NoteDate>,
}

impl Navigation {
    /// Locate `date` in a most-recent-first listing.
    ///
    /// A date that is not in the listing has no neighbours.
    #[must_use]
    pub fn locate(date: &NoteDate, dates: &[NoteDate]) -> Self {
        let Some(index) = dates.iter().position(|d| d == date) else {
            return Self::default();
        };

        Self {
            previous: dates.get(index + 1).cloned(),
            next: index
                .checked_sub(1)
                .and_then(|i| dates.get(i))
                .cloned(),
        }
    }
}
