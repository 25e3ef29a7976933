//! Route decisions
//!
//! Every request is matched against an ordered table of rules using only its
//! host and path (plus the query, which legacy redirects carry over). The
//! first rule that matches decides what the server does.

use crate::config::Config;
use crate::notes::NoteDate;
use url::Url;

/// Path of the daily notes listing
pub const DAILY_PATH: &str = "/daily";

/// What to do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Retired host: permanent redirect to the same path on the canonical host
    LegacyHost { location: String },
    /// `/`: temporary redirect to the listing
    Root,
    /// `/daily/`: temporary redirect to `/daily`
    IndexTrailingSlash,
    /// `/daily`: the listing of all notes
    Index,
    /// `/daily/YYYY-MM-DD/`: temporary redirect to the note without the slash
    NoteTrailingSlash(NoteDate),
    /// `/daily/YYYY-MM-DD`: a single note
    Note(NoteDate),
    /// Anything else is served from the static directory
    Static,
}

impl Route {
    /// Redirect target, for the routes that redirect.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match self {
            Route::LegacyHost { location } => Some(location.clone()),
            Route::Root | Route::IndexTrailingSlash => Some(DAILY_PATH.to_string()),
            Route::NoteTrailingSlash(date) => Some(date.url_path()),
            Route::Index | Route::Note(_) | Route::Static => None,
        }
    }
}

/// The parts of a request that routing looks at
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    /// Host name without port, if the request named one
    pub host: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

type Rule = fn(&RouteRequest<'_>, &Config) -> Option<Route>;

/// Rules in priority order; the first match wins.
const RULES: &[Rule] = &[
    legacy_host,
    root,
    index_trailing_slash,
    index,
    note_trailing_slash,
    note,
];

/// Decide how to answer `request`.
#[must_use]
pub fn decide(request: &RouteRequest<'_>, config: &Config) -> Route {
    RULES
        .iter()
        .find_map(|rule| rule(request, config))
        .unwrap_or(Route::Static)
}

fn legacy_host(request: &RouteRequest<'_>, config: &Config) -> Option<Route> {
    let host = request.host?;
    if !config
        .legacy_hosts
        .iter()
        .any(|legacy| legacy.eq_ignore_ascii_case(host))
    {
        return None;
    }

    Some(Route::LegacyHost {
        location: canonical_location(&config.canonical_host, request.path, request.query),
    })
}

fn root(request: &RouteRequest<'_>, _config: &Config) -> Option<Route> {
    (request.path == "/").then_some(Route::Root)
}

fn index_trailing_slash(request: &RouteRequest<'_>, _config: &Config) -> Option<Route> {
    request
        .path
        .strip_prefix(DAILY_PATH)
        .is_some_and(|rest| rest == "/")
        .then_some(Route::IndexTrailingSlash)
}

fn index(request: &RouteRequest<'_>, _config: &Config) -> Option<Route> {
    (request.path == DAILY_PATH).then_some(Route::Index)
}

fn note_trailing_slash(request: &RouteRequest<'_>, _config: &Config) -> Option<Route> {
    note_segment(request.path)?
        .strip_suffix('/')
        .and_then(NoteDate::parse)
        .map(Route::NoteTrailingSlash)
}

fn note(request: &RouteRequest<'_>, _config: &Config) -> Option<Route> {
    note_segment(request.path)
        .and_then(NoteDate::parse)
        .map(Route::Note)
}

fn note_segment(path: &str) -> Option<&str> {
    path.strip_prefix(DAILY_PATH)?.strip_prefix('/')
}

/// `https://<canonical host><path>`, keeping the query string.
fn canonical_location(canonical_host: &str, path: &str, query: Option<&str>) -> String {
    match Url::parse(&format!("https://{canonical_host}")) {
        Ok(mut url) => {
            url.set_path(path);
            url.set_query(query);
            url.to_string()
        }
        Err(e) => {
            tracing::warn!("Canonical host {canonical_host} is not a valid URL host: {e}");
            let query = query.map(|q| format!("?{q}")).unwrap_or_default();
            format!("https://{canonical_host}{path}{query}")
        }
    }
}
