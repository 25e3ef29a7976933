//! # Crosscut Website Library
//!
//! This library provides the functionality behind the Crosscut website: a small
//! HTTP server that renders a directory of dated markdown files ("daily notes")
//! as HTML pages and serves everything else from a static directory.
//!
//! ## Overview
//!
//! - `config`: Loads, validates and watches the site configuration
//! - `error`: Defines the crate error type
//! - `notes`: Lists and reads daily notes and works out their neighbours
//! - `markdown`: Converts note markdown to sanitized HTML
//! - `pages`: Renders the index, note and not-found pages
//! - `routes`: Decides how each request is answered
//! - `server`: Runs the web server
//! - `analytics`: Optional request tracking
//!
//! ## Getting Started
//!
//! ```no_run
//! use crosscut_website::{config::CONFIG_FILE, server};
//! use std::path::PathBuf;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), crosscut_website::error::WebsiteError> {
//!     let cancel_token = CancellationToken::new();
//!     let config_path = Some(PathBuf::from(CONFIG_FILE));
//!
//!     server::run(3000, config_path, cancel_token).await
//! }
//! ```
//!
//! ## Requests
//!
//! | Path | Response |
//! |---|---|
//! | any path on a legacy host | 308 to the same path on the canonical host |
//! | `/` | 307 to `/daily` |
//! | `/daily/` | 307 to `/daily` |
//! | `/daily` | listing of all daily notes |
//! | `/daily/YYYY-MM-DD/` | 307 to `/daily/YYYY-MM-DD` |
//! | `/daily/YYYY-MM-DD` | the note, or 404 if there is none |
//! | anything else | file from the static directory |

/// Custom error types module
///
/// Defines the `WebsiteError` enum used across the crate, and how an error
/// that reaches a request handler becomes an HTTP response.
pub mod error;

/// Configuration management module
///
/// Loads the site configuration from a JSON5 file, falls back to the built-in
/// Crosscut configuration, validates it, and reloads it when the file changes.
pub mod config;

/// Daily notes module
///
/// Validates note dates, lists the notes in the content directory, reads a
/// single note and finds the notes before and after it.
pub mod notes;

/// Markdown conversion module
pub mod markdown;

/// Page rendering module
///
/// Askama templates for the daily notes listing, a single note and the
/// not-found page, all sharing one layout.
pub mod pages;

/// Route decision module
pub mod routes;

/// Server operations module
///
/// Contains the web server implementation using the Axum framework. A single
/// handler answers every request according to its route decision, delegating
/// unmatched paths to static file serving, and the server shuts down
/// gracefully when its cancellation token is cancelled.
pub mod server;

/// Request tracking module
///
/// Sends a record of each request to a configured endpoint without making the
/// request wait for it.
pub mod analytics;
