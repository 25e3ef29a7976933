//! Custom error types for the Crosscut website
//!
//! This module defines the crate-wide error type and implements the necessary
//! traits to handle errors consistently, including turning them into HTTP
//! responses at the request handler boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::path::PathBuf;

/// Main error type for the Crosscut website
#[derive(Debug)]
pub enum WebsiteError {
    /// Error occurred while parsing the listen address
    AddressParse(std::net::AddrParseError),

    /// Error occurred while binding or running the server
    Server(std::io::Error),

    /// Error occurred while reading the configuration file
    ConfigRead(std::io::Error),

    /// Error occurred while parsing the configuration file
    ConfigParse(json5::Error),

    /// Configuration is invalid, or a configured root directory is unusable
    Configuration(String),

    /// The daily notes directory could not be scanned
    ContentDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A note file exists but could not be read
    NoteRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Error occurred while rendering a page template
    Render(askama::Error),

    /// Error occurred while watching the configuration file
    Watch(notify::Error),

    /// Error occurred while delivering a request record
    Analytics(reqwest::Error),

    /// Generic error with a message
    Generic(String),
}

impl fmt::Display for WebsiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebsiteError::AddressParse(e) => {
                write!(f, "Failed to parse network address: {e}")
            }
            WebsiteError::Server(e) => {
                write!(f, "Server runtime error: {e}")
            }
            WebsiteError::ConfigRead(e) => {
                write!(f, "Failed to read configuration file: {e}")
            }
            WebsiteError::ConfigParse(e) => {
                write!(f, "Failed to parse configuration: {e}")
            }
            WebsiteError::Configuration(msg) => {
                write!(f, "Invalid configuration: {msg}")
            }
            WebsiteError::ContentDir { path, source } => {
                write!(
                    f,
                    "Failed to list daily notes in {}: {source}",
                    path.display()
                )
            }
            WebsiteError::NoteRead { path, source } => {
                write!(f, "Failed to read note {}: {source}", path.display())
            }
            WebsiteError::Render(e) => {
                write!(f, "Template rendering error: {e}")
            }
            WebsiteError::Watch(e) => {
                write!(f, "Failed to watch configuration file: {e}")
            }
            WebsiteError::Analytics(e) => {
                write!(f, "Failed to send request record: {e}")
            }
            WebsiteError::Generic(msg) => {
                write!(f, "Error: {msg}")
            }
        }
    }
}

impl std::error::Error for WebsiteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WebsiteError::AddressParse(e) => Some(e),
            WebsiteError::Server(e) | WebsiteError::ConfigRead(e) => Some(e),
            WebsiteError::ConfigParse(e) => Some(e),
            WebsiteError::ContentDir { source, .. } | WebsiteError::NoteRead { source, .. } => {
                Some(source)
            }
            WebsiteError::Render(e) => Some(e),
            WebsiteError::Watch(e) => Some(e),
            WebsiteError::Analytics(e) => Some(e),
            WebsiteError::Configuration(_) | WebsiteError::Generic(_) => None,
        }
    }
}

impl From<std::net::AddrParseError> for WebsiteError {
    fn from(error: std::net::AddrParseError) -> Self {
        WebsiteError::AddressParse(error)
    }
}

impl From<json5::Error> for WebsiteError {
    fn from(error: json5::Error) -> Self {
        WebsiteError::ConfigParse(error)
    }
}

impl From<askama::Error> for WebsiteError {
    fn from(error: askama::Error) -> Self {
        WebsiteError::Render(error)
    }
}

impl From<notify::Error> for WebsiteError {
    fn from(error: notify::Error) -> Self {
        WebsiteError::Watch(error)
    }
}

impl From<reqwest::Error> for WebsiteError {
    fn from(error: reqwest::Error) -> Self {
        WebsiteError::Analytics(error)
    }
}

impl From<&str> for WebsiteError {
    fn from(msg: &str) -> Self {
        WebsiteError::Generic(msg.to_string())
    }
}

impl From<String> for WebsiteError {
    fn from(msg: String) -> Self {
        WebsiteError::Generic(msg)
    }
}

impl IntoResponse for WebsiteError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

/// Result type alias using our custom error type
pub type Result<T> = std::result::Result<T, WebsiteError>;
