use crate::analytics::{self, RequestRecord};
use crate::config::Config;
use crate::error::{Result, WebsiteError};
use crate::notes::{self, NoteDate};
use crate::pages;
use crate::routes::{self, Route, RouteRequest};
use axum::{
    extract::{Request, State},
    http::{header, uri::Authority, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Router,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    /// Current configuration, replaced when the configuration file changes
    pub config: Arc<RwLock<Config>>,
    /// Client used for request tracking
    pub http_client: reqwest::Client,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            http_client: reqwest::Client::new(),
        }
    }

    /// Copy of the configuration, so no lock is held while a request is served.
    fn config_snapshot(&self) -> Result<Config> {
        self.config
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| WebsiteError::from("Configuration read lock error"))
    }
}

/// Build the application router.
///
/// There are no fixed routes: every request goes through the route decision
/// table, with static files as the last resort.
pub fn app(state: AppState) -> Router {
    Router::new().fallback(serve_page).with_state(state)
}

/// Run the web server on the specified port.
///
/// # Arguments
///
/// * `port` - The port number to bind the server to
/// * `config_path` - Configuration file; `config.json5` is used if present when `None`
/// * `cancel_token` - Cancelling it shuts the server down gracefully
///
/// # Errors
///
/// Returns an error if:
/// - The configuration cannot be loaded or is invalid
/// - The content or static directory does not exist
/// - The server fails to bind to the specified address
pub async fn run(
    port: u16,
    config_path: Option<PathBuf>,
    cancel_token: CancellationToken,
) -> Result<()> {
    tracing::info!("Initializing server");

    let config_path = Config::resolve_path(config_path);
    let config = Config::load(config_path.as_deref())?;
    config.check_directories()?;
    tracing::info!(
        "Serving daily notes from {} and static files from {}",
        config.content_dir.display(),
        config.static_dir.display()
    );

    let state = AppState::new(config);

    // Dropping the watcher stops it, so it lives as long as the server.
    let _watcher = match &config_path {
        Some(path) => Some(crate::config::watch(path, state.config.clone())?),
        None => None,
    };

    let app = app(state);
    tracing::debug!("Routes configured");

    let addr = format!("0.0.0.0:{port}");
    let address: SocketAddr = addr.parse()?;
    tracing::info!("Binding server to address: {address}");

    let listener = TcpListener::bind(address)
        .await
        .map_err(WebsiteError::Server)?;

    tracing::info!("Site launched on: http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await
        .map_err(WebsiteError::Server)?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Answer any request according to its route decision.
async fn serve_page(State(state): State<AppState>, request: Request) -> Response {
    let config = match state.config_snapshot() {
        Ok(config) => config,
        Err(e) => return e.into_response(),
    };

    if let Some(endpoint) = &config.analytics_endpoint {
        let record = RequestRecord::new(request.method(), request.uri(), request.headers());
        analytics::track_request(state.http_client.clone(), endpoint.clone(), record);
    }

    let host = request_host(&request);
    let route = routes::decide(
        &RouteRequest {
            host: host.as_deref(),
            path: request.uri().path(),
            query: request.uri().query(),
        },
        &config,
    );
    tracing::debug!(
        "{} {} (host {:?}) -> {route:?}",
        request.method(),
        request.uri(),
        host
    );

    if let Some(location) = route.location() {
        let redirect = if matches!(route, Route::LegacyHost { .. }) {
            Redirect::permanent(&location)
        } else {
            Redirect::temporary(&location)
        };
        return redirect.into_response();
    }

    match route {
        Route::Index => index_page(&config).await.into_response(),
        Route::Note(date) => note_page(&config, &date, request.uri().path()).await,
        // Redirects are answered above
        _ => serve_static(&config.static_dir, request).await,
    }
}

async fn index_page(config: &Config) -> Result<Html<String>> {
    let dates = notes::list_note_dates(&config.content_dir, &config.note_extension).await?;
    let page = pages::render_index(&config.site, &dates)?;
    Ok(Html(page))
}

async fn note_page(config: &Config, date: &NoteDate, path: &str) -> Response {
    let result: Result<Option<String>> = async {
        let Some(content) =
            notes::read_note(&config.content_dir, date, &config.note_extension).await?
        else {
            return Ok(None);
        };

        // The listing may have changed since the note was read; navigation is best-effort.
        let dates = notes::list_note_dates(&config.content_dir, &config.note_extension).await?;
        pages::render_note(&config.site, date, &content, &dates).map(Some)
    }
    .await;

    match result {
        Ok(Some(page)) => Html(page).into_response(),
        Ok(None) => {
            tracing::info!("Daily note not found: {date}");
            not_found(config, path)
        }
        Err(e) => e.into_response(),
    }
}

fn not_found(config: &Config, path: &str) -> Response {
    match pages::render_not_found(&config.site, path) {
        Ok(page) => (StatusCode::NOT_FOUND, Html(page)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render not-found page: {e}");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

async fn serve_static(static_dir: &Path, request: Request) -> Response {
    match ServeDir::new(static_dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// Host the request was sent to, lowercased and without port.
fn request_host(request: &Request) -> Option<String> {
    if let Some(host) = request.uri().host() {
        return Some(host.to_ascii_lowercase());
    }

    let value = request.headers().get(header::HOST)?.to_str().ok()?;
    let authority: Authority = value.parse().ok()?;
    Some(authority.host().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_host(host: &str) -> Request {
        axum::http::Request::builder()
            .uri("/daily")
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_request_host_strips_port() {
        assert_eq!(
            request_host(&request_with_host("crosscut.cc:8080")).as_deref(),
            Some("crosscut.cc")
        );
    }

    #[test]
    fn test_request_host_lowercases() {
        assert_eq!(
            request_host(&request_with_host("WWW.Crosscut.CC")).as_deref(),
            Some("www.crosscut.cc")
        );
    }

    #[test]
    fn test_request_host_prefers_absolute_uri() {
        let request = axum::http::Request::builder()
            .uri("http://crosscut.deno.dev/daily")
            .header(header::HOST, "localhost")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request).as_deref(), Some("crosscut.deno.dev"));
    }

    #[test]
    fn test_request_host_missing() {
        let request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(request_host(&request), None);
    }

    #[test]
    fn test_config_snapshot() {
        let state = AppState::new(Config::default());
        assert_eq!(state.config_snapshot().unwrap(), Config::default());
    }
}
