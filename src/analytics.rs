use crate::error::Result;
use axum::http::{header, HeaderMap, Method, Uri};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// One tracked request, as delivered to the analytics endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// RFC 3339 time the request was received
    pub timestamp: String,
    /// Random identifier for this record
    pub id: String,
    pub method: String,
    pub url: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl RequestRecord {
    #[must_use]
    pub fn new(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let header_value = |name| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            id: format!("{:032x}", rand::random::<u128>()),
            method: method.to_string(),
            url: uri.to_string(),
            user_agent: header_value(header::USER_AGENT),
            referrer: header_value(header::REFERER),
        }
    }
}

/// Deliver `record` in the background.
///
/// The request being served never waits for this, and a failed delivery is only
/// logged.
pub fn track_request(client: reqwest::Client, endpoint: String, record: RequestRecord) {
    tokio::spawn(async move {
        if let Err(e) = send_record(&client, &endpoint, &record).await {
            warn!("Failed to track request {}: {e}", record.id);
        }
    });
}

/// POST `record` as JSON to `endpoint`.
///
/// # Errors
///
/// Returns an error if the request cannot be sent or the endpoint answers with
/// an error status.
pub async fn send_record(
    client: &reqwest::Client,
    endpoint: &str,
    record: &RequestRecord,
) -> Result<()> {
    debug!("Tracking request {} {}", record.method, record.url);
    client
        .post(endpoint)
        .json(record)
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}
