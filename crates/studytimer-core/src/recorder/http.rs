//! Remote session recorder -- posts sessions to the study backend.
//!
//! `POST {base}/study-sessions` with `{"duration", "type", "timestamp"}`.
//! Completed sessions are sent as type `pomodoro`, partial ones as
//! `partial`.

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use super::{SessionKind, SessionRecord, SessionRecorder};
use crate::error::RecorderError;

#[derive(Debug, Clone)]
pub struct HttpRecorder {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl HttpRecorder {
    /// Build a recorder for the API rooted at `base_url`
    /// (e.g. `http://localhost:5000/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self, RecorderError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            endpoint: base.join("study-sessions")?,
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Deliver one record and wait for the response.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn send(&self, record: &SessionRecord) -> Result<(), RecorderError> {
        let body = json!({
            "duration": record.duration_minutes,
            "type": wire_type(record.kind),
            "timestamp": record.occurred_at.to_rfc3339(),
        });

        let mut req = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            debug!(session = %record.id, status = status.as_u16(), "session posted");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(RecorderError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl SessionRecorder for HttpRecorder {
    /// Spawn the request on the current tokio runtime and return at once.
    /// Failures are logged from the spawned task.
    fn record(&self, record: SessionRecord) -> Result<(), RecorderError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| RecorderError::NoRuntime)?;
        let recorder = self.clone();
        handle.spawn(async move {
            if let Err(e) = recorder.send(&record).await {
                warn!(session = %record.id, endpoint = %recorder.endpoint, error = %e, "failed to post study session");
            }
        });
        Ok(())
    }
}

fn wire_type(kind: SessionKind) -> &'static str {
    match kind {
        SessionKind::Completed => "pomodoro",
        SessionKind::Partial => "partial",
    }
}
