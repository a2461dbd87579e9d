use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::{hls::BodyKind, proxy::UpstreamRequest};

/// A record of one `/stream` request, emitted as a single tracing event.
#[derive(Debug, Clone)]
pub struct StreamLogRecord {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub upstream_host: Option<String>,
    pub restricted: bool,
    pub range: Option<String>,
    pub body_kind: Option<BodyKind>,
    pub response_status: u16,
    pub response_time_ms: i64,
    pub error_type: Option<&'static str>,
    pub user_agent: Option<String>,
}

impl StreamLogRecord {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            upstream_host: None,
            restricted: false,
            range: None,
            body_kind: None,
            response_status: 0,
            response_time_ms: 0,
            error_type: None,
            user_agent: None,
        }
    }

    /// Upstream URLs stay out of the record; the host is enough to correlate.
    pub fn set_upstream(&mut self, request: &UpstreamRequest) {
        self.upstream_host = Some(request.host.clone());
        self.restricted = request.restricted;
        self.range = request
            .range
            .as_ref()
            .and_then(|r| r.to_str().ok())
            .map(String::from);
    }

    pub fn set_body_kind(&mut self, kind: BodyKind) {
        self.body_kind = Some(kind);
    }

    pub fn with_response(mut self, status: u16, elapsed: Duration) -> Self {
        self.response_status = status;
        self.response_time_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
        self
    }

    pub fn with_error(mut self, error_type: &'static str) -> Self {
        self.error_type = Some(error_type);
        self
    }

    pub fn with_client_info(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(String::from);
        self
    }

    pub fn emit(&self) {
        tracing::info!(
            request_id = %self.request_id,
            timestamp = %self.timestamp.to_rfc3339(),
            upstream_host = self.upstream_host.as_deref().unwrap_or("-"),
            restricted = self.restricted,
            range = self.range.as_deref().unwrap_or("-"),
            kind = self.body_kind.map(|k| k.as_str()).unwrap_or("-"),
            status = self.response_status,
            elapsed_ms = self.response_time_ms,
            error = self.error_type.unwrap_or("-"),
            user_agent = self.user_agent.as_deref().unwrap_or("-"),
            "Stream request completed"
        );
    }
}

impl Default for StreamLogRecord {
    fn default() -> Self {
        Self::new()
    }
}
