use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use url::Url;

use crate::{
    Error, Result,
    hls::{BodyKind, PLAYLIST_CONTENT_TYPE},
    logging::StreamLogRecord,
    proxy::{ProxyClient, relay_body},
    server::state::AppState,
    stream::{PlaylistRewriter, TransformContext, rules},
};

/// Upstream framing headers that must not be copied onto a re-framed body.
const STRIPPED_HEADERS: [header::HeaderName; 3] = [
    header::CONTENT_ENCODING,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

const EXPOSED_HEADERS: &str = "Content-Length, Content-Range, Accept-Ranges";

/// Handle GET /stream/{token} requests.
pub async fn handle_stream(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    let mut record = StreamLogRecord::new().with_client_info(user_agent);

    let response = match proxy_stream(&state, &token, &headers, &mut record).await {
        Ok(response) => response,
        Err(e) => {
            record = record.with_error(e.error_code());
            e.into_response()
        }
    };

    record
        .with_response(response.status().as_u16(), started.elapsed())
        .emit();

    response
}

/// Handle GET /stream without a token.
pub async fn handle_missing_token() -> Response {
    Error::MissingToken.into_response()
}

/// Handle OPTIONS /stream/{token} (CORS preflight).
pub async fn handle_preflight(State(state): State<AppState>) -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                state.config.allowed_origin.clone(),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, HEAD, OPTIONS"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Range, Accept-Encoding"),
            ),
            (
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static("86400"),
            ),
            (header::VARY, HeaderValue::from_static("Origin")),
        ],
    )
        .into_response()
}

async fn proxy_stream(
    state: &AppState,
    token: &str,
    headers: &HeaderMap,
    record: &mut StreamLogRecord,
) -> Result<Response> {
    if token.trim().is_empty() {
        return Err(Error::MissingToken);
    }

    let upstream_url = state.codec.verify(token)?;

    let request = state
        .client
        .prepare(&upstream_url, headers.get(header::RANGE))?;
    record.set_upstream(&request);

    let response = state.client.send(&request).await?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let kind = BodyKind::detect(content_type, &request.url);
    record.set_body_kind(kind);

    match kind {
        BodyKind::Playlist => playlist_response(state, response).await,
        BodyKind::Media => Ok(media_response(&state.config.allowed_origin, response)),
    }
}

/// Buffer, rewrite and return a playlist.
async fn playlist_response(state: &AppState, response: reqwest::Response) -> Result<Response> {
    // Resolve against where the playlist was actually served from.
    let playlist_url: Url = response.url().clone();
    let body = ProxyClient::read_text(response, state.config.max_manifest_bytes).await?;

    let context = TransformContext::new(&playlist_url, state.codec.clone(), state.config.token_ttl)?;
    let rewriter = PlaylistRewriter::new(context, rules::default_rules());
    let rewritten = rewriter.process(&body)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(PLAYLIST_CONTENT_TYPE),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                state.config.allowed_origin.clone(),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        rewritten,
    )
        .into_response())
}

/// Relay a media body untouched, keeping the upstream status (200 or 206).
fn media_response(allowed_origin: &HeaderValue, response: reqwest::Response) -> Response {
    let status = response.status();
    let mut headers = response.headers().clone();

    for name in STRIPPED_HEADERS {
        headers.remove(name);
    }

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed_origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers
        .entry(header::ACCEPT_RANGES)
        .or_insert(HeaderValue::from_static("bytes"));

    let mut proxied = Response::new(relay_body(response));
    *proxied.status_mut() = status;
    *proxied.headers_mut() = headers;
    proxied
}
