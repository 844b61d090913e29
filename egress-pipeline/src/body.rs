//! Body capture.
//!
//! A body is recorded only when its `Content-Type` is on the allow list for
//! that side. Chunks are pulled until `body_size_limit` bytes are in hand or
//! the source ends, all within `body_read_timeout_ms`. The kept bytes are cut
//! back to the last complete UTF-8 character; invalid sequences are replaced.

use bytes::Bytes;
use egress_core::{EgressError, LoggingConfig};
use futures::stream::{self, Stream, StreamExt};
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use std::convert::Infallible;
use std::fmt::Display;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Which side of the call a body belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySide {
    Request,
    Response,
}

#[derive(Debug, Clone)]
pub struct BodyReader {
    size_limit: usize,
    timeout: Duration,
    request_types: Vec<String>,
    response_types: Vec<String>,
}

impl BodyReader {
    /// `None` when body logging is disabled.
    pub fn from_config(config: &LoggingConfig) -> Option<Self> {
        if !config.log_body {
            return None;
        }
        let normalize = |types: &[String]| {
            types
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .collect::<Vec<_>>()
        };
        Some(Self {
            size_limit: config.body_size_limit,
            timeout: config.body_read_timeout(),
            request_types: normalize(&config.request_body_content_types),
            response_types: normalize(&config.response_body_content_types),
        })
    }

    /// Whether a body with these headers may be logged.
    pub fn accepts(&self, side: BodySide, headers: &HeaderMap) -> bool {
        let allowed = match side {
            BodySide::Request => &self.request_types,
            BodySide::Response => &self.response_types,
        };
        let Some(essence) = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type_essence)
        else {
            return false;
        };
        allowed.iter().any(|pattern| media_type_matches(pattern, &essence))
    }

    /// Read the loggable form of a buffered `body`.
    pub async fn read(
        &self,
        side: BodySide,
        headers: &HeaderMap,
        body: &Bytes,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, EgressError> {
        let chunks = stream::iter([Ok::<_, Infallible>(body.clone())]);
        self.read_stream(side, headers, chunks, cancel).await
    }

    /// Read the loggable form of a chunked body.
    ///
    /// Stops pulling once more than `body_size_limit` bytes have arrived, so
    /// an endless source is never drained. Fails with
    /// [`EgressError::Cancelled`] when `cancel` fires first, and with
    /// [`EgressError::Body`] on timeout or when the source yields an error.
    pub async fn read_stream<S, E>(
        &self,
        side: BodySide,
        headers: &HeaderMap,
        mut chunks: S,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, EgressError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        if !self.accepts(side, headers) {
            return Ok(None);
        }
        let limit = self.size_limit;
        let collect = async move {
            let mut buf = Vec::new();
            while buf.len() <= limit {
                match chunks.next().await {
                    Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                    Some(Err(e)) => return Err(EgressError::Body(e.to_string())),
                    None => break,
                }
            }
            Ok(buf)
        };
        let read = tokio::time::timeout(self.timeout, collect);
        let collected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EgressError::Cancelled),
            res = read => res,
        };
        let buf = collected.map_err(|_| {
            EgressError::Body(format!("read timed out after {:?}", self.timeout))
        })??;
        Ok(Some(decode(&buf, limit)))
    }
}

/// `type/subtype` lower-cased, parameters stripped.
fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `text/*` matches any `text/` subtype; anything else must match exactly.
fn media_type_matches(pattern: &str, essence: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(kind) => essence
            .split_once('/')
            .is_some_and(|(t, _)| t == kind),
        None => pattern == essence,
    }
}

fn decode(body: &[u8], limit: usize) -> String {
    let mut end = body.len().min(limit);
    if end < body.len() {
        end = drop_split_char(body, end);
    }
    String::from_utf8_lossy(&body[..end]).into_owned()
}

/// Move `end` back over a multi-byte character that the cut splits. Only the
/// last three bytes are inspected, so invalid bytes earlier on do not matter.
fn drop_split_char(body: &[u8], end: usize) -> usize {
    for start in (end.saturating_sub(3)..end).rev() {
        let width = match body[start] {
            0x80..=0xBF => continue,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if start + width > end { start } else { end };
    }
    end
}
