use bytes::Bytes;
use egress_core::{EgressError, InboundResponse, OutboundRequest, RequestMetadata};
use egress_pipeline::CallLogger;
use tokio_util::sync::CancellationToken;

/// Per-run request settings shared by every probed URL.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: http::Method,
    pub route: Option<String>,
    pub request_name: Option<String>,
    pub dependency_name: Option<String>,
    pub headers: Vec<(String, String)>,
}

/// How a single probe ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(u16),
    Failed,
}

/// Build the outbound request for `url`, with route metadata attached.
pub fn build_request(plan: &RequestPlan, url: &str) -> anyhow::Result<OutboundRequest> {
    let mut builder = http::Request::builder().method(plan.method.clone()).uri(url);
    for (name, value) in &plan.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let mut request = builder.body(Bytes::new())?;
    if let Some(route) = &plan.route {
        let mut meta = RequestMetadata::new(route)?;
        if let Some(name) = &plan.request_name {
            meta = meta.with_request_name(name.clone());
        }
        if let Some(name) = &plan.dependency_name {
            meta = meta.with_dependency_name(name.clone());
        }
        meta.attach(&mut request);
    }
    Ok(request)
}

/// Send one request through `logger`. No retries.
pub async fn run(
    logger: &dyn CallLogger,
    client: &reqwest::Client,
    request: OutboundRequest,
    cancel: &CancellationToken,
) -> Result<Outcome, EgressError> {
    let ctx = logger.start(&request, cancel).await?;

    let send = client
        .request(request.method().clone(), request.uri().to_string())
        .headers(request.headers().clone())
        .body(request.body().clone())
        .send();

    let sent = tokio::select! {
        res = send => res,
        _ = cancel.cancelled() => {
            let elapsed = ctx.elapsed();
            logger
                .fail(Some(ctx), &request, None, &EgressError::Cancelled, elapsed, cancel)
                .await?;
            return Ok(Outcome::Failed);
        }
    };

    let response = match sent {
        Ok(response) => response,
        Err(e) => {
            let elapsed = ctx.elapsed();
            logger
                .fail(Some(ctx), &request, None, &e, elapsed, cancel)
                .await?;
            return Ok(Outcome::Failed);
        }
    };

    let status = response.status();
    let version = response.version();
    let headers = response.headers().clone();
    let body = response.bytes().await;

    let mut inbound: InboundResponse = http::Response::new(Bytes::new());
    *inbound.status_mut() = status;
    *inbound.version_mut() = version;
    *inbound.headers_mut() = headers;

    match body {
        Ok(bytes) => {
            *inbound.body_mut() = bytes;
            let elapsed = ctx.elapsed();
            logger
                .stop(Some(ctx), &request, &inbound, elapsed, cancel)
                .await?;
            Ok(Outcome::Completed(status.as_u16()))
        }
        Err(e) => {
            let elapsed = ctx.elapsed();
            logger
                .fail(Some(ctx), &request, Some(&inbound), &e, elapsed, cancel)
                .await?;
            Ok(Outcome::Failed)
        }
    }
}
