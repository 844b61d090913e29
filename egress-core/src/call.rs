use crate::error::EgressError;
use crate::route::RouteTemplate;
use bytes::Bytes;
use std::sync::Arc;

/// An outgoing request as seen by the pipeline (body already buffered).
pub type OutboundRequest = http::Request<Bytes>;

/// The response returned by the transport for an [`OutboundRequest`].
pub type InboundResponse = http::Response<Bytes>;

/// Per-request metadata attached as an `http` extension by the caller.
///
/// The route template is parsed once when the metadata is built so the hot
/// path never re-parses it.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub route: Arc<RouteTemplate>,
    /// Logical name of the operation (e.g. `GetUser`).
    pub request_name: Option<String>,
    /// Name of the downstream dependency (e.g. `users-api`).
    pub dependency_name: Option<String>,
}

impl RequestMetadata {
    pub fn new(route: &str) -> Result<Self, EgressError> {
        Ok(Self {
            route: Arc::new(RouteTemplate::parse(route)?),
            request_name: None,
            dependency_name: None,
        })
    }

    pub fn with_request_name(mut self, name: impl Into<String>) -> Self {
        self.request_name = Some(name.into());
        self
    }

    pub fn with_dependency_name(mut self, name: impl Into<String>) -> Self {
        self.dependency_name = Some(name.into());
        self
    }

    /// Read the metadata attached to a request, if any.
    pub fn of(request: &OutboundRequest) -> Option<&RequestMetadata> {
        request.extensions().get::<RequestMetadata>()
    }

    /// Attach this metadata to a request.
    pub fn attach(self, request: &mut OutboundRequest) {
        request.extensions_mut().insert(self);
    }
}
