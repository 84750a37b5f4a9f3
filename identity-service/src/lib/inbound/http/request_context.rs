//! Request-scoped context: correlation id and error detail policy.
//!
//! Every request runs inside a task-local [`RequestContext`] so that error
//! responses rendered anywhere below the middleware can report the request id
//! without threading it through handler signatures. Task-locals do not cross
//! `tokio::spawn` or `spawn_blocking`; work moved off the request task must not
//! rely on [`RequestContext::current`].

use std::future::Future;

use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tokio::task_local;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Environment;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LENGTH: usize = 128;

task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub expose_internals: bool,
}

impl RequestContext {
    pub fn new(request_id: String, environment: Environment) -> Self {
        Self {
            request_id,
            expose_internals: environment.exposes_internals(),
        }
    }

    /// Context of the request being served, if called from inside one.
    pub fn current() -> Option<Self> {
        REQUEST_CONTEXT.try_with(Clone::clone).ok()
    }

    /// Run `fut` with this context in scope.
    pub async fn scope<Fut>(self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        REQUEST_CONTEXT.scope(self, fut).await
    }
}

/// Reuse a caller-supplied request id when it is short and printable,
/// otherwise mint a fresh one.
pub fn resolve_request_id(incoming: Option<&HeaderValue>) -> String {
    incoming
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LENGTH
                && id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Outermost middleware: assigns the request id, scopes the context and
/// echoes the id in the `x-request-id` response header.
pub async fn track_request(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = resolve_request_id(request.headers().get(&REQUEST_ID_HEADER));
    let context = RequestContext::new(request_id.clone(), environment);
    let span = tracing::info_span!("request", request_id = %request_id);

    let mut response = context.scope(next.run(request)).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }

    response
}
