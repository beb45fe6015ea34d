//! API Middleware
//!
//! Request logging, bearer authentication, and the role and shop gates.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{extract_bearer_token, AuthError};
use crate::domain::{Capability, DomainError, TenantContext};
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the caller's correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Correlation id resolved for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

// =========================================================================
// Bearer authentication
// =========================================================================

/// Verify the bearer token and attach the caller's [`TenantContext`].
///
/// Runs before any handler; nothing downstream reads a shop id from input.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = extract_bearer_token(header_value)?;
    let context = state.tokens.verify(token)?;

    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.0)
        .unwrap_or_else(Uuid::new_v4);

    tracing::debug!(
        user_id = context.user_id,
        shop_id = context.shop_id,
        role = %context.role,
        %correlation_id,
        "Request authenticated"
    );

    request
        .extensions_mut()
        .insert(context.with_correlation_id(correlation_id));

    Ok(next.run(request).await)
}

fn tenant_context(request: &Request<Body>) -> Result<&TenantContext, AppError> {
    request
        .extensions()
        .get::<TenantContext>()
        .ok_or_else(|| AppError::Unauthenticated("authentication required".to_string()))
}

// =========================================================================
// Role gate
// =========================================================================

/// Reject callers whose role lacks `capability`.
///
/// Mounted with `from_fn_with_state(capability, require_capability)`.
pub async fn require_capability(
    State(capability): State<Capability>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let context = tenant_context(&request)?;

    if let Err(err) = context.require(capability) {
        tracing::warn!(
            user_id = context.user_id,
            role = %context.role,
            ?capability,
            "Access denied"
        );
        return Err(err.into());
    }

    Ok(next.run(request).await)
}

// =========================================================================
// Active shop gate
// =========================================================================

/// Lock an inactive shop out of its catalog, ledger and reports.
pub async fn require_active_shop(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let shop_id = tenant_context(&request)?.shop_id;

    if !state.accounts().is_shop_active(shop_id).await? {
        tracing::info!(shop_id, "Rejected request for inactive shop");
        return Err(DomainError::Forbidden("shop is inactive".to_string()).into());
    }

    Ok(next.run(request).await)
}

// =========================================================================
// Header masking
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "proxy-authorization"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request logging
// =========================================================================

/// Log each request and echo its correlation id on the response.
///
/// An incoming `X-Correlation-Id` is reused when it parses as a UUID.
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    request.extensions_mut().insert(CorrelationId(correlation_id));

    let headers = mask_headers_for_logging(request.headers());
    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        %correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        %correlation_id,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}
