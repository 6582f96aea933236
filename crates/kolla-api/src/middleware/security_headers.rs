use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Sent on every response. Bodies embed presigned URLs and link tokens,
/// so nothing may be cached.
const ALWAYS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("cache-control", "no-store, private"),
];

const JSON_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
/// RapiDoc loads its bundle from unpkg.
const DOCS_CSP: &str = "default-src 'self'; script-src 'self' 'unsafe-inline' https://unpkg.com; \
                        style-src 'self' 'unsafe-inline'; connect-src 'self'; frame-ancestors 'none'";
const HSTS: &str = "max-age=31536000; includeSubDomains";

#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    /// Adds HSTS. Only meaningful behind TLS.
    pub is_production: bool,
}

impl SecurityHeadersConfig {
    pub fn new(is_production: bool) -> Self {
        Self { is_production }
    }

    fn apply(&self, headers: &mut HeaderMap, is_docs: bool) {
        for (name, value) in ALWAYS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        let csp = if is_docs { DOCS_CSP } else { JSON_CSP };
        headers.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(csp));
        if self.is_production {
            headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
        }
    }
}

pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let is_docs = request.uri().path().starts_with("/docs");
    let mut response = next.run(request).await;
    config.apply(response.headers_mut(), is_docs);
    response
}
