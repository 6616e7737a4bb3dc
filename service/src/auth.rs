//! # Bearer Authentication
//!
//! Optional shared-secret gate for mutating endpoints. When the service is
//! started with an API secret, every request passing through
//! [`require_bearer`] must carry `Authorization: Bearer <secret>`. Without
//! a configured secret the middleware is a no-op, which is only acceptable
//! on the local network.
//!
//! The secret itself is never kept in memory after startup — only its
//! SHA-256 digest is stored, and validation compares digests. Digests are
//! fixed-length, so the comparison cannot leak secret length through
//! timing, and a process core dump does not surrender the secret.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha2::{Digest, Sha256};

/// Digest of the configured bearer secret; `None` disables the gate.
#[derive(Clone)]
pub struct AuthConfig {
    secret_digest: Option<[u8; 32]>,
}

impl AuthConfig {
    /// Gate on `secret`; `None` leaves all endpoints open.
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret_digest: secret.map(|s| Sha256::digest(s.as_bytes()).into()),
        }
    }

    pub fn open() -> Self {
        Self {
            secret_digest: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.secret_digest.is_none()
    }

    /// Whether `provided` matches the configured secret.
    fn accepts(&self, provided: &str) -> bool {
        match self.secret_digest {
            None => true,
            Some(expected) => {
                let digest: [u8; 32] = Sha256::digest(provided.as_bytes()).into();
                digest == expected
            }
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_digest", &self.secret_digest.map(|_| "[REDACTED]"))
            .finish()
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Axum middleware enforcing the bearer secret.
pub async fn require_bearer(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    if auth.is_open() {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if auth.accepts(token) => next.run(request).await,
        Some(_) => unauthorized("invalid bearer token"),
        None => unauthorized("missing Authorization: Bearer header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn router(auth: AuthConfig) -> Router {
        Router::new()
            .route("/guarded", get(|| async { "ok" }))
            .layer(from_fn_with_state(auth, require_bearer))
    }

    async fn request(router: &Router, auth_header: Option<&str>) -> StatusCode {
        let mut builder = axum::http::Request::builder().uri("/guarded");
        if let Some(value) = auth_header {
            builder = builder.header("authorization", value);
        }
        let resp = router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        resp.status()
    }

    #[tokio::test]
    async fn open_config_admits_everything() {
        let router = router(AuthConfig::open());
        assert_eq!(request(&router, None).await, StatusCode::OK);
        assert_eq!(
            request(&router, Some("Bearer whatever")).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn secret_gates_requests() {
        let router = router(AuthConfig::new(Some("hunter2")));
        assert_eq!(request(&router, None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            request(&router, Some("Bearer wrong")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            request(&router, Some("Bearer hunter2")).await,
            StatusCode::OK
        );
    }

    #[test]
    fn debug_never_prints_the_digest() {
        let auth = AuthConfig::new(Some("hunter2"));
        let printed = format!("{auth:?}");
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("hunter2"));
    }
}
