//! Origin validation middleware.
//!
//! Wraps an inner service with any [`OriginPolicy`]. Rejected requests are
//! answered with `403 Forbidden` and never reach the inner service.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::{self, BoxFuture, FutureExt};
use tower::{Layer, Service};

use crate::observability::metrics;
use crate::security::OriginPolicy;

/// Tower layer applying an origin policy.
pub struct OriginValidatorLayer<P> {
    policy: Arc<P>,
}

impl<P: OriginPolicy> OriginValidatorLayer<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// Share an existing policy handle.
    pub fn from_arc(policy: Arc<P>) -> Self {
        Self { policy }
    }
}

impl<P> Clone for OriginValidatorLayer<P> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<S, P> Layer<S> for OriginValidatorLayer<P> {
    type Service = OriginValidatorService<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        OriginValidatorService {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

/// Service produced by [`OriginValidatorLayer`].
pub struct OriginValidatorService<S, P> {
    inner: S,
    policy: Arc<P>,
}

impl<S: Clone, P> Clone for OriginValidatorService<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<S, P, B> Service<Request<B>> for OriginValidatorService<S, P>
where
    S: Service<Request<B>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    P: OriginPolicy,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        match self.policy.check_headers(req.headers()) {
            Ok(acceptance) => {
                tracing::debug!(
                    path = %req.uri().path(),
                    outcome = acceptance.outcome(),
                    "Origin accepted"
                );
                metrics::record_origin_decision(acceptance.outcome());
                self.inner.call(req).boxed()
            }
            Err(rejection) => {
                tracing::warn!(
                    path = %req.uri().path(),
                    outcome = rejection.outcome(),
                    reason = %rejection,
                    "Origin rejected"
                );
                metrics::record_origin_decision(rejection.outcome());
                future::ready(Ok(forbidden())).boxed()
            }
        }
    }
}

/// Response sent to rejected clients. The reason is logged, not returned.
pub fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Origin not allowed").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::ORIGIN;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::util::BoxCloneService;
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    use crate::security::{
        AllowListOriginValidator, HostAllowList, PatternOriginValidator, SharedAllowList,
    };

    fn counting_inner(
        calls: Arc<AtomicUsize>,
    ) -> BoxCloneService<Request<Body>, Response, Infallible> {
        BoxCloneService::new(service_fn(move |_req: Request<Body>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(StatusCode::OK.into_response())
            }
        }))
    }

    fn request(origin: Option<&'static str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/ws");
        if let Some(origin) = origin {
            builder = builder.header("Origin", origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_origin_never_reaches_inner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = PatternOriginValidator::new([".goodsite.com"]).unwrap();
        let svc = ServiceBuilder::new()
            .layer(OriginValidatorLayer::new(policy))
            .service(counting_inner(calls.clone()));

        let res = svc
            .clone()
            .oneshot(request(Some("https://evil.com")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let res = svc
            .clone()
            .oneshot(request(Some("https://www.goodsite.com")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_origin_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = PatternOriginValidator::new(Vec::<String>::new()).unwrap();
        let svc = OriginValidatorLayer::new(policy).layer(counting_inner(calls.clone()));

        let res = svc.oneshot(request(None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_origin_is_forbidden() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = PatternOriginValidator::new(["*"]).unwrap();
        let svc = OriginValidatorLayer::new(policy).layer(counting_inner(calls.clone()));

        let res = svc.oneshot(request(Some("http://a.com/path"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_allow_list_layer_follows_updates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shared =
            SharedAllowList::new(HostAllowList::new(vec!["example.com".into()], false));
        let layer = OriginValidatorLayer::new(AllowListOriginValidator::new(shared.clone()));
        let svc = layer.layer(counting_inner(calls.clone()));

        let res = svc
            .clone()
            .oneshot(request(Some("http://localhost:8000")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        shared.store(HostAllowList::new(vec!["example.com".into()], true));
        let res = svc
            .clone()
            .oneshot(request(Some("http://localhost:8000")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeated_origin_headers_are_forbidden() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = PatternOriginValidator::new(["https://good.com"]).unwrap();
        let svc = OriginValidatorLayer::new(policy).layer(counting_inner(calls.clone()));

        let mut req = request(Some("https://good.com"));
        req.headers_mut()
            .append(ORIGIN, "https://evil.com".parse().unwrap());

        let res = svc.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_layers_share_one_policy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = Arc::new(PatternOriginValidator::new(["https://good.com"]).unwrap());
        let ws = OriginValidatorLayer::from_arc(Arc::clone(&policy))
            .layer(counting_inner(calls.clone()));
        let api = OriginValidatorLayer::from_arc(Arc::clone(&policy))
            .layer(counting_inner(calls.clone()));
        assert_eq!(Arc::strong_count(&policy), 3);

        let res = ws.oneshot(request(Some("https://good.com"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let res = api.oneshot(request(Some("https://evil.com"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
