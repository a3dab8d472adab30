#![allow(unreachable_pub, clippy::redundant_pub_crate)]
use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
};

use api_types::ErrorResponse;
use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use runtime::rate_limiter::{RateLimitDecision, RateLimiter};

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Clone, Debug)]
pub(super) struct RateLimitLayer {
    limiter: RateLimiter,
    trust_proxy: bool,
}

impl RateLimitLayer {
    pub fn new(limiter: RateLimiter, trust_proxy: bool) -> Self {
        Self { limiter, trust_proxy }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit { inner, limiter: self.limiter.clone(), trust_proxy: self.trust_proxy }
    }
}

#[derive(Clone, Debug)]
pub(super) struct RateLimit<S> {
    inner: S,
    limiter: RateLimiter,
    trust_proxy: bool,
}

/// Resolve the key a request is counted under: the first X-Forwarded-For hop
/// when the proxy is trusted, otherwise the peer address.
fn client_key<B>(req: &Request<B>, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) =
            req.headers().get("x-forwarded-for").and_then(|v| v.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_owned();
                }
            }
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}

fn rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(decision.reset_secs()));
}

impl<S, ReqBody> Service<Request<ReqBody>> for RateLimit<S>
where
    S: Service<Request<ReqBody>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let key = client_key(&req, self.trust_proxy);
        let decision = self.limiter.check(&key);

        if decision.allowed {
            let fut = self.inner.call(req);
            Box::pin(async move {
                let mut resp = fut.await?;
                rate_limit_headers(resp.headers_mut(), &decision);
                Ok(resp)
            })
        } else {
            let error_body = ErrorResponse::new(
                "rate-limit",
                "Too Many Requests",
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded",
            );
            let mut resp = axum::Json(error_body).into_response();
            *resp.status_mut() = StatusCode::TOO_MANY_REQUESTS;
            rate_limit_headers(resp.headers_mut(), &decision);
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(decision.reset_secs()));
            Box::pin(std::future::ready(Ok(resp)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RateLimitLayer;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use runtime::rate_limiter::RateLimiter;
    use std::{convert::Infallible, time::Duration};
    use tower::{Layer, Service, ServiceExt, service_fn};

    fn echo_service()
    -> impl Service<Request<Body>, Response = Response, Error = Infallible, Future: Send> + Clone + Send
    {
        service_fn(|_req: Request<Body>| async move {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        })
    }

    #[tokio::test]
    async fn attaches_informational_headers_while_allowed() {
        let layer = RateLimitLayer::new(RateLimiter::new(3, Duration::from_secs(30)), false);
        let mut svc = layer.layer(echo_service());

        for expected_remaining in ["2", "1", "0"] {
            let resp =
                svc.ready().await.unwrap().call(Request::new(Body::empty())).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(resp.headers().get("x-ratelimit-limit").unwrap(), "3");
            assert_eq!(
                resp.headers().get("x-ratelimit-remaining").unwrap(),
                expected_remaining
            );
            assert!(resp.headers().contains_key("x-ratelimit-reset"));
        }
    }

    #[tokio::test]
    async fn sets_retry_after_header_on_reject() {
        let layer = RateLimitLayer::new(RateLimiter::new(1, Duration::from_secs(30)), false);
        let mut svc = layer.layer(echo_service());

        let _ = svc.ready().await.unwrap().call(Request::new(Body::empty())).await.unwrap();
        let resp = svc.ready().await.unwrap().call(Request::new(Body::empty())).await.unwrap();

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry = resp.headers().get(axum::http::header::RETRY_AFTER).unwrap();
        assert_eq!(retry.to_str().unwrap(), "30");
        assert_eq!(resp.headers().get("x-ratelimit-remaining").unwrap(), "0");
    }

    #[tokio::test]
    async fn forwarded_for_separates_clients_when_proxy_is_trusted() {
        let layer = RateLimitLayer::new(RateLimiter::new(1, Duration::from_secs(30)), true);
        let mut svc = layer.layer(echo_service());

        let request = |addr: &str| {
            Request::builder()
                .header("x-forwarded-for", addr)
                .body(Body::empty())
                .unwrap()
        };

        let first = svc.ready().await.unwrap().call(request("203.0.113.7")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let repeat = svc.ready().await.unwrap().call(request("203.0.113.7")).await.unwrap();
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
        let other = svc.ready().await.unwrap().call(request("203.0.113.8")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forwarded_for_is_ignored_without_trust() {
        let layer = RateLimitLayer::new(RateLimiter::new(1, Duration::from_secs(30)), false);
        let mut svc = layer.layer(echo_service());

        let request = |addr: &str| {
            Request::builder()
                .header("x-forwarded-for", addr)
                .body(Body::empty())
                .unwrap()
        };

        // Without trust both requests count against the same (unknown) peer.
        let first = svc.ready().await.unwrap().call(request("203.0.113.7")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let second = svc.ready().await.unwrap().call(request("203.0.113.8")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
