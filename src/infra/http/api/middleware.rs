use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::error::ApiError;
use super::rate_limit::{RateDecision, retry_after_header_secs};
use super::state::ApiState;

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
const ANONYMOUS_CLIENT: &str = "anonymous";

/// Throttle write routes per client address.
pub async fn api_rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let limiter = &state.rate_limiter;
    let client = client_key(request.headers(), peer, limiter.trusted_proxies());

    match limiter.check(&client, &path) {
        RateDecision::Limited { retry_after } => {
            warn!(
                target = "creator_circle::api::ratelimit",
                client = %client,
                path = %path,
                limit = limiter.limit(),
                retry_after_ms = retry_after.as_millis() as u64,
                "rate limit exceeded"
            );
            ApiError::rate_limited(retry_after_header_secs(retry_after))
        }
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
    }
}

/// The socket peer, unless it is a trusted proxy: then the nearest
/// untrusted hop named in `X-Forwarded-For`, read right to left.
fn client_key(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return ANONYMOUS_CLIENT.to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }

    let hops: Vec<&str> = headers
        .get_all(FORWARDED_FOR_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();

    let mut client = peer;
    for hop in hops.into_iter().rev() {
        match hop.parse::<IpAddr>() {
            Ok(address) if trusted.contains(&address) => client = address,
            Ok(address) => return address.to_string(),
            Err(_) => break,
        }
    }
    client.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(raw: &str) -> IpAddr {
        raw.parse().expect("ip address")
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn forwarded_header_is_ignored_from_untrusted_peers() {
        let headers = forwarded("203.0.113.7");

        assert_eq!(
            client_key(&headers, Some(ip("198.51.100.4")), &[]),
            "198.51.100.4"
        );
        assert_eq!(
            client_key(&headers, Some(ip("198.51.100.4")), &[ip("10.0.0.1")]),
            "198.51.100.4"
        );
    }

    #[test]
    fn trusted_proxy_reports_the_nearest_untrusted_hop() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.2")];
        let headers = forwarded("192.0.2.99, 203.0.113.7, 10.0.0.2");

        assert_eq!(
            client_key(&headers, Some(ip("10.0.0.1")), &trusted),
            "203.0.113.7"
        );
    }

    #[test]
    fn trusted_proxy_without_usable_header_is_the_client() {
        let trusted = [ip("10.0.0.1")];

        assert_eq!(
            client_key(&HeaderMap::new(), Some(ip("10.0.0.1")), &trusted),
            "10.0.0.1"
        );
        assert_eq!(
            client_key(&forwarded("not-an-ip"), Some(ip("10.0.0.1")), &trusted),
            "10.0.0.1"
        );
    }

    #[test]
    fn missing_peer_is_anonymous() {
        assert_eq!(
            client_key(&forwarded("203.0.113.7"), None, &[]),
            ANONYMOUS_CLIENT
        );
    }
}
