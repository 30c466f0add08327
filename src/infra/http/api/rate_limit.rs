use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Number of checks between sweeps of idle buckets.
const SWEEP_EVERY: u64 = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    client: String,
    route: String,
}

/// Outcome of [`ApiRateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Sliding-log limiter: each bucket keeps the instants of the requests it
/// admitted during the last window, oldest first.
#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<BucketKey, VecDeque<Instant>>>,
    checks: Arc<AtomicU64>,
    trusted_proxies: Arc<[IpAddr]>,
}

impl ApiRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
            checks: Arc::new(AtomicU64::new(0)),
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    /// Peers allowed to report the original client through `X-Forwarded-For`.
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }

    pub fn trusted_proxies(&self) -> &[IpAddr] {
        &self.trusted_proxies
    }

    pub fn check(&self, client: &str, route: &str) -> RateDecision {
        self.check_at(client, route, Instant::now())
    }

    fn check_at(&self, client: &str, route: &str, now: Instant) -> RateDecision {
        // The sweep must run before an entry guard is held on the map.
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep(now);
        }

        let key = BucketKey {
            client: client.to_string(),
            route: route.to_string(),
        };
        let mut log = self.buckets.entry(key).or_default();
        self.expire(&mut log, now);

        let used = u32::try_from(log.len()).unwrap_or(u32::MAX);
        if used >= self.max_requests {
            let retry_after = log
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        log.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_requests - used - 1,
        }
    }

    /// Drop buckets that admitted nothing during the last window.
    pub fn sweep(&self, now: Instant) {
        self.buckets.retain(|_, log| {
            self.expire(log, now);
            !log.is_empty()
        });
    }

    pub fn tracked_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    fn expire(&self, log: &mut VecDeque<Instant>, now: Instant) {
        while log
            .front()
            .is_some_and(|admitted| now.duration_since(*admitted) >= self.window)
        {
            log.pop_front();
        }
    }
}

/// Whole seconds for a `Retry-After` header, never zero.
pub fn retry_after_header_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: &str = "/api/postblog";

    #[test]
    fn limits_after_the_ceiling_within_a_window() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 2);

        assert_eq!(
            limiter.check("10.0.0.1", ROUTE),
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check("10.0.0.1", ROUTE),
            RateDecision::Allowed { remaining: 0 }
        );
        assert!(matches!(
            limiter.check("10.0.0.1", ROUTE),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn clients_and_routes_are_counted_separately() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 1);

        assert!(matches!(limiter.check("a", ROUTE), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check("b", ROUTE), RateDecision::Allowed { .. }));
        assert!(matches!(
            limiter.check("a", "/api/postcontact"),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(limiter.check("a", ROUTE), RateDecision::Limited { .. }));
    }

    #[test]
    fn retry_after_counts_down_from_the_oldest_request() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 1);
        let start = Instant::now();

        limiter.check_at("a", ROUTE, start);
        let decision = limiter.check_at("a", ROUTE, start + Duration::from_secs(45));

        assert_eq!(
            decision,
            RateDecision::Limited {
                retry_after: Duration::from_secs(15)
            }
        );
    }

    #[test]
    fn slots_free_up_once_the_window_passes() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();

        limiter.check_at("a", ROUTE, start);
        assert!(matches!(
            limiter.check_at("a", ROUTE, start + Duration::from_secs(9)),
            RateDecision::Limited { .. }
        ));
        assert_eq!(
            limiter.check_at("a", ROUTE, start + Duration::from_secs(10)),
            RateDecision::Allowed { remaining: 0 }
        );
    }

    #[test]
    fn sweep_forgets_idle_clients() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(10), 5);
        let start = Instant::now();

        for n in 0..20 {
            limiter.check_at(&format!("198.51.100.{n}"), ROUTE, start);
        }
        limiter.check_at("recent", ROUTE, start + Duration::from_secs(8));
        assert_eq!(limiter.tracked_buckets(), 21);

        limiter.sweep(start + Duration::from_secs(12));
        assert_eq!(limiter.tracked_buckets(), 1);
    }

    #[test]
    fn many_distinct_clients_do_not_accumulate() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(1), 1);
        let start = Instant::now();

        for n in 0..(SWEEP_EVERY * 4) {
            let now = start + Duration::from_secs(n * 2);
            limiter.check_at(&format!("client-{n}"), ROUTE, now);
        }

        assert!(limiter.tracked_buckets() <= SWEEP_EVERY as usize);
    }

    #[test]
    fn header_value_rounds_up_and_is_never_zero() {
        assert_eq!(retry_after_header_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_header_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_header_secs(Duration::from_millis(14_200)), 15);
    }
}
