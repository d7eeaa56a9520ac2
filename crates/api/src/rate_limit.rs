use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Windows {
    clients: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

/// Sliding-window limiter keyed by client address. Idle clients are dropped
/// at most once per window.
#[derive(Debug, Clone)]
pub struct ClientRateLimiter {
    windows: Arc<Mutex<Windows>>,
    window: Duration,
    max_requests: usize,
}

impl ClientRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Windows {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            window,
            max_requests: max_requests.max(1),
        }
    }

    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock();

        if now.duration_since(windows.last_sweep) >= self.window {
            let window = self.window;
            windows
                .clients
                .retain(|_, hits| hits.back().is_some_and(|last| now.duration_since(*last) < window));
            windows.last_sweep = now;
        }

        let hits = windows.clients.entry(client.to_string()).or_default();
        while hits
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            hits.pop_front();
        }

        if let Some(oldest) = hits.front().copied() {
            if hits.len() >= self.max_requests {
                let elapsed = now.duration_since(oldest);
                return RateDecision::Limited {
                    retry_after: self.window.saturating_sub(elapsed),
                };
            }
        }

        hits.push_back(now);
        RateDecision::Allowed
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.lock().clients.len()
    }
}
