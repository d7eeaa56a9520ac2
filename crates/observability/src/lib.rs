use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// How a chat request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    Crisis,
    Emotion,
    Fallback,
    EmptyMessage,
    Failure,
}

impl ChatOutcome {
    const COUNT: usize = 5;

    fn slot(self) -> usize {
        match self {
            Self::Crisis => 0,
            Self::Emotion => 1,
            Self::Fallback => 2,
            Self::EmptyMessage => 3,
            Self::Failure => 4,
        }
    }
}

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    outcomes: [AtomicU64; ChatOutcome::COUNT],
    latency_micros_total: AtomicU64,
    latency_micros_max: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub crisis_replies_total: u64,
    pub emotion_replies_total: u64,
    pub fallback_replies_total: u64,
    pub empty_messages_total: u64,
    pub failures_total: u64,
    pub avg_latency_micros: f64,
    pub max_latency_micros: u64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record(&self, outcome: ChatOutcome) {
        self.outcomes[outcome.slot()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros_total.fetch_add(micros, Ordering::Relaxed);
        self.latency_micros_max.fetch_max(micros, Ordering::Relaxed);
    }

    fn count(&self, outcome: ChatOutcome) -> u64 {
        self.outcomes[outcome.slot()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.latency_micros_total.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            crisis_replies_total: self.count(ChatOutcome::Crisis),
            emotion_replies_total: self.count(ChatOutcome::Emotion),
            fallback_replies_total: self.count(ChatOutcome::Fallback),
            empty_messages_total: self.count(ChatOutcome::EmptyMessage),
            failures_total: self.count(ChatOutcome::Failure),
            avg_latency_micros: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
            max_latency_micros: self.latency_micros_max.load(Ordering::Relaxed),
        }
    }
}

/// Log line format, chosen with `HERVIVAL_LOG_FORMAT` (`json` by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" | "text" => Some(Self::Compact),
            _ => None,
        }
    }

    fn from_env() -> Self {
        env::var("HERVIVAL_LOG_FORMAT")
            .ok()
            .and_then(|value| Self::parse(&value))
            .unwrap_or(Self::Json)
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{service_name}=info,hervival_api=info,hervival_core=info"
            ))
        });

        match LogFormat::from_env() {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_current_span(true)
                .with_span_list(true)
                .init(),
            LogFormat::Compact => tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init(),
        }
    });
}
