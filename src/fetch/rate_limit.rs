use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;
use url::Url;

/// Per-host request spacing. Each host gets a next-allowed slot; callers
/// reserve a slot under the lock and sleep outside it, so concurrent
/// workers queue politely without serializing unrelated hosts.
#[derive(Clone)]
pub struct HostGate {
    slots: Arc<Mutex<HashMap<String, Instant>>>,
    base_delay: Duration,
    jitter_ms: u64,
}

impl HostGate {
    /// A gate with zero base delay and zero jitter never waits.
    pub fn new(base_delay_ms: u64, jitter_ms: u64) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            base_delay: Duration::from_millis(base_delay_ms),
            jitter_ms,
        }
    }

    pub async fn acquire(&self, host: &str) {
        if self.base_delay.is_zero() && self.jitter_ms == 0 {
            return;
        }

        let wait = {
            let mut slots = self.slots.lock().await;
            let now = Instant::now();
            let next = slots.entry(host.to_string()).or_insert(now);
            let wait = next.saturating_duration_since(now);

            let jitter = Duration::from_millis(fastrand::u64(0..=self.jitter_ms));
            *next = (*next).max(now) + self.base_delay + jitter;
            wait
        };

        if !wait.is_zero() {
            debug!("Waiting {:?} before next request to {}", wait, host);
            sleep(wait).await;
        }
    }
}

/// Host portion of a URL, for gating. Unparseable URLs share one bucket.
pub fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
